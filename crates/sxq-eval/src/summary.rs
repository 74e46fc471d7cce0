use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sxq_core::hash::stable_hash_string;
use sxq_core::{ParticleRole, SxqError};

use crate::record::OutputRecord;

/// End-of-run efficiency counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunSummary {
    /// Events analyzed.
    pub events: u64,
    /// Truth anti-S with an interaction vertex, loopers excluded.
    pub unique_anti_s: u64,
    /// Of those, anti-S whose four granddaughters were all found.
    pub with_granddaughters: u64,
    /// Anti-S reconstructed.
    pub reconstructed: u64,
    /// Sum of event times pileup weight over reconstructed anti-S.
    pub reconstructed_weighted: f64,
    /// Diagnostic-code histogram for the K-short pair.
    pub kshort_codes: BTreeMap<i32, u64>,
    /// Diagnostic-code histogram for the anti-Lambda pair.
    pub anti_lambda_codes: BTreeMap<i32, u64>,
    /// SHA-256 of the canonical JSON form without this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl RunSummary {
    /// Attaches the stable hash of the summary contents.
    pub fn with_hash(mut self) -> Result<Self, SxqError> {
        self.hash = None;
        let hash = stable_hash_string(&self)?;
        self.hash = Some(hash);
        Ok(self)
    }

    /// Reconstructed fraction of anti-S with all granddaughters.
    pub fn efficiency(&self) -> Option<f64> {
        (self.with_granddaughters > 0).then(|| self.reconstructed as f64 / self.with_granddaughters as f64)
    }
}

/// Run-level state threaded through [`crate::Analyzer::analyze_event`].
#[derive(Debug, Clone, Default)]
pub struct RunAggregator {
    summary: RunSummary,
}

impl RunAggregator {
    /// Creates an aggregator with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        self.summary = RunSummary::default();
    }

    /// Counts an analyzed event.
    pub fn count_event(&mut self) {
        self.summary.events += 1;
    }

    /// Counts a non-looping anti-S with an interaction vertex.
    pub fn count_unique(&mut self) {
        self.summary.unique_anti_s += 1;
    }

    /// Counts an anti-S whose chain is complete.
    pub fn count_complete(&mut self) {
        self.summary.with_granddaughters += 1;
    }

    /// Folds a finished record into the counters.
    pub fn record(&mut self, record: &OutputRecord) {
        if record.reconstructed {
            self.summary.reconstructed += 1;
            self.summary.reconstructed_weighted += record.weight();
        }
        if let Some(code) = record.entry(ParticleRole::KShort).code() {
            *self.summary.kshort_codes.entry(code).or_default() += 1;
        }
        if let Some(code) = record.entry(ParticleRole::AntiLambda).code() {
            *self.summary.anti_lambda_codes.entry(code).or_default() += 1;
        }
    }

    /// Snapshot of the counters.
    pub fn summary(&self) -> RunSummary {
        self.summary.clone()
    }
}
