//! Lookup-table reweighting factors.
//!
//! The tables themselves are produced elsewhere (beam-pipe acceptance versus
//! polar angle, pileup versus primary-vertex z for each good-vertex count) and
//! reach this crate through configuration.

use serde::{Deserialize, Serialize};

use crate::errors::SxqError;

/// Piecewise-constant weight table keyed on the lower edge of each bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BinnedWeights {
    /// `(lower_edge, weight)` pairs, strictly increasing in the edge.
    pub bins: Vec<(f64, f64)>,
    /// Weight returned below the first edge or for an empty table.
    #[serde(default)]
    pub underflow: f64,
}

impl BinnedWeights {
    /// Builds a table from `(lower_edge, weight)` pairs.
    pub fn new(bins: Vec<(f64, f64)>, underflow: f64) -> Self {
        Self { bins, underflow }
    }

    /// Weight of the last bin whose lower edge does not exceed `value`.
    pub fn lookup(&self, value: f64) -> f64 {
        let idx = self.bins.partition_point(|(edge, _)| *edge <= value);
        if idx == 0 {
            self.underflow
        } else {
            self.bins[idx - 1].1
        }
    }

    /// Checks that edges are finite and strictly increasing.
    pub fn validate(&self, key: &str) -> Result<(), SxqError> {
        for window in self.bins.windows(2) {
            if !(window[0].0 < window[1].0) {
                return Err(SxqError::config(
                    "weights-unsorted",
                    key,
                    "bin edges must be strictly increasing",
                ));
            }
        }
        if self.bins.iter().any(|(e, w)| !e.is_finite() || !w.is_finite()) {
            return Err(SxqError::config(
                "weights-nonfinite",
                key,
                "bin edges and weights must be finite",
            ));
        }
        Ok(())
    }
}

/// Reweighting tables applied to truth anti-S records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeightTables {
    /// Event weight versus the anti-S polar angle. Empty means unit weight.
    #[serde(default)]
    pub event: BinnedWeights,
    /// Pileup weight versus vertex z, one table per good-vertex count.
    #[serde(default)]
    pub pileup: Vec<BinnedWeights>,
}

impl WeightTables {
    /// Event weight for a truth polar angle.
    pub fn event_weight(&self, polar_angle: f64) -> f64 {
        if self.event.bins.is_empty() {
            return 1.0;
        }
        self.event.lookup(polar_angle)
    }

    /// Pileup weight for a good-vertex count bucket and a vertex z position.
    ///
    /// Buckets beyond the configured tables weigh zero. With no pileup
    /// tables at all every event has unit weight.
    pub fn pileup_weight(&self, vertex_count_bucket: usize, z: f64) -> f64 {
        if self.pileup.is_empty() {
            return 1.0;
        }
        self.pileup
            .get(vertex_count_bucket)
            .map(|table| table.lookup(z))
            .unwrap_or(0.0)
    }

    /// Validates every configured table.
    pub fn validate(&self) -> Result<(), SxqError> {
        self.event.validate("weights.event")?;
        for (idx, table) in self.pileup.iter().enumerate() {
            table.validate(&format!("weights.pileup[{idx}]"))?;
        }
        Ok(())
    }
}
