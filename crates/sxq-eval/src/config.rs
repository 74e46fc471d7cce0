//! Analyzer configuration loaded from YAML.
//!
//! Every key is optional. Missing keys take the defaults below, which match
//! the standard V0 producer settings and the matching windows used for the
//! efficiency study.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sxq_core::serde::{from_yaml_slice, to_yaml_string};
use sxq_core::{ErrorInfo, SxqError, WeightTables};
use sxq_track::UniformField;
use sxq_truth::HitSharingAssociator;
use sxq_v0::V0FitterConfig;

/// Angular-separation and vertex-distance windows per composite role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingThresholds {
    /// Maximum ΔR between a truth K-short and its candidate.
    #[serde(default = "default_delta_r_v0")]
    pub delta_r_kshort: f64,
    /// Maximum decay-vertex distance for a K-short candidate, cm.
    #[serde(default = "default_delta_l")]
    pub delta_l_kshort: f64,
    /// Maximum ΔR between a truth anti-Lambda and its candidate.
    #[serde(default = "default_delta_r_v0")]
    pub delta_r_anti_lambda: f64,
    /// Maximum decay-vertex distance for an anti-Lambda candidate, cm.
    #[serde(default = "default_delta_l")]
    pub delta_l_anti_lambda: f64,
    /// Maximum ΔR between the truth anti-S and its candidate.
    #[serde(default = "default_delta_r_anti_s")]
    pub delta_r_anti_s: f64,
    /// Maximum interaction-vertex distance for an anti-S candidate, cm.
    #[serde(default = "default_delta_l")]
    pub delta_l_anti_s: f64,
    /// Transverse decay length an anti-S candidate must exceed, cm.
    #[serde(default = "default_min_lxy_anti_s")]
    pub min_lxy_anti_s: f64,
}

fn default_delta_r_v0() -> f64 {
    0.03
}

fn default_delta_l() -> f64 {
    2.0
}

fn default_delta_r_anti_s() -> f64 {
    0.5
}

fn default_min_lxy_anti_s() -> f64 {
    1.9
}

impl Default for MatchingThresholds {
    fn default() -> Self {
        Self {
            delta_r_kshort: default_delta_r_v0(),
            delta_l_kshort: default_delta_l(),
            delta_r_anti_lambda: default_delta_r_v0(),
            delta_l_anti_lambda: default_delta_l(),
            delta_r_anti_s: default_delta_r_anti_s(),
            delta_l_anti_s: default_delta_l(),
            min_lxy_anti_s: default_min_lxy_anti_s(),
        }
    }
}

impl MatchingThresholds {
    /// Rejects non-finite windows.
    pub fn validate(&self) -> Result<(), SxqError> {
        let windows = [
            ("matching.delta_r_kshort", self.delta_r_kshort),
            ("matching.delta_l_kshort", self.delta_l_kshort),
            ("matching.delta_r_anti_lambda", self.delta_r_anti_lambda),
            ("matching.delta_l_anti_lambda", self.delta_l_anti_lambda),
            ("matching.delta_r_anti_s", self.delta_r_anti_s),
            ("matching.delta_l_anti_s", self.delta_l_anti_s),
            ("matching.min_lxy_anti_s", self.min_lxy_anti_s),
        ];
        for (key, value) in windows {
            if !value.is_finite() {
                return Err(SxqError::config(
                    "threshold-nonfinite",
                    key,
                    format!("threshold must be finite, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Complete configuration of an [`crate::Analyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalyzerConfig {
    /// V0 pre-selection and cascade thresholds.
    #[serde(default)]
    pub v0: V0FitterConfig,
    /// Truth matching windows.
    #[serde(default)]
    pub matching: MatchingThresholds,
    /// Hit-sharing association used when an event brings none.
    #[serde(default)]
    pub association: HitSharingAssociator,
    /// Field model.
    #[serde(default)]
    pub field: UniformField,
    /// Reweighting tables.
    #[serde(default)]
    pub weights: WeightTables,
}

impl AnalyzerConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SxqError> {
        let cfg: Self = from_yaml_slice(yaml.as_bytes())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a YAML file.
    pub fn load(path: &Path) -> Result<Self, SxqError> {
        let data = std::fs::read(path).map_err(|err| {
            SxqError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let cfg: Self = from_yaml_slice(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Renders the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, SxqError> {
        to_yaml_string(self)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), SxqError> {
        self.v0.validate()?;
        self.matching.validate()?;
        let fraction = self.association.min_shared_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(SxqError::config(
                "fraction-out-of-range",
                "association.min_shared_fraction",
                format!("shared-hit fraction must lie in (0, 1], got {fraction}"),
            ));
        }
        if !self.field.bz_tesla.is_finite() {
            return Err(SxqError::Geometry(
                ErrorInfo::new("field-nonfinite", "field strength must be finite")
                    .with_context("key", "field.bz_tesla"),
            ));
        }
        self.weights.validate()
    }
}
