use serde::{Deserialize, Serialize};
use sxq_core::SxqError;
use sxq_track::FitterKind;

/// Thresholds of the standalone two-track V0 reconstruction.
///
/// Floors set to a negative value effectively disable their stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V0FitterConfig {
    /// Ceiling on the track normalized chi-square.
    #[serde(default = "default_tk_chi2_cut")]
    pub tk_chi2_cut: f64,
    /// Minimum number of valid hits on a track.
    #[serde(default = "default_tk_nhits_cut")]
    pub tk_nhits_cut: u32,
    /// Transverse momentum floor in GeV.
    #[serde(default = "default_tk_pt_cut")]
    pub tk_pt_cut: f64,
    /// Transverse impact-parameter significance floor.
    #[serde(default = "default_tk_ip_sig_xy_cut")]
    pub tk_ip_sig_xy_cut: f64,
    /// Longitudinal impact-parameter significance floor.
    #[serde(default = "default_tk_ip_sig_z_cut")]
    pub tk_ip_sig_z_cut: f64,
    /// Ceiling on the distance of closest approach between the tracks, cm.
    #[serde(default = "default_tk_dca_cut")]
    pub tk_dca_cut: f64,
    /// Ceiling on the di-pion mass at the crossing point, GeV.
    #[serde(default = "default_m_pipi_cut")]
    pub m_pipi_cut: f64,
    /// Ceiling on the fitted vertex normalized chi-square.
    #[serde(default = "default_vtx_chi2_cut")]
    pub vtx_chi2_cut: f64,
    /// Floor on the transverse decay significance.
    #[serde(default = "default_vtx_decay_sig_xy_cut")]
    pub vtx_decay_sig_xy_cut: f64,
    /// Floor on the 3D decay significance.
    #[serde(default = "default_vtx_decay_sig_xyz_cut")]
    pub vtx_decay_sig_xyz_cut: f64,
    /// Floor on the transverse pointing-angle cosine.
    #[serde(default = "default_cos_theta_xy_cut")]
    pub cos_theta_xy_cut: f64,
    /// Floor on the 3D pointing-angle cosine.
    #[serde(default = "default_cos_theta_xyz_cut")]
    pub cos_theta_xyz_cut: f64,
    /// Half-width of the K-short mass window, GeV.
    #[serde(default = "default_kshort_mass_cut")]
    pub kshort_mass_cut: f64,
    /// Half-width of the Lambda mass window, GeV.
    #[serde(default = "default_lambda_mass_cut")]
    pub lambda_mass_cut: f64,
    /// Vertex fitter algorithm.
    #[serde(default)]
    pub vertex_fitter: FitterKind,
    /// Use track states refitted to the vertex for the kinematics.
    #[serde(default = "default_true")]
    pub use_refitted_tracks: bool,
    /// Evaluate the K-short hypothesis.
    #[serde(default = "default_true")]
    pub do_kshorts: bool,
    /// Evaluate the Lambda and anti-Lambda hypotheses.
    #[serde(default = "default_true")]
    pub do_lambdas: bool,
}

fn default_tk_chi2_cut() -> f64 {
    10.0
}

fn default_tk_nhits_cut() -> u32 {
    3
}

fn default_tk_pt_cut() -> f64 {
    0.35
}

fn default_tk_ip_sig_xy_cut() -> f64 {
    2.0
}

fn default_tk_ip_sig_z_cut() -> f64 {
    -1.0
}

fn default_tk_dca_cut() -> f64 {
    1.0
}

fn default_m_pipi_cut() -> f64 {
    0.6
}

fn default_vtx_chi2_cut() -> f64 {
    6.63
}

fn default_vtx_decay_sig_xy_cut() -> f64 {
    15.0
}

fn default_vtx_decay_sig_xyz_cut() -> f64 {
    -1.0
}

fn default_cos_theta_xy_cut() -> f64 {
    0.998
}

fn default_cos_theta_xyz_cut() -> f64 {
    -2.0
}

fn default_kshort_mass_cut() -> f64 {
    0.07
}

fn default_lambda_mass_cut() -> f64 {
    0.05
}

fn default_true() -> bool {
    true
}

impl Default for V0FitterConfig {
    fn default() -> Self {
        Self {
            tk_chi2_cut: default_tk_chi2_cut(),
            tk_nhits_cut: default_tk_nhits_cut(),
            tk_pt_cut: default_tk_pt_cut(),
            tk_ip_sig_xy_cut: default_tk_ip_sig_xy_cut(),
            tk_ip_sig_z_cut: default_tk_ip_sig_z_cut(),
            tk_dca_cut: default_tk_dca_cut(),
            m_pipi_cut: default_m_pipi_cut(),
            vtx_chi2_cut: default_vtx_chi2_cut(),
            vtx_decay_sig_xy_cut: default_vtx_decay_sig_xy_cut(),
            vtx_decay_sig_xyz_cut: default_vtx_decay_sig_xyz_cut(),
            cos_theta_xy_cut: default_cos_theta_xy_cut(),
            cos_theta_xyz_cut: default_cos_theta_xyz_cut(),
            kshort_mass_cut: default_kshort_mass_cut(),
            lambda_mass_cut: default_lambda_mass_cut(),
            vertex_fitter: FitterKind::default(),
            use_refitted_tracks: true,
            do_kshorts: true,
            do_lambdas: true,
        }
    }
}

impl V0FitterConfig {
    /// Whether refitted tracks are used after accounting for the fitter.
    ///
    /// The adaptive fitter does not provide refitted states.
    pub fn effective_refitted_tracks(&self) -> bool {
        self.use_refitted_tracks && self.vertex_fitter == FitterKind::Kalman
    }

    /// Rejects non-finite thresholds and negative ceilings or half-widths.
    pub fn validate(&self) -> Result<(), SxqError> {
        let thresholds = [
            ("v0.tk_chi2_cut", self.tk_chi2_cut),
            ("v0.tk_pt_cut", self.tk_pt_cut),
            ("v0.tk_ip_sig_xy_cut", self.tk_ip_sig_xy_cut),
            ("v0.tk_ip_sig_z_cut", self.tk_ip_sig_z_cut),
            ("v0.tk_dca_cut", self.tk_dca_cut),
            ("v0.m_pipi_cut", self.m_pipi_cut),
            ("v0.vtx_chi2_cut", self.vtx_chi2_cut),
            ("v0.vtx_decay_sig_xy_cut", self.vtx_decay_sig_xy_cut),
            ("v0.vtx_decay_sig_xyz_cut", self.vtx_decay_sig_xyz_cut),
            ("v0.cos_theta_xy_cut", self.cos_theta_xy_cut),
            ("v0.cos_theta_xyz_cut", self.cos_theta_xyz_cut),
            ("v0.kshort_mass_cut", self.kshort_mass_cut),
            ("v0.lambda_mass_cut", self.lambda_mass_cut),
        ];
        for (key, value) in thresholds {
            if !value.is_finite() {
                return Err(SxqError::config(
                    "threshold-nonfinite",
                    key,
                    format!("threshold must be finite, got {value}"),
                ));
            }
        }
        let non_negative = [
            ("v0.tk_dca_cut", self.tk_dca_cut),
            ("v0.kshort_mass_cut", self.kshort_mass_cut),
            ("v0.lambda_mass_cut", self.lambda_mass_cut),
        ];
        for (key, value) in non_negative {
            if value < 0.0 {
                return Err(SxqError::config(
                    "threshold-negative",
                    key,
                    format!("threshold must not be negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: V0FitterConfig =
            serde_yaml::from_str("tk_dca_cut: 0.5\nvertex_fitter: adaptive\n").expect("yaml");
        assert_eq!(cfg.tk_dca_cut, 0.5);
        assert_eq!(cfg.vertex_fitter, FitterKind::Adaptive);
        assert_eq!(cfg.kshort_mass_cut, 0.07);
        assert!(cfg.use_refitted_tracks);
        assert!(!cfg.effective_refitted_tracks());
    }

    #[test]
    fn negative_dca_is_rejected() {
        let cfg = V0FitterConfig {
            tk_dca_cut: -1.0,
            ..V0FitterConfig::default()
        };
        let err = cfg.validate().expect_err("negative dca");
        assert_eq!(err.info().code, "threshold-negative");
        assert_eq!(err.info().context.get("key").map(String::as_str), Some("v0.tk_dca_cut"));
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let cfg = V0FitterConfig {
            cos_theta_xy_cut: f64::NAN,
            ..V0FitterConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(V0FitterConfig::default().validate().is_ok());
    }
}
