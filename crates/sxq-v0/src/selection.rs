//! Single-track pre-selection packed into a 5-bit code.

use serde::{Deserialize, Serialize};
use sxq_core::{BeamSpot, ReconstructedTrack};

use crate::config::V0FitterConfig;

/// Outcome of the five single-track cuts. A `true` flag means the cut failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TrackSelection {
    /// Normalized chi-square at or above the ceiling.
    pub chi2: bool,
    /// Fewer valid hits than the floor.
    pub hits: bool,
    /// Transverse momentum at or below the floor.
    pub pt: bool,
    /// Transverse impact-parameter significance at or below the floor.
    pub ip_xy: bool,
    /// Longitudinal impact-parameter significance at or below the floor.
    pub ip_z: bool,
}

impl TrackSelection {
    /// Packs the flags with the chi-square cut as the most significant bit.
    pub fn code(&self) -> u8 {
        [self.chi2, self.hits, self.pt, self.ip_xy, self.ip_z]
            .into_iter()
            .fold(0u8, |acc, failed| (acc << 1) | u8::from(failed))
    }

    /// Decodes a packed code. Values above 31 are not valid codes.
    pub fn from_code(code: u8) -> Option<Self> {
        if code > 0b1_1111 {
            return None;
        }
        let bit = |shift: u8| code & (1 << shift) != 0;
        Some(Self {
            chi2: bit(4),
            hits: bit(3),
            pt: bit(2),
            ip_xy: bit(1),
            ip_z: bit(0),
        })
    }

    /// Whether every cut passed.
    pub fn passed(&self) -> bool {
        self.code() == 0
    }
}

/// Evaluates the pre-selection of `track` relative to `beamspot`.
pub fn select_track(
    track: &ReconstructedTrack,
    beamspot: &BeamSpot,
    cfg: &V0FitterConfig,
) -> TrackSelection {
    let ip_xy = (track.dxy(&beamspot.position) / track.dxy_error).abs();
    let ip_z = (track.dz(&beamspot.position) / track.dz_error).abs();
    TrackSelection {
        chi2: track.normalized_chi2() >= cfg.tk_chi2_cut,
        hits: track.valid_hits < cfg.tk_nhits_cut,
        pt: track.pt() <= cfg.tk_pt_cut,
        ip_xy: ip_xy <= cfg.tk_ip_sig_xy_cut,
        ip_z: ip_z <= cfg.tk_ip_sig_z_cut,
    }
}
