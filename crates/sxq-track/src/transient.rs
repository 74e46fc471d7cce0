use sxq_core::{ReconstructedTrack, Vec3};

use crate::field::MagneticField;
use crate::helix::{ClosestApproachState, FreeTrajectoryState, Helix};

/// A reconstructed track bound to a field model, ready for extrapolation.
#[derive(Debug, Clone)]
pub struct TransientTrack<'a> {
    track: &'a ReconstructedTrack,
    helix: Option<Helix>,
}

impl<'a> TransientTrack<'a> {
    /// Binds `track` to `field`.
    pub fn new(track: &'a ReconstructedTrack, field: &dyn MagneticField) -> Self {
        let state = FreeTrajectoryState {
            position: track.reference_point,
            momentum: track.momentum,
            charge: track.charge,
        };
        Self {
            track,
            helix: Helix::new(&state, field),
        }
    }

    /// The underlying reconstructed track.
    pub fn track(&self) -> &'a ReconstructedTrack {
        self.track
    }

    /// Trajectory of the track, `None` when the state cannot be propagated.
    pub fn helix(&self) -> Option<&Helix> {
        self.helix.as_ref()
    }

    /// Charge of the track.
    pub fn charge(&self) -> i32 {
        self.track.charge
    }

    /// State at the closest approach to `point`.
    pub fn state_closest_to(&self, point: &Vec3) -> Option<ClosestApproachState> {
        self.helix.as_ref()?.closest_to(point)
    }

    /// Transverse measurement uncertainty in cm.
    pub fn sigma_transverse(&self) -> f64 {
        self.track.dxy_error
    }

    /// Uncertainty perpendicular to the track in the plane containing z.
    pub fn sigma_longitudinal(&self) -> f64 {
        let p = &self.track.momentum;
        let sin_theta = p.x.hypot(p.y) / p.norm();
        self.track.dz_error * sin_theta
    }
}
