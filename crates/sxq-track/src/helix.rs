//! Helical trajectory states in a longitudinal field.
//!
//! A state is parameterized by the transverse path length `s` measured from
//! its defining point:
//!
//! ```text
//! phi(s) = phi0 + omega * s
//! x(s)   = x0 + (sin phi(s) - sin phi0) / omega
//! y(s)   = y0 - (cos phi(s) - cos phi0) / omega
//! z(s)   = z0 + s * pz / pt
//! ```
//!
//! with `omega = -q * K * Bz / pt`. A vanishing `omega` degenerates to a
//! straight line.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use sxq_core::kinematics::wrap_phi;
use sxq_core::Vec3;

use crate::field::{MagneticField, CURVATURE_CONSTANT};

/// Curvatures below this magnitude (1/cm) are treated as straight lines.
const STRAIGHT_LINE_OMEGA: f64 = 1e-12;

/// Position, momentum and charge at a point, without uncertainties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeTrajectoryState {
    /// Position of the state.
    pub position: Vec3,
    /// Momentum at the position.
    pub momentum: Vec3,
    /// Charge in units of e.
    pub charge: i32,
}

/// Trajectory state at the point of closest transverse approach to a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestApproachState {
    /// Position on the trajectory.
    pub position: Vec3,
    /// Momentum at that position.
    pub momentum: Vec3,
    /// Reference point the approach was computed for.
    pub reference: Vec3,
    /// Signed transverse path length from the defining point.
    pub path_length: f64,
}

impl ClosestApproachState {
    /// Transverse impact parameter in perigee convention.
    pub fn dxy(&self) -> f64 {
        let v = self.position - self.reference;
        let phi = self.momentum.y.atan2(self.momentum.x);
        -v.x * phi.sin() + v.y * phi.cos()
    }

    /// Longitudinal impact parameter in perigee convention.
    pub fn dz(&self) -> f64 {
        let v = self.position - self.reference;
        let p = &self.momentum;
        let pt2 = p.x * p.x + p.y * p.y;
        v.z - (v.x * p.x + v.y * p.y) * p.z / pt2
    }
}

/// Helix through a free trajectory state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Helix {
    origin: Vec3,
    phi0: f64,
    pt: f64,
    pz: f64,
    omega: f64,
    charge: i32,
}

impl Helix {
    /// Builds the helix for `state` in `field`. Returns `None` for states
    /// with no transverse momentum or non-finite components.
    pub fn new(state: &FreeTrajectoryState, field: &dyn MagneticField) -> Option<Self> {
        let p = &state.momentum;
        let pt = p.x.hypot(p.y);
        if !(pt > 0.0) || !pt.is_finite() || !p.z.is_finite() {
            return None;
        }
        if !state.position.iter().all(|c| c.is_finite()) {
            return None;
        }
        let bz = field.bz_at(&state.position);
        let omega = -(state.charge as f64) * CURVATURE_CONSTANT * bz / pt;
        Some(Self {
            origin: state.position,
            phi0: p.y.atan2(p.x),
            pt,
            pz: p.z,
            omega: if omega.abs() < STRAIGHT_LINE_OMEGA { 0.0 } else { omega },
            charge: state.charge,
        })
    }

    /// Charge carried by the trajectory.
    pub fn charge(&self) -> i32 {
        self.charge
    }

    /// Signed curvature in 1/cm.
    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Whether the trajectory is a straight line.
    pub fn is_straight(&self) -> bool {
        self.omega == 0.0
    }

    /// Centre and radius of the transverse circle, if curved.
    pub fn circle(&self) -> Option<(Vec3, f64)> {
        if self.is_straight() {
            return None;
        }
        let cx = self.origin.x - self.phi0.sin() / self.omega;
        let cy = self.origin.y + self.phi0.cos() / self.omega;
        Some((Vec3::new(cx, cy, 0.0), 1.0 / self.omega.abs()))
    }

    /// Position after a transverse path length `s`.
    pub fn position_at(&self, s: f64) -> Vec3 {
        let z = self.origin.z + s * self.pz / self.pt;
        if self.is_straight() {
            return Vec3::new(
                self.origin.x + s * self.phi0.cos(),
                self.origin.y + s * self.phi0.sin(),
                z,
            );
        }
        let phi = self.phi0 + self.omega * s;
        Vec3::new(
            self.origin.x + (phi.sin() - self.phi0.sin()) / self.omega,
            self.origin.y - (phi.cos() - self.phi0.cos()) / self.omega,
            z,
        )
    }

    /// Momentum after a transverse path length `s`.
    pub fn momentum_at(&self, s: f64) -> Vec3 {
        let phi = self.phi0 + self.omega * s;
        Vec3::new(self.pt * phi.cos(), self.pt * phi.sin(), self.pz)
    }

    /// Free state after a transverse path length `s`.
    pub fn state_at(&self, s: f64) -> FreeTrajectoryState {
        FreeTrajectoryState {
            position: self.position_at(s),
            momentum: self.momentum_at(s),
            charge: self.charge,
        }
    }

    /// Transverse path length to the point closest to `point` in the xy plane.
    ///
    /// On a circle the shorter of the two arcs towards that point is taken.
    /// Fails when `point` sits on the circle centre.
    pub fn path_to_closest(&self, point: &Vec3) -> Option<f64> {
        if self.is_straight() {
            let s = (point.x - self.origin.x) * self.phi0.cos()
                + (point.y - self.origin.y) * self.phi0.sin();
            return Some(s);
        }
        let (centre, _) = self.circle()?;
        let dx = point.x - centre.x;
        let dy = point.y - centre.y;
        if dx.hypot(dy) == 0.0 {
            return None;
        }
        // On the circle (x - cx, y - cy) = (sin phi, -cos phi) / omega.
        let phi = if self.omega > 0.0 {
            dx.atan2(-dy)
        } else {
            (-dx).atan2(dy)
        };
        let dphi = wrap_phi(phi - self.phi0);
        let s = dphi / self.omega;
        if s.is_finite() && (dphi.abs() <= PI) {
            Some(s)
        } else {
            None
        }
    }

    /// Trajectory state closest to `point` in the transverse plane.
    pub fn closest_to(&self, point: &Vec3) -> Option<ClosestApproachState> {
        let s = self.path_to_closest(point)?;
        let position = self.position_at(s);
        let momentum = self.momentum_at(s);
        if !position.iter().chain(momentum.iter()).all(|c| c.is_finite()) {
            return None;
        }
        Some(ClosestApproachState {
            position,
            momentum,
            reference: *point,
            path_length: s,
        })
    }
}
