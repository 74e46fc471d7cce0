//! Magnetic field models used to build trajectory states.

use serde::{Deserialize, Serialize};
use sxq_core::Vec3;

/// Conversion between transverse momentum (GeV), field (T) and curvature
/// radius (cm) for a unit charge: `R = pt / (K * B)`.
pub const CURVATURE_CONSTANT: f64 = 0.002_997_924_58;

/// Field provider queried at a position.
pub trait MagneticField: Send + Sync {
    /// Longitudinal field component in tesla at `position`.
    fn bz_at(&self, position: &Vec3) -> f64;
}

/// Solenoid approximation with a constant longitudinal field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformField {
    /// Field strength along +z in tesla.
    #[serde(default = "default_bz")]
    pub bz_tesla: f64,
}

fn default_bz() -> f64 {
    3.8
}

impl UniformField {
    /// Creates a uniform field.
    pub fn new(bz_tesla: f64) -> Self {
        Self { bz_tesla }
    }

    /// Field-free configuration in which every trajectory is a straight line.
    pub fn zero() -> Self {
        Self { bz_tesla: 0.0 }
    }
}

impl Default for UniformField {
    fn default() -> Self {
        Self {
            bz_tesla: default_bz(),
        }
    }
}

impl MagneticField for UniformField {
    fn bz_at(&self, _position: &Vec3) -> f64 {
        self.bz_tesla
    }
}
