//! Stateless geometry and kinematics helpers.
//!
//! Lengths are in centimetres and momenta in GeV throughout. Divisions by a
//! vanishing decay length or transverse momentum are not guarded here and
//! produce non-finite values; callers that can hit those cases check first.

use std::f64::consts::{PI, TAU};

use nalgebra::{Matrix3, Vector3};

/// Three-vector used for positions and momenta.
pub type Vec3 = Vector3<f64>;
/// Symmetric 3x3 covariance matrix.
pub type Cov3 = Matrix3<f64>;

/// Transverse distance between `origin` and `point`.
pub fn transverse_decay_length(origin: &Vec3, point: &Vec3) -> f64 {
    let dx = point.x - origin.x;
    let dy = point.y - origin.y;
    (dx * dx + dy * dy).sqrt()
}

/// Full 3D distance between two points.
pub fn three_d_distance(a: &Vec3, b: &Vec3) -> f64 {
    (a - b).norm()
}

/// Signed transverse distance of `reference` from the line through `vertex`
/// along `momentum`.
///
/// The sign is the sign of the z component of `d × (reference − vertex)`,
/// with `d` the transverse direction of the line.
pub fn signed_transverse_impact_parameter(vertex: &Vec3, momentum: &Vec3, reference: &Vec3) -> f64 {
    let pt = momentum.x.hypot(momentum.y);
    let ux = momentum.x / pt;
    let uy = momentum.y / pt;
    let rx = reference.x - vertex.x;
    let ry = reference.y - vertex.y;
    ux * ry - uy * rx
}

/// Longitudinal offset between the line's point of closest transverse
/// approach to `reference` and `reference` itself.
pub fn longitudinal_impact_parameter(vertex: &Vec3, momentum: &Vec3, reference: &Vec3) -> f64 {
    let pt2 = momentum.x * momentum.x + momentum.y * momentum.y;
    let t = ((reference.x - vertex.x) * momentum.x + (reference.y - vertex.y) * momentum.y) / pt2;
    vertex.z + t * momentum.z - reference.z
}

/// Wraps an azimuthal difference into [-π, π]. Non-finite input gives NaN.
pub fn wrap_phi(dphi: f64) -> f64 {
    if !dphi.is_finite() {
        return f64::NAN;
    }
    if (-PI..=PI).contains(&dphi) {
        return dphi;
    }
    (dphi + PI).rem_euclid(TAU) - PI
}

/// Separation in (φ, η) space.
pub fn angular_separation(phi1: f64, eta1: f64, phi2: f64, eta2: f64) -> f64 {
    let dphi = wrap_phi(phi1 - phi2);
    let deta = eta1 - eta2;
    (dphi * dphi + deta * deta).sqrt()
}

/// One-sigma uncertainty on the transverse decay length using only the
/// diagonal vertex and reference-point variances.
#[allow(clippy::too_many_arguments)]
pub fn decay_length_uncertainty(
    vx: f64,
    vy: f64,
    cov_xx: f64,
    cov_yy: f64,
    ref_x: f64,
    ref_y: f64,
    ref_var_x: f64,
    ref_var_y: f64,
) -> f64 {
    let dx = vx - ref_x;
    let dy = vy - ref_y;
    let lxy = (dx * dx + dy * dy).sqrt();
    (dx * dx * (cov_xx + ref_var_x) + dy * dy * (cov_yy + ref_var_y)).sqrt() / lxy
}

/// Transverse momentum.
pub fn transverse_momentum(p: &Vec3) -> f64 {
    p.x.hypot(p.y)
}

/// Azimuthal angle of a momentum.
pub fn azimuth(p: &Vec3) -> f64 {
    p.y.atan2(p.x)
}

/// Polar angle of a momentum, measured from the +z axis.
pub fn polar_angle(p: &Vec3) -> f64 {
    transverse_momentum(p).atan2(p.z)
}

/// Pseudorapidity of a momentum. Purely longitudinal momenta map to ±1e10.
pub fn pseudorapidity(p: &Vec3) -> f64 {
    let pt = transverse_momentum(p);
    if pt == 0.0 {
        return if p.z >= 0.0 { 1e10 } else { -1e10 };
    }
    (p.z / pt).asinh()
}

/// Energy for a momentum under a mass hypothesis.
pub fn energy(p: &Vec3, mass: f64) -> f64 {
    (p.norm_squared() + mass * mass).sqrt()
}

/// Invariant mass of a system given total energy and total momentum.
///
/// Space-like combinations (rounding only) return the signed root of the
/// negative square, mirroring the usual Lorentz-vector convention.
pub fn invariant_mass(total_energy: f64, total_momentum: &Vec3) -> f64 {
    let m2 = total_energy * total_energy - total_momentum.norm_squared();
    if m2 >= 0.0 {
        m2.sqrt()
    } else {
        -(-m2).sqrt()
    }
}

/// Invariant mass of a set of momenta each assigned a mass hypothesis.
pub fn system_mass(daughters: &[(Vec3, f64)]) -> f64 {
    let total_e: f64 = daughters.iter().map(|(p, m)| energy(p, *m)).sum();
    let total_p: Vec3 = daughters.iter().fold(Vec3::zeros(), |acc, (p, _)| acc + p);
    invariant_mass(total_e, &total_p)
}
