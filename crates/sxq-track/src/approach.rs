//! Closest approach of two trajectories, solved in the transverse plane.
//!
//! The transverse projections are intersected (circles or lines); the
//! longitudinal coordinate only selects between the two intersection
//! solutions. When the circles do not touch, the points of closest transverse
//! approach on the line of centres are used.

use serde::{Deserialize, Serialize};
use sxq_core::Vec3;

use crate::helix::Helix;

/// Result of a successful closest-approach computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approach {
    /// Point on the first trajectory.
    pub point_a: Vec3,
    /// Point on the second trajectory.
    pub point_b: Vec3,
}

impl Approach {
    /// Midpoint between the two trajectory points.
    pub fn crossing_point(&self) -> Vec3 {
        (self.point_a + self.point_b) * 0.5
    }

    /// Distance between the two trajectory points.
    pub fn distance(&self) -> f64 {
        (self.point_a - self.point_b).norm()
    }
}

/// Computes the closest approach of two trajectories.
///
/// Returns `None` for parallel lines, concentric circles, a mix of curved and
/// straight trajectories, or any non-finite intermediate.
pub fn closest_approach_in_rphi(a: &Helix, b: &Helix) -> Option<Approach> {
    let candidates = match (a.circle(), b.circle()) {
        (Some(ca), Some(cb)) => circle_candidates(ca, cb)?,
        (None, None) => vec![line_intersection(a, b)?],
        _ => return None,
    };

    let mut best: Option<Approach> = None;
    for (xy_a, xy_b) in candidates {
        let Some(state_a) = a.closest_to(&xy_a) else {
            continue;
        };
        let Some(state_b) = b.closest_to(&xy_b) else {
            continue;
        };
        let approach = Approach {
            point_a: state_a.position,
            point_b: state_b.position,
        };
        let dz = (approach.point_a.z - approach.point_b.z).abs();
        let better = match &best {
            Some(current) => dz < (current.point_a.z - current.point_b.z).abs(),
            None => true,
        };
        if better {
            best = Some(approach);
        }
    }
    best.filter(|approach| approach.distance().is_finite())
}

type Candidate = (Vec3, Vec3);

fn circle_candidates((c1, r1): (Vec3, f64), (c2, r2): (Vec3, f64)) -> Option<Vec<Candidate>> {
    let delta = c2 - c1;
    let d = delta.x.hypot(delta.y);
    if !(d > 0.0) || !d.is_finite() {
        return None;
    }
    let u = delta / d;

    if d > r1 + r2 {
        // Disjoint circles: facing points on the line of centres.
        return Some(vec![(c1 + u * r1, c2 - u * r2)]);
    }
    if d < (r1 - r2).abs() {
        // One circle inside the other: points on the same side.
        let sign = if r1 > r2 { 1.0 } else { -1.0 };
        return Some(vec![(c1 + u * (sign * r1), c2 + u * (sign * r2))]);
    }

    let along = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h = (r1 * r1 - along * along).max(0.0).sqrt();
    let base = c1 + u * along;
    let perp = Vec3::new(-u.y, u.x, 0.0);
    let first = base + perp * h;
    let second = base - perp * h;
    Some(vec![(first, first), (second, second)])
}

fn line_intersection(a: &Helix, b: &Helix) -> Option<Candidate> {
    let pa = a.position_at(0.0);
    let pb = b.position_at(0.0);
    let ua = a.momentum_at(0.0);
    let ub = b.momentum_at(0.0);
    let cross = ua.x * ub.y - ua.y * ub.x;
    let scale = ua.x.hypot(ua.y) * ub.x.hypot(ub.y);
    if cross.abs() <= 1e-12 * scale {
        return None;
    }
    let w = pb - pa;
    let t = (w.x * ub.y - w.y * ub.x) / cross;
    let point = Vec3::new(pa.x + t * ua.x, pa.y + t * ua.y, 0.0);
    Some((point, point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::UniformField;
    use crate::helix::FreeTrajectoryState;

    fn helix(position: Vec3, momentum: Vec3, charge: i32, bz: f64) -> Helix {
        let state = FreeTrajectoryState {
            position,
            momentum,
            charge,
        };
        Helix::new(&state, &UniformField::new(bz)).expect("helix")
    }

    #[test]
    fn crossing_lines_meet_at_intersection() {
        let a = helix(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 0.0), 1, 0.0);
        let b = helix(Vec3::new(2.0, 0.0, 1.5), Vec3::new(-1.0, 1.0, 0.0), -1, 0.0);
        let approach = closest_approach_in_rphi(&a, &b).expect("approach");
        let x = approach.crossing_point();
        assert!((x.x - 1.0).abs() < 1e-12 && (x.y - 1.0).abs() < 1e-12);
        assert!((approach.distance() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn parallel_lines_fail() {
        let a = helix(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 1, 0.0);
        let b = helix(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 0.0, 0.0), -1, 0.0);
        assert!(closest_approach_in_rphi(&a, &b).is_none());
    }

    #[test]
    fn tracks_from_common_vertex_close_there() {
        let vertex = Vec3::new(3.0, 2.0, -1.0);
        let a = helix(vertex, Vec3::new(0.8, 0.3, 0.2), 1, 3.8);
        let b = helix(vertex, Vec3::new(0.5, -0.4, 0.1), -1, 3.8);
        let approach = closest_approach_in_rphi(&a, &b).expect("approach");
        assert!(approach.distance() < 1e-6);
        assert!((approach.crossing_point() - vertex).norm() < 1e-6);
    }
}
