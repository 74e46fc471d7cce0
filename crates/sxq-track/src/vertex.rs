//! Geometric vertex fitters for small track multiplicities.
//!
//! Each track is linearized at its closest transverse approach to the current
//! vertex estimate as a straight line with two perpendicular measurement
//! directions. The vertex is the weighted least-squares point of those lines,
//! iterated until the linearization point stops moving.

use serde::{Deserialize, Serialize};
use sxq_core::{Cov3, Vec3};
use tracing::trace;

use crate::approach::closest_approach_in_rphi;
use crate::transient::TransientTrack;

const MAX_ITERATIONS: usize = 20;
const CONVERGENCE_CM: f64 = 1e-5;
const MAX_VERTEX_RADIUS_CM: f64 = 1e4;

/// Track state re-evaluated at the fitted vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefittedTrack {
    /// Charge of the track.
    pub charge: i32,
    /// Position, which is the fitted vertex.
    pub position: Vec3,
    /// Momentum at the vertex.
    pub momentum: Vec3,
}

/// Output of a converged vertex fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedVertex {
    /// Fitted position.
    pub position: Vec3,
    /// Position covariance.
    pub covariance: Cov3,
    /// Total chi-square.
    pub chi2: f64,
    /// Effective degrees of freedom.
    pub ndof: f64,
    /// Per-track weights used in the final iteration.
    pub track_weights: Vec<f64>,
    /// Tracks constrained to the vertex, empty when not requested.
    pub refitted_tracks: Vec<RefittedTrack>,
}

impl FittedVertex {
    /// Chi-square per degree of freedom.
    pub fn normalized_chi2(&self) -> f64 {
        if self.ndof > 0.0 {
            self.chi2 / self.ndof
        } else {
            f64::INFINITY
        }
    }

    /// Whether refitted track states are available.
    pub fn has_refitted_tracks(&self) -> bool {
        !self.refitted_tracks.is_empty()
    }
}

/// Vertex fitting service.
pub trait VertexFitter: Send + Sync {
    /// Fits a common vertex. `None` signals a fit that did not converge.
    fn vertex(&self, tracks: &[TransientTrack<'_>]) -> Option<FittedVertex>;
}

/// Selectable fitter algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitterKind {
    /// Least-squares Kalman-style fit.
    #[default]
    Kalman,
    /// Deterministic-annealing adaptive fit that down-weights outliers.
    Adaptive,
}

struct Linearized {
    point: Vec3,
    weight: Cov3,
}

fn linearize(track: &TransientTrack<'_>, at: &Vec3) -> Option<Linearized> {
    let state = track.state_closest_to(at)?;
    let u = state.momentum.try_normalize(0.0)?;
    let e1 = Vec3::new(-u.y, u.x, 0.0).try_normalize(0.0)?;
    let e2 = u.cross(&e1);
    let s1 = track.sigma_transverse();
    let s2 = track.sigma_longitudinal();
    if !(s1 > 0.0) || !(s2 > 0.0) {
        return None;
    }
    let weight = e1 * e1.transpose() / (s1 * s1) + e2 * e2.transpose() / (s2 * s2);
    Some(Linearized {
        point: state.position,
        weight,
    })
}

fn chi2_of(lin: &Linearized, vertex: &Vec3) -> f64 {
    let r = vertex - lin.point;
    (r.transpose() * lin.weight * r)[(0, 0)]
}

struct Step {
    position: Vec3,
    covariance: Cov3,
    linearized: Vec<Linearized>,
}

fn weighted_step(tracks: &[TransientTrack<'_>], at: &Vec3, weights: &[f64]) -> Option<Step> {
    let linearized = tracks
        .iter()
        .map(|track| linearize(track, at))
        .collect::<Option<Vec<_>>>()?;
    let mut info = Cov3::zeros();
    let mut rhs = Vec3::zeros();
    for (lin, w) in linearized.iter().zip(weights) {
        info += lin.weight * *w;
        rhs += lin.weight * lin.point * *w;
    }
    let covariance = info.try_inverse()?;
    let position = covariance * rhs;
    if !position.iter().all(|c| c.is_finite()) || position.norm() > MAX_VERTEX_RADIUS_CM {
        return None;
    }
    Some(Step {
        position,
        covariance,
        linearized,
    })
}

fn seed(tracks: &[TransientTrack<'_>]) -> Option<Vec3> {
    if let [a, b] = tracks {
        if let (Some(ha), Some(hb)) = (a.helix(), b.helix()) {
            if let Some(approach) = closest_approach_in_rphi(ha, hb) {
                return Some(approach.crossing_point());
            }
        }
    }
    if tracks.is_empty() {
        return None;
    }
    let sum = tracks
        .iter()
        .fold(Vec3::zeros(), |acc, t| acc + t.track().reference_point);
    Some(sum / tracks.len() as f64)
}

/// Re-evaluates each track's own helix at the vertex. The helix parameters
/// are not constrained to the vertex, so refitted momenta equal the
/// unrefitted ones there and only the charge bookkeeping differs.
fn refit(tracks: &[TransientTrack<'_>], vertex: &Vec3) -> Option<Vec<RefittedTrack>> {
    tracks
        .iter()
        .map(|track| {
            track.state_closest_to(vertex).map(|state| RefittedTrack {
                charge: track.charge(),
                position: *vertex,
                momentum: state.momentum,
            })
        })
        .collect()
}

/// Least-squares vertex fit with equal track weights.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KalmanVertexFitter {
    /// Whether to attach track states constrained to the vertex.
    pub use_refitted_tracks: bool,
}

impl KalmanVertexFitter {
    /// Creates a fitter.
    pub fn new(use_refitted_tracks: bool) -> Self {
        Self {
            use_refitted_tracks,
        }
    }
}

impl VertexFitter for KalmanVertexFitter {
    fn vertex(&self, tracks: &[TransientTrack<'_>]) -> Option<FittedVertex> {
        if tracks.len() < 2 {
            return None;
        }
        let weights = vec![1.0; tracks.len()];
        let mut at = seed(tracks)?;
        for iteration in 0..MAX_ITERATIONS {
            let step = weighted_step(tracks, &at, &weights)?;
            let moved = (step.position - at).norm();
            at = step.position;
            if moved < CONVERGENCE_CM {
                trace!(iteration, "kalman vertex fit converged");
                let chi2 = step.linearized.iter().map(|lin| chi2_of(lin, &at)).sum();
                let refitted_tracks = if self.use_refitted_tracks {
                    refit(tracks, &at)?
                } else {
                    Vec::new()
                };
                return Some(FittedVertex {
                    position: at,
                    covariance: step.covariance,
                    chi2,
                    ndof: 2.0 * tracks.len() as f64 - 3.0,
                    track_weights: weights,
                    refitted_tracks,
                });
            }
        }
        None
    }
}

/// Adaptive fit with deterministic annealing of the track weights.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveVertexFitter {
    /// Chi-square at which a track weight reaches one half at unit temperature.
    pub chi2_cut: f64,
    /// Annealing temperatures, ending at 1.
    pub temperatures: Vec<f64>,
}

impl Default for AdaptiveVertexFitter {
    fn default() -> Self {
        Self {
            chi2_cut: 9.0,
            temperatures: vec![256.0, 64.0, 16.0, 4.0, 1.0],
        }
    }
}

impl AdaptiveVertexFitter {
    fn weight(&self, chi2: f64, temperature: f64) -> f64 {
        let inlier = (-chi2 / (2.0 * temperature)).exp();
        let cut = (-self.chi2_cut / (2.0 * temperature)).exp();
        inlier / (inlier + cut)
    }
}

impl VertexFitter for AdaptiveVertexFitter {
    fn vertex(&self, tracks: &[TransientTrack<'_>]) -> Option<FittedVertex> {
        if tracks.len() < 2 {
            return None;
        }
        let mut at = seed(tracks)?;
        let mut weights = vec![1.0; tracks.len()];
        let mut last: Option<Step> = None;
        let schedule = self
            .temperatures
            .iter()
            .copied()
            .chain(std::iter::repeat(1.0).take(MAX_ITERATIONS));
        let mut settled = false;
        for temperature in schedule {
            let step = weighted_step(tracks, &at, &weights)?;
            let moved = (step.position - at).norm();
            at = step.position;
            weights = step
                .linearized
                .iter()
                .map(|lin| self.weight(chi2_of(lin, &at), temperature))
                .collect();
            last = Some(step);
            if temperature <= 1.0 && moved < CONVERGENCE_CM {
                settled = true;
                break;
            }
        }
        let step = last.filter(|_| settled)?;
        let chi2 = step
            .linearized
            .iter()
            .zip(&weights)
            .map(|(lin, w)| w * chi2_of(lin, &at))
            .sum();
        let ndof = 2.0 * weights.iter().sum::<f64>() - 3.0;
        if !(ndof > 0.0) {
            return None;
        }
        Some(FittedVertex {
            position: at,
            covariance: step.covariance,
            chi2,
            ndof,
            track_weights: weights,
            refitted_tracks: Vec::new(),
        })
    }
}

/// Builds the configured fitter. The adaptive fitter never produces
/// refitted tracks.
pub fn build_fitter(kind: FitterKind, use_refitted_tracks: bool) -> Box<dyn VertexFitter> {
    match kind {
        FitterKind::Kalman => Box::new(KalmanVertexFitter::new(use_refitted_tracks)),
        FitterKind::Adaptive => Box::new(AdaptiveVertexFitter::default()),
    }
}
