//! Truth-to-reconstruction matching.
//!
//! Composite roles are matched geometrically against vertex candidates,
//! granddaughters through the hit association. Ties keep the first
//! candidate in collection order.

use serde::{Deserialize, Serialize};
use sxq_core::kinematics::{angular_separation, three_d_distance, transverse_decay_length};
use sxq_core::{BeamSpot, CompositeVertexCandidate, TruthParticle, Vec3};
use sxq_truth::SimToRecoCollection;

use crate::config::MatchingThresholds;

/// Reconstructed object chosen as the best match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum MatchedObject {
    /// Index in a composite candidate collection.
    Candidate(usize),
    /// Index in the track collection.
    Track(usize),
}

impl MatchedObject {
    /// Collection index of the object.
    pub fn index(self) -> usize {
        match self {
            MatchedObject::Candidate(idx) | MatchedObject::Track(idx) => idx,
        }
    }
}

/// Best match for one truth particle and the metrics behind the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MatchResult {
    /// Best reconstructed object, if any was eligible.
    pub best: Option<MatchedObject>,
    /// Angular separation used for the verdict.
    pub delta_r: Option<f64>,
    /// Vertex distance used for the verdict, cm.
    pub delta_l: Option<f64>,
    /// Whether the match passed its thresholds.
    pub found: bool,
}

impl MatchResult {
    /// Index of the matched candidate, for composite roles.
    pub fn candidate(&self) -> Option<usize> {
        match self.best {
            Some(MatchedObject::Candidate(idx)) => Some(idx),
            _ => None,
        }
    }

    /// Index of the matched track, for granddaughter roles.
    pub fn track(&self) -> Option<usize> {
        match self.best {
            Some(MatchedObject::Track(idx)) => Some(idx),
            _ => None,
        }
    }
}

fn separation(truth: &TruthParticle, candidate: &CompositeVertexCandidate) -> f64 {
    angular_separation(candidate.phi(), candidate.eta(), truth.phi(), truth.eta())
}

/// Matches the truth anti-S against anti-S candidates.
///
/// Only candidates with charge −1 whose vertex lies beyond
/// `min_lxy_anti_s` from the beamspot are eligible. The ΔR and vertex
/// distance minima are tracked independently; the best candidate is the
/// one closest to `interaction_point`.
pub fn match_anti_s(
    anti_s: &TruthParticle,
    interaction_point: &Vec3,
    candidates: &[CompositeVertexCandidate],
    beamspot: &BeamSpot,
    thresholds: &MatchingThresholds,
) -> MatchResult {
    let mut min_delta_r: Option<f64> = None;
    let mut closest: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        if candidate.charge != -1 {
            continue;
        }
        if !(transverse_decay_length(&beamspot.position, &candidate.vertex) > thresholds.min_lxy_anti_s) {
            continue;
        }
        let delta_r = separation(anti_s, candidate);
        if min_delta_r.map_or(true, |best| delta_r < best) {
            min_delta_r = Some(delta_r);
        }
        let delta_l = three_d_distance(interaction_point, &candidate.vertex);
        if closest.map_or(true, |(_, best)| delta_l < best) {
            closest = Some((idx, delta_l));
        }
    }
    let delta_l = closest.map(|(_, dl)| dl);
    let found = matches!(
        (min_delta_r, delta_l),
        (Some(dr), Some(dl)) if dr < thresholds.delta_r_anti_s && dl < thresholds.delta_l_anti_s
    );
    MatchResult {
        best: closest.map(|(idx, _)| MatchedObject::Candidate(idx)),
        delta_r: min_delta_r,
        delta_l,
        found,
    }
}

/// Matches a truth V0 against its candidate collection.
///
/// The best candidate minimizes ΔR. ΔL is the distance between
/// `decay_point` and that candidate's vertex.
pub fn match_v0(
    truth: &TruthParticle,
    decay_point: &Vec3,
    candidates: &[CompositeVertexCandidate],
    delta_r_cut: f64,
    delta_l_cut: f64,
) -> MatchResult {
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let delta_r = separation(truth, candidate);
        if best.map_or(true, |(_, dr)| delta_r < dr) {
            best = Some((idx, delta_r));
        }
    }
    let Some((idx, delta_r)) = best else {
        return MatchResult::default();
    };
    let delta_l = three_d_distance(decay_point, &candidates[idx].vertex);
    MatchResult {
        best: Some(MatchedObject::Candidate(idx)),
        delta_r: Some(delta_r),
        delta_l: Some(delta_l),
        found: delta_r < delta_r_cut && delta_l < delta_l_cut,
    }
}

/// Matches a truth granddaughter through the hit association.
///
/// The first associated track is the match. Associations pointing past the
/// end of the track collection count as unmatched.
pub fn match_track(truth_index: usize, association: &SimToRecoCollection, n_tracks: usize) -> MatchResult {
    match association.best(truth_index) {
        Some(m) if m.track < n_tracks => MatchResult {
            best: Some(MatchedObject::Track(m.track)),
            delta_r: None,
            delta_l: None,
            found: true,
        },
        _ => MatchResult::default(),
    }
}
