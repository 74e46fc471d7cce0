//! Flat per-particle records written for every analyzed anti-S.

use serde::{Deserialize, Serialize};
use sxq_core::kinematics::{
    decay_length_uncertainty, invariant_mass, longitudinal_impact_parameter,
    signed_transverse_impact_parameter, transverse_decay_length,
};
use sxq_core::particle::NEUTRON_MASS;
use sxq_core::{BeamSpot, CompositeVertexCandidate, ParticleRole, ReconstructedTrack, TruthParticle, Vec3};
use sxq_track::{FreeTrajectoryState, Helix, MagneticField};
use sxq_v0::{DiagnosticCode, TrackSelection};

use crate::matcher::MatchResult;

/// Truth-level kinematics and geometry of one chain member.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthSummary {
    /// PDG code.
    pub pdg_id: i32,
    /// Charge.
    pub charge: i32,
    /// Mass.
    pub mass: f64,
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Longitudinal momentum.
    pub pz: f64,
    /// Simulated tracker hits.
    pub tracker_hits: u32,
    /// Transverse distance of the production vertex from the origin.
    pub lxy_origin: f64,
    /// Transverse distance of the production vertex from the beamspot.
    pub lxy_beamspot: f64,
    /// Production vertex z.
    pub vz: f64,
    /// Production vertex z relative to the beamspot.
    pub vz_beamspot: f64,
    /// Signed straight-line transverse impact parameter to the beamspot.
    pub dxy_beamspot: f64,
    /// Straight-line longitudinal impact parameter to the beamspot.
    pub dz_beamspot: f64,
    /// Straight-line longitudinal impact parameter to the anti-S creation vertex.
    pub dz_anti_s_creation: f64,
    /// Transverse impact parameter of the helix through the truth state.
    pub dxy_helix: Option<f64>,
    /// Longitudinal impact parameter of the helix through the truth state.
    pub dz_helix: Option<f64>,
}

impl TruthSummary {
    /// Summarizes `particle` relative to `beamspot` and the anti-S creation vertex.
    pub fn new(
        particle: &TruthParticle,
        beamspot: &BeamSpot,
        anti_s_creation: &Vec3,
        field: &dyn MagneticField,
    ) -> Self {
        let vertex = particle.vertex();
        let bs = &beamspot.position;
        let state = FreeTrajectoryState {
            position: *vertex,
            momentum: particle.momentum,
            charge: particle.charge,
        };
        let closest = Helix::new(&state, field).and_then(|helix| helix.closest_to(bs));
        Self {
            pdg_id: particle.pdg_id,
            charge: particle.charge,
            mass: particle.mass,
            pt: particle.pt(),
            eta: particle.eta(),
            phi: particle.phi(),
            pz: particle.momentum.z,
            tracker_hits: particle.tracker_hits,
            lxy_origin: transverse_decay_length(&Vec3::zeros(), vertex),
            lxy_beamspot: transverse_decay_length(bs, vertex),
            vz: vertex.z,
            vz_beamspot: vertex.z - bs.z,
            dxy_beamspot: signed_transverse_impact_parameter(vertex, &particle.momentum, bs),
            dz_beamspot: longitudinal_impact_parameter(vertex, &particle.momentum, bs),
            dz_anti_s_creation: longitudinal_impact_parameter(vertex, &particle.momentum, anti_s_creation),
            dxy_helix: closest.as_ref().map(|c| c.dxy()),
            dz_helix: closest.as_ref().map(|c| c.dz()),
        }
    }
}

/// Kinematics and geometry of the matched reconstructed object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoSummary {
    /// Candidate mass. Tracks carry none.
    pub mass: Option<f64>,
    /// Charge.
    pub charge: i32,
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Longitudinal momentum.
    pub pz: f64,
    /// Transverse distance of the vertex (or reference point) from the origin.
    pub lxy_origin: f64,
    /// Transverse distance of the vertex (or reference point) from the beamspot.
    pub lxy_beamspot: f64,
    /// Vertex z.
    pub vz: f64,
    /// Vertex z relative to the beamspot.
    pub vz_beamspot: f64,
    /// Signed straight-line transverse impact parameter to the beamspot.
    pub dxy_beamspot: f64,
    /// Straight-line longitudinal impact parameter to the beamspot.
    pub dz_beamspot: f64,
    /// Track transverse impact parameter to the beamspot.
    pub track_dxy_beamspot: Option<f64>,
    /// Track longitudinal impact parameter to the beamspot.
    pub track_dz_beamspot: Option<f64>,
}

impl RecoSummary {
    fn at(position: &Vec3, momentum: &Vec3, charge: i32, beamspot: &BeamSpot) -> Self {
        let bs = &beamspot.position;
        Self {
            mass: None,
            charge,
            pt: sxq_core::kinematics::transverse_momentum(momentum),
            eta: sxq_core::kinematics::pseudorapidity(momentum),
            phi: sxq_core::kinematics::azimuth(momentum),
            pz: momentum.z,
            lxy_origin: transverse_decay_length(&Vec3::zeros(), position),
            lxy_beamspot: transverse_decay_length(bs, position),
            vz: position.z,
            vz_beamspot: position.z - bs.z,
            dxy_beamspot: signed_transverse_impact_parameter(position, momentum, bs),
            dz_beamspot: longitudinal_impact_parameter(position, momentum, bs),
            track_dxy_beamspot: None,
            track_dz_beamspot: None,
        }
    }

    /// Summary of a composite candidate.
    pub fn from_candidate(candidate: &CompositeVertexCandidate, beamspot: &BeamSpot) -> Self {
        Self {
            mass: Some(candidate.mass),
            ..Self::at(&candidate.vertex, &candidate.momentum, candidate.charge, beamspot)
        }
    }

    /// Summary of a track, taken at its reference point.
    pub fn from_track(track: &ReconstructedTrack, beamspot: &BeamSpot) -> Self {
        Self {
            track_dxy_beamspot: Some(track.dxy(&beamspot.position)),
            track_dz_beamspot: Some(track.dz(&beamspot.position)),
            ..Self::at(&track.reference_point, &track.momentum, track.charge, beamspot)
        }
    }
}

/// Diagnostic attached to a record entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecordDiagnostic {
    /// Cascade or pair pre-selection verdict of a V0.
    Pair(DiagnosticCode),
    /// Pre-selection outcome of a granddaughter track.
    Selection(TrackSelection),
}

impl RecordDiagnostic {
    /// Numeric code as written to flat outputs.
    pub fn code(&self) -> i32 {
        match self {
            RecordDiagnostic::Pair(code) => code.code(),
            RecordDiagnostic::Selection(sel) => i32::from(sel.code()),
        }
    }
}

/// One entry of an [`OutputRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    /// Role of the particle in the chain.
    pub role: ParticleRole,
    /// Index in the truth collection.
    pub truth_index: usize,
    /// Truth-level summary.
    pub truth: TruthSummary,
    /// Match of this particle alone against the reconstruction.
    ///
    /// For the anti-S entry `found` is the candidate-level verdict. Whether
    /// the whole chain was reconstructed is [`OutputRecord::reconstructed`].
    pub matching: MatchResult,
    /// Diagnostic code, where one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<RecordDiagnostic>,
    /// Summary of the matched reconstructed object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reco: Option<RecoSummary>,
}

impl ParticleRecord {
    /// Numeric diagnostic code, if any.
    pub fn code(&self) -> Option<i32> {
        self.diagnostic.as_ref().map(RecordDiagnostic::code)
    }
}

/// Quantities derived from the best anti-S candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntiSExtras {
    /// Candidate mass after removing a neutron at rest from the four-momentum.
    pub mass_minus_neutron: f64,
    /// Transverse decay-length uncertainty relative to the beamspot.
    pub lxy_error_beamspot: f64,
    /// Transverse decay-length uncertainty relative to the beam-pipe centre.
    pub lxy_error_beampipe: f64,
}

impl AntiSExtras {
    /// Computes the extras of `candidate`.
    pub fn new(candidate: &CompositeVertexCandidate, beamspot: &BeamSpot) -> Self {
        let v = &candidate.vertex;
        let cov = &candidate.vertex_covariance;
        let bs = &beamspot.position;
        let bs_var = beamspot.variance();
        Self {
            mass_minus_neutron: invariant_mass(candidate.energy() - NEUTRON_MASS, &candidate.momentum),
            lxy_error_beamspot: decay_length_uncertainty(
                v.x,
                v.y,
                cov[(0, 0)],
                cov[(1, 1)],
                bs.x,
                bs.y,
                bs_var.x,
                bs_var.y,
            ),
            lxy_error_beampipe: decay_length_uncertainty(v.x, v.y, cov[(0, 0)], cov[(1, 1)], 0.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Everything recorded for one truth anti-S with a complete chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Event number the record came from.
    pub event: u64,
    /// Truth index of the anti-S.
    pub anti_s_index: usize,
    /// Entries in [`ParticleRole::ALL`] order.
    pub entries: [ParticleRecord; 7],
    /// Extras of the best anti-S candidate, when one was eligible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_s_extras: Option<AntiSExtras>,
    /// Event weight from the anti-S polar angle.
    pub event_weight: f64,
    /// Pileup weight from the good-vertex count and anti-S z.
    pub pileup_weight: f64,
    /// Whether the whole anti-S was reconstructed.
    pub reconstructed: bool,
}

impl OutputRecord {
    /// Entry for `role`.
    pub fn entry(&self, role: ParticleRole) -> &ParticleRecord {
        &self.entries[role.index()]
    }

    /// Product of the event and pileup weights.
    pub fn weight(&self) -> f64 {
        self.event_weight * self.pileup_weight
    }
}
