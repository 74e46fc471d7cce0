//! Read-only event content handed to the analysis by the surrounding framework.

use serde::{Deserialize, Serialize};

use crate::kinematics::{self, Cov3, Vec3};
use crate::particle::Species;

/// Reference to a simulated vertex.
///
/// When the generator assigns identity tokens, two references coincide iff
/// their tokens match. Without tokens the positions must be bit-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRef {
    /// Vertex position.
    pub position: Vec3,
    /// Opaque identity token assigned by the truth generator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl VertexRef {
    /// Creates a reference without an identity token.
    pub fn at(position: Vec3) -> Self {
        Self { position, id: None }
    }

    /// Creates a reference carrying an identity token.
    pub fn with_id(position: Vec3, id: u64) -> Self {
        Self {
            position,
            id: Some(id),
        }
    }

    /// Whether both references denote the same simulated vertex.
    #[allow(clippy::float_cmp)]
    pub fn coincides(&self, other: &VertexRef) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.position.x == other.position.x
                    && self.position.y == other.position.y
                    && self.position.z == other.position.z
            }
        }
    }
}

/// Simulation-level particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthParticle {
    /// PDG-like type code.
    pub pdg_id: i32,
    /// Electric charge in units of e.
    pub charge: i32,
    /// Momentum at production.
    pub momentum: Vec3,
    /// Rest mass.
    pub mass: f64,
    /// Production vertex.
    pub production_vertex: VertexRef,
    /// Decay vertices in generator order. Empty for undecayed particles.
    #[serde(default)]
    pub decay_vertices: Vec<VertexRef>,
    /// Number of simulated tracker hits.
    #[serde(default)]
    pub tracker_hits: u32,
    /// Identifiers of the simulated hits, used by hit-sharing association.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sim_hits: Vec<u64>,
}

impl TruthParticle {
    /// Species classification of the PDG code.
    pub fn species(&self) -> Option<Species> {
        Species::from_pdg(self.pdg_id)
    }

    /// First decay vertex, if the particle decayed or interacted.
    pub fn first_decay_vertex(&self) -> Option<&VertexRef> {
        self.decay_vertices.first()
    }

    /// Production position.
    pub fn vertex(&self) -> &Vec3 {
        &self.production_vertex.position
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        kinematics::transverse_momentum(&self.momentum)
    }

    /// Pseudorapidity.
    pub fn eta(&self) -> f64 {
        kinematics::pseudorapidity(&self.momentum)
    }

    /// Azimuth.
    pub fn phi(&self) -> f64 {
        kinematics::azimuth(&self.momentum)
    }

    /// Polar angle.
    pub fn theta(&self) -> f64 {
        kinematics::polar_angle(&self.momentum)
    }

    /// Energy from momentum and mass.
    pub fn energy(&self) -> f64 {
        kinematics::energy(&self.momentum, self.mass)
    }
}

/// Reconstructed charged-particle track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedTrack {
    /// Charge in units of e.
    pub charge: i32,
    /// Momentum at the reference point.
    pub momentum: Vec3,
    /// Point of closest approach to the nominal beamline.
    pub reference_point: Vec3,
    /// Track fit chi-square.
    pub chi2: f64,
    /// Track fit degrees of freedom.
    pub ndof: f64,
    /// Number of valid hits on the track.
    pub valid_hits: u32,
    /// Uncertainty on the transverse impact parameter.
    pub dxy_error: f64,
    /// Uncertainty on the longitudinal impact parameter.
    pub dz_error: f64,
    /// Identifiers of the hits assigned to the track.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hit_ids: Vec<u64>,
}

impl ReconstructedTrack {
    /// Chi-square per degree of freedom. Zero dof gives infinity.
    pub fn normalized_chi2(&self) -> f64 {
        if self.ndof > 0.0 {
            self.chi2 / self.ndof
        } else {
            f64::INFINITY
        }
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        kinematics::transverse_momentum(&self.momentum)
    }

    /// Pseudorapidity.
    pub fn eta(&self) -> f64 {
        kinematics::pseudorapidity(&self.momentum)
    }

    /// Azimuth.
    pub fn phi(&self) -> f64 {
        kinematics::azimuth(&self.momentum)
    }

    /// Linearized transverse impact parameter with respect to `point`.
    pub fn dxy(&self, point: &Vec3) -> f64 {
        let v = self.reference_point - point;
        (-v.x * self.momentum.y + v.y * self.momentum.x) / self.pt()
    }

    /// Linearized longitudinal impact parameter with respect to `point`.
    pub fn dz(&self, point: &Vec3) -> f64 {
        let v = self.reference_point - point;
        let pt = self.pt();
        v.z - (v.x * self.momentum.x + v.y * self.momentum.y) / pt * (self.momentum.z / pt)
    }
}

/// Reconstructed composite (V0 or anti-S) vertex candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeVertexCandidate {
    /// Total momentum.
    pub momentum: Vec3,
    /// Candidate mass.
    pub mass: f64,
    /// Decay (or interaction) vertex position.
    pub vertex: Vec3,
    /// Vertex position covariance.
    pub vertex_covariance: Cov3,
    /// Total charge.
    pub charge: i32,
    /// Particle type code.
    #[serde(default)]
    pub pdg_id: i32,
}

impl CompositeVertexCandidate {
    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        kinematics::transverse_momentum(&self.momentum)
    }

    /// Pseudorapidity.
    pub fn eta(&self) -> f64 {
        kinematics::pseudorapidity(&self.momentum)
    }

    /// Azimuth.
    pub fn phi(&self) -> f64 {
        kinematics::azimuth(&self.momentum)
    }

    /// Energy of the candidate four-momentum.
    pub fn energy(&self) -> f64 {
        kinematics::energy(&self.momentum, self.mass)
    }
}

/// Luminous-region reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSpot {
    /// Reference position.
    pub position: Vec3,
    /// Position covariance.
    pub covariance: Cov3,
}

impl BeamSpot {
    /// Beamspot at `position` with diagonal covariance given by the errors.
    pub fn new(position: Vec3, errors: Vec3) -> Self {
        Self {
            position,
            covariance: Cov3::from_diagonal(&errors.component_mul(&errors)),
        }
    }

    /// The nominal origin with zero spread.
    pub fn origin() -> Self {
        Self {
            position: Vec3::zeros(),
            covariance: Cov3::zeros(),
        }
    }

    /// Diagonal of the covariance.
    pub fn variance(&self) -> Vec3 {
        self.covariance.diagonal()
    }
}

impl Default for BeamSpot {
    fn default() -> Self {
        Self::origin()
    }
}
