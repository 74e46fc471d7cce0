#![deny(missing_docs)]
#![doc = "Core data model, particle roles and geometry helpers for the anti-S reconstruction analysis."]

pub mod errors;
pub mod event;
/// Canonical hashing helpers.
pub mod hash;
pub mod kinematics;
pub mod particle;
/// Canonical JSON and YAML serde helpers.
pub mod serde;
pub mod weights;

pub use errors::{ErrorInfo, SxqError};
pub use event::{BeamSpot, CompositeVertexCandidate, ReconstructedTrack, TruthParticle, VertexRef};
pub use kinematics::{Cov3, Vec3};
pub use particle::{ParticleRole, Species};
pub use weights::{BinnedWeights, WeightTables};
