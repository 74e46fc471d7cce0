#![deny(missing_docs)]
#![doc = "Helix propagation, closest approach and vertex fitting for charged tracks."]

pub mod approach;
pub mod field;
pub mod helix;
/// Tracks bound to a field model.
pub mod transient;
pub mod vertex;

pub use approach::{closest_approach_in_rphi, Approach};
pub use field::{MagneticField, UniformField};
pub use helix::{ClosestApproachState, FreeTrajectoryState, Helix};
pub use transient::TransientTrack;
pub use vertex::{
    build_fitter, AdaptiveVertexFitter, FittedVertex, FitterKind, KalmanVertexFitter,
    RefittedTrack, VertexFitter,
};
