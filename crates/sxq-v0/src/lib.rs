#![deny(missing_docs)]
#![doc = "Track pre-selection and the ordered two-track V0 cut cascade."]

pub mod cascade;
/// Cut thresholds and fitter selection.
pub mod config;
pub mod selection;

pub use cascade::{stage_names, DiagnosticCode, Rejection, StageResult, TargetParticle, V0Diagnoser};
pub use config::V0FitterConfig;
pub use selection::{select_track, TrackSelection};
