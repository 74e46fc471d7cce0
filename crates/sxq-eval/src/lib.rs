#![deny(missing_docs)]
#![doc = "Truth-to-reconstruction matching, per anti-S diagnostic records and run-level efficiency summaries."]

pub mod analyzer;
pub mod config;
pub mod matcher;
pub mod record;
/// Run-level counters.
pub mod summary;

pub use analyzer::{Analyzer, EventInput, EventReport};
pub use config::{AnalyzerConfig, MatchingThresholds};
pub use matcher::{match_anti_s, match_track, match_v0, MatchResult, MatchedObject};
pub use record::{AntiSExtras, OutputRecord, ParticleRecord, RecoSummary, RecordDiagnostic, TruthSummary};
pub use summary::{RunAggregator, RunSummary};
