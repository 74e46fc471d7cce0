#![deny(missing_docs)]
#![doc = "Truth decay-chain discovery and hit-based truth-to-track association for anti-S events."]

pub mod association;
pub mod chain;

pub use association::{HitSharingAssociator, SimToRecoCollection, TrackAssociator, TrackMatch};
pub use chain::{locate_chain, ChainOutcome, CompleteChain, DecayChain};
