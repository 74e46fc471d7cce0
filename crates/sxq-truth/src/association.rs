//! Truth-to-track association by shared hits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sxq_core::{ReconstructedTrack, TruthParticle};

/// Reconstructed track associated to a truth particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackMatch {
    /// Index in the track collection.
    pub track: usize,
    /// Association quality, higher is better.
    pub quality: f64,
}

/// Map from truth index to the associated tracks, best first.
///
/// Deserialized collections are re-sorted, so a supplied association may
/// list its matches in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(from = "UnorderedCollection")]
pub struct SimToRecoCollection {
    entries: BTreeMap<usize, Vec<TrackMatch>>,
}

#[derive(Deserialize)]
struct UnorderedCollection {
    #[serde(default)]
    entries: BTreeMap<usize, Vec<TrackMatch>>,
}

impl From<UnorderedCollection> for SimToRecoCollection {
    fn from(raw: UnorderedCollection) -> Self {
        let mut entries = raw.entries;
        for matches in entries.values_mut() {
            matches.sort_by(|a, b| b.quality.total_cmp(&a.quality));
        }
        Self { entries }
    }
}

impl SimToRecoCollection {
    /// Creates an empty association.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a match and keeps the list for `truth` ordered by quality.
    ///
    /// Matches of equal quality keep their insertion order.
    pub fn insert(&mut self, truth: usize, track: usize, quality: f64) {
        let matches = self.entries.entry(truth).or_default();
        let at = matches.partition_point(|m| m.quality >= quality);
        matches.insert(at, TrackMatch { track, quality });
    }

    /// All matches for `truth`, best first.
    pub fn matches(&self, truth: usize) -> &[TrackMatch] {
        self.entries.get(&truth).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The best match for `truth`, if any.
    pub fn best(&self, truth: usize) -> Option<TrackMatch> {
        self.matches(truth).first().copied()
    }

    /// Number of truth particles with at least one match.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|m| !m.is_empty()).count()
    }

    /// Whether no truth particle has a match.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the per-event truth-to-track association.
pub trait TrackAssociator {
    /// Associates `truth` particles with `tracks`.
    fn associate(&self, truth: &[TruthParticle], tracks: &[ReconstructedTrack]) -> SimToRecoCollection;
}

/// Associates a track to a truth particle when the fraction of the particle's
/// simulated hits found on the track reaches a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitSharingAssociator {
    /// Minimum shared fraction, relative to the truth hit count.
    #[serde(default = "default_min_shared_fraction")]
    pub min_shared_fraction: f64,
}

fn default_min_shared_fraction() -> f64 {
    0.75
}

impl Default for HitSharingAssociator {
    fn default() -> Self {
        Self {
            min_shared_fraction: default_min_shared_fraction(),
        }
    }
}

impl HitSharingAssociator {
    /// Creates an associator with the given threshold.
    pub fn new(min_shared_fraction: f64) -> Self {
        Self {
            min_shared_fraction,
        }
    }
}

impl TrackAssociator for HitSharingAssociator {
    fn associate(&self, truth: &[TruthParticle], tracks: &[ReconstructedTrack]) -> SimToRecoCollection {
        let mut owners: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (t_idx, track) in tracks.iter().enumerate() {
            for hit in &track.hit_ids {
                owners.entry(*hit).or_default().push(t_idx);
            }
        }

        let mut collection = SimToRecoCollection::new();
        for (p_idx, particle) in truth.iter().enumerate() {
            if particle.sim_hits.is_empty() {
                continue;
            }
            let mut shared: BTreeMap<usize, usize> = BTreeMap::new();
            for hit in &particle.sim_hits {
                for t_idx in owners.get(hit).into_iter().flatten() {
                    *shared.entry(*t_idx).or_default() += 1;
                }
            }
            let total = particle.sim_hits.len() as f64;
            for (t_idx, count) in shared {
                let fraction = count as f64 / total;
                if fraction >= self.min_shared_fraction {
                    collection.insert(p_idx, t_idx, fraction);
                }
            }
        }
        collection
    }
}
