//! Discovery of the anti-S decay chain in a truth particle collection.
//!
//! Daughters are matched by the coincidence of their production vertex with
//! the mother's first decay vertex. The search is a linear scan per level and
//! keeps the last matching particle for each slot.

use serde::{Deserialize, Serialize};
use sxq_core::{ParticleRole, Species, TruthParticle};
use tracing::trace;

/// Truth indices of an anti-S and whatever part of its chain was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayChain {
    /// Index of the anti-S.
    pub anti_s: usize,
    /// Index of the K-short daughter.
    pub kshort: Option<usize>,
    /// Index of the anti-Lambda daughter.
    pub anti_lambda: Option<usize>,
    /// Granddaughter indices in [`ParticleRole::GRANDDAUGHTERS`] order.
    pub granddaughters: [Option<usize>; 4],
}

impl DecayChain {
    fn new(anti_s: usize) -> Self {
        Self {
            anti_s,
            kshort: None,
            anti_lambda: None,
            granddaughters: [None; 4],
        }
    }

    /// Whether all four granddaughter slots are filled.
    pub fn is_complete(&self) -> bool {
        self.granddaughters.iter().all(Option::is_some)
    }

    /// Number of granddaughter slots filled.
    pub fn granddaughters_found(&self) -> usize {
        self.granddaughters.iter().flatten().count()
    }

    /// Index stored for `role`.
    pub fn index_of(&self, role: ParticleRole) -> Option<usize> {
        match role {
            ParticleRole::AntiS => Some(self.anti_s),
            ParticleRole::KShort => self.kshort,
            ParticleRole::AntiLambda => self.anti_lambda,
            other => self.granddaughters[other.index() - 3],
        }
    }

    /// Converts into a [`CompleteChain`] when every slot is filled.
    pub fn complete(&self) -> Option<CompleteChain> {
        let [ks_pi_plus, ks_pi_minus, lambda_pi_plus, lambda_anti_proton] = self.granddaughters;
        Some(CompleteChain {
            anti_s: self.anti_s,
            kshort: self.kshort?,
            anti_lambda: self.anti_lambda?,
            granddaughters: [ks_pi_plus?, ks_pi_minus?, lambda_pi_plus?, lambda_anti_proton?],
        })
    }
}

/// A decay chain with every slot filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteChain {
    /// Index of the anti-S.
    pub anti_s: usize,
    /// Index of the K-short.
    pub kshort: usize,
    /// Index of the anti-Lambda.
    pub anti_lambda: usize,
    /// Granddaughter indices in [`ParticleRole::GRANDDAUGHTERS`] order.
    pub granddaughters: [usize; 4],
}

impl CompleteChain {
    /// Truth index for each role, in record order.
    pub fn indices(&self) -> [usize; 7] {
        let [a, b, c, d] = self.granddaughters;
        [self.anti_s, self.kshort, self.anti_lambda, a, b, c, d]
    }

    /// Truth index stored for `role`.
    pub fn index_of(&self, role: ParticleRole) -> usize {
        self.indices()[role.index()]
    }
}

/// Result of looking for the chain of one truth anti-S.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "chain", rename_all = "snake_case")]
pub enum ChainOutcome {
    /// The anti-S never decayed or interacted.
    NoDecayVertex,
    /// Duplicate entry of a looping anti-S; excluded from all counting.
    Looper,
    /// Chain search ran; the chain may be incomplete.
    Chain(DecayChain),
}

/// Locates the decay chain of the anti-S at `anti_s` in `truth`.
///
/// Returns [`ChainOutcome::NoDecayVertex`] if the index is out of range.
pub fn locate_chain(anti_s: usize, truth: &[TruthParticle]) -> ChainOutcome {
    let Some(mother) = truth.get(anti_s) else {
        return ChainOutcome::NoDecayVertex;
    };
    let Some(decay) = mother.first_decay_vertex() else {
        return ChainOutcome::NoDecayVertex;
    };
    if mother.production_vertex.coincides(decay) {
        return ChainOutcome::Looper;
    }

    let mut chain = DecayChain::new(anti_s);
    for (d_idx, daughter) in truth.iter().enumerate() {
        let Some(d_species) = daughter.species().filter(|s| s.is_daughter()) else {
            continue;
        };
        if !daughter.production_vertex.coincides(decay) {
            continue;
        }
        match d_species {
            Species::KShort => chain.kshort = Some(d_idx),
            _ => chain.anti_lambda = Some(d_idx),
        }
        let Some(d_decay) = daughter.first_decay_vertex() else {
            continue;
        };
        for (g_idx, granddaughter) in truth.iter().enumerate() {
            let Some(g_species) = granddaughter.species().filter(|s| s.is_granddaughter()) else {
                continue;
            };
            if !granddaughter.production_vertex.coincides(d_decay) {
                continue;
            }
            if let Some(role) = ParticleRole::granddaughter(d_species, g_species) {
                chain.granddaughters[role.index() - 3] = Some(g_idx);
            }
        }
    }
    trace!(
        anti_s,
        granddaughters = chain.granddaughters_found(),
        "decay chain located"
    );
    ChainOutcome::Chain(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sxq_core::{Vec3, VertexRef};

    fn particle(pdg_id: i32, production: Vec3, decay: Option<Vec3>) -> TruthParticle {
        TruthParticle {
            pdg_id,
            charge: 0,
            momentum: Vec3::new(1.0, 0.0, 0.0),
            mass: 0.1,
            production_vertex: VertexRef::at(production),
            decay_vertices: decay.into_iter().map(VertexRef::at).collect(),
            tracker_hits: 0,
            sim_hits: Vec::new(),
        }
    }

    #[test]
    fn looper_is_recognised_before_scanning() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let truth = vec![particle(sxq_core::particle::PDG_ANTI_S, p, Some(p))];
        assert_eq!(locate_chain(0, &truth), ChainOutcome::Looper);
    }

    #[test]
    fn undecayed_anti_s_has_no_chain() {
        let truth = vec![particle(sxq_core::particle::PDG_ANTI_S, Vec3::zeros(), None)];
        assert_eq!(locate_chain(0, &truth), ChainOutcome::NoDecayVertex);
        assert_eq!(locate_chain(3, &truth), ChainOutcome::NoDecayVertex);
    }

    #[test]
    fn wrong_pairings_are_ignored() {
        let ip = Vec3::new(2.0, 0.0, 0.0);
        let ks_decay = Vec3::new(5.0, 0.0, 0.0);
        let truth = vec![
            particle(sxq_core::particle::PDG_ANTI_S, Vec3::zeros(), Some(ip)),
            particle(310, ip, Some(ks_decay)),
            particle(-2212, ks_decay, None),
        ];
        let ChainOutcome::Chain(chain) = locate_chain(0, &truth) else {
            panic!("expected a chain");
        };
        assert_eq!(chain.kshort, Some(1));
        assert_eq!(chain.granddaughters_found(), 0);
        assert!(chain.complete().is_none());
    }
}
