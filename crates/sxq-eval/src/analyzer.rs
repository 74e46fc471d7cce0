//! Per-event entry point.
//!
//! Every truth anti-S in the event is classified by its chain. Loopers and
//! anti-S that never interacted are skipped without counting. Incomplete
//! chains are counted as unique but produce no record. Complete chains are
//! matched role by role, the two V0 track pairs are diagnosed and one
//! [`OutputRecord`] is emitted.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sxq_core::{
    BeamSpot, CompositeVertexCandidate, ParticleRole, ReconstructedTrack, Species, SxqError,
    TruthParticle,
};
use sxq_track::MagneticField;
use sxq_truth::{locate_chain, ChainOutcome, CompleteChain, SimToRecoCollection, TrackAssociator};
use sxq_v0::{select_track, DiagnosticCode, TargetParticle, V0Diagnoser};
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::matcher::{match_anti_s, match_track, match_v0, MatchResult};
use crate::record::{AntiSExtras, OutputRecord, ParticleRecord, RecoSummary, RecordDiagnostic, TruthSummary};
use crate::summary::RunAggregator;

/// Read-only content of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventInput {
    /// Event number, used in logs and records.
    #[serde(default)]
    pub event: u64,
    /// Truth particles.
    pub truth: Vec<TruthParticle>,
    /// Reconstructed tracks.
    #[serde(default)]
    pub tracks: Vec<ReconstructedTrack>,
    /// K-short candidates. `None` when the collection is unavailable.
    #[serde(default)]
    pub kshorts: Option<Vec<CompositeVertexCandidate>>,
    /// Anti-Lambda candidates.
    #[serde(default)]
    pub anti_lambdas: Option<Vec<CompositeVertexCandidate>>,
    /// Anti-S candidates.
    #[serde(default)]
    pub anti_s: Option<Vec<CompositeVertexCandidate>>,
    /// Beamspot. The origin with zero spread is used when absent.
    #[serde(default)]
    pub beamspot: Option<BeamSpot>,
    /// Precomputed truth-to-track association.
    #[serde(default)]
    pub association: Option<SimToRecoCollection>,
    /// Number of good primary vertices.
    #[serde(default)]
    pub n_good_pv: usize,
}

/// Records and counts produced for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventReport {
    /// Event number.
    pub event: u64,
    /// Truth anti-S seen in the event.
    pub anti_s: usize,
    /// Of those, looping duplicates.
    pub loopers: usize,
    /// Non-looping anti-S with an interaction vertex.
    pub unique: usize,
    /// Anti-S with a complete chain.
    pub complete: usize,
    /// Reconstructed anti-S.
    pub reconstructed: usize,
    /// One record per complete chain.
    pub records: Vec<OutputRecord>,
}

/// Matches truth anti-S chains to the reconstruction and diagnoses the V0s.
pub struct Analyzer {
    cfg: AnalyzerConfig,
    field: Arc<dyn MagneticField>,
    diagnoser: V0Diagnoser,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer").field("cfg", &self.cfg).finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Validates `cfg` and builds the analyzer.
    pub fn new(cfg: AnalyzerConfig) -> Result<Self, SxqError> {
        cfg.validate()?;
        let field: Arc<dyn MagneticField> = Arc::new(cfg.field);
        let diagnoser = V0Diagnoser::new(cfg.v0.clone(), Arc::clone(&field));
        Ok(Self {
            cfg,
            field,
            diagnoser,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.cfg
    }

    /// Analyzes one event and folds its outcome into `aggregator`.
    pub fn analyze_event(&self, input: &EventInput, aggregator: &mut RunAggregator) -> EventReport {
        aggregator.count_event();
        let mut report = EventReport {
            event: input.event,
            ..EventReport::default()
        };

        let beamspot = input.beamspot.clone().unwrap_or_else(|| {
            warn!(event = input.event, "beamspot missing, using the origin");
            BeamSpot::origin()
        });
        let kshorts = collection(input.event, "kshorts", input.kshorts.as_deref());
        let anti_lambdas = collection(input.event, "anti_lambdas", input.anti_lambdas.as_deref());
        let anti_s = collection(input.event, "anti_s", input.anti_s.as_deref());
        let built;
        let association = match &input.association {
            Some(association) => association,
            None => {
                built = self.cfg.association.associate(&input.truth, &input.tracks);
                &built
            }
        };
        let view = EventView {
            input,
            beamspot: &beamspot,
            kshorts,
            anti_lambdas,
            anti_s,
            association,
        };

        for (idx, particle) in input.truth.iter().enumerate() {
            if particle.species() != Some(Species::AntiS) {
                continue;
            }
            report.anti_s += 1;
            let chain = match locate_chain(idx, &input.truth) {
                ChainOutcome::NoDecayVertex => continue,
                ChainOutcome::Looper => {
                    report.loopers += 1;
                    continue;
                }
                ChainOutcome::Chain(chain) => chain,
            };
            report.unique += 1;
            aggregator.count_unique();
            let Some(complete) = chain.complete() else {
                debug!(
                    event = input.event,
                    anti_s = idx,
                    granddaughters = chain.granddaughters_found(),
                    "incomplete decay chain skipped"
                );
                continue;
            };
            report.complete += 1;
            aggregator.count_complete();

            let record = self.build_record(&view, &complete);
            if record.reconstructed {
                report.reconstructed += 1;
            }
            aggregator.record(&record);
            report.records.push(record);
        }

        info!(
            event = input.event,
            anti_s = report.anti_s,
            loopers = report.loopers,
            unique = report.unique,
            complete = report.complete,
            reconstructed = report.reconstructed,
            "event analyzed"
        );
        report
    }

    fn build_record(&self, view: &EventView<'_>, chain: &CompleteChain) -> OutputRecord {
        let truth = &view.input.truth;
        let tracks: &[ReconstructedTrack] = &view.input.tracks;
        let thr = &self.cfg.matching;
        let anti_s = &truth[chain.anti_s];
        let kshort = &truth[chain.kshort];
        let anti_lambda = &truth[chain.anti_lambda];
        let interaction_point = kshort.vertex();

        let mut matches = [MatchResult::default(); 7];
        matches[ParticleRole::AntiS.index()] =
            match_anti_s(anti_s, interaction_point, view.anti_s, view.beamspot, thr);
        matches[ParticleRole::KShort.index()] = match_v0(
            kshort,
            truth[chain.index_of(ParticleRole::KShortPiPlus)].vertex(),
            view.kshorts,
            thr.delta_r_kshort,
            thr.delta_l_kshort,
        );
        matches[ParticleRole::AntiLambda.index()] = match_v0(
            anti_lambda,
            truth[chain.index_of(ParticleRole::LambdaPiPlus)].vertex(),
            view.anti_lambdas,
            thr.delta_r_anti_lambda,
            thr.delta_l_anti_lambda,
        );
        for role in ParticleRole::GRANDDAUGHTERS {
            matches[role.index()] = match_track(chain.index_of(role), view.association, tracks.len());
        }

        let matched_track = move |role: ParticleRole| matches[role.index()].track().map(|idx| &tracks[idx]);
        let mut diagnostics: [Option<RecordDiagnostic>; 7] = [None; 7];
        let mut recos: [Option<RecoSummary>; 7] = [None; 7];
        for role in ParticleRole::GRANDDAUGHTERS {
            if let Some(track) = matched_track(role) {
                let sel = select_track(track, view.beamspot, &self.cfg.v0);
                diagnostics[role.index()] = Some(RecordDiagnostic::Selection(sel));
                recos[role.index()] = Some(RecoSummary::from_track(track, view.beamspot));
            }
        }
        diagnostics[ParticleRole::KShort.index()] = self
            .pair_code(
                matched_track(ParticleRole::KShortPiPlus),
                matched_track(ParticleRole::KShortPiMinus),
                view.beamspot,
                TargetParticle::KShort,
            )
            .map(RecordDiagnostic::Pair);
        diagnostics[ParticleRole::AntiLambda.index()] = self
            .pair_code(
                matched_track(ParticleRole::LambdaPiPlus),
                matched_track(ParticleRole::LambdaAntiProton),
                view.beamspot,
                TargetParticle::AntiLambda,
            )
            .map(RecordDiagnostic::Pair);

        let composites = [
            (ParticleRole::AntiS, view.anti_s),
            (ParticleRole::KShort, view.kshorts),
            (ParticleRole::AntiLambda, view.anti_lambdas),
        ];
        for (role, candidates) in composites {
            if let Some(idx) = matches[role.index()].candidate() {
                recos[role.index()] = Some(RecoSummary::from_candidate(&candidates[idx], view.beamspot));
            }
        }
        let anti_s_extras = matches[ParticleRole::AntiS.index()]
            .candidate()
            .map(|idx| AntiSExtras::new(&view.anti_s[idx], view.beamspot));

        let creation = anti_s.vertex();
        let field = self.field.as_ref();
        let entries = ParticleRole::ALL.map(|role| {
            let i = role.index();
            let truth_index = chain.index_of(role);
            ParticleRecord {
                role,
                truth_index,
                truth: TruthSummary::new(&truth[truth_index], view.beamspot, creation, field),
                matching: matches[i],
                diagnostic: diagnostics[i],
                reco: recos[i],
            }
        });

        let reconstructed = matches.iter().all(|m| m.found);
        let event_weight = self.cfg.weights.event_weight(anti_s.theta());
        let pileup_weight = self.cfg.weights.pileup_weight(view.input.n_good_pv, anti_s.vertex().z);
        debug!(
            event = view.input.event,
            anti_s = chain.anti_s,
            reconstructed,
            event_weight,
            pileup_weight,
            "anti-S record assembled"
        );
        OutputRecord {
            event: view.input.event,
            anti_s_index: chain.anti_s,
            entries,
            anti_s_extras,
            event_weight,
            pileup_weight,
            reconstructed,
        }
    }

    fn pair_code(
        &self,
        first: Option<&ReconstructedTrack>,
        second: Option<&ReconstructedTrack>,
        beamspot: &BeamSpot,
        target: TargetParticle,
    ) -> Option<DiagnosticCode> {
        let (first, second) = (first?, second?);
        Some(self.diagnoser.diagnose_pair(first, second, beamspot, target))
    }
}

struct EventView<'a> {
    input: &'a EventInput,
    beamspot: &'a BeamSpot,
    kshorts: &'a [CompositeVertexCandidate],
    anti_lambdas: &'a [CompositeVertexCandidate],
    anti_s: &'a [CompositeVertexCandidate],
    association: &'a SimToRecoCollection,
}

fn collection<'a>(
    event: u64,
    name: &'static str,
    candidates: Option<&'a [CompositeVertexCandidate]>,
) -> &'a [CompositeVertexCandidate] {
    match candidates {
        Some(candidates) => candidates,
        None => {
            warn!(event, collection = name, "candidate collection missing");
            &[]
        }
    }
}
