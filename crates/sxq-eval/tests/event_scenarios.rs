use sxq_core::particle::{PDG_ANTI_LAMBDA, PDG_ANTI_PROTON, PDG_ANTI_S, PDG_KSHORT, PDG_PI_MINUS, PDG_PI_PLUS};
use sxq_core::{
    BeamSpot, BinnedWeights, CompositeVertexCandidate, Cov3, ParticleRole, ReconstructedTrack,
    TruthParticle, Vec3, VertexRef, WeightTables,
};
use sxq_eval::{Analyzer, AnalyzerConfig, EventInput, MatchedObject, RecordDiagnostic, RunAggregator};
use sxq_truth::SimToRecoCollection;

const IP: [f64; 3] = [2.5, 0.0, 0.5];
const KS_DECAY: [f64; 3] = [6.0, 1.2, 1.9];
const LAMBDA_DECAY: [f64; 3] = [9.0, -2.0, 1.5];

fn v(p: [f64; 3]) -> Vec3 {
    Vec3::new(p[0], p[1], p[2])
}

fn particle(
    pdg_id: i32,
    charge: i32,
    momentum: Vec3,
    mass: f64,
    production: VertexRef,
    decay: Option<VertexRef>,
    hit_base: u64,
) -> TruthParticle {
    TruthParticle {
        pdg_id,
        charge,
        momentum,
        mass,
        production_vertex: production,
        decay_vertices: decay.into_iter().collect(),
        tracker_hits: if hit_base == 0 { 0 } else { 10 },
        sim_hits: if hit_base == 0 {
            Vec::new()
        } else {
            (hit_base..hit_base + 10).collect()
        },
    }
}

fn truth() -> Vec<TruthParticle> {
    let origin = VertexRef::with_id(Vec3::zeros(), 1);
    let ip = VertexRef::with_id(v(IP), 2);
    let ks = VertexRef::with_id(v(KS_DECAY), 3);
    let lambda = VertexRef::with_id(v(LAMBDA_DECAY), 4);
    vec![
        particle(PDG_ANTI_S, 0, Vec3::new(3.0, 0.0, 1.0), 1.8, origin, Some(ip.clone()), 0),
        particle(PDG_KSHORT, 0, Vec3::new(1.5, 0.5, 0.6), 0.4976, ip.clone(), Some(ks.clone()), 0),
        particle(PDG_ANTI_LAMBDA, 0, Vec3::new(1.5, -0.5, 0.4), 1.1157, ip, Some(lambda.clone()), 0),
        particle(PDG_PI_PLUS, 1, Vec3::new(1.0, 0.4, 0.4), 0.1396, ks.clone(), None, 100),
        particle(PDG_PI_MINUS, -1, Vec3::new(0.5, 0.1, 0.2), 0.1396, ks, None, 200),
        particle(PDG_PI_PLUS, 1, Vec3::new(0.4, -0.1, 0.1), 0.1396, lambda.clone(), None, 300),
        particle(PDG_ANTI_PROTON, -1, Vec3::new(1.1, -0.4, 0.3), 0.9383, lambda, None, 400),
    ]
}

fn track_for(p: &TruthParticle) -> ReconstructedTrack {
    ReconstructedTrack {
        charge: p.charge,
        momentum: p.momentum,
        reference_point: *p.vertex(),
        chi2: 10.0,
        ndof: 10.0,
        valid_hits: 12,
        dxy_error: 0.01,
        dz_error: 0.01,
        hit_ids: p.sim_hits.clone(),
    }
}

fn candidate(momentum: Vec3, vertex: Vec3, charge: i32, mass: f64) -> CompositeVertexCandidate {
    CompositeVertexCandidate {
        momentum,
        mass,
        vertex,
        vertex_covariance: Cov3::from_diagonal(&Vec3::new(1e-4, 1e-4, 1e-4)),
        charge,
        pdg_id: 0,
    }
}

fn full_event() -> EventInput {
    let truth = truth();
    let tracks = truth[3..].iter().map(track_for).collect();
    let anti_s = vec![
        candidate(truth[0].momentum, v(IP), 1, 2.2),
        candidate(truth[0].momentum, v(IP), -1, 2.2),
    ];
    let kshorts = vec![candidate(truth[1].momentum, v(KS_DECAY), 0, 0.497)];
    let anti_lambdas = vec![candidate(truth[2].momentum, v(LAMBDA_DECAY), 0, 1.116)];
    EventInput {
        event: 7,
        truth,
        tracks,
        kshorts: Some(kshorts),
        anti_lambdas: Some(anti_lambdas),
        anti_s: Some(anti_s),
        beamspot: Some(BeamSpot::new(Vec3::zeros(), Vec3::new(0.002, 0.002, 3.0))),
        association: None,
        n_good_pv: 0,
    }
}

fn analyzer() -> Analyzer {
    Analyzer::new(AnalyzerConfig::default()).expect("default config")
}

#[test]
fn fully_matched_anti_s_is_reconstructed() {
    let mut agg = RunAggregator::new();
    let report = analyzer().analyze_event(&full_event(), &mut agg);
    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert!(record.reconstructed);
    for entry in &record.entries {
        assert!(entry.matching.found, "{:?} not found", entry.role);
    }
    let anti_s = record.entry(ParticleRole::AntiS);
    assert_eq!(anti_s.matching.best, Some(MatchedObject::Candidate(1)));
    assert!(anti_s.diagnostic.is_none());
    assert!(record.anti_s_extras.is_some());

    let summary = agg.summary();
    assert_eq!(summary.events, 1);
    assert_eq!(summary.unique_anti_s, 1);
    assert_eq!(summary.with_granddaughters, 1);
    assert_eq!(summary.reconstructed, 1);
    assert_eq!(summary.reconstructed_weighted, 1.0);
    assert_eq!(summary.kshort_codes.values().sum::<u64>(), 1);
    assert_eq!(summary.anti_lambda_codes.values().sum::<u64>(), 1);
}

#[test]
fn unmatched_granddaughter_blocks_reconstruction() {
    let mut event = full_event();
    event.tracks[3].hit_ids = (900..910).collect();
    let mut agg = RunAggregator::new();
    let report = analyzer().analyze_event(&event, &mut agg);
    let record = &report.records[0];
    assert!(!record.reconstructed);
    assert!(record.entry(ParticleRole::AntiS).matching.found);
    assert!(!record.entry(ParticleRole::LambdaAntiProton).matching.found);
    assert!(record.entry(ParticleRole::LambdaAntiProton).reco.is_none());
    for role in [ParticleRole::KShortPiPlus, ParticleRole::KShortPiMinus, ParticleRole::LambdaPiPlus] {
        assert!(record.entry(role).matching.found, "{role:?}");
    }
    assert!(record.entry(ParticleRole::AntiLambda).diagnostic.is_none());
    assert!(record.entry(ParticleRole::KShort).diagnostic.is_some());
    assert_eq!(agg.summary().reconstructed, 0);
    assert_eq!(agg.summary().reconstructed_weighted, 0.0);
    assert_eq!(agg.summary().with_granddaughters, 1);
}

#[test]
fn record_entries_follow_role_order() {
    let mut agg = RunAggregator::new();
    let report = analyzer().analyze_event(&full_event(), &mut agg);
    let record = &report.records[0];
    let roles: Vec<ParticleRole> = record.entries.iter().map(|e| e.role).collect();
    assert_eq!(roles, ParticleRole::ALL.to_vec());
    let indices: Vec<usize> = record.entries.iter().map(|e| e.truth_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
    for role in ParticleRole::GRANDDAUGHTERS {
        let entry = record.entry(role);
        assert!(matches!(entry.diagnostic, Some(RecordDiagnostic::Selection(_))));
        let reco = entry.reco.expect("track summary");
        assert!(reco.mass.is_none());
        assert!(reco.track_dxy_beamspot.is_some());
    }
    let kshort_reco = record.entry(ParticleRole::KShort).reco.expect("candidate summary");
    assert_eq!(kshort_reco.mass, Some(0.497));
    assert!(kshort_reco.track_dz_beamspot.is_none());
}

#[test]
fn loopers_are_not_counted() {
    let mut event = full_event();
    let ip = VertexRef::with_id(v(IP), 2);
    event.truth.push(particle(PDG_ANTI_S, 0, Vec3::new(3.0, 0.0, 1.0), 1.8, ip.clone(), Some(ip), 0));
    let mut agg = RunAggregator::new();
    let report = analyzer().analyze_event(&event, &mut agg);
    assert_eq!(report.anti_s, 2);
    assert_eq!(report.loopers, 1);
    assert_eq!(report.unique, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(agg.summary().unique_anti_s, 1);
}

#[test]
fn only_the_anti_s_code_starts_a_chain() {
    let mut event = full_event();
    let origin = VertexRef::with_id(Vec3::zeros(), 1);
    let far = VertexRef::with_id(Vec3::new(30.0, 0.0, 0.0), 9);
    event.truth.push(particle(-PDG_ANTI_S, 0, Vec3::new(3.0, 0.0, 1.0), 1.8, origin, Some(far), 0));
    let mut agg = RunAggregator::new();
    let report = analyzer().analyze_event(&event, &mut agg);
    assert_eq!(report.anti_s, 1);
    assert_eq!(report.unique, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].anti_s_index, 0);
}

#[test]
fn incomplete_chain_counts_as_unique_only() {
    let mut event = full_event();
    event.truth.remove(6);
    let mut agg = RunAggregator::new();
    let report = analyzer().analyze_event(&event, &mut agg);
    assert!(report.records.is_empty());
    assert_eq!(agg.summary().unique_anti_s, 1);
    assert_eq!(agg.summary().with_granddaughters, 0);
}

#[test]
fn missing_collection_means_not_found() {
    let mut event = full_event();
    event.kshorts = None;
    let mut agg = RunAggregator::new();
    let record = analyzer().analyze_event(&event, &mut agg).records.remove(0);
    let kshort = record.entry(ParticleRole::KShort);
    assert!(!kshort.matching.found);
    assert!(kshort.matching.best.is_none());
    assert!(kshort.reco.is_none());
    assert!(!record.reconstructed);
}

#[test]
fn ineligible_anti_s_candidates_are_ignored() {
    let mut event = full_event();
    event.anti_s = Some(vec![candidate(event.truth[0].momentum, Vec3::new(1.0, 0.0, 0.5), -1, 2.2)]);
    let mut agg = RunAggregator::new();
    let record = analyzer().analyze_event(&event, &mut agg).records.remove(0);
    let anti_s = record.entry(ParticleRole::AntiS);
    assert!(anti_s.matching.best.is_none());
    assert!(record.anti_s_extras.is_none());
    assert!(!record.reconstructed);
}

#[test]
fn supplied_association_replaces_hit_sharing() {
    let mut event = full_event();
    for track in &mut event.tracks {
        track.hit_ids.clear();
    }
    let mut assoc = SimToRecoCollection::new();
    for (truth_idx, track_idx) in [(3, 0), (4, 1), (5, 2), (6, 3)] {
        assoc.insert(truth_idx, track_idx, 1.0);
    }
    event.association = Some(assoc);
    let mut agg = RunAggregator::new();
    let report = analyzer().analyze_event(&event, &mut agg);
    assert!(report.records[0].reconstructed);
}

#[test]
fn pileup_bucket_overflow_zeroes_weighted_count() {
    let cfg = AnalyzerConfig {
        weights: WeightTables {
            event: BinnedWeights::new(vec![(0.0, 2.0)], 0.0),
            pileup: vec![BinnedWeights::new(vec![(-50.0, 1.0)], 0.0)],
        },
        ..AnalyzerConfig::default()
    };
    let analyzer = Analyzer::new(cfg).expect("config");
    let mut event = full_event();
    let mut agg = RunAggregator::new();
    let record = analyzer.analyze_event(&event, &mut agg).records.remove(0);
    assert_eq!(record.event_weight, 2.0);
    assert_eq!(record.pileup_weight, 1.0);
    assert_eq!(agg.summary().reconstructed_weighted, 2.0);

    event.n_good_pv = 4;
    agg.reset();
    analyzer.analyze_event(&event, &mut agg);
    let summary = agg.summary();
    assert_eq!(summary.reconstructed, 1);
    assert_eq!(summary.reconstructed_weighted, 0.0);
}

#[test]
fn identical_runs_hash_identically() {
    let analyzer = analyzer();
    let run = || {
        let mut agg = RunAggregator::new();
        analyzer.analyze_event(&full_event(), &mut agg);
        analyzer.analyze_event(&full_event(), &mut agg);
        agg.summary().with_hash().expect("hash")
    };
    let first = run();
    assert_eq!(first.events, 2);
    assert_eq!(first.hash, run().hash);
}
