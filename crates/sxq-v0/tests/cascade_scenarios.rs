use std::sync::Arc;

use sxq_core::kinematics::system_mass;
use sxq_core::particle::{KSHORT_MASS, LAMBDA_MASS, PION_MASS, PROTON_MASS};
use sxq_core::{BeamSpot, ReconstructedTrack, Vec3};
use sxq_track::{
    FittedVertex, FitterKind, FreeTrajectoryState, Helix, KalmanVertexFitter, MagneticField,
    TransientTrack, UniformField, VertexFitter,
};
use sxq_v0::{DiagnosticCode, Rejection, TargetParticle, V0Diagnoser, V0FitterConfig};

fn field() -> Arc<dyn MagneticField> {
    Arc::new(UniformField::new(3.8))
}

fn track_through(field: &dyn MagneticField, vertex: Vec3, momentum: Vec3, charge: i32) -> ReconstructedTrack {
    let state = FreeTrajectoryState {
        position: vertex,
        momentum,
        charge,
    };
    let helix = Helix::new(&state, field).expect("helix");
    let upstream = helix.state_at(-5.0);
    ReconstructedTrack {
        charge,
        momentum: upstream.momentum,
        reference_point: upstream.position,
        chi2: 12.0,
        ndof: 12.0,
        valid_hits: 12,
        dxy_error: 0.01,
        dz_error: 0.01,
        hit_ids: Vec::new(),
    }
}

/// Daughter momenta `(1, q, 0.4)` and `(1, -q, 0.2)` with q chosen so the
/// pion-pion mass equals `mass`.
fn pion_momenta(mass: f64) -> (Vec3, Vec3) {
    let build = |q: f64| (Vec3::new(1.0, q, 0.4), Vec3::new(1.0, -q, 0.2));
    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let (p, n) = build(mid);
        if system_mass(&[(p, PION_MASS), (n, PION_MASS)]) < mass {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    build(0.5 * (lo + hi))
}

/// Soft pion `(0.3, q, 0.1)` and hard anti-proton `(1.5, -q, 0.3)` with q
/// chosen so the anti-p pi+ mass equals `mass`.
fn anti_lambda_momenta(mass: f64) -> (Vec3, Vec3) {
    let build = |q: f64| (Vec3::new(0.3, q, 0.1), Vec3::new(1.5, -q, 0.3));
    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let (p, n) = build(mid);
        if system_mass(&[(p, PION_MASS), (n, PROTON_MASS)]) < mass {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    build(0.5 * (lo + hi))
}

fn decay_vertex() -> Vec3 {
    Vec3::new(10.0, 0.0, 0.0)
}

fn beamspot() -> BeamSpot {
    BeamSpot::new(Vec3::zeros(), Vec3::new(0.002, 0.002, 3.0))
}

fn kshort_pair(mass: f64) -> (ReconstructedTrack, ReconstructedTrack) {
    let f = field();
    let (p, n) = pion_momenta(mass);
    (
        track_through(f.as_ref(), decay_vertex(), p, 1),
        track_through(f.as_ref(), decay_vertex(), n, -1),
    )
}

fn anti_lambda_pair(mass: f64) -> (ReconstructedTrack, ReconstructedTrack) {
    let f = field();
    let (p, n) = anti_lambda_momenta(mass);
    (
        track_through(f.as_ref(), decay_vertex(), p, 1),
        track_through(f.as_ref(), decay_vertex(), n, -1),
    )
}

/// Kalman fit whose output is rewritten before the cascade sees it.
struct EditedFit(fn(FittedVertex) -> Option<FittedVertex>);

impl VertexFitter for EditedFit {
    fn vertex(&self, tracks: &[TransientTrack<'_>]) -> Option<FittedVertex> {
        KalmanVertexFitter::new(true).vertex(tracks).and_then(self.0)
    }
}

fn edited(edit: fn(FittedVertex) -> Option<FittedVertex>) -> V0Diagnoser {
    V0Diagnoser::with_fitter(V0FitterConfig::default(), field(), Box::new(EditedFit(edit)))
}

fn diagnoser(cfg: V0FitterConfig) -> V0Diagnoser {
    V0Diagnoser::new(cfg, field())
}

fn rejected(rejection: Rejection) -> DiagnosticCode {
    DiagnosticCode::Rejected(rejection)
}

#[test]
fn kshort_at_0495_is_accepted_in_a_002_window() {
    let (plus, minus) = kshort_pair(0.495);
    let cfg = V0FitterConfig {
        kshort_mass_cut: 0.02,
        ..V0FitterConfig::default()
    };
    let code = diagnoser(cfg).diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort);
    assert_eq!(code, DiagnosticCode::Accepted);
}

#[test]
fn track_order_does_not_matter_for_acceptance() {
    let (plus, minus) = kshort_pair(0.495);
    let d = diagnoser(V0FitterConfig::default());
    assert_eq!(
        d.diagnose(&minus, &plus, &beamspot(), TargetParticle::KShort),
        DiagnosticCode::Accepted
    );
}

#[test]
fn adaptive_fitter_accepts_the_same_pair() {
    let (plus, minus) = kshort_pair(0.495);
    let cfg = V0FitterConfig {
        vertex_fitter: FitterKind::Adaptive,
        ..V0FitterConfig::default()
    };
    assert_eq!(
        diagnoser(cfg).diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort),
        DiagnosticCode::Accepted
    );
}

#[test]
fn same_sign_wins_over_everything_else() {
    let (plus, _) = kshort_pair(0.495);
    let mut broken = plus.clone();
    broken.momentum = Vec3::new(0.0, 0.0, 0.0);
    broken.dxy_error = 0.0;
    let code = diagnoser(V0FitterConfig::default()).diagnose(
        &plus,
        &broken,
        &beamspot(),
        TargetParticle::KShort,
    );
    assert_eq!(code, rejected(Rejection::SameSign));
    assert_eq!(code.code(), 1);
}

#[test]
fn charge_magnitude_precedes_state_validity() {
    let (mut plus, mut minus) = kshort_pair(0.495);
    plus.charge = 2;
    plus.momentum = Vec3::new(0.0, 0.0, 1.0);
    let d = diagnoser(V0FitterConfig::default());
    assert_eq!(
        d.diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort).code(),
        2
    );
    plus.charge = 1;
    minus.charge = -3;
    assert_eq!(
        d.diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort).code(),
        3
    );
}

#[test]
fn track_without_transverse_momentum_has_no_impact_state() {
    let (mut plus, minus) = kshort_pair(0.495);
    plus.momentum = Vec3::new(0.0, 0.0, 2.0);
    let code = diagnoser(V0FitterConfig::default()).diagnose(
        &plus,
        &minus,
        &beamspot(),
        TargetParticle::KShort,
    );
    assert_eq!(code, rejected(Rejection::ImpactPointStateInvalid));
}

#[test]
fn parallel_straight_tracks_have_no_closest_approach() {
    let straight: Arc<dyn MagneticField> = Arc::new(UniformField::zero());
    let a = track_through(straight.as_ref(), Vec3::new(5.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.1), 1);
    let b = track_through(straight.as_ref(), Vec3::new(5.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 0.1), -1);
    let d = V0Diagnoser::new(V0FitterConfig::default(), straight);
    assert_eq!(
        d.diagnose(&a, &b, &beamspot(), TargetParticle::KShort),
        rejected(Rejection::ClosestApproachFailed)
    );
}

#[test]
fn longitudinally_separated_tracks_fail_dca() {
    let f = field();
    let q = 0.2;
    let a = track_through(f.as_ref(), decay_vertex(), Vec3::new(1.0, q, 0.3), 1);
    let b = track_through(
        f.as_ref(),
        decay_vertex() + Vec3::new(0.0, 0.0, 5.0),
        Vec3::new(1.0, -q, 0.3),
        -1,
    );
    let code = diagnoser(V0FitterConfig::default()).diagnose(&a, &b, &beamspot(), TargetParticle::KShort);
    assert_eq!(code, rejected(Rejection::DcaTooLarge));
}

#[test]
fn crossing_outside_tracker_is_rejected() {
    let f = field();
    let (p, n) = pion_momenta(0.495);
    let far = Vec3::new(130.0, 0.0, 0.0);
    let a = track_through(f.as_ref(), far, p, 1);
    let b = track_through(f.as_ref(), far, n, -1);
    let code = diagnoser(V0FitterConfig::default()).diagnose(&a, &b, &beamspot(), TargetParticle::KShort);
    assert_eq!(code, rejected(Rejection::CrossingOutsideVolume));
}

#[test]
fn back_to_back_tracks_diverge() {
    let f = field();
    let a = track_through(f.as_ref(), decay_vertex(), Vec3::new(1.0, 0.2, 0.4), 1);
    let b = track_through(f.as_ref(), decay_vertex(), Vec3::new(-1.0, 0.1, 0.2), -1);
    let code = diagnoser(V0FitterConfig::default()).diagnose(&a, &b, &beamspot(), TargetParticle::KShort);
    assert_eq!(code, rejected(Rejection::DivergingMomenta));
}

#[test]
fn earlier_stage_wins_when_two_stages_fail() {
    let (plus, minus) = kshort_pair(0.495);
    let cases = [
        (
            V0FitterConfig {
                m_pipi_cut: 0.1,
                vtx_chi2_cut: -1.0,
                ..V0FitterConfig::default()
            },
            Rejection::PiPiMassTooHigh,
        ),
        (
            V0FitterConfig {
                vtx_chi2_cut: -1.0,
                cos_theta_xy_cut: 1.5,
                ..V0FitterConfig::default()
            },
            Rejection::VertexChi2TooHigh,
        ),
        (
            V0FitterConfig {
                vtx_decay_sig_xy_cut: 1e9,
                vtx_decay_sig_xyz_cut: 1e9,
                ..V0FitterConfig::default()
            },
            Rejection::DecaySignificanceXyTooLow,
        ),
        (
            V0FitterConfig {
                vtx_decay_sig_xyz_cut: 1e9,
                kshort_mass_cut: 0.0,
                ..V0FitterConfig::default()
            },
            Rejection::DecaySignificanceXyzTooLow,
        ),
        (
            V0FitterConfig {
                cos_theta_xy_cut: 1.5,
                cos_theta_xyz_cut: 1.5,
                ..V0FitterConfig::default()
            },
            Rejection::CosThetaXyTooLow,
        ),
        (
            V0FitterConfig {
                cos_theta_xyz_cut: 1.5,
                kshort_mass_cut: 0.0,
                ..V0FitterConfig::default()
            },
            Rejection::CosThetaXyzTooLow,
        ),
    ];
    for (cfg, expected) in cases {
        let code = diagnoser(cfg).diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort);
        assert_eq!(code, rejected(expected), "expected {expected:?}");
    }
}

#[test]
fn mass_window_is_symmetric_around_nominal() {
    let offset = 0.012;
    let eps = 1e-3;
    for mass in [KSHORT_MASS - offset, KSHORT_MASS + offset] {
        let (plus, minus) = kshort_pair(mass);
        let inside = V0FitterConfig {
            kshort_mass_cut: offset + eps,
            ..V0FitterConfig::default()
        };
        let outside = V0FitterConfig {
            kshort_mass_cut: offset - eps,
            ..V0FitterConfig::default()
        };
        assert_eq!(
            diagnoser(inside).diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort),
            DiagnosticCode::Accepted
        );
        assert_eq!(
            diagnoser(outside).diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort),
            rejected(Rejection::KShortMassOutside)
        );
    }
}

#[test]
fn lambda_hypotheses_follow_the_harder_track() {
    let (plus, minus) = kshort_pair(0.495);
    let d = diagnoser(V0FitterConfig::default());
    // The positive track is harder, so only the Lambda branch is computed.
    assert_eq!(
        d.diagnose(&plus, &minus, &beamspot(), TargetParticle::Lambda),
        rejected(Rejection::LambdaMassOutside)
    );
    assert_eq!(
        d.diagnose(&plus, &minus, &beamspot(), TargetParticle::AntiLambda),
        rejected(Rejection::Inconclusive)
    );
}

#[test]
fn disabled_hypotheses_are_inconclusive() {
    let (plus, minus) = kshort_pair(0.495);
    let cfg = V0FitterConfig {
        do_kshorts: false,
        do_lambdas: false,
        ..V0FitterConfig::default()
    };
    assert_eq!(
        diagnoser(cfg).diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort),
        rejected(Rejection::Inconclusive)
    );
}

#[test]
fn pre_selection_failures_short_circuit_the_pair() {
    let (plus, minus) = kshort_pair(0.495);
    let d = diagnoser(V0FitterConfig::default());
    let bs = beamspot();
    assert_eq!(
        d.diagnose_pair(&plus, &minus, &bs, TargetParticle::KShort),
        DiagnosticCode::Accepted
    );
    let mut bad_plus = plus.clone();
    bad_plus.chi2 = 1e3;
    let mut bad_minus = minus.clone();
    bad_minus.valid_hits = 0;
    assert_eq!(
        d.diagnose_pair(&bad_plus, &minus, &bs, TargetParticle::KShort).code(),
        51
    );
    assert_eq!(
        d.diagnose_pair(&plus, &bad_minus, &bs, TargetParticle::KShort).code(),
        52
    );
    assert_eq!(
        d.diagnose_pair(&bad_plus, &bad_minus, &bs, TargetParticle::KShort).code(),
        50
    );
}

#[test]
fn anti_lambda_window_applies_when_the_negative_track_is_harder() {
    let (plus, minus) = anti_lambda_pair(LAMBDA_MASS + 0.02);
    let wide = diagnoser(V0FitterConfig {
        lambda_mass_cut: 0.05,
        ..V0FitterConfig::default()
    });
    let narrow = diagnoser(V0FitterConfig {
        lambda_mass_cut: 0.01,
        ..V0FitterConfig::default()
    });
    assert_eq!(
        wide.diagnose(&plus, &minus, &beamspot(), TargetParticle::AntiLambda),
        DiagnosticCode::Accepted
    );
    let code = narrow.diagnose(&plus, &minus, &beamspot(), TargetParticle::AntiLambda);
    assert_eq!(code, rejected(Rejection::AntiLambdaMassOutside));
    assert_eq!(code.code(), 21);
    // The Lambda branch needs the positive track to be the harder one.
    assert_eq!(
        wide.diagnose(&plus, &minus, &beamspot(), TargetParticle::Lambda),
        rejected(Rejection::Inconclusive)
    );
}

#[test]
fn failed_vertex_fit_is_reported_after_the_crossing_checks() {
    let (plus, minus) = kshort_pair(0.495);
    let code = edited(|_| None).diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort);
    assert_eq!(code, rejected(Rejection::VertexFitInvalid));
    assert_eq!(code.code(), 11);

    let (same, _) = kshort_pair(0.495);
    assert_eq!(
        edited(|_| None).diagnose(&plus, &same, &beamspot(), TargetParticle::KShort),
        rejected(Rejection::SameSign)
    );
}

#[test]
fn refitted_tracks_need_both_charge_signs() {
    let (plus, minus) = kshort_pair(0.495);
    let d = edited(|mut fit| {
        for track in &mut fit.refitted_tracks {
            track.charge = 1;
        }
        Some(fit)
    });
    let code = d.diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort);
    assert_eq!(code, rejected(Rejection::RefittedChargeMissing));
    assert_eq!(code.code(), 15);
}

#[test]
fn non_finite_vertex_momentum_invalidates_the_vertex_state() {
    let (plus, minus) = kshort_pair(0.495);
    let d = edited(|mut fit| {
        if let Some(track) = fit.refitted_tracks.first_mut() {
            track.momentum.x = f64::NAN;
        }
        Some(fit)
    });
    let code = d.diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort);
    assert_eq!(code, rejected(Rejection::VertexStateInvalid));
    assert_eq!(code.code(), 16);
}

#[test]
fn unedited_fit_through_a_custom_fitter_is_accepted() {
    let (plus, minus) = kshort_pair(0.495);
    assert_eq!(
        edited(Some).diagnose(&plus, &minus, &beamspot(), TargetParticle::KShort),
        DiagnosticCode::Accepted
    );
}
