//! Ordered two-track V0 cut cascade with first-failure diagnostic codes.
//!
//! The stages mirror a V0 producer: charge checks, the closest approach of
//! the two trajectories, a geometric vertex fit, decay significance, pointing
//! angle and finally the mass hypothesis requested by the caller. Each stage
//! stores what later stages need in a [`PairContext`]; evaluation stops at
//! the first rejection.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sxq_core::kinematics::{energy, invariant_mass};
use sxq_core::particle::{KSHORT_MASS, LAMBDA_MASS, PION_MASS, PROTON_MASS};
use sxq_core::{BeamSpot, ErrorInfo, ReconstructedTrack, SxqError, Vec3};
use sxq_track::{
    build_fitter, closest_approach_in_rphi, Approach, FittedVertex, MagneticField,
    TransientTrack, VertexFitter,
};
use tracing::debug;

use crate::config::V0FitterConfig;
use crate::selection::select_track;

const SENSITIVE_RADIUS_CM: f64 = 120.0;
const SENSITIVE_HALF_LENGTH_CM: f64 = 300.0;

/// Particle the caller believes the pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetParticle {
    /// K-short to pi+ pi-.
    KShort,
    /// Lambda to p pi-.
    Lambda,
    /// Anti-Lambda to anti-p pi+.
    AntiLambda,
}

/// Reason a pair was rejected by the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Both tracks carry the same charge.
    SameSign,
    /// First track charge magnitude differs from one.
    FirstChargeNotUnit,
    /// Second track charge magnitude differs from one.
    SecondChargeNotUnit,
    /// No valid state at the closest approach to the beamspot.
    ImpactPointStateInvalid,
    /// Closest approach of the trajectories could not be computed.
    ClosestApproachFailed,
    /// Distance of closest approach above the ceiling.
    DcaTooLarge,
    /// Crossing point outside the sensitive volume.
    CrossingOutsideVolume,
    /// No valid state at the crossing point.
    CrossingStateInvalid,
    /// Momenta at the crossing point point away from each other.
    DivergingMomenta,
    /// Di-pion mass at the crossing point above the ceiling.
    PiPiMassTooHigh,
    /// Vertex fit did not converge.
    VertexFitInvalid,
    /// Vertex normalized chi-square above the ceiling.
    VertexChi2TooHigh,
    /// Transverse decay significance below the floor.
    DecaySignificanceXyTooLow,
    /// 3D decay significance below the floor.
    DecaySignificanceXyzTooLow,
    /// Refitted tracks lack one charge sign.
    RefittedChargeMissing,
    /// No valid state at the fitted vertex.
    VertexStateInvalid,
    /// Transverse pointing-angle cosine below the floor.
    CosThetaXyTooLow,
    /// 3D pointing-angle cosine below the floor.
    CosThetaXyzTooLow,
    /// K-short mass outside the window.
    KShortMassOutside,
    /// Lambda mass outside the window.
    LambdaMassOutside,
    /// Anti-Lambda mass outside the window.
    AntiLambdaMassOutside,
    /// The requested hypothesis was never evaluated.
    Inconclusive,
}

impl Rejection {
    /// Every rejection in cascade order.
    pub const ALL: [Rejection; 22] = [
        Rejection::SameSign,
        Rejection::FirstChargeNotUnit,
        Rejection::SecondChargeNotUnit,
        Rejection::ImpactPointStateInvalid,
        Rejection::ClosestApproachFailed,
        Rejection::DcaTooLarge,
        Rejection::CrossingOutsideVolume,
        Rejection::CrossingStateInvalid,
        Rejection::DivergingMomenta,
        Rejection::PiPiMassTooHigh,
        Rejection::VertexFitInvalid,
        Rejection::VertexChi2TooHigh,
        Rejection::DecaySignificanceXyTooLow,
        Rejection::DecaySignificanceXyzTooLow,
        Rejection::RefittedChargeMissing,
        Rejection::VertexStateInvalid,
        Rejection::CosThetaXyTooLow,
        Rejection::CosThetaXyzTooLow,
        Rejection::KShortMassOutside,
        Rejection::LambdaMassOutside,
        Rejection::AntiLambdaMassOutside,
        Rejection::Inconclusive,
    ];

    /// Stable numeric code, 1 through 22.
    pub fn code(self) -> i32 {
        match self {
            Rejection::SameSign => 1,
            Rejection::FirstChargeNotUnit => 2,
            Rejection::SecondChargeNotUnit => 3,
            Rejection::ImpactPointStateInvalid => 4,
            Rejection::ClosestApproachFailed => 5,
            Rejection::DcaTooLarge => 6,
            Rejection::CrossingOutsideVolume => 7,
            Rejection::CrossingStateInvalid => 8,
            Rejection::DivergingMomenta => 9,
            Rejection::PiPiMassTooHigh => 10,
            Rejection::VertexFitInvalid => 11,
            Rejection::VertexChi2TooHigh => 12,
            Rejection::DecaySignificanceXyTooLow => 13,
            Rejection::DecaySignificanceXyzTooLow => 14,
            Rejection::RefittedChargeMissing => 15,
            Rejection::VertexStateInvalid => 16,
            Rejection::CosThetaXyTooLow => 17,
            Rejection::CosThetaXyzTooLow => 18,
            Rejection::KShortMassOutside => 19,
            Rejection::LambdaMassOutside => 20,
            Rejection::AntiLambdaMassOutside => 21,
            Rejection::Inconclusive => 22,
        }
    }

    /// Inverse of [`Rejection::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    /// One-line description for listings.
    pub fn describe(self) -> &'static str {
        match self {
            Rejection::SameSign => "same-sign charge",
            Rejection::FirstChargeNotUnit => "|charge| != 1 for the first track",
            Rejection::SecondChargeNotUnit => "|charge| != 1 for the second track",
            Rejection::ImpactPointStateInvalid => "state closest to the beamspot invalid",
            Rejection::ClosestApproachFailed => "closest approach in r-phi failed",
            Rejection::DcaTooLarge => "distance of closest approach above tk_dca_cut",
            Rejection::CrossingOutsideVolume => "crossing point outside r <= 120, |z| <= 300",
            Rejection::CrossingStateInvalid => "state at the crossing point invalid",
            Rejection::DivergingMomenta => "momenta at the crossing point diverge",
            Rejection::PiPiMassTooHigh => "pi pi mass above m_pipi_cut",
            Rejection::VertexFitInvalid => "vertex fit invalid",
            Rejection::VertexChi2TooHigh => "vertex normalized chi2 above vtx_chi2_cut",
            Rejection::DecaySignificanceXyTooLow => "2D decay significance below floor",
            Rejection::DecaySignificanceXyzTooLow => "3D decay significance below floor",
            Rejection::RefittedChargeMissing => "refitted tracks missing a charge sign",
            Rejection::VertexStateInvalid => "state at the vertex invalid",
            Rejection::CosThetaXyTooLow => "2D pointing-angle cosine below floor",
            Rejection::CosThetaXyzTooLow => "3D pointing-angle cosine below floor",
            Rejection::KShortMassOutside => "K-short mass outside window",
            Rejection::LambdaMassOutside => "Lambda mass outside window",
            Rejection::AntiLambdaMassOutside => "anti-Lambda mass outside window",
            Rejection::Inconclusive => "requested hypothesis not evaluated",
        }
    }
}

/// Final verdict for a track pair, including the pair-level pre-selection
/// outcomes. Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum DiagnosticCode {
    /// The pair would have been reconstructed as the target.
    Accepted,
    /// The cascade rejected the pair.
    Rejected(Rejection),
    /// Both tracks failed pre-selection.
    BothTracksFailedSelection,
    /// Only the first track failed pre-selection.
    FirstTrackFailedSelection,
    /// Only the second track failed pre-selection.
    SecondTrackFailedSelection,
}

impl DiagnosticCode {
    /// Numeric code: 0 accepted, 1..=22 cascade stages, 50..=52 pre-selection.
    pub fn code(self) -> i32 {
        match self {
            DiagnosticCode::Accepted => 0,
            DiagnosticCode::Rejected(rejection) => rejection.code(),
            DiagnosticCode::BothTracksFailedSelection => 50,
            DiagnosticCode::FirstTrackFailedSelection => 51,
            DiagnosticCode::SecondTrackFailedSelection => 52,
        }
    }

    /// Inverse of [`DiagnosticCode::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(DiagnosticCode::Accepted),
            50 => Some(DiagnosticCode::BothTracksFailedSelection),
            51 => Some(DiagnosticCode::FirstTrackFailedSelection),
            52 => Some(DiagnosticCode::SecondTrackFailedSelection),
            other => Rejection::from_code(other).map(DiagnosticCode::Rejected),
        }
    }

    /// Whether the pair was accepted.
    pub fn is_accepted(self) -> bool {
        self == DiagnosticCode::Accepted
    }
}

impl From<DiagnosticCode> for i32 {
    fn from(code: DiagnosticCode) -> Self {
        code.code()
    }
}

impl TryFrom<i32> for DiagnosticCode {
    type Error = SxqError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        DiagnosticCode::from_code(code).ok_or_else(|| {
            SxqError::Serde(
                ErrorInfo::new("unknown-diagnostic-code", "no diagnostic carries this code")
                    .with_context("code", code.to_string()),
            )
        })
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCode::Accepted => write!(f, "0 accepted"),
            DiagnosticCode::Rejected(r) => write!(f, "{} {}", r.code(), r.describe()),
            DiagnosticCode::BothTracksFailedSelection => write!(f, "50 both tracks failed pre-selection"),
            DiagnosticCode::FirstTrackFailedSelection => write!(f, "51 first track failed pre-selection"),
            DiagnosticCode::SecondTrackFailedSelection => write!(f, "52 second track failed pre-selection"),
        }
    }
}

/// Outcome of one cascade stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageResult {
    /// Continue with the next stage.
    Pass,
    /// Stop with this rejection.
    Reject(Rejection),
}

impl From<Result<(), Rejection>> for StageResult {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => StageResult::Pass,
            Err(rejection) => StageResult::Reject(rejection),
        }
    }
}

/// Intermediate values shared between stages of one pair evaluation.
pub struct PairContext<'a> {
    cfg: &'a V0FitterConfig,
    fitter: &'a dyn VertexFitter,
    beamspot: &'a BeamSpot,
    target: TargetParticle,
    tracks: [TransientTrack<'a>; 2],
    positive: usize,
    approach: Option<Approach>,
    crossing_momenta: Option<(Vec3, Vec3)>,
    fitted: Option<FittedVertex>,
    refitted_momenta: Option<(Vec3, Vec3)>,
    vertex_momenta: Option<(Vec3, Vec3)>,
}

impl<'a> PairContext<'a> {
    fn positive(&self) -> &TransientTrack<'a> {
        &self.tracks[self.positive]
    }

    fn negative(&self) -> &TransientTrack<'a> {
        &self.tracks[1 - self.positive]
    }

    fn fitted(&self) -> Result<&FittedVertex, Rejection> {
        self.fitted.as_ref().ok_or(Rejection::VertexFitInvalid)
    }

    fn displacement(&self) -> Result<Vec3, Rejection> {
        Ok(self.fitted()?.position - self.beamspot.position)
    }
}

type StageFn = fn(&mut PairContext<'_>) -> Result<(), Rejection>;

struct Stage {
    name: &'static str,
    check: StageFn,
}

const STAGES: &[Stage] = &[
    Stage { name: "opposite_charge", check: opposite_charge },
    Stage { name: "unit_charge", check: unit_charge },
    Stage { name: "impact_point_state", check: impact_point_state },
    Stage { name: "closest_approach", check: closest_approach },
    Stage { name: "dca", check: dca },
    Stage { name: "sensitive_volume", check: sensitive_volume },
    Stage { name: "crossing_state", check: crossing_state },
    Stage { name: "converging_momenta", check: converging_momenta },
    Stage { name: "pipi_mass", check: pipi_mass },
    Stage { name: "vertex_fit", check: vertex_fit },
    Stage { name: "vertex_chi2", check: vertex_chi2 },
    Stage { name: "decay_significance_xy", check: decay_significance_xy },
    Stage { name: "decay_significance_xyz", check: decay_significance_xyz },
    Stage { name: "refitted_tracks", check: refitted_tracks },
    Stage { name: "vertex_state", check: vertex_state },
    Stage { name: "pointing_xy", check: pointing_xy },
    Stage { name: "pointing_xyz", check: pointing_xyz },
    Stage { name: "mass_hypothesis", check: mass_hypothesis },
];

/// Names of the cascade stages in evaluation order.
pub fn stage_names() -> impl Iterator<Item = &'static str> {
    STAGES.iter().map(|stage| stage.name)
}

fn opposite_charge(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    if ctx.tracks[0].charge() == ctx.tracks[1].charge() {
        return Err(Rejection::SameSign);
    }
    Ok(())
}

fn unit_charge(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    if ctx.tracks[0].charge().abs() != 1 {
        return Err(Rejection::FirstChargeNotUnit);
    }
    if ctx.tracks[1].charge().abs() != 1 {
        return Err(Rejection::SecondChargeNotUnit);
    }
    ctx.positive = if ctx.tracks[0].charge() > 0 { 0 } else { 1 };
    Ok(())
}

fn impact_point_state(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let at = ctx.beamspot.position;
    ctx.positive()
        .state_closest_to(&at)
        .and(ctx.negative().state_closest_to(&at))
        .map(|_| ())
        .ok_or(Rejection::ImpactPointStateInvalid)
}

fn closest_approach(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let approach = match (ctx.positive().helix(), ctx.negative().helix()) {
        (Some(pos), Some(neg)) => closest_approach_in_rphi(pos, neg),
        _ => None,
    };
    ctx.approach = Some(approach.ok_or(Rejection::ClosestApproachFailed)?);
    Ok(())
}

fn crossing_point(ctx: &PairContext<'_>) -> Result<Vec3, Rejection> {
    ctx.approach
        .as_ref()
        .map(Approach::crossing_point)
        .ok_or(Rejection::ClosestApproachFailed)
}

fn dca(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let distance = ctx
        .approach
        .as_ref()
        .map(Approach::distance)
        .ok_or(Rejection::ClosestApproachFailed)?;
    if distance > ctx.cfg.tk_dca_cut {
        return Err(Rejection::DcaTooLarge);
    }
    Ok(())
}

fn sensitive_volume(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let x = crossing_point(ctx)?;
    if x.x.hypot(x.y) > SENSITIVE_RADIUS_CM || x.z.abs() > SENSITIVE_HALF_LENGTH_CM {
        return Err(Rejection::CrossingOutsideVolume);
    }
    Ok(())
}

fn crossing_state(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let x = crossing_point(ctx)?;
    let pos = ctx.positive().state_closest_to(&x);
    let neg = ctx.negative().state_closest_to(&x);
    match (pos, neg) {
        (Some(pos), Some(neg)) => {
            ctx.crossing_momenta = Some((pos.momentum, neg.momentum));
            Ok(())
        }
        _ => Err(Rejection::CrossingStateInvalid),
    }
}

fn converging_momenta(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let (pos, neg) = ctx.crossing_momenta.ok_or(Rejection::CrossingStateInvalid)?;
    if pos.dot(&neg) < 0.0 {
        return Err(Rejection::DivergingMomenta);
    }
    Ok(())
}

fn pipi_mass(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let (pos, neg) = ctx.crossing_momenta.ok_or(Rejection::CrossingStateInvalid)?;
    let total_e = energy(&pos, PION_MASS) + energy(&neg, PION_MASS);
    if invariant_mass(total_e, &(pos + neg)) > ctx.cfg.m_pipi_cut {
        return Err(Rejection::PiPiMassTooHigh);
    }
    Ok(())
}

fn vertex_fit(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let ordered = [ctx.positive().clone(), ctx.negative().clone()];
    ctx.fitted = Some(ctx.fitter.vertex(&ordered).ok_or(Rejection::VertexFitInvalid)?);
    Ok(())
}

fn vertex_chi2(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    if ctx.fitted()?.normalized_chi2() > ctx.cfg.vtx_chi2_cut {
        return Err(Rejection::VertexChi2TooHigh);
    }
    Ok(())
}

/// `|d| / (sqrt(d^T C d) / |d|)` with C the beamspot plus vertex covariance.
fn decay_significance(ctx: &PairContext<'_>, d: &Vec3) -> Result<f64, Rejection> {
    let total = ctx.beamspot.covariance + ctx.fitted()?.covariance;
    let magnitude = d.norm();
    let sigma = (d.transpose() * total * d)[(0, 0)].sqrt() / magnitude;
    Ok(magnitude / sigma)
}

fn decay_significance_xy(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let mut d = ctx.displacement()?;
    d.z = 0.0;
    let significance = decay_significance(ctx, &d)?;
    if !(significance >= ctx.cfg.vtx_decay_sig_xy_cut) {
        return Err(Rejection::DecaySignificanceXyTooLow);
    }
    Ok(())
}

fn decay_significance_xyz(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let d = ctx.displacement()?;
    let significance = decay_significance(ctx, &d)?;
    if !(significance >= ctx.cfg.vtx_decay_sig_xyz_cut) {
        return Err(Rejection::DecaySignificanceXyzTooLow);
    }
    Ok(())
}

fn refitted_tracks(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let fitted = ctx.fitted()?;
    if !ctx.cfg.effective_refitted_tracks() || fitted.refitted_tracks.len() <= 1 {
        return Ok(());
    }
    let mut positive = None;
    let mut negative = None;
    for track in &fitted.refitted_tracks {
        if track.charge > 0 {
            positive = Some(track.momentum);
        } else if track.charge < 0 {
            negative = Some(track.momentum);
        }
    }
    match (positive, negative) {
        (Some(pos), Some(neg)) => {
            ctx.refitted_momenta = Some((pos, neg));
            Ok(())
        }
        _ => Err(Rejection::RefittedChargeMissing),
    }
}

fn vertex_state(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let momenta = match ctx.refitted_momenta {
        Some(momenta) => Some(momenta),
        None => {
            let at = ctx.fitted()?.position;
            let pos = ctx.positive().state_closest_to(&at);
            let neg = ctx.negative().state_closest_to(&at);
            pos.zip(neg).map(|(p, n)| (p.momentum, n.momentum))
        }
    };
    let momenta = momenta
        .filter(|(p, n)| p.iter().chain(n.iter()).all(|c| c.is_finite()))
        .ok_or(Rejection::VertexStateInvalid)?;
    ctx.vertex_momenta = Some(momenta);
    Ok(())
}

fn total_momentum(ctx: &PairContext<'_>) -> Result<Vec3, Rejection> {
    ctx.vertex_momenta
        .map(|(p, n)| p + n)
        .ok_or(Rejection::VertexStateInvalid)
}

fn pointing_xy(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let d = ctx.displacement()?;
    let p = total_momentum(ctx)?;
    let cos = (d.x * p.x + d.y * p.y) / (d.x.hypot(d.y) * p.x.hypot(p.y));
    if !(cos >= ctx.cfg.cos_theta_xy_cut) {
        return Err(Rejection::CosThetaXyTooLow);
    }
    Ok(())
}

fn pointing_xyz(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let d = ctx.displacement()?;
    let p = total_momentum(ctx)?;
    let cos = d.dot(&p) / (d.norm() * p.norm());
    if !(cos >= ctx.cfg.cos_theta_xyz_cut) {
        return Err(Rejection::CosThetaXyzTooLow);
    }
    Ok(())
}

/// Open window `nominal - half_width < mass < nominal + half_width`.
fn in_window(mass: f64, nominal: f64, half_width: f64) -> bool {
    mass < nominal + half_width && mass > nominal - half_width
}

fn mass_hypothesis(ctx: &mut PairContext<'_>) -> Result<(), Rejection> {
    let (pos, neg) = ctx.vertex_momenta.ok_or(Rejection::VertexStateInvalid)?;
    let total = pos + neg;
    let pi_plus_e = energy(&pos, PION_MASS);
    let pi_minus_e = energy(&neg, PION_MASS);
    let proton_e = energy(&pos, PROTON_MASS);
    let anti_proton_e = energy(&neg, PROTON_MASS);

    if ctx.cfg.do_kshorts && ctx.target == TargetParticle::KShort {
        let mass = invariant_mass(pi_plus_e + pi_minus_e, &total);
        return if in_window(mass, KSHORT_MASS, ctx.cfg.kshort_mass_cut) {
            Ok(())
        } else {
            Err(Rejection::KShortMassOutside)
        };
    }
    if ctx.cfg.do_lambdas {
        if pos.norm_squared() > neg.norm_squared() {
            if ctx.target == TargetParticle::Lambda {
                let mass = invariant_mass(proton_e + pi_minus_e, &total);
                return if in_window(mass, LAMBDA_MASS, ctx.cfg.lambda_mass_cut) {
                    Ok(())
                } else {
                    Err(Rejection::LambdaMassOutside)
                };
            }
        } else if ctx.target == TargetParticle::AntiLambda {
            let mass = invariant_mass(anti_proton_e + pi_plus_e, &total);
            return if in_window(mass, LAMBDA_MASS, ctx.cfg.lambda_mass_cut) {
                Ok(())
            } else {
                Err(Rejection::AntiLambdaMassOutside)
            };
        }
    }
    Err(Rejection::Inconclusive)
}

/// Re-runs the V0 reconstruction on a single track pair and reports the
/// first stage that rejected it.
pub struct V0Diagnoser {
    cfg: V0FitterConfig,
    field: Arc<dyn MagneticField>,
    fitter: Box<dyn VertexFitter>,
}

impl fmt::Debug for V0Diagnoser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("V0Diagnoser").field("cfg", &self.cfg).finish_non_exhaustive()
    }
}

impl V0Diagnoser {
    /// Builds a diagnoser with the fitter selected by `cfg`.
    pub fn new(cfg: V0FitterConfig, field: Arc<dyn MagneticField>) -> Self {
        let fitter = build_fitter(cfg.vertex_fitter, cfg.effective_refitted_tracks());
        Self { cfg, field, fitter }
    }

    /// Builds a diagnoser around a caller-supplied fitter.
    pub fn with_fitter(
        cfg: V0FitterConfig,
        field: Arc<dyn MagneticField>,
        fitter: Box<dyn VertexFitter>,
    ) -> Self {
        Self { cfg, field, fitter }
    }

    /// Active configuration.
    pub fn config(&self) -> &V0FitterConfig {
        &self.cfg
    }

    /// Runs the cascade on `first` and `second` for the `target` hypothesis.
    pub fn diagnose(
        &self,
        first: &ReconstructedTrack,
        second: &ReconstructedTrack,
        beamspot: &BeamSpot,
        target: TargetParticle,
    ) -> DiagnosticCode {
        let field = self.field.as_ref();
        let mut ctx = PairContext {
            cfg: &self.cfg,
            fitter: self.fitter.as_ref(),
            beamspot,
            target,
            tracks: [TransientTrack::new(first, field), TransientTrack::new(second, field)],
            positive: 0,
            approach: None,
            crossing_momenta: None,
            fitted: None,
            refitted_momenta: None,
            vertex_momenta: None,
        };
        for stage in STAGES {
            if let StageResult::Reject(rejection) = StageResult::from((stage.check)(&mut ctx)) {
                debug!(
                    stage = stage.name,
                    code = rejection.code(),
                    ?target,
                    "v0 pair rejected"
                );
                return DiagnosticCode::Rejected(rejection);
            }
        }
        debug!(?target, "v0 pair accepted");
        DiagnosticCode::Accepted
    }

    /// Applies pre-selection to both tracks before running the cascade.
    ///
    /// A pair with a failing track cannot be accepted, so the cascade is
    /// skipped and a pair-level code is returned instead.
    pub fn diagnose_pair(
        &self,
        first: &ReconstructedTrack,
        second: &ReconstructedTrack,
        beamspot: &BeamSpot,
        target: TargetParticle,
    ) -> DiagnosticCode {
        let first_ok = select_track(first, beamspot, &self.cfg).passed();
        let second_ok = select_track(second, beamspot, &self.cfg).passed();
        match (first_ok, second_ok) {
            (false, false) => DiagnosticCode::BothTracksFailedSelection,
            (false, true) => DiagnosticCode::FirstTrackFailedSelection,
            (true, false) => DiagnosticCode::SecondTrackFailedSelection,
            (true, true) => self.diagnose(first, second, beamspot, target),
        }
    }
}
