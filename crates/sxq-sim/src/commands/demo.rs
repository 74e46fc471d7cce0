use std::error::Error;
use std::f64::consts::PI;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sxq_core::kinematics::energy;
use sxq_core::particle::{
    KSHORT_MASS, LAMBDA_MASS, NEUTRON_MASS, PDG_ANTI_LAMBDA, PDG_ANTI_PROTON, PDG_ANTI_S, PDG_KSHORT,
    PDG_PI_MINUS, PDG_PI_PLUS, PION_MASS, PROTON_MASS,
};
use sxq_core::serde::to_canonical_json_string;
use sxq_core::{
    BeamSpot, CompositeVertexCandidate, Cov3, ReconstructedTrack, TruthParticle, Vec3, VertexRef,
};
use sxq_eval::{Analyzer, AnalyzerConfig, EventInput};

use super::analyze::analyze_events;

const ANTI_S_MASS: f64 = 1.8;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Seed for event generation.
    #[arg(long, default_value_t = 2024)]
    pub seed: u64,
    /// Number of events to generate.
    #[arg(long, default_value_t = 10)]
    pub events: usize,
    /// Output directory for the generated events, records and summary.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &DemoArgs) -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let events: Vec<EventInput> = (0..args.events as u64)
        .map(|event| synthetic_event(&mut rng, event))
        .collect();

    fs::create_dir_all(&args.out)?;
    let mut file = BufWriter::new(fs::File::create(args.out.join("events.jsonl"))?);
    for event in &events {
        writeln!(file, "{}", to_canonical_json_string(event)?)?;
    }
    file.flush()?;

    let analyzer = Analyzer::new(AnalyzerConfig::default())?;
    let summary = analyze_events(&analyzer, &events, &args.out)?;
    println!("{}", to_canonical_json_string(&summary)?);
    Ok(())
}

fn isotropic(rng: &mut StdRng) -> Vec3 {
    let cos_theta: f64 = rng.gen_range(-1.0..1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let phi: f64 = rng.gen_range(-PI..PI);
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Splits a parent of momentum `p` and mass `m` into two daughters with an
/// isotropic rest-frame direction.
fn two_body(rng: &mut StdRng, p: &Vec3, m: f64, m1: f64, m2: f64) -> (Vec3, Vec3) {
    let q2 = (m * m - (m1 + m2).powi(2)) * (m * m - (m1 - m2).powi(2));
    let q = q2.max(0.0).sqrt() / (2.0 * m);
    let rest = isotropic(rng) * q;
    let e_parent = energy(p, m);
    let boost = |k: Vec3, mass: f64| -> Vec3 {
        let norm = p.norm();
        if norm == 0.0 {
            return k;
        }
        let n = p / norm;
        let gamma = e_parent / m;
        let beta = norm / e_parent;
        let along = k.dot(&n);
        k + n * ((gamma - 1.0) * along + gamma * beta * energy(&k, mass))
    };
    (boost(rest, m1), boost(-rest, m2))
}

fn smear(rng: &mut StdRng, v: &Vec3, width: f64) -> Vec3 {
    v + Vec3::new(
        rng.gen_range(-width..width),
        rng.gen_range(-width..width),
        rng.gen_range(-width..width),
    )
}

fn candidate(rng: &mut StdRng, p: &Vec3, vertex: &Vec3, mass: f64, charge: i32) -> CompositeVertexCandidate {
    CompositeVertexCandidate {
        momentum: smear(rng, p, 0.005),
        mass,
        vertex: smear(rng, vertex, 0.05),
        vertex_covariance: Cov3::from_diagonal(&Vec3::new(0.0025, 0.0025, 0.0025)),
        charge,
        pdg_id: 0,
    }
}

struct Generated {
    truth: Vec<TruthParticle>,
    next_hit: u64,
}

impl Generated {
    fn push(
        &mut self,
        pdg_id: i32,
        charge: i32,
        momentum: Vec3,
        mass: f64,
        production: VertexRef,
        decay: Option<VertexRef>,
    ) -> usize {
        let hits = if charge == 0 { 0 } else { 12 };
        let sim_hits = (self.next_hit..self.next_hit + hits).collect();
        self.next_hit += hits;
        self.truth.push(TruthParticle {
            pdg_id,
            charge,
            momentum,
            mass,
            production_vertex: production,
            decay_vertices: decay.into_iter().collect(),
            tracker_hits: hits as u32,
            sim_hits,
        });
        self.truth.len() - 1
    }
}

fn synthetic_event(rng: &mut StdRng, event: u64) -> EventInput {
    let mut builder = Generated {
        truth: Vec::new(),
        next_hit: 1,
    };
    let direction = isotropic(rng);
    let speed: f64 = rng.gen_range(1.0..6.0);
    let anti_s_p = direction * speed;
    let radius: f64 = rng.gen_range(2.2..6.0);
    let transverse = direction.x.hypot(direction.y);
    let ip = direction * (radius / transverse.max(0.1));

    let origin = VertexRef::with_id(Vec3::zeros(), event * 10 + 1);
    let ip_ref = VertexRef::with_id(ip, event * 10 + 2);
    builder.push(PDG_ANTI_S, 0, anti_s_p, ANTI_S_MASS, origin, Some(ip_ref.clone()));

    // The anti-S annihilates on a neutron at rest.
    let system_e = energy(&anti_s_p, ANTI_S_MASS) + NEUTRON_MASS;
    let system_m = (system_e * system_e - anti_s_p.norm_squared()).sqrt();
    let (ks_p, lambda_p) = two_body(rng, &anti_s_p, system_m, KSHORT_MASS, LAMBDA_MASS);

    let ks_flight: f64 = rng.gen_range(1.0..15.0);
    let lambda_flight: f64 = rng.gen_range(2.0..25.0);
    let ks_decay = ip + ks_p.normalize() * ks_flight;
    let lambda_decay = ip + lambda_p.normalize() * lambda_flight;
    let ks_ref = VertexRef::with_id(ks_decay, event * 10 + 3);
    let lambda_ref = VertexRef::with_id(lambda_decay, event * 10 + 4);
    builder.push(PDG_KSHORT, 0, ks_p, KSHORT_MASS, ip_ref.clone(), Some(ks_ref.clone()));
    builder.push(PDG_ANTI_LAMBDA, 0, lambda_p, LAMBDA_MASS, ip_ref, Some(lambda_ref.clone()));

    let (pi_plus, pi_minus) = two_body(rng, &ks_p, KSHORT_MASS, PION_MASS, PION_MASS);
    let (lambda_pi, anti_proton) = two_body(rng, &lambda_p, LAMBDA_MASS, PION_MASS, PROTON_MASS);
    let granddaughters = [
        builder.push(PDG_PI_PLUS, 1, pi_plus, PION_MASS, ks_ref.clone(), None),
        builder.push(PDG_PI_MINUS, -1, pi_minus, PION_MASS, ks_ref, None),
        builder.push(PDG_PI_PLUS, 1, lambda_pi, PION_MASS, lambda_ref.clone(), None),
        builder.push(PDG_ANTI_PROTON, -1, anti_proton, PROTON_MASS, lambda_ref, None),
    ];

    let mut tracks = Vec::new();
    for idx in granddaughters {
        if !rng.gen_bool(0.9) {
            continue;
        }
        let p = &builder.truth[idx];
        tracks.push(ReconstructedTrack {
            charge: p.charge,
            momentum: smear(rng, &p.momentum, 0.01),
            reference_point: smear(rng, p.vertex(), 0.01),
            chi2: rng.gen_range(5.0..20.0),
            ndof: 12.0,
            valid_hits: 12,
            dxy_error: 0.01,
            dz_error: 0.02,
            hit_ids: p.sim_hits.clone(),
        });
    }

    let kshorts = vec![candidate(rng, &ks_p, &ks_decay, KSHORT_MASS, 0)];
    let anti_lambdas = vec![candidate(rng, &lambda_p, &lambda_decay, LAMBDA_MASS, 0)];
    let anti_s_candidates = vec![candidate(rng, &(ks_p + lambda_p), &ip, system_m, -1)];

    EventInput {
        event,
        truth: builder.truth,
        tracks,
        kshorts: Some(kshorts),
        anti_lambdas: Some(anti_lambdas),
        anti_s: Some(anti_s_candidates),
        beamspot: Some(BeamSpot::new(Vec3::zeros(), Vec3::new(0.002, 0.002, 3.5))),
        association: None,
        n_good_pv: 1,
    }
}
