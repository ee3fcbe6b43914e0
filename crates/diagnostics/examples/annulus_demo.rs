//! Runs the lifecycle bookkeeping on a toy ring of bodies split over
//! in-process ranks.
//!
//! ```text
//! cargo run -p diagnostics --example annulus_demo [config.json]
//! RUST_LOG=debug cargo run -p diagnostics --example annulus_demo
//! ```
//!
//! The "dynamics" are a plain Kepler kick-drift around the central mass;
//! the point is the merge, cull and output sequence every rank runs.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use comm::{Communicator, ThreadComm};
use diagnostics::{output_step, SnapshotTarget, StepSummary};
use nalgebra::{Point3, Vector3};
use nbody::config::SimulationConfig;
use nbody::lifecycle::{correct_energy_for_gas, LifecycleStep};
use nbody::{
    Energy, EnergyLedger, GravityParams, Particle, ParticleId, ParticleSystem, ParticleView,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const N_PER_RANK: usize = 200;
const N_STEPS: u64 = 40;
/// Ids of different ranks never collide
const ID_STRIDE: u64 = 1_000_000;

fn load_config() -> Result<SimulationConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            SimulationConfig::load(&path).with_context(|| format!("loading {path}"))
        }
        None => {
            let mut config = SimulationConfig::with_bounds(0.5, 8.0);
            config.m_sun = 1.0;
            config.eps2 = 1e-6;
            config.dt_tree = 0.01;
            config.snapshot_interval = 10;
            config.n_ranks = 2;
            config.gas_drag = true;
            config.output_dir = std::env::temp_dir().join("annulus_demo");
            config.validate()?;
            Ok(config)
        }
    }
}

/// A thin ring between 0.4 and 9, so some bodies start outside the annulus
fn initial_ring(config: &SimulationConfig, rank: usize) -> ParticleSystem {
    let mut rng = ChaChaRng::seed_from_u64(config.seed + rank as u64);
    let particles = (0..N_PER_RANK)
        .map(|i| {
            let r: f64 = rng.gen_range(0.4..9.0);
            let theta = rng.gen_range(0.0..std::f64::consts::TAU);
            let v_circ = (config.m_sun / r).sqrt();
            let z = rng.gen_range(-0.01..0.01);
            let position = Point3::new(r * theta.cos(), r * theta.sin(), z);
            let velocity = Vector3::new(-v_circ * theta.sin(), v_circ * theta.cos(), 0.0);
            let id = rank as u64 * ID_STRIDE + i as u64;
            Particle::new(ParticleId(id), rng.gen_range(1e-7..1e-5), position, velocity)
        })
        .collect();
    ParticleSystem::from_particles(particles)
}

/// Kick-drift in the central field, storing the central potential
fn advance(system: &mut ParticleSystem, params: &GravityParams, time: f64) {
    let dt = params.dt_tree;
    for p in system.particles_mut() {
        let r2 = p.radius_squared() + params.eps2;
        let r = r2.sqrt();
        let acc = -p.position.coords * (params.m_sun() / (r2 * r));
        p.velocity += (acc + p.acc_gd) * dt;
        p.position += p.velocity * dt;
        p.phi_s = -params.m_sun() / (p.radius_squared() + params.eps2).sqrt();
        p.time = time;
    }
}

/// Stand-in for the collision solver: the first two bodies of the rank collide
fn fake_collision(system: &mut ParticleSystem) {
    let particles = system.particles_mut();
    if particles.len() < 2 {
        return;
    }
    let (survivor, rest) = particles.split_at_mut(1);
    survivor[0].is_merged = true;
    rest[0].id = survivor[0].id;
    rest[0].position = survivor[0].position;
    rest[0].is_dead = true;
}

/// Root-only output streams
struct OutputLogs {
    removal: BufWriter<File>,
    energy: BufWriter<File>,
}

impl OutputLogs {
    /// Creates the output directory, records the effective configuration
    /// and opens both logs
    fn create(config: &SimulationConfig) -> Result<Self> {
        let dir = &config.output_dir;
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        fs::write(dir.join("config.json"), serde_json::to_string_pretty(config)?)?;
        Ok(Self {
            removal: BufWriter::new(File::create(dir.join("removed.dat"))?),
            energy: BufWriter::new(File::create(dir.join("energy.dat"))?),
        })
    }
}

fn run_rank(comm: ThreadComm, config: &SimulationConfig, logs: Option<OutputLogs>) -> Result<()> {
    let rank = comm.rank();
    let mut system = initial_ring(config, rank);
    let mut params = config.gravity_params();
    let mut ledger = EnergyLedger::new();
    let step = LifecycleStep::new(config.bounds()).with_collision_hint(1);

    let (mut removal_log, mut energy_log): (Box<dyn Write>, Box<dyn Write>) = match logs {
        Some(logs) => (Box::new(logs.removal), Box::new(logs.energy)),
        None => (Box::new(io::sink()), Box::new(io::sink())),
    };

    // Bodies that start outside the annulus are culled before anything is measured
    step.run(&mut system, &mut ledger, &mut params, &mut removal_log, &comm)?;
    let e_init = Energy::measure(&system, &ledger, &comm);

    for istep in 1..=N_STEPS {
        let time = istep as f64 * params.dt_tree;

        if config.gas_drag {
            for p in system.particles_mut() {
                p.acc_gd = -p.velocity * 0.01;
            }
            correct_energy_for_gas(&system, &mut ledger, &params, false, &comm);
        }
        advance(&mut system, &params, time);
        if config.gas_drag {
            correct_energy_for_gas(&system, &mut ledger, &params, true, &comm);
        }

        if istep % 15 == 0 && rank == 1 {
            fake_collision(&mut system);
        }
        let outcome = step.run(&mut system, &mut ledger, &mut params, &mut removal_log, &comm)?;
        if comm.is_root() && (outcome.merged > 0 || outcome.removed > 0) {
            tracing::info!(istep, ?outcome, m_sun = params.m_sun(), "lifecycle events");
        }

        let e_now = Energy::measure(&system, &ledger, &comm);
        let id_next = comm.max_u64(system.next_id());
        let summary = StepSummary {
            time,
            e_init,
            e_now,
            delta_e: e_now.relative_error(&e_init),
            id_next,
            ..StepSummary::default()
        };
        let target = config.is_snapshot_step(istep).then(|| SnapshotTarget {
            dir: config.output_dir.clone(),
            index: istep / config.snapshot_interval,
        });
        output_step(
            &system,
            &summary,
            &config.output,
            target.as_ref(),
            &mut energy_log,
            &comm,
        )?;
    }

    let n_global = system.global_count(&comm);
    removal_log.flush()?;
    if comm.is_root() {
        tracing::info!(
            n_global,
            edisp = ledger.edisp,
            edisp_gd = ledger.edisp_gd,
            "done, output in {}",
            config.output_dir.display()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    tracing::info!(
        n_ranks = config.n_ranks,
        r_min = config.r_min,
        r_max = config.r_max,
        "starting annulus demo"
    );

    // Opened before any rank starts, so a failure here never strands a rank
    // inside a collective
    let mut logs = Some(OutputLogs::create(&config)?);
    let ranks = ThreadComm::create(config.n_ranks);
    let config = &config;
    std::thread::scope(|s| {
        let handles: Vec<_> = ranks
            .into_iter()
            .map(|comm| {
                let logs = if comm.is_root() { logs.take() } else { None };
                s.spawn(move || run_rank(comm, config, logs))
            })
            .collect();
        handles
            .into_iter()
            .try_for_each(|h| h.join().map_err(|_| anyhow::anyhow!("rank thread panicked"))?)
    })
}
