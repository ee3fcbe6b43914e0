use approx::assert_relative_eq;
use comm::SingleProcess;
use nalgebra::{Point3, Vector3};

use crate::energy::EnergyLedger;
use crate::error::LifecycleError;
use crate::lifecycle::{Annulus, LifecycleStep, StepOutcome};
use crate::params::GravityParams;
use crate::particle::{Particle, ParticleId};
use crate::system::{ParticleSystem, ParticleView};

fn make_particle(id: u64, mass: f64, x: f64) -> Particle {
    Particle::new(ParticleId(id), mass, Point3::new(x, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0))
}

#[test]
fn test_step_merges_then_culls() {
    let mut survivor = make_particle(1, 1.0, 5.0);
    survivor.is_merged = true;
    let mut absorbed = make_particle(1, 1.0, 5.0);
    absorbed.is_dead = true;
    absorbed.velocity = Vector3::new(0.0, -1.0, 0.0);
    let mut system = ParticleSystem::from_particles(vec![
        make_particle(0, 0.5, 0.5),
        survivor,
        make_particle(2, 0.5, 3.0),
        absorbed,
        make_particle(3, 0.5, 500.0),
    ]);
    let mut ledger = EnergyLedger::new();
    let mut params = GravityParams::new(0.0, 0.01, 1.0);
    let mut log = Vec::new();

    let outcome = LifecycleStep::new(Annulus::new(1.0, 100.0))
        .with_collision_hint(1)
        .run(&mut system, &mut ledger, &mut params, &mut log, &SingleProcess)
        .unwrap();

    assert_eq!(
        outcome,
        StepOutcome {
            merged: 1,
            removed: 2,
            n_global: 2
        }
    );
    assert_relative_eq!(params.m_sun(), 1.5);
    assert_eq!(String::from_utf8(log).unwrap().lines().count(), 2);

    let ids: Vec<u64> = system.particles().iter().map(|p| p.id.0).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(system.particles()[0].mass, 2.0);
    // Merge loses 0.5 * 0.5 * 4, each cull takes 0.5 * 0.5 * 1 and the
    // culled pair gives back its mutual potential
    assert_relative_eq!(ledger.edisp, -1.0 - 0.25 - 0.25 - 0.25 / 499.5, epsilon = 1e-12);
}

#[test]
fn test_step_refreshes_ids_before_culling() {
    let mut particles: Vec<Particle> = (0..4)
        .map(|i| make_particle(i, 0.1, 2.0 + i as f64))
        .collect();
    for p in &mut particles {
        p.id_local = 99;
        p.myrank = 7;
        p.is_sent = true;
    }
    let mut system = ParticleSystem::from_particles(particles);

    LifecycleStep::new(Annulus::new(1.0, 100.0))
        .run(
            &mut system,
            &mut EnergyLedger::new(),
            &mut GravityParams::new(0.0, 0.01, 1.0),
            &mut Vec::<u8>::new(),
            &SingleProcess,
        )
        .unwrap();

    for (i, p) in system.particles().iter().enumerate() {
        assert_eq!(p.id_local, i);
        assert_eq!(p.myrank, 0);
        assert!(!p.is_sent);
    }
}

#[test]
fn test_merge_failure_skips_cull() {
    let mut lonely = make_particle(4, 1.0, 3.0);
    lonely.is_merged = true;
    let mut system = ParticleSystem::from_particles(vec![lonely, make_particle(5, 1.0, 0.1)]);
    let mut params = GravityParams::new(0.0, 0.01, 1.0);
    let mut log: Vec<u8> = Vec::new();

    let err = LifecycleStep::new(Annulus::new(1.0, 100.0))
        .run(&mut system, &mut EnergyLedger::new(), &mut params, &mut log, &SingleProcess)
        .unwrap_err();

    assert!(matches!(err, LifecycleError::MissingMergePartner { .. }));
    assert_eq!(system.local_count(), 2);
    assert_eq!(params.m_sun(), 1.0);
    assert!(log.is_empty());
}

#[test]
fn test_quiet_step_changes_nothing() {
    let particles = (0..3)
        .map(|i| make_particle(i, 0.2, 10.0 * (i + 1) as f64))
        .collect();
    let mut system = ParticleSystem::from_particles(particles);
    let mut ledger = EnergyLedger::new();
    let mut params = GravityParams::new(1e-6, 0.01, 1.0);

    let outcome = LifecycleStep::new(Annulus::new(1.0, 100.0))
        .run(&mut system, &mut ledger, &mut params, &mut Vec::<u8>::new(), &SingleProcess)
        .unwrap();

    assert_eq!(outcome.merged, 0);
    assert_eq!(outcome.removed, 0);
    assert_eq!(outcome.n_global, 3);
    assert_eq!(ledger, EnergyLedger::new());
}
