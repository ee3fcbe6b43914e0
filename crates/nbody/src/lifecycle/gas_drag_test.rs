use approx::assert_relative_eq;
use comm::SingleProcess;
use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use crate::energy::EnergyLedger;
use crate::lifecycle::gas_drag::correct_energy_for_gas;
use crate::params::GravityParams;
use crate::system::{ParticleSystem, ParticleView};

fn dragged_system() -> ParticleSystem {
    let mut system = ParticleSystem::new();
    system.add_particle(1.0, Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
    system.add_particle(0.5, Point3::new(0.0, 2.0, 0.0), Vector3::new(-0.7, 0.0, 0.1));
    let particles = system.particles_mut();
    particles[0].acc_gd = Vector3::new(0.0, -0.1, 0.0);
    particles[1].acc_gd = Vector3::new(0.2, 0.0, -0.05);
    system
}

#[test]
fn test_zero_timestep_nets_zero() {
    let system = dragged_system();
    let params = GravityParams::new(0.0, 0.0, 1.0);
    let mut ledger = EnergyLedger::new();

    correct_energy_for_gas(&system, &mut ledger, &params, false, &SingleProcess);
    correct_energy_for_gas(&system, &mut ledger, &params, true, &SingleProcess);

    assert_eq!(ledger.edisp_gd, 0.0);
}

#[test]
fn test_single_half_kick() {
    let mut system = ParticleSystem::new();
    system.add_particle(2.0, Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
    system.particles_mut()[0].acc_gd = Vector3::new(0.0, -0.5, 0.0);
    let params = GravityParams::new(0.0, 0.1, 1.0);
    let mut ledger = EnergyLedger {
        edisp: -3.0,
        edisp_gd: 1.0,
    };

    let de = correct_energy_for_gas(&system, &mut ledger, &params, false, &SingleProcess);

    // 0.5 * 0.1 * 2 * (-0.5) * (1 + 0.25 * (-0.5) * 0.1)
    let expected = 0.05 * 2.0 * -0.5 * (1.0 - 0.0125);
    assert_relative_eq!(de, expected, epsilon = 1e-15);
    assert_relative_eq!(ledger.edisp_gd, 1.0 + expected, epsilon = 1e-15);
    assert_eq!(ledger.edisp, -3.0);
}

#[test]
fn test_second_half_flips_quadratic_term() {
    let mut system = ParticleSystem::new();
    system.add_particle(1.0, Point3::new(1.0, 0.0, 0.0), Vector3::zeros());
    system.particles_mut()[0].acc_gd = Vector3::new(2.0, 0.0, 0.0);
    let params = GravityParams::new(0.0, 0.5, 1.0);

    let mut ledger = EnergyLedger::new();
    let first = correct_energy_for_gas(&system, &mut ledger, &params, false, &SingleProcess);
    let second = correct_energy_for_gas(&system, &mut ledger, &params, true, &SingleProcess);

    // At rest only the a² dt term survives, with opposite signs
    assert_relative_eq!(first, 0.25 * 1.0 * 4.0 * 0.25 * 0.5);
    assert_relative_eq!(second, -first);
}

#[test]
fn test_both_halves_leave_velocity_term() {
    let mut rng = ChaChaRng::seed_from_u64(11);
    let mut system = ParticleSystem::new();
    for _ in 0..64 {
        let v = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-0.1..0.1),
        );
        system.add_particle(rng.gen_range(0.01..1.0), Point3::new(1.0, 0.0, 0.0), v);
    }
    for p in system.particles_mut() {
        p.acc_gd = -p.velocity * rng.gen_range(0.0..0.2);
    }
    let params = GravityParams::new(0.0, 0.03, 1.0);
    let mut ledger = EnergyLedger::new();

    correct_energy_for_gas(&system, &mut ledger, &params, false, &SingleProcess);
    correct_energy_for_gas(&system, &mut ledger, &params, true, &SingleProcess);

    let velocity_work: f64 = system
        .particles()
        .iter()
        .map(|p| p.mass * p.acc_gd.dot(&p.velocity))
        .sum();
    assert_relative_eq!(ledger.edisp_gd, params.dt_tree * velocity_work, epsilon = 1e-12);
    // Drag opposing the motion only removes energy
    assert!(ledger.edisp_gd < 0.0);
}
