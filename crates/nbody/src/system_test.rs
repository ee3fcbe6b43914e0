use comm::SingleProcess;
use nalgebra::{Point3, Vector3};

use crate::particle::{Particle, ParticleId};
use crate::system::{ParticleSystem, ParticleView};

fn make_system(n: usize) -> ParticleSystem {
    let mut system = ParticleSystem::new();
    for i in 0..n {
        system.add_particle(
            1.0 + i as f64,
            Point3::new(1.0 + i as f64, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        );
    }
    system
}

fn ids(system: &ParticleSystem) -> Vec<u64> {
    system.particles().iter().map(|p| p.id.0).collect()
}

#[test]
fn test_add_particle_assigns_sequential_ids() {
    let system = make_system(3);

    assert_eq!(ids(&system), vec![0, 1, 2]);
    assert_eq!(system.next_id(), 3);
}

#[test]
fn test_push_keeps_id_and_advances_next_id() {
    let mut system = make_system(1);
    system.push(Particle::new(ParticleId(20), 1.0, Point3::origin(), Vector3::zeros()));

    assert_eq!(system.next_id(), 21);
    assert!(system.find(ParticleId(20)).is_some());
}

#[test]
fn test_remove_sorted_compacts_in_order() {
    let mut system = make_system(6);

    system.remove_sorted(&[0, 2, 5]);

    assert_eq!(ids(&system), vec![1, 3, 4]);
    assert_eq!(system.local_count(), 3);
}

#[test]
fn test_remove_sorted_empty_is_noop() {
    let mut system = make_system(2);

    system.remove_sorted(&[]);

    assert_eq!(system.local_count(), 2);
}

#[test]
fn test_remove_sorted_everything() {
    let mut system = make_system(3);

    system.remove_sorted(&[0, 1, 2]);

    assert_eq!(system.local_count(), 0);
}

#[test]
#[should_panic(expected = "strictly increasing")]
fn test_remove_sorted_rejects_unsorted() {
    let mut system = make_system(3);
    system.remove_sorted(&[2, 1]);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_remove_sorted_rejects_out_of_range() {
    let mut system = make_system(3);
    system.remove_sorted(&[3]);
}

#[test]
fn test_totals() {
    let system = make_system(3);

    assert_eq!(system.total_mass(), 6.0);
    assert_eq!(system.total_momentum(), Vector3::new(0.0, 6.0, 0.0));
}

#[test]
fn test_global_count_single_rank() {
    let system = make_system(4);

    assert_eq!(system.global_count(&SingleProcess), 4);
}
