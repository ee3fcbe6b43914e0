use approx::assert_relative_eq;
use comm::SingleProcess;
use nalgebra::{Point3, Vector3};
use nbody::{ParticleSystem, ParticleView};

use crate::stats::MassStatistics;

#[test]
fn test_statistics_of_local_set() {
    let mut system = ParticleSystem::new();
    for (mass, neighbors) in [(0.5, 2), (2.0, 0), (0.5, 7)] {
        system.add_particle(mass, Point3::new(1.0, 0.0, 0.0), Vector3::zeros());
        let last = system.local_count() - 1;
        system.particles_mut()[last].neighbor = neighbors;
    }

    let stats = MassStatistics::compute(&system, &SingleProcess);

    assert_relative_eq!(stats.m_mean, 1.0);
    assert_eq!(stats.m_max, 2.0);
    assert_relative_eq!(stats.neighbor_mean, 3.0);
}

#[test]
fn test_empty_system_gives_zeros() {
    let stats = MassStatistics::compute(&ParticleSystem::new(), &SingleProcess);

    assert_eq!(stats, MassStatistics::default());
}
