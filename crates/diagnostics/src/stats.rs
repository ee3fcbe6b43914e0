use comm::Communicator;
use nbody::ParticleView;
use serde::{Deserialize, Serialize};

/// Mass and neighbour statistics of the whole particle set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MassStatistics {
    pub m_mean: f64,
    pub m_max: f64,
    /// Mean neighbour count
    pub neighbor_mean: f64,
}

impl MassStatistics {
    /// Reduces the local particles over all ranks (collective)
    ///
    /// An empty system gives all zeros.
    ///
    /// # Examples
    ///
    /// ```
    /// use comm::SingleProcess;
    /// use diagnostics::MassStatistics;
    /// use nbody::ParticleSystem;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let mut system = ParticleSystem::new();
    /// system.add_particle(1.0, Point3::new(1.0, 0.0, 0.0), Vector3::zeros());
    /// system.add_particle(3.0, Point3::new(2.0, 0.0, 0.0), Vector3::zeros());
    ///
    /// let stats = MassStatistics::compute(&system, &SingleProcess);
    /// assert_eq!(stats.m_mean, 2.0);
    /// assert_eq!(stats.m_max, 3.0);
    /// ```
    pub fn compute<V: ParticleView, C: Communicator>(view: &V, comm: &C) -> Self {
        let particles = view.particles();
        let m_sum_loc: f64 = particles.iter().map(|p| p.mass).sum();
        let m_max_loc = particles.iter().map(|p| p.mass).fold(0.0, f64::max);
        let nei_sum_loc: usize = particles.iter().map(|p| p.neighbor as usize).sum();

        let m_sum = comm.sum_f64(m_sum_loc);
        let m_max = comm.max_f64(m_max_loc);
        let nei_sum = comm.sum_usize(nei_sum_loc);
        let n_glb = view.global_count(comm);

        if n_glb == 0 {
            return Self::default();
        }

        Self {
            m_mean: m_sum / n_glb as f64,
            m_max,
            neighbor_mean: nei_sum as f64 / n_glb as f64,
        }
    }
}
