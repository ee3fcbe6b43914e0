use comm::Communicator;
use nalgebra::{Point3, Vector3};

use crate::particle::{Particle, ParticleId};

/// The slice of the global particle set resident on one rank
///
/// The force solver and the domain decomposition own the real container;
/// the lifecycle routines only need indexed access, a count, and batched
/// removal.
pub trait ParticleView {
    fn particles(&self) -> &[Particle];

    fn particles_mut(&mut self) -> &mut [Particle];

    /// Removes the particles at `indices` and compacts the rest in place
    ///
    /// `indices` must be strictly increasing and in range. Surviving
    /// particles keep their relative order.
    fn remove_sorted(&mut self, indices: &[usize]);

    fn local_count(&self) -> usize {
        self.particles().len()
    }

    /// Number of particles across all ranks (collective)
    fn global_count<C: Communicator>(&self, comm: &C) -> usize {
        comm.sum_usize(self.local_count())
    }
}

/// Vec-backed particle container for one rank
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    /// Next id handed out by [`ParticleSystem::add_particle`]
    next_id: u64,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing particles; new ids continue after the largest one
    ///
    /// # Examples
    ///
    /// ```
    /// use nbody::particle::{Particle, ParticleId};
    /// use nbody::system::{ParticleSystem, ParticleView};
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let p = Particle::new(ParticleId(9), 1.0, Point3::new(2.0, 0.0, 0.0), Vector3::zeros());
    /// let mut system = ParticleSystem::from_particles(vec![p]);
    ///
    /// let id = system.add_particle(1.0, Point3::new(3.0, 0.0, 0.0), Vector3::zeros());
    /// assert_eq!(id, ParticleId(10));
    /// assert_eq!(system.local_count(), 2);
    /// ```
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        let next_id = particles.iter().map(|p| p.id.0 + 1).max().unwrap_or(0);
        Self { particles, next_id }
    }

    /// Adds a new particle and returns its id
    pub fn add_particle(
        &mut self,
        mass: f64,
        position: Point3<f64>,
        velocity: Vector3<f64>,
    ) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        self.particles.push(Particle::new(id, mass, position, velocity));
        id
    }

    /// Adds a fully specified particle, keeping its id
    pub fn push(&mut self, particle: Particle) {
        self.next_id = self.next_id.max(particle.id.0 + 1);
        self.particles.push(particle);
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    /// Finds the first particle carrying `id`
    pub fn find(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    /// Total mass of the local particles
    pub fn total_mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    /// Total momentum of the local particles
    pub fn total_momentum(&self) -> Vector3<f64> {
        self.particles
            .iter()
            .map(|p| p.momentum())
            .fold(Vector3::zeros(), |acc, p| acc + p)
    }

    pub fn into_particles(self) -> Vec<Particle> {
        self.particles
    }
}

impl ParticleView for ParticleSystem {
    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    fn remove_sorted(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        assert!(
            indices.windows(2).all(|w| w[0] < w[1]),
            "removal indices must be strictly increasing"
        );
        assert!(
            indices[indices.len() - 1] < self.particles.len(),
            "removal index {} out of range for {} particles",
            indices[indices.len() - 1],
            self.particles.len()
        );

        let mut pending = indices.iter().peekable();
        let mut slot = 0;
        self.particles.retain(|_| {
            let remove = pending.next_if_eq(&&slot).is_some();
            slot += 1;
            !remove
        });
    }
}
