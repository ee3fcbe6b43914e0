use std::fmt;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Global particle identifier
///
/// Assigned when a particle is created and kept by the surviving body of a
/// merge. The collision solver marks a merging pair by giving both bodies the
/// same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One locally resident body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: ParticleId,
    /// Slot index on the owning rank, refreshed every step
    pub id_local: usize,
    /// Owning rank, refreshed every step
    pub myrank: usize,
    pub mass: f64,
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    /// Gas drag acceleration
    pub acc_gd: Vector3<f64>,
    /// Potential from the other bodies
    pub phi: f64,
    /// Drag (dissipative) potential
    pub phi_d: f64,
    /// Potential of the central mass
    pub phi_s: f64,
    /// Time of the last update
    pub time: f64,
    /// Number of neighbours found by the force solver
    pub neighbor: u32,
    /// Set by the collision solver on the body that absorbs its same-id partner
    pub is_merged: bool,
    /// Set by the collision solver on the body that gets absorbed
    pub is_dead: bool,
    pub in_domain: bool,
    pub is_sent: bool,
}

impl Particle {
    /// Creates a particle at rest with respect to every potential
    ///
    /// # Examples
    ///
    /// ```
    /// use nbody::particle::{Particle, ParticleId};
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let position = Point3::new(1.0, 0.0, 0.0);
    /// let p = Particle::new(ParticleId(7), 1.0e-6, position, Vector3::new(0.0, 1.0, 0.0));
    /// assert_eq!(p.id, ParticleId(7));
    /// assert!(!p.is_merged && !p.is_dead);
    /// ```
    pub fn new(id: ParticleId, mass: f64, position: Point3<f64>, velocity: Vector3<f64>) -> Self {
        Self {
            id,
            id_local: 0,
            myrank: 0,
            mass,
            position,
            velocity,
            acc_gd: Vector3::zeros(),
            phi: 0.0,
            phi_d: 0.0,
            phi_s: 0.0,
            time: 0.0,
            neighbor: 0,
            is_merged: false,
            is_dead: false,
            in_domain: true,
            is_sent: false,
        }
    }

    pub fn momentum(&self) -> Vector3<f64> {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    /// Squared distance from the central mass at the origin
    pub fn radius_squared(&self) -> f64 {
        self.position.coords.magnitude_squared()
    }

    /// Potential energy this body carries through all three potential fields
    pub fn potential_energy(&self) -> f64 {
        self.mass * (self.phi_s + self.phi_d + self.phi)
    }

    /// Softened pairwise potential energy `-m_i m_j / sqrt(|r_i - r_j|² + eps²)`
    pub fn mutual_potential(&self, other: &Particle, eps2: f64) -> f64 {
        let dr = self.position - other.position;
        -self.mass * other.mass / (dr.magnitude_squared() + eps2).sqrt()
    }
}
