//! Physical constants shared by the lifecycle routines

use serde::{Deserialize, Serialize};

/// Softening, tree timestep, and the central mass
///
/// Passed by reference into every routine that needs it. The central mass
/// only grows, and only the boundary cull grows it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityParams {
    /// Softening length squared
    pub eps2: f64,
    /// Timestep of the tree (long-range) integrator
    pub dt_tree: f64,
    m_sun: f64,
}

impl GravityParams {
    pub fn new(eps2: f64, dt_tree: f64, m_sun: f64) -> Self {
        Self {
            eps2,
            dt_tree,
            m_sun,
        }
    }

    /// Current central mass
    pub fn m_sun(&self) -> f64 {
        self.m_sun
    }

    /// Adds mass swallowed by the central body
    ///
    /// # Examples
    ///
    /// ```
    /// use nbody::params::GravityParams;
    ///
    /// let mut params = GravityParams::new(0.0, 0.01, 1.0);
    /// params.absorb_mass(0.25);
    /// assert_eq!(params.m_sun(), 1.25);
    /// ```
    pub fn absorb_mass(&mut self, mass: f64) {
        assert!(mass >= 0.0, "central mass can only grow (got {mass})");
        self.m_sun += mass;
    }
}
