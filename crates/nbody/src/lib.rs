pub mod config;
pub mod energy;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod params;
pub mod particle;
pub mod system;

#[cfg(test)]
mod system_test;

pub use energy::{Energy, EnergyLedger};
pub use error::LifecycleError;
pub use params::GravityParams;
pub use particle::{Particle, ParticleId};
pub use system::{ParticleSystem, ParticleView};
