//! Per-step particle lifecycle
//!
//! These routines run once per timestep over the local particles and then
//! synchronize with the other ranks:
//! - [`ids`]: refresh slot indices and ownership
//! - [`merge`]: apply merges flagged by the collision solver
//! - [`boundary`]: cull particles that left the annulus
//! - [`gas_drag`]: energy correction for the drag sub-steps
//! - [`step`]: the fixed collective sequence every rank runs

pub mod boundary;
pub mod gas_drag;
pub mod ids;
pub mod merge;
pub mod step;

#[cfg(test)]
mod gas_drag_test;
#[cfg(test)]
mod step_test;

pub use boundary::{remove_out_of_boundary, Annulus};
pub use gas_drag::correct_energy_for_gas;
pub use ids::refresh_local_ids;
pub use merge::{merge_particles, MergeReport};
pub use step::{LifecycleStep, StepOutcome};
