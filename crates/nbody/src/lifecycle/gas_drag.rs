//! Energy correction for the gas drag half-kicks
//!
//! Drag is applied as two half-kicks around the tree step. The work it does
//! on the bodies is not captured by any potential, so each half-kick books
//! its contribution into `ledger.edisp_gd`.

use comm::Communicator;
use rayon::prelude::*;

use crate::energy::EnergyLedger;
use crate::params::GravityParams;
use crate::system::ParticleView;

/// Books the drag work of one half-kick and returns the increment (collective)
///
/// The increment is `0.5 dt Σ m a·(v + c a dt)` over all ranks, with
/// `c = 0.25` before the tree step and `c = -0.25` after it, `a` the drag
/// acceleration and `dt = params.dt_tree`.
///
/// # Examples
///
/// ```
/// use comm::SingleProcess;
/// use nbody::energy::EnergyLedger;
/// use nbody::lifecycle::correct_energy_for_gas;
/// use nbody::params::GravityParams;
/// use nbody::system::{ParticleSystem, ParticleView};
/// use nalgebra::{Point3, Vector3};
///
/// let mut system = ParticleSystem::new();
/// system.add_particle(2.0, Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
/// system.particles_mut()[0].acc_gd = Vector3::new(0.0, -0.5, 0.0);
///
/// let params = GravityParams::new(0.0, 0.0, 1.0);
/// let mut ledger = EnergyLedger::new();
/// let de = correct_energy_for_gas(&system, &mut ledger, &params, false, &SingleProcess);
///
/// // No time step, no work
/// assert_eq!(de, 0.0);
/// assert_eq!(ledger.edisp_gd, 0.0);
/// ```
pub fn correct_energy_for_gas<V: ParticleView, C: Communicator>(
    view: &V,
    ledger: &mut EnergyLedger,
    params: &GravityParams,
    second_half: bool,
    comm: &C,
) -> f64 {
    let coef = if second_half { -0.25 } else { 0.25 };
    let dt = params.dt_tree;

    let work_loc: f64 = view
        .particles()
        .par_iter()
        .map(|p| p.mass * p.acc_gd.dot(&(p.velocity + p.acc_gd * (coef * dt))))
        .sum();

    let de = 0.5 * dt * comm.sum_f64(work_loc);
    ledger.edisp_gd += de;
    de
}
