//! Removal of particles that left the annulus
//!
//! A particle is culled when it is farther than `r_max` from the central
//! mass (escaped) or closer than `r_min` (swallowed). Swallowed mass is
//! added to the central mass. The energy the culled particles carried out of
//! the system goes to the ledger.
//!
//! The energy accounting needs the full state of every culled particle on
//! one rank: when two culled bodies live on different ranks, their mutual
//! potential would otherwise be subtracted twice. Culled particles are
//! therefore gathered on the root, which does the accounting and writes the
//! removal log.

use std::io::Write;

use comm::{Communicator, GatherLayout};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::energy::EnergyLedger;
use crate::error::LifecycleError;
use crate::format::removal_record;
use crate::params::GravityParams;
use crate::particle::Particle;
use crate::system::ParticleView;

/// Radial bounds of the valid region around the central mass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Annulus {
    pub r_min: f64,
    pub r_max: f64,
}

impl Annulus {
    pub fn new(r_min: f64, r_max: f64) -> Self {
        Self { r_min, r_max }
    }

    /// Whether a particle at squared radius `r2` stays in the system
    ///
    /// Only a radius that compares outside the bounds is culled, so a NaN
    /// radius stays and is left to the integrator to report.
    ///
    /// # Examples
    ///
    /// ```
    /// use nbody::lifecycle::Annulus;
    ///
    /// let annulus = Annulus::new(1.0, 100.0);
    /// assert!(annulus.contains(1.0));
    /// assert!(annulus.contains(100.0 * 100.0));
    /// assert!(!annulus.contains(0.25));
    /// ```
    pub fn contains(&self, r2: f64) -> bool {
        !(r2 < self.r_min * self.r_min || r2 > self.r_max * self.r_max)
    }

    /// Whether a particle at squared radius `r2` falls into the central mass
    pub fn swallows(&self, r2: f64) -> bool {
        r2 < self.r_min * self.r_min
    }
}

/// Energy removed with the culled particles, in gather order
///
/// Each particle takes away its kinetic energy and its share of all three
/// potentials. For every earlier particle with a different id the pair's
/// mutual potential is added back, since both bodies subtracted it.
/// Same-id pairs are merge artifacts and are skipped.
pub fn removed_energy(removed: &[Particle], eps2: f64) -> f64 {
    removed
        .iter()
        .enumerate()
        .map(|(i, pi)| {
            let pair_terms: f64 = removed[..i]
                .iter()
                .filter(|pj| pj.id != pi.id)
                .map(|pj| pi.mutual_potential(pj, eps2))
                .sum();
            pair_terms - pi.kinetic_energy() - pi.potential_energy()
        })
        .sum()
}

/// Energy accounting and logging on the root rank
fn account_removed<W: Write>(
    removed: &[Particle],
    eps2: f64,
    removal_log: &mut W,
) -> Result<f64, LifecycleError> {
    for p in removed {
        tracing::info!(
            id = %p.id,
            "removed particle at ({:.15}, {:.15}, {:.15})",
            p.position.x,
            p.position.y,
            p.position.z
        );
        writeln!(removal_log, "{}", removal_record(p))?;
    }
    Ok(removed_energy(removed, eps2))
}

/// Culls particles outside `bounds` and returns the global number removed
/// (collective)
///
/// Steps, identical on every rank:
/// 1. find the local particles outside the annulus
/// 2. sum the swallowed mass over all ranks and add it to the central mass
/// 3. gather the culled particles on the root, which accounts for their
///    energy and writes one `removal_log` line per particle
/// 4. remove the local culled particles in one batch
/// 5. sum the root's energy account into `ledger.edisp`
///
/// Step 3 is skipped on every rank when nothing was culled anywhere.
/// Step 5 books nothing when the root failed to account for the removals.
/// `removal_log` is only written on the root.
///
/// # Examples
///
/// ```
/// use comm::SingleProcess;
/// use nbody::energy::EnergyLedger;
/// use nbody::lifecycle::{remove_out_of_boundary, Annulus};
/// use nbody::params::GravityParams;
/// use nbody::system::{ParticleSystem, ParticleView};
/// use nalgebra::{Point3, Vector3};
///
/// let mut system = ParticleSystem::new();
/// system.add_particle(0.5, Point3::new(0.5, 0.0, 0.0), Vector3::zeros());
/// system.add_particle(1.0, Point3::new(5.0, 0.0, 0.0), Vector3::zeros());
///
/// let mut params = GravityParams::new(0.0, 0.01, 1.0);
/// let mut log = Vec::new();
/// let removed = remove_out_of_boundary(
///     &mut system,
///     &mut EnergyLedger::new(),
///     &mut params,
///     &Annulus::new(1.0, 100.0),
///     &mut log,
///     &SingleProcess,
/// )
/// .unwrap();
///
/// assert_eq!(removed, 1);
/// assert_eq!(system.local_count(), 1);
/// assert_eq!(params.m_sun(), 1.5);
/// ```
pub fn remove_out_of_boundary<V, C, W>(
    view: &mut V,
    ledger: &mut EnergyLedger,
    params: &mut GravityParams,
    bounds: &Annulus,
    removal_log: &mut W,
    comm: &C,
) -> Result<usize, LifecycleError>
where
    V: ParticleView,
    C: Communicator,
    W: Write,
{
    // 1. Local scan
    let outside: Vec<(usize, bool)> = view
        .particles()
        .par_iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let r2 = p.radius_squared();
            (!bounds.contains(r2)).then(|| (i, bounds.swallows(r2)))
        })
        .collect();

    let remove_list: Vec<usize> = outside.iter().map(|&(i, _)| i).collect();
    let (m_swallowed_loc, n_swallowed_loc) = outside
        .iter()
        .filter(|&&(_, swallowed)| swallowed)
        .fold((0.0, 0usize), |(m, n), &(i, _)| (m + view.particles()[i].mass, n + 1));

    // 2. Central mass
    let m_swallowed = comm.sum_f64(m_swallowed_loc);
    let n_swallowed = comm.sum_usize(n_swallowed_loc);
    params.absorb_mass(m_swallowed);
    if n_swallowed > 0 {
        tracing::info!(
            n_absorbed = n_swallowed,
            m_sun = params.m_sun(),
            "central mass swallowed {:e}",
            m_swallowed
        );
    }

    // 3. Gather on the root
    let n_remove_loc = remove_list.len();
    let n_remove_glb = comm.sum_usize(n_remove_loc);

    let mut accounted: Result<f64, LifecycleError> = Ok(0.0);
    if n_remove_glb > 0 {
        let layout = comm.gather_usize(n_remove_loc).map(GatherLayout::from_counts);
        if let Some(layout) = &layout {
            assert_eq!(
                layout.total(),
                n_remove_glb,
                "per-rank removal counts do not add up to the global count"
            );
            tracing::debug!(counts = ?layout.counts, "gathering culled particles");
        }

        let particles = view.particles();
        let records: Vec<Particle> = remove_list.iter().map(|&i| particles[i]).collect();

        if let Some(removed) = comm.gather_varying(records, layout.as_ref()) {
            accounted = account_removed(&removed, params.eps2, removal_log);
        }
    }

    // 4. Local removal
    if !remove_list.is_empty() {
        view.remove_sorted(&remove_list);
    }

    // 5. Ledger
    let edisp_loc = accounted.as_ref().copied().unwrap_or(0.0);
    let edisp = comm.sum_f64(edisp_loc);
    let failed_ranks = comm.sum_usize(usize::from(accounted.is_err()));

    accounted?;
    if failed_ranks > 0 {
        return Err(LifecycleError::PeerFailure { failed_ranks });
    }
    ledger.edisp += edisp;

    Ok(n_remove_glb)
}
