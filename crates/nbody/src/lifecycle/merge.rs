//! Merging of bodies flagged by the collision solver
//!
//! The collision solver expresses one merge as two particles sharing an id:
//! the survivor carries `is_merged`, the absorbed body carries `is_dead` and
//! sits at the same position. Merging conserves:
//! - Total mass: m = m_i + m_j
//! - Momentum: v = (m_i v_i + m_j v_j) / m
//!
//! The kinetic energy of the relative motion, `0.5 μ |v_rel|²` with the
//! reduced mass `μ = m_i m_j / m`, leaves the system and goes to the ledger.

use comm::Communicator;
use nalgebra::Vector3;
use rayon::prelude::*;

use crate::energy::EnergyLedger;
use crate::error::LifecycleError;
use crate::particle::Particle;
use crate::system::ParticleView;

/// Outcome of one merge pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeReport {
    /// Merges applied on this rank
    pub merged_local: usize,
    /// Energy added to the ledger, summed over all ranks
    pub edisp: f64,
}

/// New state of a survivor, computed before anything is mutated
#[derive(Debug, Clone, Copy)]
struct MergeUpdate {
    survivor: usize,
    absorbed: usize,
    mass: f64,
    velocity: Vector3<f64>,
    acc_gd: Vector3<f64>,
    phi: f64,
    phi_d: f64,
    de: f64,
}

/// Combines survivor `i` with its absorbed partner `j` using pre-merge masses
fn combine(i: usize, pi: &Particle, j: usize, pj: &Particle) -> MergeUpdate {
    let (mi, mj) = (pi.mass, pj.mass);
    let m = mi + mj;
    let vrel = pj.velocity - pi.velocity;

    MergeUpdate {
        survivor: i,
        absorbed: j,
        mass: m,
        velocity: (pi.velocity * mi + pj.velocity * mj) / m,
        acc_gd: (pi.acc_gd * mi + pj.acc_gd * mj) / m,
        phi: (mi * pi.phi + mj * pj.phi) / m,
        phi_d: (mi * pi.phi_d + mj * pj.phi_d) / m,
        de: -0.5 * mi * mj / m * vrel.magnitude_squared(),
    }
}

/// Finds the single same-id partner of flagged particle `i` and checks the
/// collision solver's contract for the pair
fn plan_merge(particles: &[Particle], i: usize) -> Result<MergeUpdate, LifecycleError> {
    let pi = &particles[i];
    let mut partners = particles
        .iter()
        .enumerate()
        .filter(|&(j, pj)| j != i && pj.id == pi.id);

    let (j, pj) = partners.next().ok_or(LifecycleError::MissingMergePartner {
        id: pi.id,
        index: i,
    })?;

    let extra = partners.count();
    if extra > 0 {
        return Err(LifecycleError::ChainedMerge {
            id: pi.id,
            index: i,
            partners: extra + 1,
        });
    }
    if pi.position != pj.position {
        return Err(LifecycleError::MergePositionMismatch { id: pi.id });
    }
    if !pj.is_dead {
        return Err(LifecycleError::PartnerNotDead { id: pi.id, index: i });
    }

    Ok(combine(i, pi, j, pj))
}

/// Applies every merge flagged by the collision solver (collective)
///
/// Each flagged particle absorbs its same-id partner, which is then removed
/// from the container in one batch. `n_col_hint` is the expected number of
/// merges and only sizes the removal buffer.
///
/// A broken contract (no partner, several partners, partner not dead,
/// mismatched positions) leaves the container and the ledger untouched and
/// returns an error, but only after this rank has taken part in the collectives, so its
/// peers never stall. Every rank returns an error if any rank failed.
///
/// # Examples
///
/// ```
/// use comm::SingleProcess;
/// use nbody::energy::EnergyLedger;
/// use nbody::lifecycle::merge_particles;
/// use nbody::system::{ParticleSystem, ParticleView};
/// use nalgebra::{Point3, Vector3};
///
/// let mut system = ParticleSystem::new();
/// let id = system.add_particle(1.0, Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
/// system.add_particle(1.0, Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
///
/// // What the collision solver leaves behind for one merge
/// let particles = system.particles_mut();
/// particles[0].is_merged = true;
/// particles[1].id = id;
/// particles[1].is_dead = true;
///
/// let mut ledger = EnergyLedger::new();
/// let report = merge_particles(&mut system, 1, &mut ledger, &SingleProcess).unwrap();
///
/// assert_eq!(report.merged_local, 1);
/// assert_eq!(system.local_count(), 1);
/// assert_eq!(system.particles()[0].mass, 2.0);
/// assert_eq!(ledger.edisp, -1.0);
/// ```
pub fn merge_particles<V: ParticleView, C: Communicator>(
    view: &mut V,
    n_col_hint: usize,
    ledger: &mut EnergyLedger,
    comm: &C,
) -> Result<MergeReport, LifecycleError> {
    let particles = view.particles();
    let planned: Result<Vec<MergeUpdate>, LifecycleError> = particles
        .par_iter()
        .enumerate()
        .filter(|(_, p)| p.is_merged)
        .map(|(i, _)| plan_merge(particles, i))
        .collect();

    let edisp_loc = match &planned {
        Ok(updates) => updates.iter().map(|u| u.de).sum(),
        Err(_) => 0.0,
    };

    comm.barrier();
    let edisp = comm.sum_f64(edisp_loc);
    let failed_ranks = comm.sum_usize(usize::from(planned.is_err()));

    let updates = planned?;
    if failed_ranks > 0 {
        return Err(LifecycleError::PeerFailure { failed_ranks });
    }
    ledger.edisp += edisp;

    let mut remove = Vec::with_capacity(n_col_hint.max(updates.len()));
    let particles = view.particles_mut();
    for u in &updates {
        let p = &mut particles[u.survivor];
        p.mass = u.mass;
        p.velocity = u.velocity;
        p.acc_gd = u.acc_gd;
        p.phi = u.phi;
        p.phi_d = u.phi_d;
        p.is_merged = false;
        remove.push(u.absorbed);
    }

    remove.sort_unstable();
    if !remove.is_empty() {
        view.remove_sorted(&remove);
    }

    tracing::debug!(
        rank = comm.rank(),
        merged = updates.len(),
        "merge pass done, edisp += {:e}",
        edisp
    );

    Ok(MergeReport {
        merged_local: updates.len(),
        edisp,
    })
}
