//! Energy bookkeeping
//!
//! [`EnergyLedger`] accumulates energy taken out of (or put into) the system
//! by non-conservative events: merges, removals, and the gas drag
//! correction. Every increment it receives has already been summed over all
//! ranks, so the ledger holds the same values everywhere.
//!
//! [`Energy`] is a snapshot of the energy terms, written into snapshot
//! headers and the energy log.

use comm::Communicator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::system::ParticleView;

/// Running totals of dissipated energy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyLedger {
    /// Energy dispersed by merges and removals
    pub edisp: f64,
    /// Energy correction from the gas drag sub-steps
    pub edisp_gd: f64,
}

impl EnergyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> f64 {
        self.edisp + self.edisp_gd
    }
}

/// Energy terms of the whole system at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    pub ekin: f64,
    /// Potential energy in the central mass field
    pub ephi_sun: f64,
    /// Mutual potential energy of the bodies
    pub ephi_planet: f64,
    /// Drag potential energy
    pub ephi_d: f64,
    pub etot: f64,
    pub edisp: f64,
    pub edisp_gd: f64,
}

impl Energy {
    /// Builds an energy record from its parts; `etot` is their sum
    pub fn from_terms(
        ekin: f64,
        ephi_sun: f64,
        ephi_planet: f64,
        ephi_d: f64,
        ledger: &EnergyLedger,
    ) -> Self {
        Self {
            ekin,
            ephi_sun,
            ephi_planet,
            ephi_d,
            etot: ekin + ephi_sun + ephi_planet + ephi_d,
            edisp: ledger.edisp,
            edisp_gd: ledger.edisp_gd,
        }
    }

    /// Sums the energy terms over all ranks (collective)
    ///
    /// Uses the potentials last stored on the particles by the force solver.
    /// The mutual potential is halved since every pair appears twice.
    pub fn measure<V: ParticleView, C: Communicator>(
        view: &V,
        ledger: &EnergyLedger,
        comm: &C,
    ) -> Self {
        let (ekin, ephi_sun, ephi_planet, ephi_d) = view
            .particles()
            .par_iter()
            .map(|p| {
                (
                    p.kinetic_energy(),
                    p.mass * p.phi_s,
                    0.5 * p.mass * p.phi,
                    p.mass * p.phi_d,
                )
            })
            .reduce(
                || (0.0, 0.0, 0.0, 0.0),
                |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2, a.3 + b.3),
            );

        Self::from_terms(
            comm.sum_f64(ekin),
            comm.sum_f64(ephi_sun),
            comm.sum_f64(ephi_planet),
            comm.sum_f64(ephi_d),
            ledger,
        )
    }

    /// Relative drift of the conserved quantity `etot - edisp - edisp_gd`
    ///
    /// # Examples
    ///
    /// ```
    /// use nbody::energy::{Energy, EnergyLedger};
    ///
    /// let e0 = Energy::from_terms(1.0, -3.0, 0.0, 0.0, &EnergyLedger::new());
    /// let ledger = EnergyLedger { edisp: -0.5, edisp_gd: 0.0 };
    /// let e1 = Energy::from_terms(0.5, -3.0, 0.0, 0.0, &ledger);
    ///
    /// // The half unit of kinetic energy lost is fully accounted for
    /// assert_eq!(e1.relative_error(&e0), 0.0);
    /// ```
    pub fn relative_error(&self, initial: &Energy) -> f64 {
        let now = self.etot - self.edisp - self.edisp_gd;
        let then = initial.etot - initial.edisp - initial.edisp_gd;
        (now - then) / then
    }
}
