use std::io::Write;

use comm::Communicator;
use serde::{Deserialize, Serialize};

use crate::energy::EnergyLedger;
use crate::error::LifecycleError;
use crate::lifecycle::{merge_particles, refresh_local_ids, remove_out_of_boundary, Annulus};
use crate::params::GravityParams;
use crate::system::ParticleView;

/// Global counts after one lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Merges applied across all ranks
    pub merged: usize,
    /// Particles culled across all ranks
    pub removed: usize,
    /// Particles left across all ranks
    pub n_global: usize,
}

/// The bookkeeping that follows the collision solver every step
///
/// Every rank runs [`LifecycleStep::run`] with the same settings. The
/// collectives inside happen in a fixed order and never depend on local
/// data, so ranks with nothing to merge or cull still take part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifecycleStep {
    pub bounds: Annulus,
    /// Expected number of merges, used to size buffers
    pub n_col_hint: usize,
}

impl LifecycleStep {
    pub fn new(bounds: Annulus) -> Self {
        Self {
            bounds,
            n_col_hint: 0,
        }
    }

    pub fn with_collision_hint(mut self, n_col_hint: usize) -> Self {
        self.n_col_hint = n_col_hint;
        self
    }

    /// Id refresh, merge, cull, then a global count (collective)
    ///
    /// Ids are refreshed first so the indices logged during merge and cull
    /// are this step's slots. A merge failure stops the step on every rank
    /// before the cull.
    pub fn run<V, C, W>(
        &self,
        view: &mut V,
        ledger: &mut EnergyLedger,
        params: &mut GravityParams,
        removal_log: &mut W,
        comm: &C,
    ) -> Result<StepOutcome, LifecycleError>
    where
        V: ParticleView,
        C: Communicator,
        W: Write,
    {
        refresh_local_ids(view, comm);

        let report = merge_particles(view, self.n_col_hint, ledger, comm)?;
        let merged = comm.sum_usize(report.merged_local);

        let removed =
            remove_out_of_boundary(view, ledger, params, &self.bounds, removal_log, comm)?;
        let n_global = view.global_count(comm);

        tracing::debug!(merged, removed, n_global, "lifecycle step done");

        Ok(StepOutcome {
            merged,
            removed,
            n_global,
        })
    }
}
