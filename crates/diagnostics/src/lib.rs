//! Run diagnostics for the annulus N-body simulation
//!
//! Everything here is collective: every rank calls in, the root writes.
//!
//! - [`stats`]: mass and neighbour statistics across ranks
//! - [`snapshot`]: ASCII snapshots and their reader
//! - [`energy_log`]: the per-step summary line

pub mod energy_log;
pub mod error;
pub mod snapshot;
pub mod stats;

pub use energy_log::{output_step, StepSummary, StepTimings};
pub use error::OutputError;
pub use snapshot::{
    make_snapshot, read_snapshot, snapshot_path, write_snapshot, FileHeader, Snapshot,
    SnapshotTarget,
};
pub use stats::MassStatistics;

#[cfg(test)]
mod energy_log_test;
#[cfg(test)]
mod stats_test;
