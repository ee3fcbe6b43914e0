//! Per-step summary line of the energy log
//!
//! ```text
//! time  n_total  etot  de  n_largest_cluster  n_cluster  n_isolated
//!       [m_max  m_mean  neighbor_mean]  [soft_step ... output_step]
//! ```
//!
//! The bracketed blocks are switched on by [`OutputOptions`]. The time is
//! fixed-point with 8 decimals, every other float uses [`sci15`].

use std::io::Write;
use std::path::PathBuf;

use comm::Communicator;
use nbody::config::OutputOptions;
use nbody::format::{fixed8, sci15};
use nbody::{Energy, ParticleView};
use serde::{Deserialize, Serialize};

use crate::error::OutputError;
use crate::snapshot::{make_snapshot, FileHeader, SnapshotTarget};
use crate::stats::MassStatistics;

/// Wall-clock seconds spent in each phase of the last step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTimings {
    pub soft_step: f64,
    pub hard_step: f64,
    pub calc_soft_force_step: f64,
    pub neighbor_search_step: f64,
    pub calc_hard_force_step: f64,
    pub create_cluster_step: f64,
    pub communication_step: f64,
    pub output_step: f64,
}

impl StepTimings {
    fn values(&self) -> [f64; 8] {
        [
            self.soft_step,
            self.hard_step,
            self.calc_soft_force_step,
            self.neighbor_search_step,
            self.calc_hard_force_step,
            self.create_cluster_step,
            self.communication_step,
            self.output_step,
        ]
    }
}

/// What the driver knows about the step being logged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub time: f64,
    pub e_init: Energy,
    pub e_now: Energy,
    /// Energy error reported in the log
    pub delta_e: f64,
    pub id_next: u64,
    pub n_largest_cluster: usize,
    pub n_cluster: usize,
    pub n_isolated: usize,
    pub timings: StepTimings,
}

/// Formats one energy-log line (no trailing newline)
///
/// `stats` is printed only when `options.detailed_mass_stats` is set.
pub fn summary_line(
    summary: &StepSummary,
    n_total: usize,
    stats: Option<&MassStatistics>,
    options: &OutputOptions,
) -> String {
    let mut fields = vec![
        fixed8(summary.time),
        n_total.to_string(),
        sci15(summary.e_now.etot),
        sci15(summary.delta_e),
        summary.n_largest_cluster.to_string(),
        summary.n_cluster.to_string(),
        summary.n_isolated.to_string(),
    ];

    if options.detailed_mass_stats {
        let stats = stats.copied().unwrap_or_default();
        fields.extend([stats.m_max, stats.m_mean, stats.neighbor_mean].map(sci15));
    }
    if options.timing {
        fields.extend(summary.timings.values().map(sci15));
    }

    fields.join("\t")
}

/// End-of-step output (collective)
///
/// Does nothing on steps without a `snapshot` target. Otherwise every rank
/// takes part in the statistics reductions and the snapshot gather, then
/// the root appends one line to `energy_log`. A failed energy-log write is
/// reduced over the group, so the other ranks return
/// [`OutputError::PeerFailure`].
pub fn output_step<V, C, W>(
    view: &V,
    summary: &StepSummary,
    options: &OutputOptions,
    snapshot: Option<&SnapshotTarget>,
    energy_log: &mut W,
    comm: &C,
) -> Result<Option<PathBuf>, OutputError>
where
    V: ParticleView,
    C: Communicator,
    W: Write,
{
    let Some(target) = snapshot else {
        return Ok(None);
    };

    let stats = options
        .detailed_mass_stats
        .then(|| MassStatistics::compute(view, comm));
    let n_total = view.global_count(comm);

    let header = FileHeader::new(summary.time, summary.id_next, summary.e_init, summary.e_now);
    let path = make_snapshot(view, header, target, comm)?;

    let logged = if comm.is_root() {
        let line = summary_line(summary, n_total, stats.as_ref(), options);
        writeln!(energy_log, "{line}").and_then(|()| energy_log.flush())
    } else {
        Ok(())
    };

    let failed_ranks = comm.sum_usize(usize::from(logged.is_err()));
    logged?;
    if failed_ranks > 0 {
        return Err(OutputError::PeerFailure { failed_ranks });
    }
    Ok(path)
}
