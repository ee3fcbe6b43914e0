use comm::SingleProcess;
use nalgebra::{Point3, Vector3};
use nbody::config::OutputOptions;
use nbody::{Energy, EnergyLedger, ParticleSystem};

use crate::energy_log::{output_step, summary_line, StepSummary, StepTimings};
use crate::snapshot::SnapshotTarget;
use crate::stats::MassStatistics;

fn sample_summary() -> StepSummary {
    StepSummary {
        time: 0.125,
        e_now: Energy::from_terms(0.5, -1.5, 0.0, 0.0, &EnergyLedger::new()),
        delta_e: -2.5e-10,
        n_largest_cluster: 3,
        n_cluster: 12,
        n_isolated: 80,
        ..StepSummary::default()
    }
}

#[test]
fn test_minimal_line() {
    let line = summary_line(&sample_summary(), 95, None, &OutputOptions::default());

    assert_eq!(
        line,
        "0.12500000\t95\t-1.000000000000000e+00\t-2.500000000000000e-10\t3\t12\t80"
    );
}

#[test]
fn test_detailed_mass_block() {
    let stats = MassStatistics {
        m_mean: 0.5,
        m_max: 2.0,
        neighbor_mean: 1.5,
    };
    let options = OutputOptions {
        detailed_mass_stats: true,
        timing: false,
    };

    let line = summary_line(&sample_summary(), 95, Some(&stats), &options);
    let fields: Vec<&str> = line.split('\t').collect();

    assert_eq!(fields.len(), 10);
    assert_eq!(fields[7], "2.000000000000000e+00");
    assert_eq!(fields[8], "5.000000000000000e-01");
    assert_eq!(fields[9], "1.500000000000000e+00");
}

#[test]
fn test_timing_block_follows_mass_block() {
    let mut summary = sample_summary();
    summary.timings = StepTimings {
        soft_step: 1.0,
        output_step: 0.25,
        ..StepTimings::default()
    };
    let options = OutputOptions {
        detailed_mass_stats: true,
        timing: true,
    };

    let line = summary_line(&summary, 95, Some(&MassStatistics::default()), &options);
    let fields: Vec<&str> = line.split('\t').collect();

    assert_eq!(fields.len(), 18);
    assert_eq!(fields[10], "1.000000000000000e+00");
    assert_eq!(fields[17], "2.500000000000000e-01");
}

#[test]
fn test_timing_without_mass_block() {
    let options = OutputOptions {
        detailed_mass_stats: false,
        timing: true,
    };

    let line = summary_line(&sample_summary(), 1, None, &options);
    assert_eq!(line.split('\t').count(), 15);
}

#[test]
fn test_output_step_skips_non_snapshot_steps() {
    let mut system = ParticleSystem::new();
    system.add_particle(1.0, Point3::new(2.0, 0.0, 0.0), Vector3::zeros());
    let mut log: Vec<u8> = Vec::new();

    let options = OutputOptions::default();
    let path = output_step(&system, &sample_summary(), &options, None, &mut log, &SingleProcess)
        .unwrap();

    assert!(path.is_none());
    assert!(log.is_empty());
}

#[test]
fn test_output_step_writes_snapshot_and_line() {
    let dir = std::env::temp_dir().join(format!("diagnostics-log-{}", std::process::id()));
    let mut system = ParticleSystem::new();
    system.add_particle(1.0, Point3::new(2.0, 0.0, 0.0), Vector3::zeros());
    system.add_particle(3.0, Point3::new(3.0, 0.0, 0.0), Vector3::zeros());
    let target = SnapshotTarget {
        dir: dir.clone(),
        index: 0,
    };
    let options = OutputOptions {
        detailed_mass_stats: true,
        timing: false,
    };
    let mut log = Vec::new();

    let summary = sample_summary();
    let path = output_step(&system, &summary, &options, Some(&target), &mut log, &SingleProcess)
        .unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!(path, Some(dir.join("snap000000.dat")));
    let text = String::from_utf8(log).unwrap();
    assert!(text.ends_with('\n'));
    let fields: Vec<&str> = text.trim_end().split('\t').collect();
    assert_eq!(fields[1], "2");
    assert_eq!(fields[7], "3.000000000000000e+00");
    assert_eq!(fields[8], "2.000000000000000e+00");
}
