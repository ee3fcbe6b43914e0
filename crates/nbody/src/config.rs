//! Run configuration
//!
//! Loaded from a JSON file. Every field except the annulus bounds has a
//! default, so a minimal file only names `r_min` and `r_max`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::Annulus;
use crate::params::GravityParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which optional blocks the energy log prints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Adds `m_max m_mean neighbor_mean`
    pub detailed_mass_stats: bool,
    /// Adds the per-phase step timings
    pub timing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub r_min: f64,
    pub r_max: f64,
    #[serde(default = "default_eps2")]
    pub eps2: f64,
    #[serde(default = "default_dt_tree")]
    pub dt_tree: f64,
    #[serde(default = "default_m_sun")]
    pub m_sun: f64,
    /// Steps between snapshots and energy-log lines
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub output: OutputOptions,
    /// Whether the drag half-kicks are booked
    #[serde(default)]
    pub gas_drag: bool,
    #[serde(default = "default_n_ranks")]
    pub n_ranks: usize,
    #[serde(default)]
    pub seed: u64,
}

fn default_eps2() -> f64 {
    0.0
}

fn default_dt_tree() -> f64 {
    1.0 / 64.0
}

fn default_m_sun() -> f64 {
    0.1
}

fn default_snapshot_interval() -> u64 {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_n_ranks() -> usize {
    1
}

impl SimulationConfig {
    /// Config with default values for everything but the annulus
    pub fn with_bounds(r_min: f64, r_max: f64) -> Self {
        Self {
            r_min,
            r_max,
            eps2: default_eps2(),
            dt_tree: default_dt_tree(),
            m_sun: default_m_sun(),
            snapshot_interval: default_snapshot_interval(),
            output_dir: default_output_dir(),
            output: OutputOptions::default(),
            gas_drag: false,
            n_ranks: default_n_ranks(),
            seed: 0,
        }
    }

    /// Reads and validates a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parses and validates a JSON config
    ///
    /// # Examples
    ///
    /// ```
    /// use nbody::config::SimulationConfig;
    ///
    /// let config = SimulationConfig::from_json(r#"{ "r_min": 0.5, "r_max": 40.0 }"#).unwrap();
    /// assert_eq!(config.m_sun, 0.1);
    /// assert_eq!(config.snapshot_interval, 1);
    ///
    /// assert!(SimulationConfig::from_json(r#"{ "r_min": 2.0, "r_max": 1.0 }"#).is_err());
    /// ```
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if !(self.r_min > 0.0) {
            return invalid(format!("r_min must be positive, got {}", self.r_min));
        }
        if !(self.r_max > self.r_min) {
            return invalid(format!("r_max ({}) must exceed r_min ({})", self.r_max, self.r_min));
        }
        if !(self.eps2 >= 0.0) {
            return invalid(format!("eps2 must be non-negative, got {}", self.eps2));
        }
        if !(self.dt_tree > 0.0) {
            return invalid(format!("dt_tree must be positive, got {}", self.dt_tree));
        }
        if !(self.m_sun > 0.0) {
            return invalid(format!("m_sun must be positive, got {}", self.m_sun));
        }
        if self.snapshot_interval == 0 {
            return invalid("snapshot_interval must be at least 1".to_string());
        }
        if self.n_ranks == 0 {
            return invalid("n_ranks must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn gravity_params(&self) -> GravityParams {
        GravityParams::new(self.eps2, self.dt_tree, self.m_sun)
    }

    pub fn bounds(&self) -> Annulus {
        Annulus::new(self.r_min, self.r_max)
    }

    /// Whether `step` writes a snapshot and an energy-log line
    pub fn is_snapshot_step(&self, step: u64) -> bool {
        step % self.snapshot_interval == 0
    }
}
