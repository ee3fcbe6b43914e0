use thiserror::Error;

/// Failures writing or reading the run's output files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output I/O failed")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{failed_ranks} rank(s) failed to write output")]
    PeerFailure { failed_ranks: usize },
}
