//! Error types for system construction and solving

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("memory allocation failed for {what}")]
    AllocationFailure { what: &'static str },

    #[error("no pivot in column {column}, singular matrix")]
    NoPivot { column: usize },

    #[error("modular inverse not found for pivot {pivot}")]
    NoInverse { pivot: u32 },

    #[error("no known g")]
    NoKnownEquations,

    /// Reserved for structural singularity checks; elimination reports
    /// [`SolveError::NoPivot`] instead.
    #[error("singular matrix")]
    SingularMatrix,

    #[error("system is not square: {equations} known g equations, {unknowns} unknown f coefficients")]
    NonSquareSystem { equations: usize, unknowns: usize },

    #[error("length mismatch for {name}: expected {expected}, got {actual}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid modulus {0}: must be at least 2")]
    InvalidModulus(u32),
}

pub type Result<T> = std::result::Result<T, SolveError>;

/// Errors from the file-driven experiment runner
#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("parse error in {path} line {line}: {reason}")]
    Parse {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("row {index} not found in h file")]
    MissingRow { index: usize },

    #[error(transparent)]
    Solve(#[from] SolveError),
}

impl ExperimentError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn json(path: &std::path::Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.display().to_string(),
            source,
        }
    }
}
