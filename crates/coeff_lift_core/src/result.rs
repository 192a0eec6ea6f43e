//! Tagged solve results
//!
//! [`SolveResult`] is the flat shape handed across an FFI or scripting
//! boundary: a status code, an optional owned solution and a diagnostic.

use crate::error::SolveError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a solve call
///
/// The first five discriminants match the status numbering used by the
/// existing trace-analysis tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum SolveStatus {
    Ok = 0,
    NoPivot = 1,
    NoInverse = 2,
    NoKnownG = 3,
    SingularMatrix = 4,
    AllocationFailure = 5,
    NonSquareSystem = 6,
    InvalidInput = 7,
}

impl SolveStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_ok(self) -> bool {
        self == SolveStatus::Ok
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Ok => "OK",
            SolveStatus::NoPivot => "NO_PIVOT",
            SolveStatus::NoInverse => "NO_INVERSE",
            SolveStatus::NoKnownG => "NO_KNOWN_G",
            SolveStatus::SingularMatrix => "SINGULAR_MATRIX",
            SolveStatus::AllocationFailure => "ALLOCATION_FAILURE",
            SolveStatus::NonSquareSystem => "NON_SQUARE_SYSTEM",
            SolveStatus::InvalidInput => "INVALID_INPUT",
        };
        f.write_str(name)
    }
}

impl SolveError {
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveError::AllocationFailure { .. } => SolveStatus::AllocationFailure,
            SolveError::NoPivot { .. } => SolveStatus::NoPivot,
            SolveError::NoInverse { .. } => SolveStatus::NoInverse,
            SolveError::NoKnownEquations => SolveStatus::NoKnownG,
            SolveError::SingularMatrix => SolveStatus::SingularMatrix,
            SolveError::NonSquareSystem { .. } => SolveStatus::NonSquareSystem,
            SolveError::LengthMismatch { .. } | SolveError::InvalidModulus(_) => {
                SolveStatus::InvalidInput
            }
        }
    }
}

/// Status, optional solution and diagnostic of one solve call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    /// Centered solution, present only when `status` is `Ok`
    pub x: Option<Vec<i64>>,
    pub message: String,
}

impl SolveResult {
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Number of solved coefficients (0 on failure)
    pub fn len(&self) -> usize {
        self.x.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert back into a `Result`, keeping the message on failure
    pub fn into_result(self) -> Result<Vec<i64>, (SolveStatus, String)> {
        match self.x {
            Some(x) if self.status.is_ok() => Ok(x),
            _ => Err((self.status, self.message)),
        }
    }
}

impl From<Result<Vec<i64>, SolveError>> for SolveResult {
    fn from(result: Result<Vec<i64>, SolveError>) -> Self {
        match result {
            Ok(x) => SolveResult {
                status: SolveStatus::Ok,
                x: Some(x),
                message: "ok".to_string(),
            },
            Err(e) => SolveResult {
                status: e.status(),
                x: None,
                message: e.to_string(),
            },
        }
    }
}
