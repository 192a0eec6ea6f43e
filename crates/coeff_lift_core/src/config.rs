//! Solver and batch-run configuration

use crate::backend::{RayonBackend, DEFAULT_PARALLEL_THRESHOLD};
use crate::error::ExperimentError;
use crate::modular::DEFAULT_MODULUS;
use crate::poly::half_degree;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the Gaussian solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Ring modulus q
    pub modulus: u32,
    /// Row count above which elimination runs on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            modulus: DEFAULT_MODULUS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl SolverConfig {
    pub fn backend(&self) -> RayonBackend {
        RayonBackend::with_threshold(self.parallel_threshold)
    }
}

/// Configuration for a batch of key-recovery experiments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory holding `f_{idx}_guess.json`
    pub f_dir: PathBuf,
    /// Directory holding `g_{idx}_guess.json`
    pub g_dir: PathBuf,
    /// CSV file with one public key `h` per line
    pub h_csv: PathBuf,
    /// Output CSV, one row per experiment
    pub out_csv: PathBuf,
    /// Key indices to process, repeats allowed
    pub indices: Vec<usize>,
    /// Ring degree (512 or 1024 for Falcon)
    pub n: usize,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl BatchConfig {
    /// Load a batch configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ExperimentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ExperimentError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| ExperimentError::json(path, e))
    }

    /// Number of known coefficients kept per polynomial
    pub fn known_target(&self) -> usize {
        half_degree(self.n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_defaults() {
        let cfg = SolverConfig::default();
        assert_eq!(cfg.modulus, 12289);
        assert_eq!(cfg.parallel_threshold, 100);
        assert_eq!(cfg.backend().threshold(), 100);
    }

    #[test]
    fn test_batch_config_json() {
        let json = r#"{
            "f_dir": "data/f",
            "g_dir": "data/g",
            "h_csv": "data/h.csv",
            "out_csv": "out.csv",
            "indices": [3, 1, 3],
            "n": 512,
            "solver": { "parallel_threshold": 64 }
        }"#;
        let cfg: BatchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.indices, vec![3, 1, 3]);
        assert_eq!(cfg.solver.modulus, 12289);
        assert_eq!(cfg.solver.parallel_threshold, 64);
        assert_eq!(cfg.known_target(), 256);

        let odd = BatchConfig { n: 7, ..cfg };
        assert_eq!(odd.known_target(), 4);
    }
}
