//! Coeff Lift Core Library
//!
//! Recovers the unknown coefficients of an NTRU/Falcon secret `f` from
//! partial knowledge of `f` and `g = h ⋆ f` in Z_q[x]/(x^n + 1).
//!
//! # Overview
//!
//! Each known coefficient of `g` is one linear equation in the coefficients
//! of `f`. Known `f` terms move to the right-hand side, leaving a square
//! system over the unknown ones, which is solved by Gaussian elimination
//! mod q with row elimination parallelized over rayon.
//!
//! # Key Components
//!
//! - [`modular`] - Residue arithmetic, inverses and centered lifting
//! - [`matrix`] - Dense row-major matrix
//! - [`backend`] - Backend trait for sequential/rayon row elimination
//! - [`solve`] - Gaussian elimination over Z_q
//! - [`circulant`] - Negacyclic system construction from partial knowledge
//! - [`poly`] - Partially known polynomials and knowledge selection
//! - [`experiment`] - Batch recovery runs over guess files

pub mod backend;
pub mod circulant;
pub mod config;
pub mod error;
pub mod experiment;
pub mod matrix;
pub mod modular;
pub mod poly;
pub mod result;
pub mod solve;
pub mod synthetic;

pub use backend::{Backend, CpuBackend, RayonBackend};
pub use circulant::{
    circulant_row, recover_f, recover_f_timed, solve_unknown_f, solve_unknown_f_with, verify_recovery,
    CirculantSystem, CirculantSystemBuilder, KnowledgeIndex,
};
pub use config::{BatchConfig, SolverConfig};
pub use error::{ExperimentError, SolveError};
pub use experiment::{run_batch, BatchReport, ExperimentOutcome};
pub use matrix::Matrix;
pub use modular::{modinv, to_centered_mod, DEFAULT_MODULUS};
pub use poly::{balance_known, half_degree, negacyclic_mul, select_known_positions, PartialPoly, Selection};
pub use result::{SolveResult, SolveStatus};
pub use solve::{gaussian_mod_q_solve, verify_solution, GaussianSolver, LinearSystem};
pub use synthetic::{random_unimodular_matrix, SyntheticInstance};

/// Timing breakdown for a solve, in seconds
#[derive(Debug, Clone, Default)]
pub struct Timings {
    pub total_time: f64,
    pub build_time: f64,
    pub solve_time: f64,
    pub verify_time: f64,
    pub dimension: usize,
    pub verified: bool,
}
