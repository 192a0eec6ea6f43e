//! Gaussian elimination over Z_q
//!
//! Solves `A·x ≡ b (mod q)` for square `A` by Gauss-Jordan elimination on
//! the augmented matrix `[A | b]`. Every column becomes pivotal with an
//! identity coefficient, so the augmented column holds the solution when the
//! loop finishes and no back-substitution is needed.
//!
//! The modulus need not be prime. Pivots are chosen as the first row (from
//! the current column downwards) whose entry is invertible mod q.

use crate::backend::{Backend, RayonBackend};
use crate::error::{Result, SolveError};
use crate::matrix::Matrix;
use crate::modular::{modinv, mul_mod, reduce_mod, to_centered_mod};
use crate::result::SolveResult;
use crate::Timings;
use std::time::Instant;
use tracing::debug;

/// Square linear system with every entry reduced into `[0, q)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearSystem {
    a: Matrix<u32>,
    b: Vec<u32>,
    q: u32,
}

impl LinearSystem {
    /// Build a system from residues, reducing anything outside `[0, q)`
    pub fn new(a: Matrix<u32>, b: Vec<u32>, q: u32) -> Result<Self> {
        if q < 2 {
            return Err(SolveError::InvalidModulus(q));
        }
        if !a.is_square() {
            return Err(SolveError::NonSquareSystem {
                equations: a.rows(),
                unknowns: a.cols(),
            });
        }
        if b.len() != a.rows() {
            return Err(SolveError::LengthMismatch {
                name: "b",
                expected: a.rows(),
                actual: b.len(),
            });
        }
        let (rows, cols) = a.dims();
        let a = Matrix::from_flat(a.into_data().into_iter().map(|x| x % q).collect(), rows, cols)?;
        let b = b.into_iter().map(|x| x % q).collect();
        Ok(Self { a, b, q })
    }

    /// Build a system from arbitrary integers
    pub fn from_signed(a: &Matrix<i64>, b: &[i64], q: u32) -> Result<Self> {
        if q < 2 {
            return Err(SolveError::InvalidModulus(q));
        }
        let b = b.iter().map(|&x| reduce_mod(x, q)).collect();
        Self::new(a.reduce_mod(q), b, q)
    }

    /// Number of equations (and unknowns)
    pub fn dim(&self) -> usize {
        self.a.rows()
    }

    pub fn modulus(&self) -> u32 {
        self.q
    }

    pub fn matrix(&self) -> &Matrix<u32> {
        &self.a
    }

    pub fn rhs(&self) -> &[u32] {
        &self.b
    }

    /// Check `(A·x) mod q == b` for a (possibly centered) solution
    pub fn is_solution(&self, x: &[i64]) -> bool {
        verify_solution(&self.a, &self.b, x, self.q)
    }
}

/// Modular Gaussian elimination solver
///
/// The column loop runs on the calling thread; the per-column row
/// elimination is delegated to the backend.
pub struct GaussianSolver<B: Backend> {
    backend: B,
}

impl Default for GaussianSolver<RayonBackend> {
    fn default() -> Self {
        Self::new(RayonBackend::default())
    }
}

impl<B: Backend> GaussianSolver<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Solve the system, returning the solution in centered form
    ///
    /// # Returns
    /// * `Ok(x)` with every `x[i]` in `(-q/2, q/2]`
    /// * `Err(SolveError::NoPivot { column })` when no remaining row has an
    ///   invertible entry in `column`
    pub fn solve(&self, system: &LinearSystem) -> Result<Vec<i64>> {
        let m = system.dim();
        let q = system.q;
        debug!(
            dimension = m,
            modulus = q,
            backend = self.backend.name(),
            threads = rayon::current_num_threads(),
            "gaussian solve"
        );

        let mut work = Matrix::augmented(&system.a, &system.b, q)?;

        for col in 0..m {
            let pivot_row = find_pivot(&work, col, q).ok_or(SolveError::NoPivot { column: col })?;
            work.swap_rows(col, pivot_row);

            let pivot = *work.get(col, col);
            let inv = modinv(pivot as i64, q).ok_or(SolveError::NoInverse { pivot })?;
            for v in &mut work.row_mut(col)[col..] {
                *v = mul_mod(*v, inv, q);
            }

            self.backend.eliminate_column(&mut work, col, q);
        }

        let mut x = Vec::new();
        x.try_reserve_exact(m)
            .map_err(|_| SolveError::AllocationFailure { what: "solution" })?;
        x.extend((0..m).map(|i| to_centered_mod(*work.get(i, m) as i64, q)));
        Ok(x)
    }

    /// Solve and report, with timing breakdown
    pub fn solve_timed(&self, system: &LinearSystem) -> (SolveResult, Timings) {
        let mut timings = Timings {
            dimension: system.dim(),
            ..Timings::default()
        };
        let start = Instant::now();

        let result = self.solve(system);
        timings.solve_time = start.elapsed().as_secs_f64();

        if let Ok(x) = &result {
            let verify_start = Instant::now();
            timings.verified = system.is_solution(x);
            timings.verify_time = verify_start.elapsed().as_secs_f64();
        }

        timings.total_time = start.elapsed().as_secs_f64();
        (SolveResult::from(result), timings)
    }
}

/// First row at or below `col` whose entry in `col` is invertible mod q
fn find_pivot(work: &Matrix<u32>, col: usize, q: u32) -> Option<usize> {
    (col..work.rows()).find(|&row| modinv(*work.get(row, col) as i64, q).is_some())
}

/// Solve `A·x ≡ b (mod q)` for arbitrary integer inputs
///
/// Uses the rayon backend with its default threshold.
pub fn gaussian_mod_q_solve(a: &Matrix<i64>, b: &[i64], q: u32) -> SolveResult {
    let result = LinearSystem::from_signed(a, b, q)
        .and_then(|system| GaussianSolver::<RayonBackend>::default().solve(&system));
    SolveResult::from(result)
}

/// Verify that `(A·x) mod q == b`
pub fn verify_solution(a: &Matrix<u32>, b: &[u32], x: &[i64], q: u32) -> bool {
    if x.len() != a.cols() || b.len() != a.rows() {
        return false;
    }
    let x_mod: Vec<u32> = x.iter().map(|&v| reduce_mod(v, q)).collect();
    a.mul_vec_mod(&x_mod, q)
        .iter()
        .zip(b)
        .all(|(&lhs, &rhs)| lhs == rhs % q)
}
