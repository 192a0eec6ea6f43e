//! Circulant system builder
//!
//! Turns `g ≡ h ⋆ f (mod q)` in Z_q[x]/(x^n + 1) plus knowledge masks into
//! a square linear system over the unknown coefficients of `f`.
//!
//! # Construction
//!
//! Coefficient `k` of `h ⋆ f` is `Σ_j Hk[j]·f[j]` with the negacyclic row
//!
//! ```text
//! Hk[j] =  h[k - j]      (j <= k)
//! Hk[j] = -h[n + k - j]  (j >  k)
//! ```
//!
//! Each known `g[k]` gives one equation. Known `f[j]` terms move to the
//! right-hand side, unknown ones become the columns of `A`:
//!
//! ```text
//! b[i]      = g[k_i] - Σ_{j known} Hk_i[j]·f[j]   (mod q)
//! A[i][idx] = Hk_i[unknown_f[idx]]
//! ```

use crate::backend::{Backend, RayonBackend};
use crate::error::{Result, SolveError};
use crate::matrix::Matrix;
use crate::modular::{add_mod, mul_mod, reduce_mod, sub_mod};
use crate::poly::PartialPoly;
use crate::result::SolveResult;
use crate::solve::{GaussianSolver, LinearSystem};
use crate::Timings;
use std::time::Instant;
use tracing::debug;

/// Negacyclic row `Hk` of `h` for output coefficient `k`, reduced into `[0, q)`
///
/// Wrapped entries are negated after reduction, so any `i64` coefficient
/// is accepted.
pub fn circulant_row(h: &[i64], k: usize, q: u32) -> Vec<u32> {
    let n = h.len();
    (0..n)
        .map(|j| {
            if j <= k {
                reduce_mod(h[k - j], q)
            } else {
                sub_mod(0, reduce_mod(h[n + k - j], q), q)
            }
        })
        .collect()
}

/// Index sets derived from the knowledge masks, each in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeIndex {
    pub known_g: Vec<usize>,
    pub known_f: Vec<usize>,
    pub unknown_f: Vec<usize>,
}

impl KnowledgeIndex {
    pub fn from_masks(g_mask: &[bool], f_mask: &[bool]) -> Self {
        let known_g = (0..g_mask.len()).filter(|&i| g_mask[i]).collect();
        let (known_f, unknown_f): (Vec<usize>, Vec<usize>) = (0..f_mask.len()).partition(|&i| f_mask[i]);
        Self {
            known_g,
            known_f,
            unknown_f,
        }
    }

    /// Number of equations
    pub fn equations(&self) -> usize {
        self.known_g.len()
    }

    /// Number of unknowns
    pub fn unknowns(&self) -> usize {
        self.unknown_f.len()
    }
}

/// A built system together with the `f` positions its unknowns map to
#[derive(Debug, Clone)]
pub struct CirculantSystem {
    pub system: LinearSystem,
    pub index: KnowledgeIndex,
}

/// Builds the linear system for the unknown coefficients of `f`
pub struct CirculantSystemBuilder<'a> {
    h: &'a [i64],
    g: &'a PartialPoly,
    f: &'a PartialPoly,
    q: u32,
}

impl<'a> CirculantSystemBuilder<'a> {
    pub fn new(h: &'a [i64], g: &'a PartialPoly, f: &'a PartialPoly, q: u32) -> Self {
        Self { h, g, f, q }
    }

    /// Check lengths and modulus, then build `(A, b)`
    ///
    /// # Errors
    /// * `NoKnownEquations` if no `g` coefficient is known
    /// * `NonSquareSystem` if `#known g != #unknown f`
    pub fn build(&self) -> Result<CirculantSystem> {
        let n = self.h.len();
        let q = self.q;
        if q < 2 {
            return Err(SolveError::InvalidModulus(q));
        }
        for (name, len) in [("g", self.g.len()), ("f", self.f.len())] {
            if len != n {
                return Err(SolveError::LengthMismatch {
                    name,
                    expected: n,
                    actual: len,
                });
            }
        }

        let index = KnowledgeIndex::from_masks(self.g.mask(), self.f.mask());
        let m = index.equations();
        if m == 0 {
            return Err(SolveError::NoKnownEquations);
        }
        if m != index.unknowns() {
            return Err(SolveError::NonSquareSystem {
                equations: m,
                unknowns: index.unknowns(),
            });
        }
        debug!(n, equations = m, known_f = index.known_f.len(), "building circulant system");

        let g = self.g.coeffs();
        let f = self.f.coeffs();
        let f_known: Vec<(usize, u32)> = index
            .known_f
            .iter()
            .map(|&j| (j, reduce_mod(f[j], q)))
            .collect();

        let mut a = Matrix::zeros(m, m)?;
        let mut b = Vec::new();
        b.try_reserve_exact(m)
            .map_err(|_| SolveError::AllocationFailure { what: "rhs" })?;

        for (i, &k) in index.known_g.iter().enumerate() {
            let hk = circulant_row(self.h, k, q);

            let known_part = f_known
                .iter()
                .fold(0u32, |acc, &(j, fj)| add_mod(acc, mul_mod(hk[j], fj, q), q));
            b.push(sub_mod(reduce_mod(g[k], q), known_part, q));

            for (dst, &j) in a.row_mut(i).iter_mut().zip(&index.unknown_f) {
                *dst = hk[j];
            }
        }

        Ok(CirculantSystem {
            system: LinearSystem::new(a, b, q)?,
            index,
        })
    }
}

/// Recover the unknown coefficients of `f`, in ascending index order
///
/// Reports in the same tagged shape as [`gaussian_mod_q_solve`]. Uses the
/// rayon backend with its default threshold.
///
/// [`gaussian_mod_q_solve`]: crate::solve::gaussian_mod_q_solve
pub fn solve_unknown_f(h: &[i64], g: &PartialPoly, f: &PartialPoly, q: u32) -> SolveResult {
    SolveResult::from(solve_unknown_f_with(
        &GaussianSolver::<RayonBackend>::default(),
        h,
        g,
        f,
        q,
    ))
}

/// [`solve_unknown_f`] with an explicit solver
pub fn solve_unknown_f_with<B: Backend>(
    solver: &GaussianSolver<B>,
    h: &[i64],
    g: &PartialPoly,
    f: &PartialPoly,
    q: u32,
) -> Result<Vec<i64>> {
    let built = CirculantSystemBuilder::new(h, g, f, q).build()?;
    solver.solve(&built.system)
}

/// Recover `f` and return it fully known
pub fn recover_f<B: Backend>(
    solver: &GaussianSolver<B>,
    h: &[i64],
    g: &PartialPoly,
    f: &PartialPoly,
    q: u32,
) -> Result<PartialPoly> {
    let solution = solve_unknown_f_with(solver, h, g, f, q)?;
    f.fill_unknown(&solution)
}

/// [`recover_f`] with a build/solve/verify timing breakdown
///
/// `timings.verified` is set when the recovered `f` reproduces every known
/// coefficient of `g`.
pub fn recover_f_timed<B: Backend>(
    solver: &GaussianSolver<B>,
    h: &[i64],
    g: &PartialPoly,
    f: &PartialPoly,
    q: u32,
) -> (Result<PartialPoly>, Timings) {
    let mut timings = Timings::default();
    let start = Instant::now();

    let result = CirculantSystemBuilder::new(h, g, f, q).build().and_then(|built| {
        timings.build_time = start.elapsed().as_secs_f64();
        timings.dimension = built.system.dim();

        let solve_start = Instant::now();
        let solution = solver.solve(&built.system);
        timings.solve_time = solve_start.elapsed().as_secs_f64();
        f.fill_unknown(&solution?)
    });

    if let Ok(full) = &result {
        let verify_start = Instant::now();
        timings.verified = verify_recovery(h, full.coeffs(), g, q).unwrap_or(false);
        timings.verify_time = verify_start.elapsed().as_secs_f64();
    }

    timings.total_time = start.elapsed().as_secs_f64();
    (result, timings)
}

/// Check that `h ⋆ f` reproduces every known coefficient of `g`
pub fn verify_recovery(h: &[i64], f: &[i64], g: &PartialPoly, q: u32) -> Result<bool> {
    let product = crate::poly::negacyclic_mul(h, f, q)?;
    Ok(g.known_indices()
        .into_iter()
        .all(|k| reduce_mod(product[k], q) == reduce_mod(g.coeffs()[k], q)))
}
