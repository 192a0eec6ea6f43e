//! Synthetic instances for tests and benchmarks
//!
//! Generates keys shaped like the real attack data: a uniform public `h`, a
//! small secret `f`, `g = h ⋆ f`, and knowledge masks with exactly as many
//! known `g` coefficients as unknown `f` coefficients.

use crate::error::{Result, SolveError};
use crate::matrix::Matrix;
use crate::modular::{add_mod, mul_mod};
use crate::poly::{negacyclic_mul, PartialPoly};
use rand::seq::index::sample;
use rand::Rng;

/// Random invertible `m×m` matrix mod q, built as `L·U` with unit diagonals
pub fn random_unimodular_matrix<R: Rng + ?Sized>(m: usize, q: u32, rng: &mut R) -> Result<Matrix<u32>> {
    if q < 2 {
        return Err(SolveError::InvalidModulus(q));
    }
    let mut lower = Matrix::<u32>::zeros(m, m)?;
    let mut upper = Matrix::<u32>::zeros(m, m)?;
    for i in 0..m {
        *lower.get_mut(i, i) = 1;
        *upper.get_mut(i, i) = 1;
        for j in 0..i {
            *lower.get_mut(i, j) = rng.gen_range(0..q);
            *upper.get_mut(j, i) = rng.gen_range(0..q);
        }
    }

    let mut a = Matrix::<u32>::zeros(m, m)?;
    for i in 0..m {
        for j in 0..m {
            // L is lower and U upper triangular, so only k <= min(i, j) contributes
            let mut acc = 0;
            for k in 0..=i.min(j) {
                acc = add_mod(acc, mul_mod(*lower.get(i, k), *upper.get(k, j), q), q);
            }
            *a.get_mut(i, j) = acc;
        }
    }
    Ok(a)
}

/// A generated key with partial knowledge of `f` and `g`
#[derive(Debug, Clone)]
pub struct SyntheticInstance {
    pub q: u32,
    pub h: Vec<i64>,
    pub secret_f: Vec<i64>,
    pub f: PartialPoly,
    pub g: PartialPoly,
}

impl SyntheticInstance {
    /// Generate an instance of degree `n` with `unknowns` unknown `f`
    /// coefficients (and as many known `g` coefficients)
    ///
    /// Secret coefficients are uniform in `[-bound, bound]`.
    pub fn generate<R: Rng + ?Sized>(
        n: usize,
        unknowns: usize,
        bound: i64,
        q: u32,
        rng: &mut R,
    ) -> Result<Self> {
        if q < 2 {
            return Err(SolveError::InvalidModulus(q));
        }
        if unknowns > n {
            return Err(SolveError::LengthMismatch {
                name: "unknowns",
                expected: n,
                actual: unknowns,
            });
        }

        let h: Vec<i64> = (0..n).map(|_| rng.gen_range(0..q) as i64).collect();
        let secret_f: Vec<i64> = (0..n).map(|_| rng.gen_range(-bound..=bound)).collect();
        let g_full = negacyclic_mul(&h, &secret_f, q)?;

        let mut f_mask = vec![true; n];
        for i in sample(rng, n, unknowns) {
            f_mask[i] = false;
        }
        let mut g_mask = vec![false; n];
        for i in sample(rng, n, unknowns) {
            g_mask[i] = true;
        }

        let f_coeffs = secret_f
            .iter()
            .zip(&f_mask)
            .map(|(&v, &known)| if known { v } else { 0 })
            .collect();
        let g_coeffs = g_full
            .iter()
            .zip(&g_mask)
            .map(|(&v, &known)| if known { v } else { 0 })
            .collect();

        Ok(Self {
            q,
            h,
            f: PartialPoly::new(f_coeffs, f_mask)?,
            g: PartialPoly::new(g_coeffs, g_mask)?,
            secret_f,
        })
    }

    pub fn n(&self) -> usize {
        self.h.len()
    }

    /// The secret values at the unknown `f` positions, in ascending order
    pub fn expected_solution(&self) -> Vec<i64> {
        self.f
            .unknown_indices()
            .into_iter()
            .map(|i| self.secret_f[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::verify_solution;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unimodular_is_invertible() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = random_unimodular_matrix(6, 17, &mut rng).unwrap();
        // det(L·U) = 1, so the identity columns are reachable: solve e_0
        let x: Vec<i64> = vec![1, 0, 0, 0, 0, 0];
        let b: Vec<u32> = (0..6).map(|i| *a.get(i, 0)).collect();
        assert!(verify_solution(&a, &b, &x, 17));
    }

    #[test]
    fn test_generate_shapes() {
        let mut rng = StdRng::seed_from_u64(3);
        let inst = SyntheticInstance::generate(16, 8, 3, 12289, &mut rng).unwrap();
        assert_eq!(inst.n(), 16);
        assert_eq!(inst.f.unknown_count(), 8);
        assert_eq!(inst.g.known_count(), 8);
        assert_eq!(inst.expected_solution().len(), 8);
        assert!(inst.secret_f.iter().all(|v| v.abs() <= 3));

        let product = negacyclic_mul(&inst.h, &inst.secret_f, 12289).unwrap();
        for k in inst.g.known_indices() {
            assert_eq!(inst.g.coeffs()[k], product[k]);
        }
    }

    #[test]
    fn test_generate_rejects_too_many_unknowns() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(SyntheticInstance::generate(4, 5, 1, 17, &mut rng).is_err());
    }
}
