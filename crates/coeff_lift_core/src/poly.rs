//! Partially known polynomials in Z_q[x]/(x^n + 1)
//!
//! A [`PartialPoly`] pairs a coefficient vector with a knowledge mask:
//! `mask[i] == true` means coefficient `i` (of `x^i`) has been observed.

use crate::error::{Result, SolveError};
use crate::modular::{reduce_mod, to_centered_mod};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Coefficient vector with a knowledge mask of the same length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialPoly {
    coeffs: Vec<i64>,
    mask: Vec<bool>,
}

impl PartialPoly {
    pub fn new(coeffs: Vec<i64>, mask: Vec<bool>) -> Result<Self> {
        if coeffs.len() != mask.len() {
            return Err(SolveError::LengthMismatch {
                name: "mask",
                expected: coeffs.len(),
                actual: mask.len(),
            });
        }
        Ok(Self { coeffs, mask })
    }

    /// Fully known polynomial
    pub fn known(coeffs: Vec<i64>) -> Self {
        let mask = vec![true; coeffs.len()];
        Self { coeffs, mask }
    }

    /// Dense polynomial from a sparse `position -> value` map
    ///
    /// Positions `>= n` are ignored; missing positions are unknown with
    /// coefficient 0.
    pub fn from_known(known: &BTreeMap<usize, i64>, n: usize) -> Self {
        let mut coeffs = vec![0; n];
        let mut mask = vec![false; n];
        for (&i, &v) in known.range(..n) {
            coeffs[i] = v;
            mask[i] = true;
        }
        Self { coeffs, mask }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn coeffs(&self) -> &[i64] {
        &self.coeffs
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn is_known(&self, i: usize) -> bool {
        self.mask[i]
    }

    pub fn known_count(&self) -> usize {
        self.mask.iter().filter(|&&k| k).count()
    }

    pub fn unknown_count(&self) -> usize {
        self.len() - self.known_count()
    }

    /// Ascending indices of known coefficients
    pub fn known_indices(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.mask[i]).collect()
    }

    /// Ascending indices of unknown coefficients
    pub fn unknown_indices(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| !self.mask[i]).collect()
    }

    /// Keep only the first `limit` known positions (in index order)
    pub fn truncate_known(&mut self, limit: usize) {
        let mut kept = 0;
        for known in self.mask.iter_mut().filter(|k| **k) {
            if kept < limit {
                kept += 1;
            } else {
                *known = false;
            }
        }
    }

    /// Write `solution` into the unknown positions in ascending order
    ///
    /// The result is fully known.
    pub fn fill_unknown(&self, solution: &[i64]) -> Result<PartialPoly> {
        let unknown = self.unknown_indices();
        if unknown.len() != solution.len() {
            return Err(SolveError::LengthMismatch {
                name: "solution",
                expected: unknown.len(),
                actual: solution.len(),
            });
        }
        let mut coeffs = self.coeffs.clone();
        for (&i, &v) in unknown.iter().zip(solution) {
            coeffs[i] = v;
        }
        Ok(PartialPoly::known(coeffs))
    }
}

impl fmt::Display for PartialPoly {
    /// Unknown coefficients print as `?`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (&c, &k)) in self.coeffs.iter().zip(&self.mask).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if k {
                write!(f, "{}", c)?;
            } else {
                write!(f, "?")?;
            }
        }
        write!(f, "]")
    }
}

/// Outcome of [`select_known_positions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Enough,
    Insufficient { count: usize, required: usize },
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Enough => write!(f, "ok"),
            Selection::Insufficient { count, required } => {
                write!(f, "not enough known values: only {}/{}", count, required)
            }
        }
    }
}

/// Dense polynomial from a guess map, flagging when fewer than `max_known`
/// positions below `n` are known
pub fn select_known_positions(
    known: &BTreeMap<usize, i64>,
    max_known: usize,
    n: usize,
) -> (PartialPoly, Selection) {
    let poly = PartialPoly::from_known(known, n);
    let count = poly.known_count();
    let selection = if count < max_known {
        warn!(count, required = max_known, "not enough known values");
        Selection::Insufficient {
            count,
            required: max_known,
        }
    } else {
        Selection::Enough
    };
    (poly, selection)
}

/// `n / 2` rounded half to even: 7 gives 4, 5 gives 2
pub fn half_degree(n: usize) -> usize {
    let half = n / 2;
    if n % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}

/// Limit both polynomials to [`half_degree`] known positions when both
/// exceed it
///
/// With `n/2` known `g` and `n/2` known `f` the circulant system is square.
/// If either side is at or below the limit the inputs are left untouched.
pub fn balance_known(f: &mut PartialPoly, g: &mut PartialPoly, n: usize) {
    let half = half_degree(n);
    if f.known_count() > half && g.known_count() > half {
        f.truncate_known(half);
        g.truncate_known(half);
    }
}

/// Negacyclic product `a ⋆ b` in Z_q[x]/(x^n + 1), centered
///
/// Schoolbook multiplication; `x^(i+j)` with `i + j >= n` wraps to
/// `-x^(i+j-n)`.
pub fn negacyclic_mul(a: &[i64], b: &[i64], q: u32) -> Result<Vec<i64>> {
    let n = a.len();
    if b.len() != n {
        return Err(SolveError::LengthMismatch {
            name: "negacyclic operand",
            expected: n,
            actual: b.len(),
        });
    }
    let q64 = q as u64;
    let a: Vec<u64> = a.iter().map(|&v| reduce_mod(v, q) as u64).collect();
    let b: Vec<u64> = b.iter().map(|&v| reduce_mod(v, q) as u64).collect();
    let mut acc = vec![0u64; n];

    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            let prod = ai * bj % q64;
            let k = i + j;
            if k < n {
                acc[k] = (acc[k] + prod) % q64;
            } else {
                acc[k - n] = (acc[k - n] + q64 - prod) % q64;
            }
        }
    }

    Ok(acc.into_iter().map(|v| to_centered_mod(v as i64, q)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_known_ignores_out_of_range() {
        let known: BTreeMap<usize, i64> = [(0, 5), (3, -2), (9, 7)].into_iter().collect();
        let p = PartialPoly::from_known(&known, 4);
        assert_eq!(p.coeffs(), &[5, 0, 0, -2]);
        assert_eq!(p.mask(), &[true, false, false, true]);
        assert_eq!(p.to_string(), "[5, ?, ?, -2]");
    }

    #[test]
    fn test_select_known_positions() {
        let known: BTreeMap<usize, i64> = (0..3).map(|i| (i, i as i64)).collect();
        let (_, sel) = select_known_positions(&known, 4, 8);
        assert_eq!(sel, Selection::Insufficient { count: 3, required: 4 });
        assert_eq!(sel.to_string(), "not enough known values: only 3/4");

        let (p, sel) = select_known_positions(&known, 3, 8);
        assert_eq!(sel, Selection::Enough);
        assert_eq!(p.known_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_balance_known() {
        let mut f = PartialPoly::new(vec![0; 8], vec![true, true, false, true, true, true, false, false]).unwrap();
        let mut g = PartialPoly::new(vec![0; 8], vec![false, true, true, true, true, true, true, false]).unwrap();
        balance_known(&mut f, &mut g, 8);
        assert_eq!(f.known_indices(), vec![0, 1, 3, 4]);
        assert_eq!(g.known_indices(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_half_degree_rounds_half_to_even() {
        assert_eq!(half_degree(512), 256);
        assert_eq!(half_degree(8), 4);
        assert_eq!(half_degree(7), 4);
        assert_eq!(half_degree(5), 2);
        assert_eq!(half_degree(3), 2);
        assert_eq!(half_degree(1), 0);
        assert_eq!(half_degree(0), 0);
    }

    #[test]
    fn test_balance_known_odd_degree() {
        let mut f = PartialPoly::new(vec![0; 7], vec![true, true, true, true, true, false, false]).unwrap();
        let mut g = PartialPoly::new(vec![0; 7], vec![false, true, true, true, true, true, true]).unwrap();
        balance_known(&mut f, &mut g, 7);
        assert_eq!(f.known_indices(), vec![0, 1, 2, 3]);
        assert_eq!(g.known_indices(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_balance_known_untouched_when_one_side_small() {
        let mut f = PartialPoly::new(vec![0; 4], vec![true, true, true, false]).unwrap();
        let mut g = PartialPoly::new(vec![0; 4], vec![true, false, false, false]).unwrap();
        let (f0, g0) = (f.clone(), g.clone());
        balance_known(&mut f, &mut g, 4);
        assert_eq!(f, f0);
        assert_eq!(g, g0);
    }

    #[test]
    fn test_fill_unknown() {
        let p = PartialPoly::new(vec![3, 0, 7, 0], vec![true, false, true, false]).unwrap();
        let full = p.fill_unknown(&[-1, 2]).unwrap();
        assert_eq!(full.coeffs(), &[3, -1, 7, 2]);
        assert_eq!(full.unknown_count(), 0);
        assert!(p.fill_unknown(&[1]).is_err());
    }

    #[test]
    fn test_negacyclic_mul_wraps_with_sign() {
        // x^3 * x = x^4 = -1 in Z[x]/(x^4 + 1)
        let a = [0, 0, 0, 1];
        let b = [0, 1, 0, 0];
        assert_eq!(negacyclic_mul(&a, &b, 17).unwrap(), vec![-1, 0, 0, 0]);

        // (1 + x)(1 + x^3) = 1 + x + x^3 + x^4 = x + x^3
        let a = [1, 1, 0, 0];
        let b = [1, 0, 0, 1];
        assert_eq!(negacyclic_mul(&a, &b, 17).unwrap(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_negacyclic_mul_length_mismatch() {
        assert!(negacyclic_mul(&[1, 2], &[1], 17).is_err());
    }
}
