//! Backend trait for row elimination
//!
//! The solver owns the column loop (pivot search, swap, normalisation) and
//! hands the per-column elimination step to a backend. Every row other than
//! the pivot row only reads the pivot row and writes its own storage, so a
//! backend is free to process rows in parallel. A backend call returns only
//! once every row has been updated; that return is the barrier between
//! columns.

use crate::matrix::Matrix;
use crate::modular::{mul_mod, sub_mod};
use rayon::prelude::*;

/// Default row count below which [`RayonBackend`] stays sequential
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 100;

/// Backend trait for the elimination step of modular Gaussian elimination
///
/// Implementations can run sequentially or across a thread pool; results
/// must not depend on the choice.
pub trait Backend: Send + Sync {
    /// Name of this backend (for logging)
    fn name(&self) -> &'static str;

    /// Eliminate column `col` from every row except row `col`
    ///
    /// # Arguments
    /// * `work` - Augmented matrix, all entries in `[0, q)`, with row `col`
    ///   already normalised so that `work[col][col] == 1`
    /// * `col` - Pivot column (and pivot row)
    /// * `q` - Modulus
    fn eliminate_column(&self, work: &mut Matrix<u32>, col: usize, q: u32);
}

/// `row -= row[col] * pivot (mod q)` over columns `col..`
#[inline]
pub(crate) fn eliminate_row(row: &mut [u32], pivot: &[u32], col: usize, q: u32) {
    let factor = row[col] % q;
    if factor == 0 {
        return;
    }
    for (dst, &p) in row[col..].iter_mut().zip(&pivot[col..]) {
        *dst = sub_mod(*dst, mul_mod(factor, p, q), q);
    }
}

/// Sequential CPU backend
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for CpuBackend {
    fn name(&self) -> &'static str {
        "CPU"
    }

    fn eliminate_column(&self, work: &mut Matrix<u32>, col: usize, q: u32) {
        let cols = work.cols();
        let (above, pivot, below) = work.split_at_row(col);
        for row in above.chunks_mut(cols).chain(below.chunks_mut(cols)) {
            eliminate_row(row, pivot, col, q);
        }
    }
}

/// Data-parallel CPU backend on the rayon global pool
///
/// Systems with at most `min_parallel_rows` rows are eliminated
/// sequentially; splitting them across threads costs more than it saves.
#[derive(Debug, Clone, Copy)]
pub struct RayonBackend {
    min_parallel_rows: usize,
}

impl RayonBackend {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_PARALLEL_THRESHOLD)
    }

    pub fn with_threshold(min_parallel_rows: usize) -> Self {
        Self { min_parallel_rows }
    }

    pub fn threshold(&self) -> usize {
        self.min_parallel_rows
    }

    pub fn num_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

impl Default for RayonBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for RayonBackend {
    fn name(&self) -> &'static str {
        "Rayon"
    }

    fn eliminate_column(&self, work: &mut Matrix<u32>, col: usize, q: u32) {
        if work.rows() <= self.min_parallel_rows {
            return CpuBackend.eliminate_column(work, col, q);
        }
        let cols = work.cols();
        let (above, pivot, below) = work.split_at_row(col);
        above
            .par_chunks_mut(cols)
            .chain(below.par_chunks_mut(cols))
            .for_each(|row| eliminate_row(row, pivot, col, q));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix<u32> {
        // Row 0 is the normalised pivot row for column 0
        Matrix::from_flat(vec![1, 2, 4, 3, 5, 7, 10, 0, 16], 3, 3).unwrap()
    }

    #[test]
    fn test_eliminate_row() {
        let mut row = vec![3u32, 5, 7];
        eliminate_row(&mut row, &[1, 2, 4], 0, 17);
        // [3 - 3, 5 - 6, 7 - 12] mod 17
        assert_eq!(row, vec![0, 16, 12]);
    }

    #[test]
    fn test_cpu_eliminate_column() {
        let mut m = sample();
        CpuBackend::new().eliminate_column(&mut m, 0, 17);
        assert_eq!(m.row(0), &[1, 2, 4]);
        assert_eq!(m.row(1), &[0, 16, 12]);
        assert_eq!(m.row(2), &[0, 14, 10]);
    }

    #[test]
    fn test_rayon_matches_cpu() {
        let mut seq = sample();
        let mut par = sample();
        CpuBackend.eliminate_column(&mut seq, 0, 17);
        RayonBackend::with_threshold(0).eliminate_column(&mut par, 0, 17);
        assert_eq!(seq, par);
    }
}
