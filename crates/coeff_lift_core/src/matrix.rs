//! Dense matrix operations
//!
//! Row-major dense matrix backed by a single contiguous buffer.

use crate::error::{Result, SolveError};
use crate::modular::reduce_mod;
use num_traits::Zero;

/// Dense matrix in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Clone> Matrix<T> {
    /// Create a matrix from a flat vector (row-major order)
    pub fn from_flat(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(SolveError::LengthMismatch {
                name: "matrix",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Create a matrix from nested rows, all of which must have equal length
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(SolveError::LengthMismatch {
                    name: "matrix row",
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Get matrix dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Access element at (i, j)
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[i * self.cols + j]
    }

    /// Mutable access to element at (i, j)
    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut T {
        &mut self.data[i * self.cols + j]
    }

    /// Get underlying data as slice
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get mutable underlying data
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume and return underlying data
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Get a row as a slice
    pub fn row(&self, i: usize) -> &[T] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Get a row as a mutable slice
    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        let start = i * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Swap two rows in place
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * self.cols);
        head[lo * self.cols..(lo + 1) * self.cols].swap_with_slice(&mut tail[..self.cols]);
    }

    /// Split the matrix around row `i`
    ///
    /// Returns the rows above `i`, row `i` itself, and the rows below `i`.
    /// The pivot row is shared while the others stay mutable, which is what
    /// the elimination backends need.
    pub fn split_at_row(&mut self, i: usize) -> (&mut [T], &[T], &mut [T]) {
        let (above, rest) = self.data.split_at_mut(i * self.cols);
        let (pivot, below) = rest.split_at_mut(self.cols);
        (above, &*pivot, below)
    }
}

impl<T: Clone + Zero> Matrix<T> {
    /// Create a zero matrix
    ///
    /// The buffer is reserved fallibly so that an oversized request surfaces
    /// as [`SolveError::AllocationFailure`] instead of aborting.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or(SolveError::AllocationFailure { what: "matrix" })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| SolveError::AllocationFailure { what: "matrix" })?;
        data.resize(len, T::zero());
        Ok(Self { data, rows, cols })
    }
}

impl Matrix<i64> {
    /// Reduce all entries modulo q into `[0, q)`
    pub fn reduce_mod(&self, q: u32) -> Matrix<u32> {
        Matrix {
            data: self.data.iter().map(|&x| reduce_mod(x, q)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl Matrix<u32> {
    /// Build the `m×(m+1)` augmented matrix `[A | b]`, reducing every entry mod q
    pub fn augmented(a: &Matrix<u32>, b: &[u32], q: u32) -> Result<Self> {
        let m = a.rows();
        if b.len() != m {
            return Err(SolveError::LengthMismatch {
                name: "b",
                expected: m,
                actual: b.len(),
            });
        }
        let mut aug = Matrix::zeros(m, a.cols() + 1)?;
        for i in 0..m {
            let row = aug.row_mut(i);
            for (dst, &src) in row.iter_mut().zip(a.row(i)) {
                *dst = src % q;
            }
            row[a.cols()] = b[i] % q;
        }
        Ok(aug)
    }

    /// Compute `A·x mod q` for residues `x`
    pub fn mul_vec_mod(&self, x: &[u32], q: u32) -> Vec<u32> {
        (0..self.rows)
            .map(|i| {
                let acc = self
                    .row(i)
                    .iter()
                    .zip(x)
                    .fold(0u64, |acc, (&a, &xi)| (acc + a as u64 * xi as u64) % q as u64);
                acc as u32
            })
            .collect()
    }
}
