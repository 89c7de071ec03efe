//! Compressed sparse row matrices.
//!
//! Every operator can be materialised as a [`SparseMatrix`] for inspection,
//! testing and hand-off to external linear algebra.

use crate::error::{FdmError, FdmResult};

/// Real matrix in compressed sparse row format.
///
/// Column indices within a row are strictly increasing and no stored value
/// is exactly zero.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Assemble from `(row, col, value)` entries; duplicates are summed.
    ///
    /// # Errors
    ///
    /// Returns `FdmError::Index` if an entry lies outside `rows x cols`.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_fdm::operators::SparseMatrix;
    ///
    /// let m = SparseMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (0, 0, 2.0), (1, 0, -1.0)])
    ///     .unwrap();
    /// assert_eq!(m.get(0, 0).unwrap(), 3.0);
    /// assert_eq!(m.get(0, 1).unwrap(), 0.0);
    /// assert_eq!(m.nnz(), 2);
    /// ```
    pub fn from_triplets<I>(rows: usize, cols: usize, triplets: I) -> FdmResult<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut entries: Vec<(usize, usize, f64)> = triplets.into_iter().collect();
        if let Some(&(r, c, _)) = entries.iter().find(|&&(r, c, _)| r >= rows || c >= cols) {
            return Err(FdmError::index(format!(
                "entry ({}, {}) outside a {}x{} matrix",
                r, c, rows, cols
            )));
        }
        entries.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut row_ptr = vec![0; rows + 1];
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        let mut iter = entries.into_iter().peekable();
        while let Some((r, c, mut v)) = iter.next() {
            while let Some(&(r2, c2, v2)) = iter.peek() {
                if (r2, c2) != (r, c) {
                    break;
                }
                v += v2;
                iter.next();
            }
            if v != 0.0 {
                col_idx.push(c);
                values.push(v);
                row_ptr[r + 1] += 1;
            }
        }
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }
        Ok(Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Square identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Entry `(row, col)`, zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> FdmResult<f64> {
        if row >= self.rows || col >= self.cols {
            return Err(FdmError::index(format!(
                "entry ({}, {}) outside a {}x{} matrix",
                row, col, self.rows, self.cols
            )));
        }
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        Ok(self.col_idx[range.clone()]
            .binary_search(&col)
            .map(|k| self.values[range.start + k])
            .unwrap_or(0.0))
    }

    /// Stored entries of a row as `(col, value)` pairs.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = if row < self.rows {
            self.row_ptr[row]..self.row_ptr[row + 1]
        } else {
            0..0
        };
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// All stored entries as `(row, col, value)`.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |r| self.row(r).map(move |(c, v)| (r, c, v)))
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, x: &[f64]) -> FdmResult<Vec<f64>> {
        FdmError::check_len("vector", x.len(), self.cols)?;
        Ok((0..self.rows)
            .map(|r| self.row(r).map(|(c, v)| v * x[c]).sum::<f64>())
            .collect())
    }

    /// Entry-wise sum of two matrices of equal shape.
    pub fn add(&self, other: &SparseMatrix) -> FdmResult<SparseMatrix> {
        if (self.rows, self.cols) != (other.rows, other.cols) {
            return Err(FdmError::configuration(format!(
                "cannot add a {}x{} matrix to a {}x{} matrix",
                other.rows, other.cols, self.rows, self.cols
            )));
        }
        Self::from_triplets(self.rows, self.cols, self.triplets().chain(other.triplets()))
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&self, factor: f64) -> SparseMatrix {
        if factor == 0.0 {
            return Self {
                rows: self.rows,
                cols: self.cols,
                row_ptr: vec![0; self.rows + 1],
                col_idx: Vec::new(),
                values: Vec::new(),
            };
        }
        let mut scaled = self.clone();
        scaled.values.iter_mut().for_each(|v| *v *= factor);
        scaled
    }
}
