//! Nine-point stencil coupling two axes.

use super::{FdmLinearOp, RowCoefficients, SparseMatrix, ROW_MIN_LEN};
use crate::error::{FdmError, FdmResult};
use crate::layout::FdmLinearOpLayout;
use rayon::prelude::*;
use std::sync::Arc;

/// Operator whose row `i` combines the 3x3 neighbourhood of point `i` in the
/// `(axis1, axis2)` plane.
///
/// Slot `k = 3·(o1 + 1) + (o2 + 1)` holds the neighbour at offset `o1` along
/// `axis1` and `o2` along `axis2`, with `o1, o2 ∈ {-1, 0, 1}`. Off-grid
/// neighbours are clamped onto the line; their weights are zero or are summed
/// into the clamped point.
#[derive(Clone, Debug, PartialEq)]
pub struct NinePointLinearOp {
    axis1: usize,
    axis2: usize,
    layout: Arc<FdmLinearOpLayout>,
    indices: Vec<[usize; 9]>,
    weights: Vec<[f64; 9]>,
}

impl NinePointLinearOp {
    /// Build from per-row weights in slot order.
    ///
    /// # Errors
    ///
    /// `FdmError::Configuration` if the axes coincide or `weights` has the
    /// wrong length, `FdmError::Index` if an axis is outside the layout.
    pub fn from_weights(
        axis1: usize,
        axis2: usize,
        layout: Arc<FdmLinearOpLayout>,
        weights: Vec<[f64; 9]>,
    ) -> FdmResult<Self> {
        layout.check_axis(axis1)?;
        layout.check_axis(axis2)?;
        if axis1 == axis2 {
            return Err(FdmError::configuration(format!(
                "mixed operator needs two distinct axes, got {} twice",
                axis1
            )));
        }
        FdmError::check_len("nine-point weights", weights.len(), layout.size())?;

        let indices = (0..layout.size())
            .map(|i| {
                let mut row = [0; 9];
                for o1 in -1..=1isize {
                    let n1 = layout.line_neighbor(i, axis1, o1);
                    for o2 in -1..=1isize {
                        row[slot(o1, o2)] = layout.line_neighbor(n1, axis2, o2);
                    }
                }
                row
            })
            .collect();
        Ok(Self {
            axis1,
            axis2,
            layout,
            indices,
            weights,
        })
    }

    /// The two coupled axes.
    #[inline]
    pub fn axes(&self) -> (usize, usize) {
        (self.axis1, self.axis2)
    }

    /// Index space of the operator.
    #[inline]
    pub fn layout(&self) -> &Arc<FdmLinearOpLayout> {
        &self.layout
    }

    /// Weights of row `i` in slot order.
    pub fn weights(&self, i: usize) -> FdmResult<&[f64; 9]> {
        self.weights.get(i).ok_or_else(|| {
            FdmError::index(format!("row {} of a {}-row operator", i, self.weights.len()))
        })
    }

    /// Scale row `i` by `coefficients[i]`.
    pub fn mult(&self, coefficients: RowCoefficients<'_>) -> FdmResult<Self> {
        let n = self.layout.size();
        coefficients.check("row coefficients", n)?;
        let mut out = self.clone();
        for (i, row) in out.weights.iter_mut().enumerate() {
            let c = coefficients.at(i);
            row.iter_mut().for_each(|w| *w *= c);
        }
        Ok(out)
    }

    /// Operator sum; both operators must couple the same axes.
    pub fn add(&self, other: &NinePointLinearOp) -> FdmResult<Self> {
        if self.layout != other.layout || self.axes() != other.axes() {
            return Err(FdmError::configuration(
                "nine-point operators couple different axes or layouts",
            ));
        }
        let mut out = self.clone();
        for (row, other_row) in out.weights.iter_mut().zip(&other.weights) {
            for (w, o) in row.iter_mut().zip(other_row) {
                *w += o;
            }
        }
        Ok(out)
    }
}

#[inline]
pub(crate) fn slot(o1: isize, o2: isize) -> usize {
    (3 * (o1 + 1) + (o2 + 1)) as usize
}

impl FdmLinearOp for NinePointLinearOp {
    fn size(&self) -> usize {
        self.layout.size()
    }

    fn apply(&self, r: &[f64]) -> FdmResult<Vec<f64>> {
        FdmError::check_len("vector", r.len(), self.layout.size())?;
        Ok(self
            .indices
            .par_iter()
            .zip(self.weights.par_iter())
            .with_min_len(ROW_MIN_LEN)
            .map(|(idx, w)| idx.iter().zip(w).map(|(&j, &w)| w * r[j]).sum::<f64>())
            .collect())
    }

    fn to_matrix(&self) -> FdmResult<SparseMatrix> {
        let n = self.layout.size();
        SparseMatrix::from_triplets(
            n,
            n,
            self.indices
                .iter()
                .zip(&self.weights)
                .enumerate()
                .flat_map(|(i, (idx, w))| idx.iter().zip(w).map(move |(&j, &w)| (i, j, w))),
        )
    }
}
