//! Row-major matrix of scalar nodes.

use crate::autograd::{ScalarNode, ValueRef};

use super::{ensure_len, DimensionError};

/// A `rows × cols` grid of scalar autograd nodes, stored row-major.
///
/// Cloning is cheap in the sense that it shares the nodes: a clone refers to the same
/// graph positions, not copies of them.
#[derive(Clone, Debug)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// One node per element, row-major.
    nodes: Vec<ValueRef>,
}

impl Matrix {
    /// Wraps existing nodes. `nodes.len()` must equal `rows * cols`.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Mismatch`] when the node count does not fit the shape.
    pub fn from_nodes(rows: usize, cols: usize, nodes: Vec<ValueRef>) -> Result<Self, DimensionError> {
        ensure_len("matrix elements", rows * cols, nodes.len())?;
        Ok(Matrix { rows, cols, nodes })
    }

    /// Creates a matrix of fresh leaf nodes holding `values`.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Mismatch`] when `values.len() != rows * cols`.
    pub fn from_values(rows: usize, cols: usize, values: &[f64]) -> Result<Self, DimensionError> {
        Self::from_nodes(rows, cols, values.iter().copied().map(ValueRef::new).collect())
    }

    /// Stacks rows of equal width.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Empty`] when `rows` is empty.
    /// - [`DimensionError::Mismatch`] when rows differ in width.
    pub fn from_rows(rows: Vec<Vec<ValueRef>>) -> Result<Self, DimensionError> {
        let cols = rows
            .first()
            .map(Vec::len)
            .ok_or(DimensionError::Empty {
                context: "matrix rows",
            })?;
        let n_rows = rows.len();
        let mut nodes = Vec::with_capacity(n_rows * cols);
        for row in rows {
            ensure_len("matrix row width", cols, row.len())?;
            nodes.extend(row);
        }
        Ok(Matrix {
            rows: n_rows,
            cols,
            nodes,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row `r` as a slice.
    ///
    /// # Panics
    ///
    /// If `r >= rows`.
    #[must_use]
    pub fn row(&self, r: usize) -> &[ValueRef] {
        assert!(r < self.rows, "row {r} out of range for {} rows", self.rows);
        &self.nodes[r * self.cols..(r + 1) * self.cols]
    }

    /// Element at `(r, c)`.
    ///
    /// # Panics
    ///
    /// If either index is out of range.
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> &ValueRef {
        &self.row(r)[c]
    }

    /// Iterator over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[ValueRef]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// All nodes, row-major.
    #[must_use]
    pub fn nodes(&self) -> &[ValueRef] {
        &self.nodes
    }

    /// Columns `start..start + len` of every row (e.g. one attention head).
    ///
    /// # Errors
    ///
    /// - [`DimensionError::OutOfRange`] when the column range exceeds `cols`.
    pub fn column_slice(&self, start: usize, len: usize) -> Result<Matrix, DimensionError> {
        let end = start + len;
        if end > self.cols {
            return Err(DimensionError::OutOfRange {
                context: "matrix column slice",
                index: end - 1,
                bound: self.cols,
            });
        }
        let nodes = self
            .iter_rows()
            .flat_map(|row| row[start..end].iter().cloned())
            .collect();
        Ok(Matrix {
            rows: self.rows,
            cols: len,
            nodes,
        })
    }

    /// Concatenates matrices with the same row count side by side.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Empty`] when `parts` is empty.
    /// - [`DimensionError::Mismatch`] when row counts differ.
    pub fn hconcat(parts: &[Matrix]) -> Result<Matrix, DimensionError> {
        let rows = parts
            .first()
            .map(Matrix::rows)
            .ok_or(DimensionError::Empty {
                context: "matrix concat",
            })?;
        for part in parts {
            ensure_len("matrix concat rows", rows, part.rows)?;
        }
        let cols = parts.iter().map(Matrix::cols).sum();
        let mut nodes = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for part in parts {
                nodes.extend(part.row(r).iter().cloned());
            }
        }
        Ok(Matrix { rows, cols, nodes })
    }

    /// Element-wise sum (the residual connection).
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Mismatch`] when shapes differ.
    pub fn add(&self, rhs: &Matrix) -> Result<Matrix, DimensionError> {
        ensure_len("matrix add rows", self.rows, rhs.rows)?;
        ensure_len("matrix add cols", self.cols, rhs.cols)?;
        let nodes = self
            .nodes
            .iter()
            .zip(&rhs.nodes)
            .map(|(a, b)| a + b)
            .collect();
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            nodes,
        })
    }

    /// Applies `f` to every element, keeping the shape.
    #[must_use]
    pub fn map(&self, f: impl FnMut(&ValueRef) -> ValueRef) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            nodes: self.nodes.iter().map(f).collect(),
        }
    }

    /// Forward values, row-major.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.nodes.iter().map(ValueRef::data).collect()
    }

    /// Gradients (after backward), row-major.
    #[must_use]
    pub fn grads(&self) -> Vec<f64> {
        self.nodes.iter().map(ValueRef::grad).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_checks_element_count() {
        assert!(Matrix::from_values(2, 2, &[1.0, 2.0, 3.0, 4.0]).is_ok());
        assert_eq!(
            Matrix::from_values(2, 2, &[1.0, 2.0, 3.0]).unwrap_err(),
            DimensionError::Mismatch {
                context: "matrix elements",
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn row_and_get_index_row_major() {
        let m = Matrix::from_values(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.row(1).len(), 3);
        assert_eq!(m.get(1, 0).data(), 4.0);
        assert_eq!(m.iter_rows().count(), 2);
    }

    #[test]
    fn from_rows_rejects_ragged_and_empty() {
        let ragged = vec![vec![ValueRef::new(1.0)], vec![ValueRef::new(1.0), ValueRef::new(2.0)]];
        assert!(matches!(
            Matrix::from_rows(ragged),
            Err(DimensionError::Mismatch { .. })
        ));
        assert!(matches!(
            Matrix::from_rows(Vec::new()),
            Err(DimensionError::Empty { .. })
        ));
    }

    #[test]
    fn column_slice_and_hconcat_round_trip_shares_nodes() {
        let m = Matrix::from_values(2, 4, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        let left = m.column_slice(0, 2).unwrap();
        let right = m.column_slice(2, 2).unwrap();
        assert_eq!(left.values(), vec![1.0, 2.0, 5.0, 6.0]);
        let joined = Matrix::hconcat(&[left, right]).unwrap();
        assert_eq!(joined.values(), m.values());
        assert_eq!(joined.get(1, 3).id(), m.get(1, 3).id());
        assert!(m.column_slice(3, 2).is_err());
    }

    #[test]
    fn add_backward_reaches_both_operands() {
        let a = Matrix::from_values(1, 2, &[1.0, 2.0]).unwrap();
        let b = Matrix::from_values(1, 2, &[3.0, 4.0]).unwrap();
        let c = a.add(&b).unwrap();
        assert_eq!(c.values(), vec![4.0, 6.0]);
        crate::autograd::sum(c.nodes()).backward().unwrap();
        assert_eq!(a.grads(), vec![1.0, 1.0]);
        assert_eq!(b.grads(), vec![1.0, 1.0]);
        let wrong = Matrix::from_values(2, 1, &[0.0, 0.0]).unwrap();
        assert!(a.add(&wrong).is_err());
    }

    #[test]
    fn map_keeps_shape() {
        let a = Matrix::from_values(1, 3, &[-1.0, 0.0, 2.0]).unwrap();
        let r = a.map(ValueRef::relu);
        assert_eq!(r.shape(), (1, 3));
        assert_eq!(r.values(), vec![0.0, 0.0, 2.0]);
    }
}
