//! Embedding table lookup.

use crate::autograd::ValueRef;
use crate::tensor::{DimensionError, Matrix};

use super::{Initializer, Module};

/// A table of `num_embeddings` rows of width `dim`.
///
/// Lookups return the table's own nodes, so backward only touches the rows that were read.
pub struct Embedding {
    /// Names this table in dimension errors (e.g. `"token embedding"`).
    context: &'static str,
    dim: usize,
    table: Vec<Vec<ValueRef>>,
}

impl Embedding {
    /// Gaussian-initialized table.
    #[must_use]
    pub fn new(
        context: &'static str,
        num_embeddings: usize,
        dim: usize,
        init: &mut Initializer,
    ) -> Self {
        Embedding {
            context,
            dim,
            table: init.matrix(num_embeddings, dim),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn num_embeddings(&self) -> usize {
        self.table.len()
    }

    /// Row width.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Row `index`.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::OutOfRange`] when `index >= num_embeddings`.
    pub fn row(&self, index: usize) -> Result<&[ValueRef], DimensionError> {
        self.table
            .get(index)
            .map(Vec::as_slice)
            .ok_or(DimensionError::OutOfRange {
                context: self.context,
                index,
                bound: self.table.len(),
            })
    }

    /// Stacks the rows for `ids` into an `ids.len() × dim` matrix.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Empty`] when `ids` is empty.
    /// - [`DimensionError::OutOfRange`] for any id outside the table.
    pub fn lookup(&self, ids: &[usize]) -> Result<Matrix, DimensionError> {
        if ids.is_empty() {
            return Err(DimensionError::Empty {
                context: self.context,
            });
        }
        let mut nodes = Vec::with_capacity(ids.len() * self.dim);
        for &id in ids {
            nodes.extend(self.row(id)?.iter().cloned());
        }
        Matrix::from_nodes(ids.len(), self.dim, nodes)
    }
}

impl Module for Embedding {
    /// Row-major.
    fn parameters(&self) -> Vec<ValueRef> {
        self.table.iter().flatten().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{sum, ScalarNode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(rows: usize, dim: usize) -> Embedding {
        let mut rng = StdRng::seed_from_u64(11);
        let mut init = Initializer::new(0.5, &mut rng).unwrap();
        Embedding::new("test embedding", rows, dim, &mut init)
    }

    #[test]
    fn lookup_shares_table_nodes() {
        let emb = table(4, 3);
        let m = emb.lookup(&[2, 0, 2]).unwrap();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m.get(0, 1).id(), emb.row(2).unwrap()[1].id());
        assert_eq!(m.get(2, 1).id(), emb.row(2).unwrap()[1].id());
    }

    #[test]
    fn gradient_only_reaches_rows_that_were_read() {
        let emb = table(4, 2);
        let m = emb.lookup(&[1, 3, 1]).unwrap();
        sum(m.nodes()).backward().unwrap();
        let grads: Vec<f64> = emb.parameters().iter().map(ValueRef::grad).collect();
        assert_eq!(grads, vec![0.0, 0.0, 2.0, 2.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn out_of_range_id_names_the_table() {
        let emb = table(2, 2);
        assert_eq!(
            emb.lookup(&[0, 5]).unwrap_err(),
            DimensionError::OutOfRange {
                context: "test embedding",
                index: 5,
                bound: 2
            }
        );
        assert!(matches!(emb.lookup(&[]), Err(DimensionError::Empty { .. })));
    }
}
