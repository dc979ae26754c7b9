use nalgebra::DMatrix;
use qf_core::{Pole, C64};
use serde::{Deserialize, Serialize};

/// Entries with magnitude below this are dropped when coalescing.
pub const ENTRY_EPSILON: f64 = 1e-15;

/// Non-zero entry of a sparse operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatorEntry {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// Complex weight.
    pub value: C64,
}

/// Coordinate-list operator over a register basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseOperator {
    dimension: usize,
    entries: Vec<OperatorEntry>,
}

impl SparseOperator {
    /// Zero operator of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    /// Basis dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stored entries; sorted and unique after [`SparseOperator::coalesce`].
    pub fn entries(&self) -> &[OperatorEntry] {
        &self.entries
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `value` at `(row, col)`; duplicates add up on coalesce.
    pub fn push(&mut self, row: usize, col: usize, value: C64) {
        self.entries.push(OperatorEntry { row, col, value });
    }

    /// Appends every entry of `other` scaled by `scale`.
    pub fn add_scaled(&mut self, other: &SparseOperator, scale: C64) {
        self.entries
            .extend(other.entries.iter().map(|entry| OperatorEntry {
                value: entry.value * scale,
                ..*entry
            }));
    }

    /// Sorts by `(row, col)`, sums duplicates and drops vanishing entries.
    pub fn coalesce(&mut self) {
        self.entries
            .sort_by(|a, b| a.row.cmp(&b.row).then_with(|| a.col.cmp(&b.col)));
        let mut coalesced: Vec<OperatorEntry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if let Some(prev) = coalesced.last_mut() {
                if prev.row == entry.row && prev.col == entry.col {
                    prev.value += entry.value;
                    continue;
                }
            }
            coalesced.push(entry);
        }
        coalesced.retain(|entry| entry.value.norm() > ENTRY_EPSILON);
        self.entries = coalesced;
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Self {
        let mut adjoint = Self {
            dimension: self.dimension,
            entries: self
                .entries
                .iter()
                .map(|entry| OperatorEntry {
                    row: entry.col,
                    col: entry.row,
                    value: entry.value.conj(),
                })
                .collect(),
        };
        adjoint.coalesce();
        adjoint
    }

    /// `(A + A†) / 2`, coalesced.
    pub fn hermitized(&self) -> Self {
        let mut out = Self::zeros(self.dimension);
        let half = C64::new(0.5, 0.0);
        out.add_scaled(self, half);
        out.add_scaled(&self.adjoint(), half);
        out.coalesce();
        out
    }

    /// Whether `A == A†` up to `tolerance` per entry.
    pub fn is_hermitian(&self, tolerance: f64) -> bool {
        let dense = self.to_dense();
        dense
            .iter()
            .zip(dense.adjoint().iter())
            .all(|(a, b)| (a - b).norm() <= tolerance)
    }

    /// Weight at `(row, col)`, summing duplicates.
    pub fn get(&self, row: usize, col: usize) -> C64 {
        self.entries
            .iter()
            .filter(|entry| entry.row == row && entry.col == col)
            .map(|entry| entry.value)
            .sum()
    }

    /// Dense copy.
    pub fn to_dense(&self) -> DMatrix<C64> {
        let mut dense = DMatrix::zeros(self.dimension, self.dimension);
        for entry in &self.entries {
            dense[(entry.row, entry.col)] += entry.value;
        }
        dense
    }

    /// `A · M` for a dense square `M`.
    pub fn mul_dense(&self, matrix: &DMatrix<C64>) -> DMatrix<C64> {
        let mut out = DMatrix::zeros(self.dimension, matrix.ncols());
        for entry in &self.entries {
            for col in 0..matrix.ncols() {
                out[(entry.row, col)] += entry.value * matrix[(entry.col, col)];
            }
        }
        out
    }

    /// `M · A` for a dense square `M`.
    pub fn dense_mul(&self, matrix: &DMatrix<C64>) -> DMatrix<C64> {
        let mut out = DMatrix::zeros(matrix.nrows(), self.dimension);
        for entry in &self.entries {
            for row in 0..matrix.nrows() {
                out[(row, entry.col)] += matrix[(row, entry.row)] * entry.value;
            }
        }
        out
    }

    /// `A† A`, coalesced.
    pub fn adjoint_product(&self) -> Self {
        let mut out = Self::zeros(self.dimension);
        for a in &self.entries {
            for b in &self.entries {
                if a.row == b.row {
                    out.push(a.col, b.col, a.value.conj() * b.value);
                }
            }
        }
        out.coalesce();
        out
    }
}

/// Projector onto `pole` of `axis`, identity elsewhere.
pub fn projector(dimension: usize, axis: usize, pole: Pole) -> SparseOperator {
    let mut op = SparseOperator::zeros(dimension);
    for index in 0..dimension {
        if (index >> axis) & 1 == pole.bit() {
            op.push(index, index, C64::new(1.0, 0.0));
        }
    }
    op
}

/// `|to><from|` on `axis`, identity elsewhere.
pub fn transition(dimension: usize, axis: usize, from: Pole, to: Pole) -> SparseOperator {
    let mut op = SparseOperator::zeros(dimension);
    let mask = 1usize << axis;
    for index in 0..dimension {
        if (index >> axis) & 1 == from.bit() {
            let target = (index & !mask) | (to.bit() << axis);
            op.push(target, index, C64::new(1.0, 0.0));
        }
    }
    op
}

/// Moves amplitude from `from` on `axis_a` to `to` on `axis_b` in one step.
///
/// `axis_a` leaves `from` for its opposite pole while `axis_b` enters `to`
/// from its opposite pole; requires distinct axes.
pub fn cross_transition(
    dimension: usize,
    (axis_a, from): (usize, Pole),
    (axis_b, to): (usize, Pole),
) -> SparseOperator {
    let mut op = SparseOperator::zeros(dimension);
    let mask = (1usize << axis_a) | (1usize << axis_b);
    for index in 0..dimension {
        if (index >> axis_a) & 1 == from.bit() && (index >> axis_b) & 1 == to.opposite().bit() {
            let target = (index & !mask) | (from.opposite().bit() << axis_a) | (to.bit() << axis_b);
            op.push(target, index, C64::new(1.0, 0.0));
        }
    }
    op
}

/// `P_north - P_south` on `axis`.
pub fn pauli_z(dimension: usize, axis: usize) -> SparseOperator {
    let mut op = SparseOperator::zeros(dimension);
    for index in 0..dimension {
        let sign = if (index >> axis) & 1 == 0 { 1.0 } else { -1.0 };
        op.push(index, index, C64::new(sign, 0.0));
    }
    op
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_merges_and_drops_zeros() {
        let mut op = SparseOperator::zeros(2);
        op.push(1, 0, C64::new(1.0, 0.0));
        op.push(0, 1, C64::new(0.5, 0.0));
        op.push(1, 0, C64::new(-1.0, 0.0));
        op.push(0, 1, C64::new(0.25, 0.0));
        op.coalesce();
        assert_eq!(op.nnz(), 1);
        assert_eq!(op.entries()[0].value, C64::new(0.75, 0.0));
    }

    #[test]
    fn cross_transition_flips_both_axes() {
        let op = cross_transition(4, (0, Pole::North), (1, Pole::North));
        // |north,south> = 0b10 goes to |south,north> = 0b01
        assert_eq!(op.nnz(), 1);
        assert_eq!((op.entries()[0].row, op.entries()[0].col), (0b01, 0b10));
    }

    #[test]
    fn adjoint_product_of_transition_is_projector() {
        let lowering = transition(2, 0, Pole::North, Pole::South);
        let product = lowering.adjoint_product();
        assert_eq!(product, {
            let mut p = projector(2, 0, Pole::North);
            p.coalesce();
            p
        });
    }
}
