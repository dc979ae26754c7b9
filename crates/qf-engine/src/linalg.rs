//! Dense density-operator kernels shared by the state engine.

use nalgebra::DMatrix;
use qf_core::{Pole, C64};
use qf_register::SparseOperator;

/// Eigenvalues below this are treated as zero in entropies.
const ENTROPY_FLOOR: f64 = 1e-12;

fn local_bits(index: usize, axes: &[usize]) -> usize {
    let k = axes.len();
    axes.iter()
        .enumerate()
        .fold(0, |acc, (pos, &axis)| acc | (((index >> axis) & 1) << (k - 1 - pos)))
}

fn spread_bits(local: usize, axes: &[usize]) -> usize {
    let k = axes.len();
    axes.iter()
        .enumerate()
        .fold(0, |acc, (pos, &axis)| acc | (((local >> (k - 1 - pos)) & 1) << axis))
}

fn axes_mask(axes: &[usize]) -> usize {
    axes.iter().fold(0, |acc, &axis| acc | (1 << axis))
}

/// Conjugates `rho` by a unitary acting on `axes`.
///
/// The unitary's local basis takes `axes[0]` as its most significant bit.
pub(crate) fn conjugate_by(rho: &mut DMatrix<C64>, axes: &[usize], unitary: &DMatrix<C64>) {
    let dim = rho.nrows();
    let local = unitary.nrows();
    let mask = axes_mask(axes);
    let bases: Vec<usize> = (0..dim).filter(|index| index & mask == 0).collect();
    let mut buffer = vec![C64::new(0.0, 0.0); local];

    // rho <- U rho
    for &base in &bases {
        let rows: Vec<usize> = (0..local).map(|l| base | spread_bits(l, axes)).collect();
        for col in 0..dim {
            for (out, slot) in buffer.iter_mut().enumerate() {
                *slot = (0..local).map(|k| unitary[(out, k)] * rho[(rows[k], col)]).sum();
            }
            for (l, &row) in rows.iter().enumerate() {
                rho[(row, col)] = buffer[l];
            }
        }
    }
    // rho <- rho U†
    for &base in &bases {
        let cols: Vec<usize> = (0..local).map(|l| base | spread_bits(l, axes)).collect();
        for row in 0..dim {
            for (out, slot) in buffer.iter_mut().enumerate() {
                *slot = (0..local)
                    .map(|k| rho[(row, cols[k])] * unitary[(out, k)].conj())
                    .sum();
            }
            for (l, &col) in cols.iter().enumerate() {
                rho[(row, col)] = buffer[l];
            }
        }
    }
}

/// Reduced density operator over `axes`, in the same local ordering as
/// [`conjugate_by`].
pub(crate) fn reduced(rho: &DMatrix<C64>, axes: &[usize]) -> DMatrix<C64> {
    let dim = rho.nrows();
    let mask = axes_mask(axes);
    let local = 1usize << axes.len();
    let mut out = DMatrix::zeros(local, local);
    for row in 0..dim {
        for col in 0..dim {
            if row & !mask == col & !mask {
                out[(local_bits(row, axes), local_bits(col, axes))] += rho[(row, col)];
            }
        }
    }
    out
}

/// Von Neumann entropy in bits of a Hermitian operator.
pub(crate) fn entropy_bits(rho: &DMatrix<C64>) -> f64 {
    let hermitian = hermitian_part(rho);
    hermitian
        .symmetric_eigenvalues()
        .iter()
        .filter(|&&lambda| lambda > ENTROPY_FLOOR)
        .map(|&lambda| -lambda * lambda.log2())
        .sum()
}

/// `(M + M†) / 2`.
pub(crate) fn hermitian_part(rho: &DMatrix<C64>) -> DMatrix<C64> {
    (rho + rho.adjoint()) * C64::new(0.5, 0.0)
}

/// Real part of the trace.
pub(crate) fn trace(rho: &DMatrix<C64>) -> f64 {
    rho.diagonal().iter().map(|value| value.re).sum()
}

/// Sum of diagonal entries whose `axis` bit selects `pole`.
pub(crate) fn marginal(rho: &DMatrix<C64>, axis: usize, pole: Pole) -> f64 {
    (0..rho.nrows())
        .filter(|index| (index >> axis) & 1 == pole.bit())
        .map(|index| rho[(index, index)].re)
        .sum()
}

/// Jump operator with its precomputed `L†` and `L†L`.
pub(crate) struct Channel<'a> {
    jump: &'a SparseOperator,
    adjoint: SparseOperator,
    decay: SparseOperator,
}

impl<'a> Channel<'a> {
    pub(crate) fn new(jump: &'a SparseOperator) -> Self {
        Self {
            jump,
            adjoint: jump.adjoint(),
            decay: jump.adjoint_product(),
        }
    }
}

/// `dρ/dt = -i[H, ρ] + Σ (L ρ L† - ½{L†L, ρ})`.
pub(crate) fn lindblad_rate(
    rho: &DMatrix<C64>,
    hamiltonian: Option<&SparseOperator>,
    channels: &[Channel<'_>],
) -> DMatrix<C64> {
    let dim = rho.nrows();
    let mut drho = DMatrix::zeros(dim, dim);
    if let Some(h) = hamiltonian.filter(|h| !h.is_empty()) {
        let commutator = h.mul_dense(rho) - h.dense_mul(rho);
        drho += commutator * C64::new(0.0, -1.0);
    }
    for channel in channels {
        let l_rho = channel.jump.mul_dense(rho);
        let sandwich = channel.adjoint.dense_mul(&l_rho);
        let anticommutator = channel.decay.mul_dense(rho) + channel.decay.dense_mul(rho);
        drho += sandwich - anticommutator * C64::new(0.5, 0.0);
    }
    drho
}

/// Pins `axis` to `pole` with the trace-preserving reset channel
/// `K0 = |p><p|`, `K1 = |p><¬p|`.
///
/// The reduced state of every other axis is unchanged.
pub(crate) fn reset_axis(rho: &DMatrix<C64>, axis: usize, pole: Pole) -> DMatrix<C64> {
    let dim = rho.nrows();
    let bit = 1usize << axis;
    let target = pole.bit() << axis;
    let mut out = DMatrix::zeros(dim, dim);
    for row in 0..dim {
        for col in 0..dim {
            // only blocks diagonal in the axis survive, mapped onto the pole
            if row & bit == col & bit {
                let r = (row & !bit) | target;
                let c = (col & !bit) | target;
                out[(r, c)] += rho[(row, col)];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_bits_roundtrip() {
        let axes = [3, 0];
        for local in 0..4 {
            assert_eq!(local_bits(spread_bits(local, &axes), &axes), local);
        }
        // axes[0] is the high bit
        assert_eq!(spread_bits(0b10, &axes), 0b1000);
    }

    #[test]
    fn reset_preserves_trace() {
        let mut rho = DMatrix::zeros(4, 4);
        rho[(0, 0)] = C64::new(0.25, 0.0);
        rho[(3, 3)] = C64::new(0.75, 0.0);
        rho[(0, 3)] = C64::new(0.4, 0.0);
        rho[(3, 0)] = C64::new(0.4, 0.0);
        let pinned = reset_axis(&rho, 0, Pole::North);
        assert!((trace(&pinned) - 1.0).abs() < 1e-12);
        assert!((marginal(&pinned, 0, Pole::North) - 1.0).abs() < 1e-12);
        assert!((marginal(&pinned, 1, Pole::South) - 0.75).abs() < 1e-12);
    }
}
