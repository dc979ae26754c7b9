use std::f64::consts::FRAC_1_SQRT_2;

use nalgebra::{Matrix2, Matrix4};
use qf_core::C64;
use serde::{Deserialize, Serialize};

const ZERO: C64 = C64::new(0.0, 0.0);
const ONE: C64 = C64::new(1.0, 0.0);

/// Named single-axis unitary.
///
/// Matrices act on `(north, south)` amplitudes in that order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", content = "angle", rename_all = "kebab-case")]
pub enum SingleAxisGate {
    /// Hadamard.
    H,
    /// Pole flip.
    X,
    /// Pauli Y.
    Y,
    /// Relative sign between poles.
    Z,
    /// `diag(1, e^{iθ})`.
    Phase(f64),
    /// Rotation about Y by θ.
    Ry(f64),
}

impl SingleAxisGate {
    /// Unitary matrix.
    pub fn matrix(self) -> Matrix2<C64> {
        match self {
            SingleAxisGate::H => {
                let h = C64::new(FRAC_1_SQRT_2, 0.0);
                Matrix2::new(h, h, h, -h)
            }
            SingleAxisGate::X => Matrix2::new(ZERO, ONE, ONE, ZERO),
            SingleAxisGate::Y => Matrix2::new(ZERO, C64::new(0.0, -1.0), C64::new(0.0, 1.0), ZERO),
            SingleAxisGate::Z => Matrix2::new(ONE, ZERO, ZERO, -ONE),
            SingleAxisGate::Phase(theta) => Matrix2::new(ONE, ZERO, ZERO, C64::from_polar(1.0, theta)),
            SingleAxisGate::Ry(theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                Matrix2::new(
                    C64::new(c, 0.0),
                    C64::new(-s, 0.0),
                    C64::new(s, 0.0),
                    C64::new(c, 0.0),
                )
            }
        }
    }

    /// Short label kept in gate histories.
    pub fn label(self) -> &'static str {
        match self {
            SingleAxisGate::H => "H",
            SingleAxisGate::X => "X",
            SingleAxisGate::Y => "Y",
            SingleAxisGate::Z => "Z",
            SingleAxisGate::Phase(_) => "PHASE",
            SingleAxisGate::Ry(_) => "RY",
        }
    }
}

/// Named two-axis unitary; the first axis is the high bit of the local basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TwoAxisGate {
    /// Controlled flip, first axis controls.
    Cnot,
    /// Controlled sign.
    Cz,
    /// Exchange of the two axes.
    Swap,
}

impl TwoAxisGate {
    /// Unitary matrix in the `|first, second>` basis.
    pub fn matrix(self) -> Matrix4<C64> {
        let mut m = Matrix4::from_element(ZERO);
        match self {
            TwoAxisGate::Cnot => {
                m[(0, 0)] = ONE;
                m[(1, 1)] = ONE;
                m[(2, 3)] = ONE;
                m[(3, 2)] = ONE;
            }
            TwoAxisGate::Cz => {
                m[(0, 0)] = ONE;
                m[(1, 1)] = ONE;
                m[(2, 2)] = ONE;
                m[(3, 3)] = -ONE;
            }
            TwoAxisGate::Swap => {
                m[(0, 0)] = ONE;
                m[(1, 2)] = ONE;
                m[(2, 1)] = ONE;
                m[(3, 3)] = ONE;
            }
        }
        m
    }

    /// Short label kept in gate histories.
    pub fn label(self) -> &'static str {
        match self {
            TwoAxisGate::Cnot => "CNOT",
            TwoAxisGate::Cz => "CZ",
            TwoAxisGate::Swap => "SWAP",
        }
    }
}
