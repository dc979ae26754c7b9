use nalgebra::DMatrix;
use qf_core::C64;
use serde::{Deserialize, Serialize};

/// Radius below which the polar angles are reported as zero.
const RADIUS_FLOOR: f64 = 1e-12;

/// Bloch-sphere coordinates of one axis, north pole at `z = +1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlochVector {
    /// `2 Re ρ(north, south)`.
    pub x: f64,
    /// `-2 Im ρ(north, south)`.
    pub y: f64,
    /// `P(north) - P(south)`.
    pub z: f64,
    /// Length of `(x, y, z)`; `1` for a pure axis, `0` when fully mixed.
    pub r: f64,
    /// Polar angle from the north pole, in `[0, π]`.
    pub theta: f64,
    /// Azimuth in `(-π, π]`.
    pub phi: f64,
}

impl BlochVector {
    /// Reads the vector off a reduced single-axis operator (north first).
    pub(crate) fn from_reduced(rho: &DMatrix<C64>) -> Self {
        let coherence = rho[(0, 1)];
        let x = 2.0 * coherence.re;
        let y = -2.0 * coherence.im;
        let z = rho[(0, 0)].re - rho[(1, 1)].re;
        let r = (x * x + y * y + z * z).sqrt();
        let (theta, phi) = if r < RADIUS_FLOOR {
            (0.0, 0.0)
        } else {
            ((z / r).clamp(-1.0, 1.0).acos(), y.atan2(x))
        };
        Self { x, y, z, r, theta, phi }
    }

    /// Packed `[x, y, z, r, theta, phi]`.
    pub fn to_array(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.r, self.theta, self.phi]
    }
}
