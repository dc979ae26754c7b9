//! Real-or-complex coupling amplitudes with explicit promotion rules.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::C64;

/// Coupling amplitude authored either as a plain real number or as a
/// complex value.
///
/// Serialized form is a bare number for [`Amplitude::Real`] and a
/// two-element `[re, im]` array for [`Amplitude::Complex`]. The variant is
/// part of the value: `Real(0.5)` and `Complex([0.5, 0.0])` compare unequal
/// and survive a save/load cycle unchanged.
///
/// Addition promotes: `Real + Real` stays real, any other combination is
/// complex (a real operand contributes a zero imaginary part).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amplitude {
    /// Purely real amplitude.
    Real(f64),
    /// Complex amplitude stored as `[re, im]`.
    Complex([f64; 2]),
}

impl Amplitude {
    /// Creates a complex amplitude from its parts.
    pub const fn complex(re: f64, im: f64) -> Self {
        Amplitude::Complex([re, im])
    }

    /// Real part.
    pub fn re(&self) -> f64 {
        match self {
            Amplitude::Real(value) => *value,
            Amplitude::Complex([re, _]) => *re,
        }
    }

    /// Imaginary part (zero for real amplitudes).
    pub fn im(&self) -> f64 {
        match self {
            Amplitude::Real(_) => 0.0,
            Amplitude::Complex([_, im]) => *im,
        }
    }

    /// Whether the amplitude uses the complex representation.
    pub fn is_complex(&self) -> bool {
        matches!(self, Amplitude::Complex(_))
    }

    /// Whether both parts are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.re() == 0.0 && self.im() == 0.0
    }

    /// Converts into a numeric complex scalar.
    pub fn to_c64(&self) -> C64 {
        C64::new(self.re(), self.im())
    }

    /// Returns the complex-promoted form of this amplitude.
    pub fn promoted(&self) -> Self {
        Amplitude::Complex([self.re(), self.im()])
    }
}

impl Default for Amplitude {
    fn default() -> Self {
        Amplitude::Real(0.0)
    }
}

impl From<f64> for Amplitude {
    fn from(value: f64) -> Self {
        Amplitude::Real(value)
    }
}

impl From<C64> for Amplitude {
    fn from(value: C64) -> Self {
        Amplitude::Complex([value.re, value.im])
    }
}

impl Add for Amplitude {
    type Output = Amplitude;

    fn add(self, rhs: Amplitude) -> Amplitude {
        match (self, rhs) {
            (Amplitude::Real(a), Amplitude::Real(b)) => Amplitude::Real(a + b),
            (lhs, rhs) => Amplitude::Complex([lhs.re() + rhs.re(), lhs.im() + rhs.im()]),
        }
    }
}

impl AddAssign for Amplitude {
    fn add_assign(&mut self, rhs: Amplitude) {
        *self = *self + rhs;
    }
}
