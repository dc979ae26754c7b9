#![deny(missing_docs)]
#![doc = "Core value types shared by every layer of the quantum faction engine: \
symbols, poles, real-or-complex amplitudes, the canonical error type and the \
deterministic RNG policy."]

pub mod amplitude;
pub mod errors;
pub mod rng;
pub mod schema;
mod symbol;

pub use amplitude::Amplitude;
pub use errors::{ErrorInfo, QfError};
pub use num_complex::Complex;
pub use rng::{derive_substream_seed, RngHandle};
pub use schema::SchemaVersion;
pub use symbol::Symbol;

use serde::{Deserialize, Serialize};

/// Complex scalar used throughout the numeric layers.
pub type C64 = Complex<f64>;

/// One of the two basis states of a register axis.
///
/// Bit value `0` encodes [`Pole::North`] and bit value `1` encodes
/// [`Pole::South`] when an axis is embedded in a register basis index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pole {
    /// Upper pole, basis bit `0`.
    North,
    /// Lower pole, basis bit `1`.
    South,
}

impl Pole {
    /// Returns the other pole of the same axis.
    pub const fn opposite(self) -> Self {
        match self {
            Pole::North => Pole::South,
            Pole::South => Pole::North,
        }
    }

    /// Returns the basis bit encoding this pole.
    pub const fn bit(self) -> usize {
        match self {
            Pole::North => 0,
            Pole::South => 1,
        }
    }

    /// Decodes a pole from a basis bit (any non-zero value is south).
    pub const fn from_bit(bit: usize) -> Self {
        if bit == 0 {
            Pole::North
        } else {
            Pole::South
        }
    }

    /// Lowercase label used in reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Pole::North => "north",
            Pole::South => "south",
        }
    }
}

impl std::fmt::Display for Pole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
