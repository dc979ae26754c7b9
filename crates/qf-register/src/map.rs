use std::collections::BTreeMap;

use qf_core::{ErrorInfo, Pole, QfError, Symbol};
use serde::{Deserialize, Serialize};

/// Largest number of axes a register may hold.
///
/// The density operator is dense over `2^axes` basis states, so the bound
/// keeps a single instance near a million complex entries.
pub const MAX_AXES: usize = 10;

/// One two-level subsystem and the symbols labelling its poles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    /// Bit position of the axis in a basis index.
    pub index: usize,
    /// Symbol of the north pole (bit 0).
    pub north: Symbol,
    /// Symbol of the south pole (bit 1).
    pub south: Symbol,
}

impl Axis {
    /// Symbol labelling a pole.
    pub fn symbol(&self, pole: Pole) -> &Symbol {
        match pole {
            Pole::North => &self.north,
            Pole::South => &self.south,
        }
    }
}

/// Injective map from symbols to `(axis, pole)` coordinates.
///
/// Axis indices need not be registered in order. The register spans every
/// index up to the highest registered one; an index that was skipped is an
/// unlabelled axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMap {
    axes: BTreeMap<usize, Axis>,
    coordinates: BTreeMap<Symbol, (usize, Pole)>,
}

fn register_error(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

impl RegisterMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels axis `index` with a north and a south symbol.
    pub fn register_axis(
        &mut self,
        index: usize,
        north: impl Into<Symbol>,
        south: impl Into<Symbol>,
    ) -> Result<(), QfError> {
        let (north, south) = (north.into(), south.into());
        if index >= MAX_AXES {
            return Err(QfError::Register(
                register_error("axis-out-of-range", "axis index exceeds register capacity")
                    .with_context("axis", index)
                    .with_context("max_axes", MAX_AXES),
            ));
        }
        if north == south {
            return Err(QfError::Register(
                register_error("poles-identical", "north and south symbols must differ")
                    .with_context("symbol", &north),
            ));
        }
        if self.axes.contains_key(&index) {
            return Err(QfError::Register(
                register_error("axis-registered", "axis already labelled")
                    .with_context("axis", index),
            ));
        }
        for symbol in [&north, &south] {
            if let Some((axis, _)) = self.coordinates.get(symbol) {
                return Err(QfError::Register(
                    register_error("symbol-registered", "symbol already mapped to an axis")
                        .with_context("symbol", symbol)
                        .with_context("axis", axis),
                ));
            }
        }
        self.coordinates.insert(north.clone(), (index, Pole::North));
        self.coordinates.insert(south.clone(), (index, Pole::South));
        self.axes.insert(index, Axis { index, north, south });
        Ok(())
    }

    /// Whether the symbol labels a pole.
    pub fn has(&self, symbol: &str) -> bool {
        self.coordinates.contains_key(symbol)
    }

    /// Axis a symbol lives on.
    pub fn axis_of(&self, symbol: &str) -> Option<usize> {
        self.coordinates.get(symbol).map(|&(axis, _)| axis)
    }

    /// Pole a symbol labels.
    pub fn pole_of(&self, symbol: &str) -> Option<Pole> {
        self.coordinates.get(symbol).map(|&(_, pole)| pole)
    }

    /// Axis and pole of a symbol.
    pub fn coordinate(&self, symbol: &str) -> Option<(usize, Pole)> {
        self.coordinates.get(symbol).copied()
    }

    /// Symbol labelling a pole of an axis.
    pub fn symbol_at(&self, axis: usize, pole: Pole) -> Option<&Symbol> {
        self.axes.get(&axis).map(|a| a.symbol(pole))
    }

    /// Labelled axis at an index.
    pub fn axis(&self, index: usize) -> Option<&Axis> {
        self.axes.get(&index)
    }

    /// Labelled axes in index order.
    pub fn axes(&self) -> impl Iterator<Item = &Axis> {
        self.axes.values()
    }

    /// Registered symbols in symbol order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.coordinates.keys()
    }

    /// Number of axes spanned by the register.
    pub fn axis_count(&self) -> usize {
        self.axes.keys().next_back().map_or(0, |&last| last + 1)
    }

    /// Basis size, `2^axis_count`.
    pub fn dimension(&self) -> usize {
        1usize << self.axis_count()
    }

    /// Symbols selected by a basis index, one per labelled axis in axis order.
    pub fn basis_to_symbols(&self, index: usize) -> Vec<Symbol> {
        self.axes
            .values()
            .map(|axis| axis.symbol(Pole::from_bit((index >> axis.index) & 1)).clone())
            .collect()
    }

    /// Basis index selecting exactly the given symbols.
    ///
    /// Requires one symbol per labelled axis. Unlabelled axes sit at north.
    pub fn symbols_to_basis<S: AsRef<str>>(&self, symbols: &[S]) -> Result<usize, QfError> {
        let mut index = 0usize;
        let mut covered = vec![false; self.axis_count()];
        for symbol in symbols {
            let symbol = symbol.as_ref();
            let Some((axis, pole)) = self.coordinate(symbol) else {
                return Err(QfError::Register(
                    register_error("symbol-unknown", "symbol is not mapped to an axis")
                        .with_context("symbol", symbol),
                ));
            };
            if covered[axis] {
                return Err(QfError::Register(
                    register_error("axis-repeated", "two symbols select the same axis")
                        .with_context("axis", axis),
                ));
            }
            covered[axis] = true;
            index |= pole.bit() << axis;
        }
        if let Some(missing) = self.axes.keys().find(|&&axis| !covered[axis]) {
            return Err(QfError::Register(
                register_error("axis-uncovered", "no symbol selects this axis")
                    .with_context("axis", missing),
            ));
        }
        Ok(index)
    }
}
