#![deny(missing_docs)]
#![doc = "Icons: the merged coupling record of every faction touching a symbol, and the \
composer that folds descriptors into them."]

/// Icon composition over a faction subset.
pub mod compose;
/// Icon data model and affiliation classes.
pub mod icon;

pub use compose::{IconComposer, IconSet};
pub use icon::{Affiliation, Icon, SourcedBellFeature};
