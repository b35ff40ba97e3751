//! Student identity and gradebook normalization.
//!
//! Every raw export is projected onto the same identity columns and keyed by
//! a [`StudentKey`] so gradebooks from different platforms can be joined.

pub mod format;
pub mod gradebook;
pub mod identity;
pub mod merged;

pub use format::{FileType, HeaderMapping, NameColumns, NameOrder, NameSeparator};
pub use gradebook::{Gradebook, StudentRecord};
pub use identity::{Identity, StudentKey};
pub use merged::MergedGradebook;
