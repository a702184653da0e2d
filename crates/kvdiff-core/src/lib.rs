//! Kvdiff Core - pairwise diff engine for key-value mappings
//!
//! This library compares ordered key-value mappings, classifies every
//! differing key as added, removed or altered, and offers filtered views
//! over the resulting change set.

pub mod change;
pub mod change_set;
pub mod diff;
pub mod result;

pub use change::{Change, ChangeKind, ValuePair};
pub use change_set::{ChangeSet, Pairing};
pub use diff::{mapping_from_value, DiffEngine, DiffError, Mapping};
pub use result::{ActionEntries, ActionView, ChangeField, DiffResult, DiffStats};
