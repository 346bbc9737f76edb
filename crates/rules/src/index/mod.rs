//! Project ruleset index.
//!
//! Every file contributes at most one entry per category (definitions,
//! variables, translations). A new contribution replaces the file's previous
//! one and the aggregate is recomputed in full, so the index always equals
//! the union of the live contributions.

mod merge;
mod project;
mod tree;


pub use self::merge::deep_merge;
pub use self::project::{RulesetIndex, RulesetStore};
pub use self::tree::{RulesetTree, SharedIndex};
