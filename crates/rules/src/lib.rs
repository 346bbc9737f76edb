//! Cross-reference index for OpenXcom-style ruleset files.
//!
//! This crate provides:
//! - A tree-sitter backed YAML document model with byte ranges for every node
//! - Definition, variable and translation extraction per file
//! - A recursive key matcher resolving a byte range to its rule type and field
//! - A per-project-root index with per-file replace-then-merge semantics
//! - A parallel project loader with single-file reload and `notify` hot-reload

pub mod document;
pub mod error;
pub mod extract;
pub mod index;
pub mod loader;
pub mod matcher;
pub mod policy;

pub use error::{Result, RuleError};
pub use index::{RulesetIndex, RulesetStore, RulesetTree};
pub use loader::{LoadEvent, LoadReport, LoadState, ProjectFiles, RulesetLoader};
pub use matcher::{find_anchor, resolve_at_range, resolve_key};
