//! Project loader: discovery, bulk load, single-file reload and hot-reload.
//!
//! Every file is read, LF-normalized, classified (ruleset or language file)
//! and extracted; its contributions then replace the file's previous ones in
//! the [`RulesetTree`](crate::index::RulesetTree) of its project root.

mod core;
mod discover;
mod error;
mod events;
pub mod line_endings;
mod watcher;


pub use self::core::RulesetLoader;
pub use self::discover::{
    discover_project_files, is_translation_file, FileClass, FileMatcher, ProjectFiles,
};
pub use self::error::{LoadReport, LoadResult, LoadStatus};
pub use self::events::{FileProgress, LoadEvent, LoadState};
