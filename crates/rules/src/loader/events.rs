//! Loader state and the events handed to load callbacks.

use std::fmt;
use std::path::PathBuf;

/// Lifecycle of a [`RulesetLoader`](super::RulesetLoader).
///
/// Single-file reloads run against a `Ready` index and leave it `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// One file finished loading into `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProgress {
    pub root: PathBuf,
    pub relative_path: PathBuf,
    pub files_done: usize,
    pub total_files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    FileLoaded(FileProgress),
    /// Emitted once after every file of a bulk load has been handled.
    Complete,
}
