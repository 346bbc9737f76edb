//! Per-file load outcomes.

use std::path::PathBuf;
use std::time::Duration;

/// Outcome of loading a single ruleset or language file.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, PartialEq)]
pub enum LoadStatus {
    /// File was read and its contributions merged.
    Loaded {
        definitions: usize,
        variables: usize,
        translations: usize,
    },
    /// File was not loaded (outside its project root, etc.).
    Skipped { reason: String },
    /// Read or parse error. A parse error still replaces the file's previous
    /// contributions with empty ones; a read error leaves them untouched.
    Failed { error: String },
}

impl LoadResult {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded { .. })
    }
}

/// Summary of a bulk load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub results: Vec<LoadResult>,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn loaded(&self) -> usize {
        self.results.iter().filter(|r| r.is_loaded()).count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
            .count()
    }

    /// Total definitions merged across all loaded files.
    pub fn definitions(&self) -> usize {
        self.results
            .iter()
            .map(|r| match r.status {
                LoadStatus::Loaded { definitions, .. } => definitions,
                _ => 0,
            })
            .sum()
    }
}
