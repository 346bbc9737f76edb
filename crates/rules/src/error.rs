//! Error type shared by parsing, loading and watching.

use std::path::PathBuf;

/// Errors that can occur while parsing, loading or watching ruleset files.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document-level markup parse failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// Language file deserialization error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid file glob in the settings.
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// Filesystem watcher error.
    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// Worker pool for bulk loads could not be built.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A file was handed to a project it does not belong to.
    #[error("{} is not inside project root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// Result alias for ruleset operations.
pub type Result<T> = std::result::Result<T, RuleError>;
