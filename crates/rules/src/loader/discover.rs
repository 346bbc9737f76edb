//! Project file discovery and classification.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use rulemap_core::Settings;
use tracing::{debug, warn};

use crate::error::Result;

/// Directory that marks a `.yml` file as a language file.
const LANGUAGE_DIR: &str = "Language";

/// One project root and the files to load into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFiles {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

/// How a file's contents are extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// Ruleset file: definitions, variables and `extraStrings`.
    Ruleset,
    /// `{ locale: { key: text } }` language file.
    Language,
}

impl FileClass {
    pub fn of(path: &Path) -> Self {
        if is_translation_file(path) {
            FileClass::Language
        } else {
            FileClass::Ruleset
        }
    }
}

/// A `.yml` file inside a `Language` directory.
pub fn is_translation_file(path: &Path) -> bool {
    let in_language_dir = path
        .parent()
        .map(|parent| {
            parent
                .components()
                .any(|c| matches!(c, Component::Normal(name) if name == LANGUAGE_DIR))
        })
        .unwrap_or(false);
    in_language_dir && path.extension().is_some_and(|ext| ext == "yml")
}

/// Compiled rule-file and language-file patterns.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    patterns: GlobSet,
}

impl FileMatcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new(&settings.rule_files_pattern)?);
        builder.add(Glob::new(&settings.translation_files_pattern)?);
        Ok(Self {
            patterns: builder.build()?,
        })
    }

    /// Does `path` (absolute or relative to `root`) match either pattern?
    pub fn matches(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let hidden = relative.components().any(|c| {
            matches!(c, Component::Normal(name) if name.to_string_lossy().starts_with('.'))
        });
        !hidden && self.patterns.is_match(relative)
    }
}

/// Walk `root` and return every matching file, sorted.
///
/// Dot-directories and dotfiles are skipped. Unreadable entries are logged
/// and skipped.
pub fn discover_project_files(root: &Path, settings: &Settings) -> Result<ProjectFiles> {
    let matcher = FileMatcher::new(settings)?;
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "failed to read directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && matcher.matches(root, entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(root = %root.display(), files = files.len(), "discovered project files");
    Ok(ProjectFiles {
        root: root.to_path_buf(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn language_files_are_yml_under_language() {
        assert!(is_translation_file(Path::new("/mod/Language/en-US.yml")));
        assert!(is_translation_file(Path::new("mod/Language/extra/de.yml")));
        assert!(!is_translation_file(Path::new("/mod/Language/en-US.rul")));
        assert!(!is_translation_file(Path::new("/mod/Ruleset/en-US.yml")));
        assert!(!is_translation_file(Path::new("/mod/Languages/en-US.yml")));
        assert_eq!(FileClass::of(Path::new("/mod/Ruleset/items.rul")), FileClass::Ruleset);
        assert_eq!(FileClass::of(Path::new("/mod/Language/de.yml")), FileClass::Language);
    }

    #[test]
    fn discovers_matching_files_sorted() {
        let dir = TempDir::new().expect("create tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("Ruleset/sub")).unwrap();
        fs::create_dir_all(root.join("Language")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("Ruleset/units.rul"), "units: []\n").unwrap();
        fs::write(root.join("Ruleset/sub/items.rul"), "items: []\n").unwrap();
        fs::write(root.join("Ruleset/readme.txt"), "no").unwrap();
        fs::write(root.join("Language/en-US.yml"), "en-US: {}\n").unwrap();
        fs::write(root.join(".git/hidden.rul"), "items: []\n").unwrap();

        let project = discover_project_files(root, &Settings::default()).unwrap();
        let relative: Vec<_> = project
            .files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("Language/en-US.yml"),
                PathBuf::from("Ruleset/sub/items.rul"),
                PathBuf::from("Ruleset/units.rul"),
            ]
        );
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let settings = Settings {
            rule_files_pattern: "**/[.rul".to_string(),
            ..Settings::default()
        };
        assert!(FileMatcher::new(&settings).is_err());
    }
}
