//! Core [`RulesetLoader`] struct: bulk and single-file loading with optional hot-reload.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rayon::prelude::*;
use rulemap_core::{Definition, Settings, Translation, Variables};
use tracing::{debug, error, info, warn};

use crate::document::RulesetDocument;
use crate::error::{Result, RuleError};
use crate::extract::{
    find_all_definitions, translations_from_language_file, translations_from_ruleset,
    variables_from_document,
};
use crate::index::{RulesetStore, RulesetTree};

use super::discover::{FileClass, FileMatcher, ProjectFiles};
use super::error::{LoadReport, LoadResult, LoadStatus};
use super::events::{FileProgress, LoadEvent, LoadState};
use super::line_endings;
use super::watcher::{handle_fs_event, WatchContext};

/// Loads project files into a shared [`RulesetTree`].
///
/// A bulk [`load`](Self::load) re-initializes the tree and loads every file of
/// every project; [`reload_file`](Self::reload_file) and
/// [`load_text`](Self::load_text) replace a single file's contributions.
pub struct RulesetLoader {
    settings: Settings,
    tree: Arc<RulesetTree>,
    state: Arc<RwLock<LoadState>>,
    /// Held for writing by a bulk load and for reading by single-file updates.
    gate: Arc<RwLock<()>>,
    /// Active filesystem watchers (held to keep them alive).
    watchers: Vec<RecommendedWatcher>,
}

impl RulesetLoader {
    pub fn new(settings: Settings) -> Self {
        let tree = Arc::new(RulesetTree::new(settings.locale.clone()));
        Self {
            settings,
            tree,
            state: Arc::new(RwLock::new(LoadState::Idle)),
            gate: Arc::new(RwLock::new(())),
            watchers: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The shared per-root index.
    pub fn tree(&self) -> Arc<RulesetTree> {
        Arc::clone(&self.tree)
    }

    pub fn state(&self) -> LoadState {
        *self.state.read().expect("state lock poisoned")
    }

    fn set_state(&self, state: LoadState) {
        *self.state.write().expect("state lock poisoned") = state;
    }

    /// Load every file of every project from scratch.
    ///
    /// Files are read and extracted in parallel on a pool of
    /// `settings.max_parallel` threads; merges happen one file at a time in
    /// the order the files are listed. `on_event` receives one
    /// [`LoadEvent::FileLoaded`] per merged file and a single
    /// [`LoadEvent::Complete`] at the end. Per-file failures are reported in
    /// the returned [`LoadReport`] and never abort the batch.
    ///
    /// Single-file updates, including watcher reloads, wait until the load
    /// has finished. Calling them from `on_event` deadlocks.
    pub fn load<F>(&self, projects: &[ProjectFiles], mut on_event: F) -> Result<LoadReport>
    where
        F: FnMut(LoadEvent),
    {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.max_parallel)
            .build()?;

        let _gate = self.gate.write().expect("load gate poisoned");
        self.set_state(LoadState::Loading);
        self.tree.reset();

        let jobs: Vec<(&Path, &Path)> = projects
            .iter()
            .flat_map(|project| {
                project
                    .files
                    .iter()
                    .map(move |file| (project.root.as_path(), file.as_path()))
            })
            .collect();
        let totals: HashMap<&Path, usize> = projects
            .iter()
            .map(|project| (project.root.as_path(), project.files.len()))
            .collect();
        info!(projects = projects.len(), files = jobs.len(), "loading rulesets");

        let crlf_fix = self.settings.crlf_fix;
        let mut results = Vec::with_capacity(jobs.len());
        let mut done: HashMap<&Path, usize> = HashMap::new();

        let (tx, rx) = mpsc::channel::<(usize, std::io::Result<FileExtraction>)>();
        std::thread::scope(|scope| {
            let jobs = &jobs;
            let pool = &pool;
            scope.spawn(move || {
                pool.install(|| {
                    jobs.par_iter().enumerate().for_each_with(tx, |tx, (i, (_, path))| {
                        let _ = tx.send((i, read_and_extract(path, crlf_fix)));
                    });
                });
            });

            // Merge strictly in job order; extractions may finish out of order.
            let mut pending = BTreeMap::new();
            let mut next = 0;
            while let Ok((i, extracted)) = rx.recv() {
                pending.insert(i, extracted);
                while let Some(extracted) = pending.remove(&next) {
                    let (root, path) = jobs[next];
                    next += 1;

                    let result = self.merge_extracted(root, path, extracted);
                    if let Some(relative_path) = loaded_relative_path(root, &result) {
                        let files_done = done.entry(root).or_insert(0);
                        *files_done += 1;
                        on_event(LoadEvent::FileLoaded(FileProgress {
                            root: root.to_path_buf(),
                            relative_path,
                            files_done: *files_done,
                            total_files: totals.get(root).copied().unwrap_or_default(),
                        }));
                    }
                    results.push(result);
                }
            }
        });

        self.set_state(LoadState::Ready);
        on_event(LoadEvent::Complete);

        let report = LoadReport {
            results,
            elapsed: start.elapsed(),
        };
        info!(
            loaded = report.loaded(),
            failed = report.failed(),
            definitions = report.definitions(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "rulesets loaded"
        );
        Ok(report)
    }

    fn merge_extracted(
        &self,
        root: &Path,
        path: &Path,
        extracted: std::io::Result<FileExtraction>,
    ) -> LoadResult {
        match extracted {
            Ok(extraction) => merge_into_tree(&self.tree, root, path, extraction),
            Err(e) => read_failure(path, e),
        }
    }

    /// Re-read one file and replace its contributions.
    pub fn reload_file<F>(&self, root: &Path, path: &Path, mut on_event: F) -> LoadResult
    where
        F: FnMut(LoadEvent),
    {
        let _gate = self.gate.read().expect("load gate poisoned");
        let result = load_path(&self.tree, root, path, self.settings.crlf_fix);
        self.finish_single(root, &result, &mut on_event);
        result
    }

    /// Replace one file's contributions with those of `text` (unsaved contents).
    pub fn load_text(&self, root: &Path, path: &Path, text: &str) -> LoadResult {
        let _gate = self.gate.read().expect("load gate poisoned");
        let extraction = extract(path, text, self.settings.crlf_fix);
        let result = merge_into_tree(&self.tree, root, path, extraction);
        self.finish_single(root, &result, &mut |_: LoadEvent| {});
        result
    }

    /// Supersede one file's contributions with empty ones.
    pub fn remove_file(&self, root: &Path, path: &Path) -> LoadResult {
        let _gate = self.gate.read().expect("load gate poisoned");
        remove_path(&self.tree, root, path)
    }

    fn finish_single(&self, root: &Path, result: &LoadResult, on_event: &mut dyn FnMut(LoadEvent)) {
        mark_ready(&self.state);
        if let Some(relative_path) = loaded_relative_path(root, result) {
            on_event(LoadEvent::FileLoaded(single_file_progress(
                &self.tree,
                root,
                relative_path,
            )));
        }
    }

    /// Start a recursive filesystem watcher on `root`.
    ///
    /// On create/modify of a matching file the file is reloaded; on removal
    /// its contributions are superseded with empty ones. Read errors are
    /// logged and the previous contributions kept.
    pub fn watch<F>(&mut self, root: &Path, on_event: F) -> Result<()>
    where
        F: Fn(LoadEvent) + Send + 'static,
    {
        let context = self.watch_context(root)?;
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &context, &on_event),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(root = %root.display(), "watching project for changes (recursive)");
        self.watchers.push(watcher);
        Ok(())
    }

    pub(super) fn watch_context(&self, root: &Path) -> Result<WatchContext> {
        Ok(WatchContext {
            tree: Arc::clone(&self.tree),
            state: Arc::clone(&self.state),
            gate: Arc::clone(&self.gate),
            root: root.to_path_buf(),
            matcher: FileMatcher::new(&self.settings)?,
            crlf_fix: self.settings.crlf_fix,
        })
    }
}

/// Everything one file contributes to its project's index.
#[derive(Debug)]
pub(super) struct FileExtraction {
    class: FileClass,
    definitions: Vec<Definition>,
    variables: Variables,
    translations: Vec<Translation>,
    /// Parse failure; the contributions above are empty when set.
    parse_error: Option<String>,
}

impl FileExtraction {
    fn empty(class: FileClass) -> Self {
        Self {
            class,
            definitions: Vec::new(),
            variables: Variables::new(),
            translations: Vec::new(),
            parse_error: None,
        }
    }

    fn failed(class: FileClass, path: &Path, error: impl std::fmt::Display) -> Self {
        error!(path = %path.display(), error = %error, "failed to parse file, it contributes nothing");
        Self {
            parse_error: Some(error.to_string()),
            ..Self::empty(class)
        }
    }
}

fn read_and_extract(path: &Path, crlf_fix: bool) -> std::io::Result<FileExtraction> {
    let text = fs::read_to_string(path)?;
    Ok(extract(path, &text, crlf_fix))
}

/// Classify `path` and extract its contributions from `text`.
pub(super) fn extract(path: &Path, text: &str, crlf_fix: bool) -> FileExtraction {
    let class = FileClass::of(path);
    let normalized = line_endings::normalize(text);

    match class {
        FileClass::Language => match translations_from_language_file(&normalized) {
            Ok(translations) => FileExtraction {
                translations,
                ..FileExtraction::empty(class)
            },
            Err(e) => FileExtraction::failed(class, path, e),
        },
        FileClass::Ruleset => {
            let doc = match RulesetDocument::parse(&normalized) {
                Ok(doc) => doc,
                Err(e) => return FileExtraction::failed(class, path, e),
            };
            let mut definitions = find_all_definitions(&doc);
            if crlf_fix && line_endings::uses_crlf(text) {
                for definition in &mut definitions {
                    definition.range = line_endings::adjust_range(&normalized, definition.range);
                }
            }
            let json = doc.to_json();
            debug!(path = %path.display(), definitions = definitions.len(), "extracted ruleset file");
            FileExtraction {
                class,
                definitions,
                variables: variables_from_document(&json),
                translations: translations_from_ruleset(&json),
                parse_error: None,
            }
        }
    }
}

/// Merge one file's extraction into `store`, replacing its prior contributions.
///
/// Language files only touch translations; ruleset files replace all three
/// categories.
pub(super) fn merge_contribution(store: &mut impl RulesetStore, path: &Path, extraction: FileExtraction) {
    match extraction.class {
        FileClass::Language => store.merge_translations(path, extraction.translations),
        FileClass::Ruleset => {
            store.merge_definitions(path, extraction.definitions);
            store.merge_variables(path, extraction.variables);
            store.merge_translations(path, extraction.translations);
        }
    }
}

fn relative_to(root: &Path, path: &Path) -> Result<PathBuf> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| RuleError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })
}

pub(super) fn merge_into_tree(
    tree: &RulesetTree,
    root: &Path,
    path: &Path,
    extraction: FileExtraction,
) -> LoadResult {
    if let Err(e) = relative_to(root, path) {
        warn!(path = %path.display(), error = %e, "skipping file");
        return LoadResult {
            path: path.to_path_buf(),
            status: LoadStatus::Skipped {
                reason: e.to_string(),
            },
        };
    }

    let status = match &extraction.parse_error {
        Some(error) => LoadStatus::Failed {
            error: error.clone(),
        },
        None => LoadStatus::Loaded {
            definitions: extraction.definitions.len(),
            variables: extraction.variables.len(),
            translations: extraction.translations.len(),
        },
    };
    tree.with_index(root, |index| merge_contribution(index, path, extraction));
    debug!(root = %root.display(), path = %path.display(), status = ?status, "merged file");

    LoadResult {
        path: path.to_path_buf(),
        status,
    }
}

fn read_failure(path: &Path, e: std::io::Error) -> LoadResult {
    error!(path = %path.display(), error = %e, "failed to read file");
    LoadResult {
        path: path.to_path_buf(),
        status: LoadStatus::Failed {
            error: RuleError::from(e).to_string(),
        },
    }
}

/// Read, extract and merge a single file.
pub(super) fn load_path(tree: &RulesetTree, root: &Path, path: &Path, crlf_fix: bool) -> LoadResult {
    match read_and_extract(path, crlf_fix) {
        Ok(extraction) => merge_into_tree(tree, root, path, extraction),
        Err(e) => read_failure(path, e),
    }
}

pub(super) fn remove_path(tree: &RulesetTree, root: &Path, path: &Path) -> LoadResult {
    let result = merge_into_tree(tree, root, path, FileExtraction::empty(FileClass::of(path)));
    if result.is_loaded() {
        info!(path = %path.display(), "removed file contributions");
    }
    result
}

/// Relative path of a successfully loaded file; progress is only reported for those.
pub(super) fn loaded_relative_path(root: &Path, result: &LoadResult) -> Option<PathBuf> {
    if result.is_loaded() {
        relative_to(root, &result.path).ok()
    } else {
        None
    }
}

pub(super) fn single_file_progress(tree: &RulesetTree, root: &Path, relative_path: PathBuf) -> FileProgress {
    let files = tree.with_index(root, |index| index.file_count());
    FileProgress {
        root: root.to_path_buf(),
        relative_path,
        files_done: files,
        total_files: files,
    }
}

pub(super) fn mark_ready(state: &RwLock<LoadState>) {
    let mut state = state.write().expect("state lock poisoned");
    if *state == LoadState::Idle {
        *state = LoadState::Ready;
    }
}
