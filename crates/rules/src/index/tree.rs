//! [`RulesetTree`]: one [`RulesetIndex`] per project root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use rulemap_core::{DefinitionLookup, RuleType, Variables};
use tracing::{debug, info};

use super::project::{RulesetIndex, RulesetStore};

/// Shared handle to one root's index. Merges for a root hold its lock.
pub type SharedIndex = Arc<Mutex<RulesetIndex>>;

/// All project roots known to the loader.
///
/// Roots are created on first reference and only dropped by [`reset`](Self::reset).
#[derive(Debug)]
pub struct RulesetTree {
    locale: String,
    roots: RwLock<BTreeMap<PathBuf, SharedIndex>>,
}

impl RulesetTree {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            roots: RwLock::new(BTreeMap::new()),
        }
    }

    /// Drop every root and its contributions.
    pub fn reset(&self) {
        let mut roots = self.roots.write().expect("roots lock poisoned");
        if !roots.is_empty() {
            info!(roots = roots.len(), "resetting ruleset tree");
        }
        roots.clear();
    }

    /// Index for `root`, created empty if this is the first reference.
    pub fn get_or_create(&self, root: &Path) -> SharedIndex {
        if let Some(index) = self.roots.read().expect("roots lock poisoned").get(root) {
            return Arc::clone(index);
        }
        let mut roots = self.roots.write().expect("roots lock poisoned");
        Arc::clone(roots.entry(root.to_path_buf()).or_insert_with(|| {
            debug!(root = %root.display(), "creating ruleset index");
            Arc::new(Mutex::new(RulesetIndex::new(self.locale.clone())))
        }))
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots
            .read()
            .expect("roots lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Run `f` against the index of `root` while holding its lock.
    pub fn with_index<T>(&self, root: &Path, f: impl FnOnce(&mut RulesetIndex) -> T) -> T {
        let index = self.get_or_create(root);
        let mut guard = index.lock().expect("ruleset index lock poisoned");
        f(&mut guard)
    }

    pub fn find_definitions(
        &self,
        root: &Path,
        name: &str,
        source: Option<&RuleType>,
    ) -> Vec<DefinitionLookup> {
        self.with_index(root, |index| index.definitions_by_name(name, source))
    }

    pub fn translation(&self, root: &Path, key: &str) -> String {
        self.with_index(root, |index| index.translation(key))
    }

    pub fn variables(&self, root: &Path) -> Variables {
        self.with_index(root, |index| index.variables().clone())
    }

    pub fn files_defining(&self, root: &Path, name: &str) -> Vec<PathBuf> {
        self.with_index(root, |index| index.files_defining(name))
    }

    pub fn definition_file_count(&self, root: &Path) -> usize {
        self.with_index(root, |index| index.definition_file_count())
    }
}
