//! Filesystem event handler for the notify watcher (hot-reload).

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use notify::event::{ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{debug, info};

use crate::index::RulesetTree;

use super::core::{load_path, loaded_relative_path, mark_ready, remove_path, single_file_progress};
use super::discover::FileMatcher;
use super::events::{LoadEvent, LoadState};

/// Everything a watcher callback needs, cloned out of the loader.
pub(super) struct WatchContext {
    pub tree: Arc<RulesetTree>,
    pub state: Arc<RwLock<LoadState>>,
    pub gate: Arc<RwLock<()>>,
    pub root: PathBuf,
    pub matcher: FileMatcher,
    pub crlf_fix: bool,
}

/// Handle a single filesystem event from the notify watcher.
pub(super) fn handle_fs_event(event: &Event, context: &WatchContext, on_event: &dyn Fn(LoadEvent)) {
    for path in &event.paths {
        if !context.matcher.matches(&context.root, path) {
            continue;
        }

        let _gate = context.gate.read().expect("load gate poisoned");
        let result = match &event.kind {
            EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any) => {
                if path.is_file() {
                    let result = load_path(&context.tree, &context.root, path, context.crlf_fix);
                    info!(path = %path.display(), status = ?result.status, "hot-reloaded file");
                    result
                } else {
                    // renamed away
                    remove_path(&context.tree, &context.root, path)
                }
            }
            EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
                remove_path(&context.tree, &context.root, path)
            }
            other => {
                debug!(path = %path.display(), kind = ?other, "ignoring filesystem event");
                continue;
            }
        };

        mark_ready(&context.state);
        if let Some(relative_path) = loaded_relative_path(&context.root, &result) {
            on_event(LoadEvent::FileLoaded(single_file_progress(
                &context.tree,
                &context.root,
                relative_path,
            )));
        }
    }
}
