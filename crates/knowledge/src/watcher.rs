//! Change-triggered reload of the knowledge store.
//!
//! A `notify` watcher on the data directory forwards relevant events into a
//! channel. A background task waits until no event has arrived for the
//! quiet period, then runs the same [`KnowledgeStore::reload`] the admin
//! endpoint uses. A burst of edits therefore costs one reload.

use campusbot_core::error::KnowledgeError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notes::{comparable_path, is_note_file};
use crate::store::KnowledgeStore;

/// Default quiet period between the last change and the reload.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Keeps the watcher alive. Dropping it stops watching.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start watching the store's data directory (non-recursively), plus the
/// catalog's own directory when it lives elsewhere.
///
/// Must be called from within a tokio runtime.
pub fn spawn_watcher(
    store: Arc<KnowledgeStore>,
    debounce: Duration,
) -> Result<WatchHandle, KnowledgeError> {
    let (tx, rx) = mpsc::unbounded_channel::<()>();
    let catalog_name = store.catalog_file().file_name().map(|n| n.to_os_string());

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event, catalog_name.as_ref()) => {
            let _ = tx.send(());
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "File watcher error"),
    })
    .map_err(|e| KnowledgeError::Watch(e.to_string()))?;

    watcher
        .watch(store.data_dir(), RecursiveMode::NonRecursive)
        .map_err(|e| KnowledgeError::Watch(format!("{}: {e}", store.data_dir().display())))?;

    if let Some(catalog_dir) = separate_catalog_dir(&store) {
        match watcher.watch(&catalog_dir, RecursiveMode::NonRecursive) {
            Ok(()) => info!(dir = %catalog_dir.display(), "Watching catalog directory"),
            Err(e) => warn!(dir = %catalog_dir.display(), error = %e, "Catalog directory not watched"),
        }
    }

    info!(
        dir = %store.data_dir().display(),
        debounce_ms = debounce.as_millis() as u64,
        "Watching knowledge directory"
    );

    let task = tokio::spawn(debounce_loop(rx, debounce, move || {
        let store = Arc::clone(&store);
        async move {
            let report = store.reload_async().await;
            info!(
                programs = report.programs,
                notes_len = report.notes_len,
                "Knowledge reloaded after file change"
            );
        }
    }));

    Ok(WatchHandle {
        _watcher: watcher,
        task,
    })
}

fn is_relevant(event: &Event, catalog_name: Option<&OsString>) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.iter().any(|p| {
        is_note_file(p) || catalog_name.is_some_and(|name| p.file_name() == Some(name.as_os_str()))
    })
}

/// The catalog's directory, if it is not the data directory.
fn separate_catalog_dir(store: &KnowledgeStore) -> Option<std::path::PathBuf> {
    let parent = match store.catalog_file().parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let parent = comparable_path(parent);
    (parent != comparable_path(store.data_dir())).then_some(parent)
}

/// Run `on_settled` once per burst of signals, after `quiet` has elapsed
/// with no further signal. Returns when the sending side is dropped.
pub(crate) async fn debounce_loop<F, Fut>(
    mut rx: mpsc::UnboundedReceiver<()>,
    quiet: Duration,
    mut on_settled: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    while rx.recv().await.is_some() {
        // Coalesce everything that arrives before the line goes quiet
        loop {
            match tokio::time::timeout(quiet, rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }
        debug!("Change burst settled, reloading");
        on_settled().await;
    }
}
