//! The knowledge store: atomically swapped catalog and notes snapshots.

use arc_swap::ArcSwap;
use campusbot_config::KnowledgeConfig;
use campusbot_core::catalog::ProgramRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::catalog::read_catalog;
use crate::notes::load_notes;

/// Outcome of one reload, for logging and the admin endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    /// Programs held after the reload
    pub programs: usize,
    /// Characters of merged notes held after the reload
    pub notes_len: usize,
    /// Set when the catalog could not be refreshed and the previous
    /// snapshot was kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_error: Option<String>,
}

/// Process-scoped holder of the institutional data injected into prompts.
///
/// Readers take a cheap `Arc` snapshot; a reload builds the new value off
/// to the side and publishes it with a single pointer swap.
pub struct KnowledgeStore {
    data_dir: PathBuf,
    catalog_file: PathBuf,
    catalog: ArcSwap<Vec<ProgramRecord>>,
    notes: ArcSwap<String>,
}

impl KnowledgeStore {
    /// Create an empty store. Nothing is read until a load is requested.
    pub fn new(data_dir: impl Into<PathBuf>, catalog_file: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            catalog_file: catalog_file.into(),
            catalog: ArcSwap::from_pointee(Vec::new()),
            notes: ArcSwap::from_pointee(String::new()),
        }
    }

    pub fn from_config(config: &KnowledgeConfig) -> Self {
        Self::new(&config.data_dir, config.catalog_path())
    }

    /// Create and immediately load both snapshots.
    pub fn open(config: &KnowledgeConfig) -> Self {
        let store = Self::from_config(config);
        store.reload();
        store
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn catalog_file(&self) -> &Path {
        &self.catalog_file
    }

    /// Re-read the catalog. On any failure the previous snapshot stays in
    /// place and the error is logged. Returns the number of programs held.
    pub fn load_catalog(&self) -> usize {
        self.try_load_catalog().unwrap_or_else(|_| self.catalog.load().len())
    }

    fn try_load_catalog(&self) -> Result<usize, String> {
        match read_catalog(&self.catalog_file) {
            Ok(records) => {
                let count = records.len();
                self.catalog.store(Arc::new(records));
                info!(programs = count, file = %self.catalog_file.display(), "Catalog loaded");
                Ok(count)
            }
            Err(e) => {
                let kept = self.catalog.load().len();
                match &e {
                    campusbot_core::KnowledgeError::NotFound(_) => {
                        warn!(error = %e, kept, "Catalog file missing, keeping previous snapshot")
                    }
                    _ => error!(error = %e, kept, "Catalog load failed, keeping previous snapshot"),
                }
                Err(e.to_string())
            }
        }
    }

    /// Re-read the notes directory and publish the merged text.
    /// Returns the merged length in characters.
    pub fn load_notes(&self) -> usize {
        let merged = load_notes(&self.data_dir, Some(&self.catalog_file));
        let len = merged.chars().count();
        self.notes.store(Arc::new(merged));
        info!(notes_len = len, dir = %self.data_dir.display(), "Notes loaded");
        len
    }

    /// Re-run both loads. Used by startup, the admin endpoint, and the
    /// file watcher alike.
    pub fn reload(&self) -> ReloadReport {
        let catalog = self.try_load_catalog();
        let notes_len = self.load_notes();
        ReloadReport {
            programs: self.catalog.load().len(),
            notes_len,
            catalog_error: catalog.err(),
        }
    }

    /// [`reload`](Self::reload) on the blocking pool, for async callers.
    pub async fn reload_async(self: &Arc<Self>) -> ReloadReport {
        let store = Arc::clone(self);
        match tokio::task::spawn_blocking(move || store.reload()).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Reload task failed");
                ReloadReport {
                    programs: self.catalog.load().len(),
                    notes_len: self.notes.load().chars().count(),
                    catalog_error: Some(e.to_string()),
                }
            }
        }
    }

    /// The current catalog snapshot.
    pub fn list_programs(&self) -> Arc<Vec<ProgramRecord>> {
        self.catalog.load_full()
    }

    /// Case-insensitive exact slug lookup.
    pub fn get_program(&self, slug: &str) -> Option<ProgramRecord> {
        self.catalog
            .load()
            .iter()
            .find(|p| p.matches_slug(slug))
            .cloned()
    }

    /// The current merged notes text.
    pub fn notes(&self) -> Arc<String> {
        self.notes.load_full()
    }

    /// One line per program (name, level, career group), in catalog order,
    /// for at most `limit` programs.
    pub fn brief_summary(&self, limit: usize) -> String {
        self.catalog
            .load()
            .iter()
            .take(limit)
            .map(ProgramRecord::brief_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
