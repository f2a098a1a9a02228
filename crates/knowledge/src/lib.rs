//! Knowledge store for campusbot.
//!
//! Holds two snapshots sourced from a data directory on disk:
//! - the program **catalog** (structured JSON list of records)
//! - the merged **notes** text (txt / md / json files, truncated)
//!
//! Each snapshot is replaced atomically on reload, so a prompt being
//! assembled while a reload runs always sees the last fully loaded
//! version. Load failures are logged and never reach the caller.

pub mod catalog;
pub mod notes;
pub mod store;
pub mod watcher;

pub use store::{KnowledgeStore, ReloadReport};
pub use watcher::{WatchHandle, spawn_watcher};
