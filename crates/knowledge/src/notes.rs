//! Notes aggregation: merge the supplementary files in the data directory
//! into one bounded block of text for the system prompt.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Per-file cap for plain text and markdown bodies (characters).
pub const MAX_TEXT_NOTE_CHARS: usize = 8_000;
/// Per-file cap for the pretty-printed sample of a JSON note (characters).
pub const MAX_JSON_SAMPLE_CHARS: usize = 4_000;
/// Cap on the merged notes text (characters).
pub const MAX_NOTES_TOTAL_CHARS: usize = 20_000;
/// Number of leading elements sampled from a bare JSON array.
pub const JSON_SAMPLE_ITEMS: usize = 5;
/// Placed between documents in the merged text.
pub const NOTE_SEPARATOR: &str = "\n\n---\n\n";
/// Recognized note extensions (matched case-insensitively).
pub const NOTE_EXTENSIONS: [&str; 3] = ["txt", "md", "json"];

/// One supplementary document after the per-file truncation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeDocument {
    pub name: String,
    pub body: String,
}

impl KnowledgeDocument {
    /// The document as it appears in the merged notes.
    pub fn render(&self) -> String {
        format!("{}:\n{}", self.name, self.body)
    }
}

/// Whether a path has one of the recognized note extensions.
pub fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| NOTE_EXTENSIONS.iter().any(|n| ext.eq_ignore_ascii_case(n)))
}

/// Truncate to at most `max` characters, never splitting a character.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// List note files directly under `dir`, sorted by name, skipping the
/// catalog source file.
pub fn list_note_files(dir: &Path, exclude: Option<&Path>) -> Vec<PathBuf> {
    let excluded = exclude.map(comparable_path);

    let mut files: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_note_file(p))
            .filter(|p| excluded.as_ref().is_none_or(|ex| comparable_path(p) != *ex))
            .collect(),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to read notes directory");
            return Vec::new();
        }
    };

    // Sort for deterministic ordering
    files.sort();
    files
}

/// Canonical form when the path exists, so `data/majors.json` and
/// `./data/majors.json` compare equal.
pub(crate) fn comparable_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Read one note with the per-file truncation policy.
/// Returns `None` for unreadable or unparseable files.
pub fn read_document(path: &Path) -> Option<KnowledgeDocument> {
    let file_name = path.file_name()?.to_string_lossy().into_owned();
    let raw = std::fs::read_to_string(path).ok()?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let value: Value = serde_json::from_str(&raw).ok()?;
        let sample = json_sample(value);
        let pretty = serde_json::to_string_pretty(&sample).ok()?;
        return Some(KnowledgeDocument {
            name: format!("JSON({file_name})"),
            body: truncate_chars(&pretty, MAX_JSON_SAMPLE_CHARS).to_string(),
        });
    }

    Some(KnowledgeDocument {
        name: file_name,
        body: truncate_chars(&raw, MAX_TEXT_NOTE_CHARS).to_string(),
    })
}

/// The part of a JSON note worth showing: the first few elements of an
/// array, or the wrapped `items`/`majors` list of an object.
fn json_sample(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().take(JSON_SAMPLE_ITEMS).collect()),
        Value::Object(mut obj) => crate::catalog::CATALOG_LIST_KEYS
            .iter()
            .find_map(|key| obj.remove(*key).filter(|v| !v.is_null()))
            .unwrap_or_else(|| Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    }
}

/// Scan `dir`, read every note, merge and cap the result.
pub fn load_notes(dir: &Path, exclude: Option<&Path>) -> String {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "Notes directory missing");
        return String::new();
    }

    let rendered: Vec<String> = list_note_files(dir, exclude)
        .iter()
        .filter_map(|path| {
            let doc = read_document(path);
            if doc.is_none() {
                debug!(file = %path.display(), "Skipping unreadable note");
            }
            doc
        })
        .map(|doc| doc.render())
        .collect();

    let joined = rendered.join(NOTE_SEPARATOR);
    truncate_chars(&joined, MAX_NOTES_TOTAL_CHARS).to_string()
}
