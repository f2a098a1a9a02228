//! Program catalog records.
//!
//! A record is immutable once loaded. The knowledge store swaps whole
//! catalogs, so nothing here needs interior mutability.

use serde::{Deserialize, Serialize};

/// One academic program in the catalog.
///
/// Every field except `slug` and `name` is optional in the source file.
/// Fields this struct does not know about are kept in `extra` and served
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    /// Unique (case-insensitive) identifier within one catalog snapshot
    #[serde(default)]
    pub slug: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Academic level (e.g. "Bachelor", "College")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub core_modules: Vec<String>,

    /// Job titles graduates typically hold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<u32>,

    /// Free-text admission target (who the program admits)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuition_range: Option<TuitionRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    /// Unrecognized fields, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProgramRecord {
    /// Minimal record, mostly for tests and fixtures.
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            level: None,
            career_group: None,
            description: None,
            skills: Vec::new(),
            core_modules: Vec::new(),
            jobs: Vec::new(),
            duration_months: None,
            admission_target: None,
            tuition_range: None,
            contact: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Case-insensitive exact slug comparison.
    pub fn matches_slug(&self, slug: &str) -> bool {
        !self.slug.is_empty() && self.slug.to_lowercase() == slug.to_lowercase()
    }

    /// One line of the catalog brief injected into the system prompt.
    pub fn brief_line(&self) -> String {
        format!(
            "- {} ({}) | group: {}",
            self.name,
            self.level.as_deref().unwrap_or(""),
            self.career_group.as_deref().unwrap_or(""),
        )
    }
}

/// Tuition bounds. Accepts either `[min, max]` or `{"min": .., "max": ..}`
/// on input and always serializes as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TuitionRangeRepr", into = "[f64; 2]")]
pub struct TuitionRange {
    pub min: f64,
    pub max: f64,
}

impl TuitionRange {
    /// Lower bound must not exceed the upper bound.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TuitionRangeRepr {
    Pair([f64; 2]),
    Bounds { min: f64, max: f64 },
}

impl From<TuitionRangeRepr> for TuitionRange {
    fn from(repr: TuitionRangeRepr) -> Self {
        match repr {
            TuitionRangeRepr::Pair([min, max]) => Self { min, max },
            TuitionRangeRepr::Bounds { min, max } => Self { min, max },
        }
    }
}

impl From<TuitionRange> for [f64; 2] {
    fn from(range: TuitionRange) -> Self {
        [range.min, range.max]
    }
}

/// Admissions contact for a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
