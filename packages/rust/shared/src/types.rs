//! Core domain types for docsmith corpora and artifacts.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// RFC 3339 UTC timestamp at seconds precision, the format used for every
/// `generatedAt` field and the export header.
pub fn generated_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Result of an idempotent artifact write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The artifact changed and was persisted.
    Written,
    /// The artifact matched the previous one (modulo the exempt timestamp);
    /// nothing was written.
    Unchanged,
}

impl WriteOutcome {
    pub fn is_written(self) -> bool {
        matches!(self, Self::Written)
    }
}

impl std::fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Written => write!(f, "written"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// One indexed documentation unit.
///
/// Records are rebuilt from scratch on every pass; the only state carried
/// between runs is the previously written artifact the Regeneration Guard
/// diffs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRecord {
    /// Stable slug derived from the relative path (extension stripped,
    /// separators normalized to `/`). Unique within a corpus.
    pub id: String,
    /// First markdown heading, or a humanized filename.
    pub title: String,
    /// First path segment, or the corpus default for root-level files.
    pub section: String,
    /// First qualifying prose paragraph, truncated at a character budget.
    pub summary: String,
    /// Fully flattened plaintext used for full-text search.
    pub text: String,
    /// Relative path to the original source file.
    pub file: String,
}

// ---------------------------------------------------------------------------
// Index artifact (navigation metadata)
// ---------------------------------------------------------------------------

/// Navigation stub for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexItem {
    pub id: String,
    pub title: String,
    pub file: String,
}

/// One named section with its ordered items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionGroup {
    pub name: String,
    pub items: Vec<IndexItem>,
}

/// The `index.json` structure written per corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexArtifact {
    /// RFC 3339 UTC timestamp (seconds precision). Exempt from the
    /// unchanged-artifact comparison.
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    /// Corpus kind, e.g. `docs` or `wiki`.
    pub kind: String,
    /// Total number of documents across all sections.
    pub count: usize,
    pub sections: Vec<SectionGroup>,
}

// ---------------------------------------------------------------------------
// Search artifact (full-text payload)
// ---------------------------------------------------------------------------

/// Search payload for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    pub id: String,
    pub title: String,
    pub section: String,
    pub summary: String,
    pub text: String,
}

/// The `search.json` structure written per corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchArtifact {
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub kind: String,
    pub count: usize,
    pub items: Vec<SearchItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_timestamp_has_seconds_precision() {
        let ts = generated_timestamp();
        // e.g. 2025-01-01T00:00:00+00:00 — no fractional seconds.
        assert!(!ts.contains('.'));
        assert!(ts.ends_with("+00:00"));
    }

    #[test]
    fn write_outcome_display() {
        assert_eq!(WriteOutcome::Written.to_string(), "written");
        assert_eq!(WriteOutcome::Unchanged.to_string(), "unchanged");
        assert!(WriteOutcome::Written.is_written());
    }

    #[test]
    fn index_artifact_serializes_generated_at_camel_case() {
        let artifact = IndexArtifact {
            generated_at: "2025-01-01T00:00:00+00:00".into(),
            kind: "docs".into(),
            count: 1,
            sections: vec![SectionGroup {
                name: "overview".into(),
                items: vec![IndexItem {
                    id: "start".into(),
                    title: "Start".into(),
                    file: "start.md".into(),
                }],
            }],
        };

        let json = serde_json::to_string(&artifact).expect("serialize");
        assert!(json.contains("\"generatedAt\""));
        assert!(!json.contains("generated_at"));

        let parsed: IndexArtifact = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, artifact);
    }

    #[test]
    fn search_artifact_roundtrip() {
        let artifact = SearchArtifact {
            generated_at: "2025-01-01T00:00:00+00:00".into(),
            kind: "wiki".into(),
            count: 1,
            items: vec![SearchItem {
                id: "language/enums".into(),
                title: "Enums".into(),
                section: "language".into(),
                summary: "Enumerated types.".into(),
                text: "Enums Enumerated types.".into(),
            }],
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialize");
        let parsed: SearchArtifact = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.count, 1);
        assert_eq!(parsed.items[0].section, "language");
    }
}
