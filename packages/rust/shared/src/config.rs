//! Site configuration for docsmith.
//!
//! Each documentation site carries a `docsmith.toml` at its root. A missing
//! file falls back to built-in defaults. CLI flags override config values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocsmithError, Result};

/// Configuration file name at the site root.
const CONFIG_FILE_NAME: &str = "docsmith.toml";

// ---------------------------------------------------------------------------
// Config structs (matching docsmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level site config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display title used in the LLMS pack header.
    #[serde(default = "default_title")]
    pub title: String,

    /// Output path for the concatenated export, relative to the site root.
    #[serde(default = "default_output")]
    pub output: String,

    /// Indexed corpora, in export order.
    #[serde(default = "default_corpora", rename = "corpus")]
    pub corpora: Vec<CorpusConfig>,

    /// Sanitization rule tables shared by all corpora.
    #[serde(default)]
    pub sanitize: SanitizeConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            output: default_output(),
            corpora: default_corpora(),
            sanitize: SanitizeConfig::default(),
        }
    }
}

fn default_title() -> String {
    "Documentation".into()
}
fn default_output() -> String {
    "llms.txt".into()
}
fn default_corpora() -> Vec<CorpusConfig> {
    vec![CorpusConfig::default()]
}

/// `[[corpus]]` entry — one indexed document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Corpus kind recorded in artifacts (`docs`, `wiki`, ...).
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Corpus directory relative to the site root. Sources live under
    /// `<root>/source`; artifacts are written to `<root>/index.json` and
    /// `<root>/search.json`.
    #[serde(default = "default_kind")]
    pub root: String,

    /// URL mount used for deep links (`<mount>/?p=<id>`).
    #[serde(default = "default_mount")]
    pub mount: String,

    /// Pinned section order; unseen sections are appended alphabetically.
    #[serde(default = "default_section_order")]
    pub section_order: Vec<String>,

    /// Pinned per-document order; unlisted ids sort after all pinned ones.
    #[serde(default)]
    pub pinned_order: Vec<String>,

    /// Section assigned to root-level files without an override.
    #[serde(default = "default_section")]
    pub default_section: String,

    /// Section overrides for specific root-level basenames.
    #[serde(default)]
    pub section_by_basename: BTreeMap<String, String>,

    /// Human-readable section labels; unlisted sections are humanized.
    #[serde(default = "default_section_labels")]
    pub section_labels: BTreeMap<String, String>,

    /// When set, ids shaped like `spec/NNNN` deep-link to
    /// `<mount>/spec/NNNN/` instead of the query-parameter form.
    #[serde(default)]
    pub numbered_spec_routes: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            root: default_kind(),
            mount: default_mount(),
            section_order: default_section_order(),
            pinned_order: Vec::new(),
            default_section: default_section(),
            section_by_basename: BTreeMap::new(),
            section_labels: default_section_labels(),
            numbered_spec_routes: false,
        }
    }
}

fn default_kind() -> String {
    "docs".into()
}
fn default_mount() -> String {
    "/docs".into()
}
fn default_section() -> String {
    "overview".into()
}
fn default_section_order() -> Vec<String> {
    vec!["overview".into(), "guides".into()]
}
fn default_section_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("overview".to_string(), "Start".to_string()),
        ("cli".to_string(), "CLI".to_string()),
        ("config".to_string(), "Configuration".to_string()),
        ("api".to_string(), "APIs".to_string()),
        ("std".to_string(), "Standard library".to_string()),
    ])
}

impl CorpusConfig {
    /// Directory holding the corpus source files.
    pub fn source_root(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.root).join("source")
    }

    /// Path of the navigation index artifact.
    pub fn index_path(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.root).join("index.json")
    }

    /// Path of the full-text search artifact.
    pub fn search_path(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.root).join("search.json")
    }

    /// Human-readable label for a section name.
    pub fn section_label(&self, name: &str) -> String {
        if let Some(label) = self.section_labels.get(name) {
            return label.clone();
        }
        if name.is_empty() {
            return "Docs".to_string();
        }
        humanize_slug(name)
    }
}

/// Turn a slug like `getting-started` into `Getting Started`.
pub fn humanize_slug(slug: &str) -> String {
    slug.replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.collect::<String>())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Sanitization tables
// ---------------------------------------------------------------------------

/// `[sanitize]` section — the data-driven rule tables consumed by the
/// sanitizer. All pattern matching is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeConfig {
    /// Basenames excluded from indexing entirely.
    #[serde(default = "default_exclude_basenames")]
    pub exclude_basenames: Vec<String>,

    /// Heading texts that open a skip region (heading + body dropped).
    #[serde(default = "default_status_headings")]
    pub status_headings: Vec<String>,

    /// Line prefixes (label + colon) dropped outside code fences.
    #[serde(default = "default_status_line_prefixes")]
    pub status_line_prefixes: Vec<String>,

    /// Regex fragments; prose lines matching any of them are dropped.
    /// Never applied inside code fences.
    #[serde(default = "default_internal_refs")]
    pub internal_refs: Vec<String>,

    /// Ordered phrase-rewrite rules applied outside inline-code spans.
    #[serde(default = "default_rules")]
    pub rules: Vec<RewriteRule>,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            exclude_basenames: default_exclude_basenames(),
            status_headings: default_status_headings(),
            status_line_prefixes: default_status_line_prefixes(),
            internal_refs: default_internal_refs(),
            rules: default_rules(),
        }
    }
}

/// One find/replace entry in the rewrite table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRule {
    /// Regex pattern, compiled case-insensitively.
    pub pattern: String,
    /// Replacement text (regex capture syntax allowed).
    pub replace: String,
}

fn rule(pattern: &str, replace: &str) -> RewriteRule {
    RewriteRule {
        pattern: pattern.into(),
        replace: replace.into(),
    }
}

fn default_exclude_basenames() -> Vec<String> {
    ["README.md", "PLAN.md", "STATUS.md", "llms.txt"]
        .map(String::from)
        .to_vec()
}

fn default_status_headings() -> Vec<String> {
    vec!["Status".into(), "Implementation status".into()]
}

fn default_status_line_prefixes() -> Vec<String> {
    vec!["Status:".into(), "Implementation status:".into()]
}

fn default_internal_refs() -> Vec<String> {
    vec![
        r"STATUS\.md".into(),
        r"PLAN\.md".into(),
        r"README\.md".into(),
        r"\bllms\.txt\b".into(),
    ]
}

/// Default wording-normalization table. Order matters: more specific
/// patterns come before the broad ones they would otherwise shadow.
fn default_rules() -> Vec<RewriteRule> {
    vec![
        rule(r"\bwhat works today\b", "supported behavior"),
        rule(r"\bexamples\s*\(works today\)", "Examples"),
        rule(r"\bexample\s*\(works today\)\s*:", "Example:"),
        rule(r"\bworks today:\s*", "Example: "),
        rule(r"\s*\(works today\)", ""),
        rule(r"\bworks today\b", "example"),
        rule(r"\bcurrent limitations\b", "Limitations"),
        rule(r"\bcurrent subset limitation\b", "Limitation"),
        rule(r"\bimplemented in\b", "defined in"),
        rule(r"\bcurrently\s+not\b", "not"),
        rule(r"\s*\(\s*current\s+(?:subset|support)[^)]*\)", ""),
        rule(r"\bcurrent\s+(?:subset|support)\b", ""),
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path to the config file under a site root.
pub fn config_file_path(site_root: &Path) -> PathBuf {
    site_root.join(CONFIG_FILE_NAME)
}

/// Load the site config. Returns defaults if the file does not exist.
/// A missing site root is fatal.
pub fn load_site_config(site_root: &Path) -> Result<SiteConfig> {
    if !site_root.is_dir() {
        return Err(DocsmithError::config(format!(
            "site root '{}' is not a directory",
            site_root.display()
        )));
    }

    let path = config_file_path(site_root);
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(SiteConfig::default());
    }

    load_site_config_from(&path)
}

/// Load the site config from a specific file path.
pub fn load_site_config_from(path: &Path) -> Result<SiteConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocsmithError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocsmithError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file at the site root.
/// Returns the path to the created file.
pub fn init_site_config(site_root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(site_root).map_err(|e| DocsmithError::io(site_root, e))?;

    let path = config_file_path(site_root);
    let config = SiteConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocsmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocsmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
