//! LLMS-pack builder: one flattened, delimited export of every corpus.
//!
//! Consumes the persisted navigation indexes (so the export always mirrors
//! what the site serves) plus the raw sources, re-sanitized for export.
//! The write is skipped when only the `Generated:` header line differs.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use tracing::{debug, info, instrument};

use docsmith_sanitize::Sanitizer;
use docsmith_shared::{
    CorpusConfig, DocsmithError, IndexArtifact, Result, SiteConfig, WriteOutcome,
    generated_timestamp, humanize_slug,
};

/// Width of the per-document delimiter rule.
const RULE_WIDTH: usize = 78;

/// Query-string escaping for document ids in deep links.
const QUERY_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?');

/// Ids shaped like `spec/NNNN` get a dedicated path route when enabled.
static SPEC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^spec/(\d{4})$").expect("valid regex"));

/// Outcome of one export build.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Where the pack was (or would have been) written.
    pub path: PathBuf,
    /// Whether the file was written or left untouched.
    pub outcome: WriteOutcome,
    /// Total documents across all corpora.
    pub doc_count: usize,
    /// Documents whose backing source file was missing.
    pub missing_sources: usize,
}

/// One TOC entry loaded from a persisted index.
#[derive(Debug, Clone)]
struct PackItem {
    section: String,
    id: String,
    title: String,
    file: String,
}

/// Build the LLMS pack for a site.
///
/// Fails fast when a corpus index has not been built yet; a missing source
/// file for an individual document only produces an inline error block.
#[instrument(skip_all, fields(site = %site_root.display()))]
pub fn build_pack(
    site_root: &Path,
    config: &SiteConfig,
    output_override: Option<&Path>,
) -> Result<ExportReport> {
    let sanitizer = Sanitizer::new(&config.sanitize)?;

    let mut corpora: Vec<(&CorpusConfig, Vec<PackItem>)> = Vec::new();
    for corpus in &config.corpora {
        corpora.push((corpus, load_items(site_root, corpus)?));
    }

    let doc_count: usize = corpora.iter().map(|(_, items)| items.len()).sum();
    let mut missing_sources = 0usize;

    let mut lines: Vec<String> = Vec::new();
    push_header(&mut lines, config);
    push_toc(&mut lines, config, &corpora);

    lines.push(String::new());
    lines.push("Content".into());
    lines.push("-------".into());
    lines.push(String::new());

    for &(corpus, ref items) in &corpora {
        for item in items {
            push_document(&mut lines, site_root, corpus, item, &sanitizer, &mut missing_sources);
        }
    }

    let next_text = format!("{}\n", lines.join("\n").trim_end());

    let out_path = match output_override {
        Some(p) => p.to_path_buf(),
        None => site_root.join(&config.output),
    };

    let outcome = write_if_changed(&out_path, &next_text)?;
    info!(
        path = %out_path.display(),
        doc_count,
        missing_sources,
        outcome = %outcome,
        "export built"
    );

    Ok(ExportReport {
        path: out_path,
        outcome,
        doc_count,
        missing_sources,
    })
}

// ---------------------------------------------------------------------------
// Index loading
// ---------------------------------------------------------------------------

/// Load the persisted index for a corpus, flattened to TOC entries.
fn load_items(site_root: &Path, corpus: &CorpusConfig) -> Result<Vec<PackItem>> {
    let index_path = corpus.index_path(site_root);

    let content = match std::fs::read_to_string(&index_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DocsmithError::missing_artifact(
                &index_path,
                "run `docsmith index` first",
            ));
        }
        Err(e) => return Err(DocsmithError::io(&index_path, e)),
    };

    let index: IndexArtifact = serde_json::from_str(&content).map_err(|e| {
        DocsmithError::validation(format!(
            "invalid index artifact at {}: {e}",
            index_path.display()
        ))
    })?;

    let mut items = Vec::new();
    for section in index.sections {
        for item in section.items {
            if item.id.is_empty() || item.file.is_empty() {
                continue;
            }
            items.push(PackItem {
                section: section.name.clone(),
                id: item.id,
                title: item.title,
                file: item.file,
            });
        }
    }

    debug!(kind = %corpus.kind, count = items.len(), "index loaded");
    Ok(items)
}

/// Deep link for one document.
fn doc_url(corpus: &CorpusConfig, id: &str) -> String {
    if corpus.numbered_spec_routes {
        if let Some(caps) = SPEC_ID_RE.captures(id) {
            return format!("{}/spec/{}/", corpus.mount, &caps[1]);
        }
    }
    let encoded = utf8_percent_encode(id, QUERY_ESCAPE);
    format!("{}/?p={encoded}", corpus.mount)
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

fn push_header(lines: &mut Vec<String>, config: &SiteConfig) {
    let banner = format!("{} · LLMS Pack", config.title);
    let underline = "=".repeat(banner.chars().count());

    lines.push(banner);
    lines.push(underline);
    lines.push(String::new());
    lines.push(format!(
        "This file concatenates the full {} documentation hosted on this website,",
        config.title
    ));
    lines.push("so an LLM can answer questions using the same source of truth as readers.".into());
    lines.push(String::new());
    lines.push(format!("Generated: {}", generated_timestamp()));
    lines.push(String::new());
    lines.push("How to link:".into());
    for corpus in &config.corpora {
        lines.push(format!(
            "- {}: {}/?p=<id>",
            humanize_slug(&corpus.kind),
            corpus.mount
        ));
    }
    lines.push(String::new());
    lines.push("Table of contents".into());
    lines.push("-----------------".into());
    lines.push(String::new());
}

fn push_toc(lines: &mut Vec<String>, config: &SiteConfig, corpora: &[(&CorpusConfig, Vec<PackItem>)]) {
    for (i, &(corpus, ref items)) in corpora.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!("{} {}", config.title, humanize_slug(&corpus.kind)));

        let mut current_section: Option<&str> = None;
        for item in items {
            if current_section != Some(item.section.as_str()) {
                current_section = Some(item.section.as_str());
                lines.push(format!("- {}", corpus.section_label(&item.section)));
            }
            lines.push(format!(
                "  - {} — {} — {}",
                item.id,
                item.title,
                doc_url(corpus, &item.id)
            ));
        }
    }
}

fn push_document(
    lines: &mut Vec<String>,
    site_root: &Path,
    corpus: &CorpusConfig,
    item: &PackItem,
    sanitizer: &Sanitizer,
    missing_sources: &mut usize,
) {
    let rule = "=".repeat(RULE_WIDTH);
    let source_path = corpus.source_root(site_root).join(&item.file);

    let raw = match std::fs::read_to_string(&source_path) {
        Ok(raw) => raw,
        Err(_) => {
            // A stale index entry must not abort the whole export.
            *missing_sources += 1;
            debug!(file = %item.file, "source file missing, emitting placeholder");
            lines.push(rule.clone());
            lines.push(format!(
                "{}: {} ({})",
                corpus.kind.to_uppercase(),
                item.title,
                item.id
            ));
            lines.push(format!("URL: {}", doc_url(corpus, &item.id)));
            lines.push("ERROR: source file missing".into());
            lines.push(rule);
            lines.push(String::new());
            return;
        }
    };

    let content = sanitizer.sanitize(&raw);

    lines.push(rule.clone());
    lines.push(format!(
        "{}: {} ({})",
        corpus.kind.to_uppercase(),
        item.title,
        item.id
    ));
    lines.push(format!("URL: {}", doc_url(corpus, &item.id)));
    lines.push(rule);
    lines.push(String::new());
    lines.push(content.trim_end().to_string());
    lines.push(String::new());
}

// ---------------------------------------------------------------------------
// Idempotent write
// ---------------------------------------------------------------------------

/// Persist the pack unless it matches the previous one modulo the header
/// `Generated:` line.
fn write_if_changed(path: &Path, next_text: &str) -> Result<WriteOutcome> {
    if let Ok(prev_text) = std::fs::read_to_string(path) {
        if normalize_generated_line(&prev_text) == normalize_generated_line(next_text) {
            debug!(path = %path.display(), "pack unchanged, skipping write");
            return Ok(WriteOutcome::Unchanged);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocsmithError::io(parent, e))?;
    }
    std::fs::write(path, next_text).map_err(|e| DocsmithError::io(path, e))?;
    Ok(WriteOutcome::Written)
}

/// Normalize only the header `Generated:` timestamp, so rebuilds with
/// unchanged content compare equal. Body occurrences are left alone: the
/// header region ends at the `How to link:` line.
fn normalize_generated_line(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_header = true;
    let mut replaced = false;

    for line in text.lines() {
        if in_header && !replaced && line.starts_with("Generated: ") {
            out.push("Generated: <preserved>");
            replaced = true;
            continue;
        }
        out.push(line);
        if line.trim() == "How to link:" {
            in_header = false;
        }
    }

    format!("{}\n", out.join("\n").trim_end())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
