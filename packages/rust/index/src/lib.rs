//! Corpus indexing pipeline: collect, assemble, and persist the navigation
//! index and full-text search artifacts for each corpus.
//!
//! The pipeline is a synchronous batch pass: every artifact is computed
//! fully in memory, then the regeneration guard decides whether the write
//! is warranted.

pub mod assemble;
pub mod collect;
pub mod extract;
pub mod guard;

use std::path::Path;

use tracing::{info, instrument};

use docsmith_sanitize::Sanitizer;
use docsmith_shared::{
    CorpusConfig, DocsmithError, Result, SiteConfig, WriteOutcome, generated_timestamp,
};

/// Outcome of building one corpus's artifact pair.
#[derive(Debug, Clone)]
pub struct CorpusBuildReport {
    /// Corpus kind (`docs`, `wiki`, ...).
    pub kind: String,
    /// Number of documents indexed.
    pub count: usize,
    /// Outcome for `index.json`.
    pub index: WriteOutcome,
    /// Outcome for `search.json`.
    pub search: WriteOutcome,
}

/// Build the artifact pair for one corpus.
#[instrument(skip_all, fields(kind = %corpus.kind))]
pub fn build_corpus(
    site_root: &Path,
    corpus: &CorpusConfig,
    sanitizer: &Sanitizer,
    exclude_basenames: &[String],
) -> Result<CorpusBuildReport> {
    let records = collect::collect_records(site_root, corpus, sanitizer, exclude_basenames)?;

    let generated_at = generated_timestamp();
    let (index, search) = assemble::assemble(&records, corpus, &generated_at);

    let index_value = serde_json::to_value(&index)
        .map_err(|e| DocsmithError::validation(format!("index serialization failed: {e}")))?;
    let search_value = serde_json::to_value(&search)
        .map_err(|e| DocsmithError::validation(format!("search serialization failed: {e}")))?;

    let index_outcome =
        guard::write_json_if_changed(&corpus.index_path(site_root), &index_value, true)?;
    let search_outcome =
        guard::write_json_if_changed(&corpus.search_path(site_root), &search_value, true)?;

    info!(
        count = records.len(),
        index = %index_outcome,
        search = %search_outcome,
        "corpus indexed"
    );

    Ok(CorpusBuildReport {
        kind: corpus.kind.clone(),
        count: records.len(),
        index: index_outcome,
        search: search_outcome,
    })
}

/// Build every corpus declared by the site config.
pub fn build_site(site_root: &Path, config: &SiteConfig) -> Result<Vec<CorpusBuildReport>> {
    let sanitizer = Sanitizer::new(&config.sanitize)?;

    let mut reports = Vec::with_capacity(config.corpora.len());
    for corpus in &config.corpora {
        reports.push(build_corpus(
            site_root,
            corpus,
            &sanitizer,
            &config.sanitize.exclude_basenames,
        )?);
    }
    Ok(reports)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
