//! Corpus collection: walk a source tree and produce ordered document records.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, instrument};
use walkdir::WalkDir;

use docsmith_sanitize::Sanitizer;
use docsmith_shared::{CorpusConfig, DocRecord, DocsmithError, Result, humanize_slug};

use crate::extract::{first_heading, first_paragraph, flatten_text};

/// Indexable file extensions.
const INDEXABLE_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Fallback rank for ids absent from the pinned order.
const UNPINNED_RANK: usize = 9999;

/// Fallback rank for sections absent from the section order.
const UNORDERED_SECTION_RANK: usize = 999;

/// Collect document records for one corpus.
///
/// Walks `<corpus root>/source`, sanitizes and extracts each indexable file,
/// and returns records in the corpus's total order:
/// `(section rank, pinned rank, lowercased title, id)`. The result is
/// identical across runs given identical inputs and configuration.
#[instrument(skip_all, fields(kind = %corpus.kind))]
pub fn collect_records(
    site_root: &Path,
    corpus: &CorpusConfig,
    sanitizer: &Sanitizer,
    exclude_basenames: &[String],
) -> Result<Vec<DocRecord>> {
    let source_root = corpus.source_root(site_root);
    if !source_root.is_dir() {
        return Err(DocsmithError::validation(format!(
            "corpus source directory '{}' does not exist",
            source_root.display()
        )));
    }

    let mut records: Vec<DocRecord> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for entry in WalkDir::new(&source_root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(&source_root).to_path_buf();
            match e.into_io_error() {
                Some(io) => DocsmithError::io(path, io),
                None => DocsmithError::validation(format!(
                    "walk failed under '{}'",
                    source_root.display()
                )),
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if exclude_basenames.iter().any(|b| b == name.as_ref()) {
            continue;
        }

        let extension = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        if !extension.is_some_and(|e| INDEXABLE_EXTENSIONS.contains(&e.as_str())) {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(&source_root)
            .expect("walk entries live under the source root")
            .to_string_lossy()
            .replace('\\', "/");

        let raw = std::fs::read_to_string(entry.path())
            .map_err(|e| DocsmithError::io(entry.path(), e))?;

        let record = build_record(&rel, &raw, corpus, sanitizer);
        if !seen_ids.insert(record.id.clone()) {
            return Err(DocsmithError::validation(format!(
                "duplicate document id '{}' in corpus '{}'",
                record.id, corpus.kind
            )));
        }
        records.push(record);
    }

    sort_records(&mut records, corpus);
    debug!(count = records.len(), "corpus collected");

    Ok(records)
}

/// Build one record from a relative path and raw file content.
fn build_record(rel: &str, raw: &str, corpus: &CorpusConfig, sanitizer: &Sanitizer) -> DocRecord {
    let sanitized = sanitizer.sanitize(raw);

    let title = first_heading(&sanitized).unwrap_or_else(|| humanize_slug(file_stem(rel)));

    DocRecord {
        id: path_to_id(rel),
        title,
        section: section_for_path(rel, corpus),
        summary: first_paragraph(&sanitized),
        text: flatten_text(&sanitized),
        file: rel.to_string(),
    }
}

/// Derive the stable document id from a relative path: separators are
/// already `/`-normalized; the indexable extension is stripped.
pub fn path_to_id(rel: &str) -> String {
    for ext in INDEXABLE_EXTENSIONS {
        if let Some(stripped) = rel.strip_suffix(&format!(".{ext}")) {
            return stripped.to_string();
        }
    }
    rel.to_string()
}

/// Section for a relative path: first path segment, else the basename
/// override table, else the corpus default.
fn section_for_path(rel: &str, corpus: &CorpusConfig) -> String {
    if let Some((first, _)) = rel.split_once('/') {
        return first.to_string();
    }
    corpus
        .section_by_basename
        .get(rel)
        .cloned()
        .unwrap_or_else(|| corpus.default_section.clone())
}

/// Filename stem used for title fallback.
fn file_stem(rel: &str) -> &str {
    let base = rel.rsplit('/').next().unwrap_or(rel);
    base.rsplit_once('.').map_or(base, |(stem, _)| stem)
}

/// Sort records by the corpus's total order.
fn sort_records(records: &mut [DocRecord], corpus: &CorpusConfig) {
    let section_rank: HashMap<&str, usize> = corpus
        .section_order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let pinned_rank: HashMap<&str, usize> = corpus
        .pinned_order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    records.sort_by_cached_key(|record| {
        (
            section_rank
                .get(record.section.as_str())
                .copied()
                .unwrap_or(UNORDERED_SECTION_RANK),
            pinned_rank
                .get(record.id.as_str())
                .copied()
                .unwrap_or(UNPINNED_RANK),
            record.title.to_lowercase(),
            record.id.clone(),
        )
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_shared::SanitizeConfig;
    use std::fs;
    use std::path::PathBuf;

    fn write_source(root: &Path, rel: &str, content: &str) {
        let path = root.join("docs/source").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn collect(root: &Path, corpus: &CorpusConfig) -> Result<Vec<DocRecord>> {
        let sanitizer = Sanitizer::new(&SanitizeConfig::default()).unwrap();
        let exclude = SanitizeConfig::default().exclude_basenames;
        collect_records(root, corpus, &sanitizer, &exclude)
    }

    #[test]
    fn path_to_id_strips_known_extensions() {
        assert_eq!(path_to_id("guides/hello.md"), "guides/hello");
        assert_eq!(path_to_id("notes.txt"), "notes");
        assert_eq!(path_to_id("guides/hello"), "guides/hello");
    }

    #[test]
    fn collect_assigns_ids_and_sections() {
        let tmp = tempfile::tempdir().unwrap();
        write_source(tmp.path(), "section/a.md", "# Alpha\n\nFirst.\n");
        write_source(tmp.path(), "section/b.md", "# Beta\n\nSecond.\n");
        write_source(tmp.path(), "start.md", "# Start\n\nRoot file.\n");

        let corpus = CorpusConfig::default();
        let records = collect(tmp.path(), &corpus).unwrap();

        assert_eq!(records.len(), 3);
        let a = records.iter().find(|r| r.id == "section/a").unwrap();
        assert_eq!(a.section, "section");
        assert_eq!(a.title, "Alpha");
        assert_eq!(a.summary, "First.");

        let start = records.iter().find(|r| r.id == "start").unwrap();
        assert_eq!(start.section, "overview");
    }

    #[test]
    fn collect_excludes_basenames_and_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        write_source(tmp.path(), "README.md", "# Readme\n");
        write_source(tmp.path(), "image.png", "binary");
        write_source(tmp.path(), "kept.md", "# Kept\n");

        let records = collect(tmp.path(), &CorpusConfig::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "kept");
    }

    #[test]
    fn collect_title_falls_back_to_filename() {
        let tmp = tempfile::tempdir().unwrap();
        write_source(
            tmp.path(),
            "getting-started.md",
            "Hello. This is a test.\n\nSecond paragraph.\n",
        );

        let records = collect(tmp.path(), &CorpusConfig::default()).unwrap();
        assert_eq!(records[0].title, "Getting Started");
        assert_eq!(records[0].summary, "Hello. This is a test.");
    }

    #[test]
    fn collect_rejects_duplicate_ids() {
        let tmp = tempfile::tempdir().unwrap();
        write_source(tmp.path(), "page.md", "# A\n");
        write_source(tmp.path(), "page.txt", "# B\n");

        let err = collect(tmp.path(), &CorpusConfig::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate document id 'page'"));
    }

    #[test]
    fn collect_missing_source_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = collect(tmp.path(), &CorpusConfig::default()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn collect_respects_basename_section_override() {
        let tmp = tempfile::tempdir().unwrap();
        write_source(tmp.path(), "changelog.md", "# Changelog\n");

        let mut corpus = CorpusConfig::default();
        corpus
            .section_by_basename
            .insert("changelog.md".into(), "meta".into());

        let records = collect(tmp.path(), &corpus).unwrap();
        assert_eq!(records[0].section, "meta");
    }

    #[test]
    fn sort_is_pinned_then_title_then_id() {
        let mut corpus = CorpusConfig::default();
        corpus.section_order = vec!["overview".into(), "guides".into()];
        corpus.pinned_order = vec!["guides/hello".into()];

        let mut records = vec![
            record("guides/zeta", "Aardvark", "guides"),
            record("guides/hello", "Zulu", "guides"),
            record("other/x", "X", "other"),
            record("start", "Start", "overview"),
        ];
        sort_records(&mut records, &corpus);

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        // overview first, then guides with the pinned id ahead of the
        // alphabetically earlier title, then the unlisted section.
        assert_eq!(ids, ["start", "guides/hello", "guides/zeta", "other/x"]);
    }

    #[test]
    fn sort_is_stable_across_runs() {
        let corpus = CorpusConfig::default();
        let build = || {
            let mut records = vec![
                record("b", "Same", "overview"),
                record("a", "Same", "overview"),
                record("c", "Same", "overview"),
            ];
            sort_records(&mut records, &corpus);
            records.into_iter().map(|r| r.id).collect::<Vec<_>>()
        };
        assert_eq!(build(), vec!["a", "b", "c"]);
        assert_eq!(build(), build());
    }

    fn record(id: &str, title: &str, section: &str) -> DocRecord {
        DocRecord {
            id: id.into(),
            title: title.into(),
            section: section.into(),
            summary: String::new(),
            text: String::new(),
            file: PathBuf::from(id).to_string_lossy().into_owned(),
        }
    }
}
