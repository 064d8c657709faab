//! Index assembly: group ordered records into the two JSON artifacts.

use std::collections::HashMap;

use docsmith_shared::{
    CorpusConfig, DocRecord, IndexArtifact, IndexItem, SearchArtifact, SearchItem, SectionGroup,
};

/// Build the index and search artifacts for one corpus.
///
/// Pure given the record list, the corpus configuration, and a generation
/// timestamp. Sections follow the pinned order, then any unseen sections
/// alphabetically; items keep the collector's established order.
pub fn assemble(
    records: &[DocRecord],
    corpus: &CorpusConfig,
    generated_at: &str,
) -> (IndexArtifact, SearchArtifact) {
    let index = IndexArtifact {
        generated_at: generated_at.to_string(),
        kind: corpus.kind.clone(),
        count: records.len(),
        sections: group_sections(records, &corpus.section_order),
    };

    let search = SearchArtifact {
        generated_at: generated_at.to_string(),
        kind: corpus.kind.clone(),
        count: records.len(),
        items: records
            .iter()
            .map(|r| SearchItem {
                id: r.id.clone(),
                title: r.title.clone(),
                section: r.section.clone(),
                summary: r.summary.clone(),
                text: r.text.clone(),
            })
            .collect(),
    };

    (index, search)
}

/// Group records by section, pinned order first, remainder alphabetical.
fn group_sections(records: &[DocRecord], section_order: &[String]) -> Vec<SectionGroup> {
    let mut grouped: HashMap<&str, Vec<IndexItem>> = HashMap::new();
    for record in records {
        grouped
            .entry(record.section.as_str())
            .or_default()
            .push(IndexItem {
                id: record.id.clone(),
                title: record.title.clone(),
                file: record.file.clone(),
            });
    }

    let mut out = Vec::new();
    for name in section_order {
        if let Some(items) = grouped.remove(name.as_str()) {
            out.push(SectionGroup {
                name: name.clone(),
                items,
            });
        }
    }

    let mut remaining: Vec<(&str, Vec<IndexItem>)> = grouped.into_iter().collect();
    remaining.sort_by(|a, b| a.0.cmp(b.0));
    for (name, items) in remaining {
        out.push(SectionGroup {
            name: name.to_string(),
            items,
        });
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
