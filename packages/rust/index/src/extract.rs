//! Structural extraction over sanitized markdown.
//!
//! Pure functions: title ([`first_heading`]), summary ([`first_paragraph`])
//! and search plaintext ([`flatten_text`]). All three treat markdown as a
//! line stream, not a parsed tree.

use std::sync::LazyLock;

use regex::Regex;

/// Character budget for extracted summaries.
const SUMMARY_BUDGET: usize = 220;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static STATUS_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Status:|Implementation status:)\s*").expect("valid regex")
});

/// Collapse whitespace runs to single spaces and trim.
fn collapse_ws(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

/// Extract the first markdown heading as the document title.
///
/// Scanning stops at the first non-blank, non-comment, non-heading line:
/// a document whose prose starts before any heading has no extracted title
/// (the collector falls back to a filename-derived one).
pub fn first_heading(markdown: &str) -> Option<String> {
    for line in markdown.lines() {
        if line.starts_with('#') {
            let heading = collapse_ws(line.trim_start_matches('#'));
            return if heading.is_empty() { None } else { Some(heading) };
        }
        if !line.trim().is_empty() && !line.starts_with("<!--") {
            break;
        }
    }
    None
}

/// Extract the first qualifying prose paragraph as a summary.
///
/// Skips fenced code, status-label lines, headings, and list/table lines;
/// accumulation stops at the first blank line after content has started or
/// once the buffer exceeds the character budget.
pub fn first_paragraph(markdown: &str) -> String {
    let mut in_code = false;
    let mut buf: Vec<&str> = Vec::new();
    let mut collected = 0usize;

    for raw in markdown.lines() {
        let line = raw.trim_end();

        if line.starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        if STATUS_LINE_RE.is_match(line) {
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if line.starts_with(['-', '*', '|']) {
            continue;
        }
        if line.trim().is_empty() {
            if !buf.is_empty() {
                break;
            }
            continue;
        }

        let trimmed = line.trim();
        buf.push(trimmed);
        collected += trimmed.len();
        if collected > SUMMARY_BUDGET {
            break;
        }
    }

    collapse_ws(&buf.join(" "))
}

/// Flatten markdown to searchable plaintext.
///
/// Fence markers are removed (payload kept), inline code and links are
/// unwrapped, heading/list/quote markers, emphasis, and table pipes are
/// stripped, and whitespace is collapsed. Output carries no markdown
/// control characters; it is a search corpus, not readable prose.
pub fn flatten_text(markdown: &str) -> String {
    static COMMENT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
    static FENCE_OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new("```[^\n]*\n").expect("valid regex"));
    static INLINE_CODE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"));
    static HEADING_MARK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^#+\s*").expect("valid regex"));
    static LIST_MARK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^[\s>*-]+\s*").expect("valid regex"));

    let md = COMMENT_RE.replace_all(markdown, " ");
    let md = FENCE_OPEN_RE.replace_all(&md, "\n");
    let md = md.replace("```", "\n");
    let md = INLINE_CODE_RE.replace_all(&md, "$1");
    let md = LINK_RE.replace_all(&md, "$1");
    let md = HEADING_MARK_RE.replace_all(&md, "");
    let md = LIST_MARK_RE.replace_all(&md, "");
    let md = md
        .replace("**", "")
        .replace("__", "")
        .replace(['*', '_'], "")
        .replace('|', " ");

    collapse_ws(&md)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
