//! Markdown sanitization for indexing and export.
//!
//! [`Sanitizer`] rewrites documentation prose in a single forward pass:
//! status-only sections and internal-only references are dropped, wording
//! is normalized through a data-driven rule table, and code payload is
//! preserved verbatim (only trailing comment text inside fences is touched).
//!
//! Malformed input is never an error: an unterminated fence or an unclosed
//! skip region simply carries its state through to end of document.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use docsmith_shared::{DocsmithError, Result, SanitizeConfig};

/// Matches an ATX heading and captures its depth and text.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*$").expect("valid regex"));

/// A configured, reusable markdown sanitizer.
///
/// Construction compiles the config's rule tables once; [`Sanitizer::sanitize`]
/// is then a pure text transform, restartable per document.
pub struct Sanitizer {
    status_heading_re: Regex,
    status_line_re: Regex,
    internal_ref_re: Option<Regex>,
    rules: Vec<(Regex, String)>,
}

impl Sanitizer {
    /// Compile the sanitization tables from config.
    pub fn new(config: &SanitizeConfig) -> Result<Self> {
        let status_heading_re = alternation(&config.status_headings, r"^(?:", r")\b")?;
        let status_line_re = alternation(&config.status_line_prefixes, r"^(?:", r")\s*")?;

        let internal_ref_re = if config.internal_refs.is_empty() {
            None
        } else {
            let joined = config
                .internal_refs
                .iter()
                .map(|p| format!("(?:{p})"))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile_insensitive(&joined)?)
        };

        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            rules.push((compile_insensitive(&rule.pattern)?, rule.replace.clone()));
        }

        debug!(rule_count = rules.len(), "sanitizer compiled");

        Ok(Self {
            status_heading_re,
            status_line_re,
            internal_ref_re,
            rules,
        })
    }

    /// Sanitize one markdown document.
    ///
    /// Preserves line structure, trims trailing whitespace per line, and
    /// terminates the output with exactly one newline.
    pub fn sanitize(&self, markdown: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut in_code = false;
        let mut code_lang: Option<String> = None;
        let mut skip_depth: Option<usize> = None;

        for raw in markdown.lines() {
            let trimmed = raw.trim_start();

            if trimmed.starts_with("```") {
                let entering = !in_code;
                in_code = entering;
                code_lang = if entering {
                    trimmed[3..].split_whitespace().next().map(str::to_lowercase)
                } else {
                    None
                };
                if skip_depth.is_none() {
                    out.push(raw.trim_end().to_string());
                }
                continue;
            }

            if !in_code {
                if let Some(caps) = HEADING_RE.captures(raw) {
                    let depth = caps[1].len();
                    // A heading at or above the trigger's depth closes the region.
                    if skip_depth.is_some_and(|d| depth <= d) {
                        skip_depth = None;
                    }
                    if skip_depth.is_none() && self.status_heading_re.is_match(&caps[2]) {
                        skip_depth = Some(depth);
                        continue;
                    }
                }
            }

            if skip_depth.is_some() {
                continue;
            }

            if in_code {
                out.push(
                    self.rewrite_code_line(raw, code_lang.as_deref())
                        .trim_end()
                        .to_string(),
                );
                continue;
            }

            if self.status_line_re.is_match(raw) {
                continue;
            }
            if let Some(re) = &self.internal_ref_re {
                if re.is_match(raw) {
                    continue;
                }
            }

            out.push(self.rewrite_prose(raw).trim_end().to_string());
        }

        let joined = out.join("\n");
        format!("{}\n", joined.trim_end())
    }

    /// Apply the rewrite table to a prose line, leaving inline-code spans
    /// untouched: the line is split on backticks and only the even-indexed
    /// (non-code) segments are rewritten.
    fn rewrite_prose(&self, line: &str) -> String {
        if !line.contains('`') {
            return self.apply_rules(line);
        }

        line.split('`')
            .enumerate()
            .map(|(i, segment)| {
                if i % 2 == 0 {
                    self.apply_rules(segment)
                } else {
                    segment.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("`")
    }

    /// Inside a fence, rewrite only the substring after the language's line
    /// comment marker. Code payload is never altered; an unrecognized fence
    /// language means no rewriting at all.
    fn rewrite_code_line(&self, line: &str, lang: Option<&str>) -> String {
        let Some(marker) = lang.and_then(comment_marker) else {
            return line.to_string();
        };

        let Some(idx) = line.find(marker) else {
            return line.to_string();
        };

        // Only treat the marker as a comment opener at line start or after
        // whitespace; `https://` must not count.
        let at_boundary = line[..idx]
            .chars()
            .last()
            .is_none_or(char::is_whitespace);
        if !at_boundary {
            return line.to_string();
        }

        let split = idx + marker.len();
        format!("{}{}", &line[..split], self.apply_rules(&line[split..]))
    }

    /// Run the ordered rule table over a text fragment.
    fn apply_rules(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (re, replacement) in &self.rules {
            if re.is_match(&out) {
                out = re.replace_all(&out, replacement.as_str()).into_owned();
            }
        }
        out
    }
}

/// Line comment marker for a fence language tag.
///
/// The list is a fixed allowlist: fences in any other language are left
/// entirely untouched.
fn comment_marker(lang: &str) -> Option<&'static str> {
    match lang {
        "c" | "cpp" | "cc" | "c++" | "rust" | "zig" | "js" | "javascript" | "ts"
        | "typescript" => Some("//"),
        "bash" | "sh" | "zsh" | "fish" | "toml" | "yaml" | "yml" => Some("#"),
        _ => None,
    }
}

/// Build `^(?:a|b|c)<suffix>`-style regexes from literal alternatives.
fn alternation(parts: &[String], prefix: &str, suffix: &str) -> Result<Regex> {
    let escaped = parts
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    // An empty alternative set must never match.
    let pattern = if parts.is_empty() {
        r"^\z.".to_string()
    } else {
        format!("{prefix}{escaped}{suffix}")
    };
    compile_insensitive(&pattern)
}

fn compile_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| DocsmithError::config(format!("invalid sanitize pattern `{pattern}`: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_shared::SanitizeConfig;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(&SanitizeConfig::default()).expect("default config compiles")
    }

    #[test]
    fn status_section_dropped_with_body() {
        let input = "# Getting Started\n\n## Status\n\nStatus: implemented\n\n## Usage\n\nRun the tool.\n";
        let output = sanitizer().sanitize(input);

        assert!(output.contains("# Getting Started"));
        assert!(output.contains("## Usage"));
        assert!(output.contains("Run the tool."));
        assert!(!output.contains("Status"));
        assert!(!output.contains("implemented"));
    }

    #[test]
    fn skip_region_bounded_by_shallower_heading() {
        let input = "## Status\n\ndropped\n\n### Detail\n\nalso dropped\n\n# Top\n\nkept\n";
        let output = sanitizer().sanitize(input);

        assert!(!output.contains("dropped"));
        assert!(!output.contains("Detail"));
        assert!(output.contains("# Top"));
        assert!(output.contains("kept"));
    }

    #[test]
    fn status_line_dropped_outside_code() {
        let input = "Intro text.\nStatus: in review\nMore text.\n";
        let output = sanitizer().sanitize(input);
        assert_eq!(output, "Intro text.\nMore text.\n");
    }

    #[test]
    fn internal_ref_dropped_in_prose_kept_in_code() {
        let input = "See PLAN.md for details.\n\n```bash\ncat PLAN.md\n```\n";
        let output = sanitizer().sanitize(input);

        assert!(!output.contains("See PLAN.md"));
        assert!(output.contains("cat PLAN.md"));
    }

    #[test]
    fn code_payload_never_rewritten() {
        let input = "```rust\nlet works_today = \"what works today\";\n```\n";
        let output = sanitizer().sanitize(input);
        // No comment marker on the line, so the matching phrase survives.
        assert!(output.contains("let works_today = \"what works today\";"));
    }

    #[test]
    fn code_comment_tail_rewritten() {
        let input = "```rust\nlet x = 1; // what works today\n```\n";
        let output = sanitizer().sanitize(input);
        assert!(output.contains("let x = 1; // supported behavior"));
    }

    #[test]
    fn url_in_code_is_not_a_comment() {
        let input = "```rust\nlet u = \"https://example.com/what works today\";\n```\n";
        let output = sanitizer().sanitize(input);
        assert!(output.contains("https://example.com/what works today"));
    }

    #[test]
    fn unknown_fence_language_untouched() {
        let input = "```brainfuck\n# what works today\n```\n";
        let output = sanitizer().sanitize(input);
        assert!(output.contains("# what works today"));
    }

    #[test]
    fn inline_code_span_untouched() {
        let input = "Prose about what works today and `what works today` in code.\n";
        let output = sanitizer().sanitize(input);
        assert_eq!(
            output,
            "Prose about supported behavior and `what works today` in code.\n"
        );
    }

    #[test]
    fn unterminated_fence_stays_open() {
        let input = "```js\nSee PLAN.md\nStatus: open\n";
        let output = sanitizer().sanitize(input);
        // Remainder treated as code: drop rules must not fire.
        assert!(output.contains("See PLAN.md"));
        assert!(output.contains("Status: open"));
    }

    #[test]
    fn fence_line_dropped_inside_skip_region() {
        let input = "## Status\n\n```sh\necho hidden\n```\n\n## Usage\nok\n";
        let output = sanitizer().sanitize(input);
        assert!(!output.contains("```"));
        assert!(!output.contains("echo hidden"));
        assert!(output.contains("## Usage"));
    }

    #[test]
    fn trailing_whitespace_trimmed_single_final_newline() {
        let input = "Line one   \nLine two\t\n\n\n";
        let output = sanitizer().sanitize(input);
        assert_eq!(output, "Line one\nLine two\n");
    }

    #[test]
    fn rule_table_order_is_respected() {
        // `works today:` must win over the bare `works today` rule.
        let input = "Works today: call run().\n";
        let output = sanitizer().sanitize(input);
        assert_eq!(output, "Example: call run().\n");
    }

    #[test]
    fn empty_rule_tables_accepted() {
        let config = SanitizeConfig {
            exclude_basenames: vec![],
            status_headings: vec![],
            status_line_prefixes: vec![],
            internal_refs: vec![],
            rules: vec![],
        };
        let sanitizer = Sanitizer::new(&config).expect("compiles");
        let output = sanitizer.sanitize("Status: kept now\n# Status\nbody\n");
        assert!(output.contains("Status: kept now"));
        assert!(output.contains("body"));
    }
}
