//! Heading outline extraction: Markdown text → ordered table of contents.
//!
//! A heading is a line whose trimmed form starts with a run of `#` markers,
//! then at least one whitespace character, then some non-whitespace text.
//! The level is the length of the marker run; it is not capped at six.
//! Everything else, including `#` characters in the middle of a line or a
//! marker run with nothing after it, is ignored.
//!
//! Extraction is a single pass over the lines with no state carried between
//! them, so it cannot fail and always yields entries in document order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Title rendered above the bulleted list in the TOC artifact.
pub const TOC_TITLE: &str = "# Table of Contents";

/// Indentation added per level below 1 when rendering.
const INDENT_UNIT: &str = "  ";

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#+)\s+(.+)$").unwrap());

/// One heading found in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    level: usize,
    title: String,
    line: usize,
}

impl HeadingEntry {
    /// Number of leading `#` markers, always ≥ 1.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Heading text with surrounding whitespace removed; never empty.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 1-based line number in the source text.
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Ordered sequence of headings produced by [`extract_outline`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outline {
    entries: Vec<HeadingEntry>,
}

impl Outline {
    pub fn entries(&self) -> &[HeadingEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeadingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deepest heading level present, or 0 for an empty outline.
    pub fn max_depth(&self) -> usize {
        self.entries.iter().map(|e| e.level).max().unwrap_or(0)
    }

    /// Nested bulleted list, one line per entry, no title block.
    pub fn to_markdown_list(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&render_entry(entry));
            out.push('\n');
        }
        out
    }

    /// The full TOC artifact: [`TOC_TITLE`], a blank line, then the list.
    pub fn render(&self) -> String {
        format!("{TOC_TITLE}\n\n{}", self.to_markdown_list())
    }
}

impl<'a> IntoIterator for &'a Outline {
    type Item = &'a HeadingEntry;
    type IntoIter = std::slice::Iter<'a, HeadingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Scan `markdown` and return every heading line in order of appearance.
pub fn extract_outline(markdown: &str) -> Outline {
    let entries = markdown
        .split('\n')
        .enumerate()
        .filter_map(|(i, line)| parse_heading(line).map(|(level, title)| HeadingEntry {
            level,
            title: title.to_string(),
            line: i + 1,
        }))
        .collect();
    Outline { entries }
}

/// `Some((level, title))` when `line` is a heading.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let caps = RE_HEADING.captures(line.trim())?;
    let level = caps.get(1)?.as_str().len();
    let title = caps.get(2)?.as_str().trim();
    (!title.is_empty()).then_some((level, title))
}

/// One bullet line: two spaces per level below 1, then `- title`.
pub fn render_entry(entry: &HeadingEntry) -> String {
    format!(
        "{}- {}",
        INDENT_UNIT.repeat(entry.level.saturating_sub(1)),
        entry.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(outline: &Outline) -> Vec<(usize, &str)> {
        outline.iter().map(|e| (e.level(), e.title())).collect()
    }

    #[test]
    fn no_headings_yields_empty() {
        assert!(extract_outline("").is_empty());
        assert!(extract_outline("plain text\n\nmore text\n").is_empty());
    }

    #[test]
    fn nested_levels_in_order() {
        let outline = extract_outline("# Title\n## Sub\ntext\n### Deep");
        assert_eq!(pairs(&outline), vec![(1, "Title"), (2, "Sub"), (3, "Deep")]);
    }

    #[test]
    fn bare_markers_produce_nothing() {
        assert!(extract_outline("###").is_empty());
        assert!(extract_outline("### ").is_empty());
        assert!(extract_outline("#   \t").is_empty());
    }

    #[test]
    fn mid_line_marker_is_not_heading() {
        assert!(extract_outline("text # not a heading").is_empty());
    }

    #[test]
    fn marker_without_space_is_not_heading() {
        assert!(extract_outline("#NoSpace\n##also-not").is_empty());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let outline = extract_outline("   ## Indented Title   \r\n");
        assert_eq!(pairs(&outline), vec![(2, "Indented Title")]);
    }

    #[test]
    fn title_keeps_inner_markers_and_case() {
        let outline = extract_outline("## C# and F# Notes");
        assert_eq!(pairs(&outline), vec![(2, "C# and F# Notes")]);
    }

    #[test]
    fn levels_beyond_six_are_kept() {
        let outline = extract_outline("######## Eight");
        assert_eq!(pairs(&outline), vec![(8, "Eight")]);
    }

    #[test]
    fn duplicates_are_not_removed() {
        let outline = extract_outline("# Intro\n# Intro");
        assert_eq!(outline.len(), 2);
    }

    #[test]
    fn line_numbers_are_one_based() {
        let outline = extract_outline("intro\n\n# First\ntext\n## Second");
        let lines: Vec<usize> = outline.iter().map(|e| e.line()).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn end_to_end_document() {
        let md = "# Intro\nSome text\n## Background\nMore text\n# Methods\n## Data\n## Analysis";
        let outline = extract_outline(md);
        let levels: Vec<usize> = outline.iter().map(|e| e.level()).collect();
        let titles: Vec<&str> = outline.iter().map(|e| e.title()).collect();
        assert_eq!(levels, vec![1, 2, 1, 2, 2]);
        assert_eq!(titles, vec!["Intro", "Background", "Methods", "Data", "Analysis"]);
        assert_eq!(outline.max_depth(), 2);
    }

    #[test]
    fn extraction_is_idempotent() {
        let md = "# A\nx\n## B\n### C";
        assert_eq!(extract_outline(md), extract_outline(md));
    }

    #[test]
    fn moving_body_lines_keeps_headings() {
        let a = extract_outline("# A\nbody one\n## B\nbody two\n");
        let b = extract_outline("body two\n# A\n## B\nbody one\n\n");
        assert_eq!(pairs(&a), pairs(&b));
    }

    #[test]
    fn render_indents_two_spaces_per_level() {
        let outline = extract_outline("# Intro\n## Background\n### Detail\n# Methods");
        assert_eq!(
            outline.render(),
            "# Table of Contents\n\n- Intro\n  - Background\n    - Detail\n- Methods\n"
        );
    }

    #[test]
    fn render_empty_outline_keeps_title() {
        assert_eq!(Outline::default().render(), "# Table of Contents\n\n");
    }

    #[test]
    fn serialises_as_array() {
        let outline = extract_outline("# One");
        let json = serde_json::to_value(&outline).unwrap();
        assert_eq!(json[0]["level"], 1);
        assert_eq!(json[0]["title"], "One");
        assert_eq!(json[0]["line"], 1);
    }
}
