//! Document assembly
//!
//! Joins accepted sections into the flat markdown document. The display form
//! keeps the `<br>` item separators; the storage form drops them. Stripping
//! the markers from the display form always reproduces the storage form.

use super::validator::BREAK_MARKER;
use sdk::types::{SectionEntry, SectionKind};

const SECTION_SEPARATOR: &str = "\n\n";

fn render_with<F>(sections: &[SectionEntry], body: F) -> String
where
    F: Fn(&str) -> String,
{
    sections
        .iter()
        .filter(|entry| entry.kind.in_document())
        .map(|entry| match entry.kind.heading() {
            Some(heading) => format!("## {}\n{}", heading, body(&entry.text)),
            None => body(&entry.text),
        })
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

/// Remove break markers
pub fn strip_breaks(text: &str) -> String {
    text.replace(BREAK_MARKER, "")
}

/// Document with break markers kept
pub fn render_display(sections: &[SectionEntry]) -> String {
    render_with(sections, str::to_string)
}

/// Plain document as persisted
pub fn render_storage(sections: &[SectionEntry]) -> String {
    render_with(sections, strip_breaks)
}

/// Whitespace-separated words, headers included
pub fn word_count(document: &str) -> usize {
    document.split_whitespace().count()
}

/// The accepted app name, rendered as the document title
pub fn title(sections: &[SectionEntry]) -> Option<&str> {
    sections
        .iter()
        .find(|entry| entry.kind == SectionKind::AppName)
        .map(|entry| entry.text.as_str())
}
