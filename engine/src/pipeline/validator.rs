//! Section validation
//!
//! Pure functions that turn raw provider output into an accepted section
//! value or a rejection. Three stages, each testable on its own:
//! `normalize` strips list markers and other noise, `contains_denylisted`
//! spots conversational leakage, and `validate` applies a `SectionRule`.

use sdk::types::SectionRule;
use std::fmt;

/// Tokens that betray a conversational exchange or a code block
pub const DENYLIST: [&str; 5] = ["You:", "AI:", "User:", "LLM", "```"];

/// Prefix of every accepted list item
pub const BULLET: &str = "- ";

/// Separator between list items in the display form
pub const ITEM_SEPARATOR: &str = "<br>\n";

/// Line-break marker stripped from the storage form
pub const BREAK_MARKER: &str = "<br>";

fn is_noise(c: char) -> bool {
    matches!(c, '-' | '*' | '[' | ']' | '.' | '`' | '"' | '\'')
        || c.is_ascii_digit()
        || c.is_whitespace()
}

/// Strip leading and trailing noise (list markers, numbering, quotes, whitespace)
pub fn normalize(text: &str) -> &str {
    text.trim_matches(is_noise)
}

/// First denylisted token found in `text`, if any
pub fn contains_denylisted(text: &str) -> Option<&'static str> {
    DENYLIST.iter().copied().find(|token| text.contains(token))
}

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    Denylisted(&'static str),
    ItemCount { found: usize, min: usize, max: usize },
    WordCount { found: usize, min: usize, max: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty after cleaning"),
            Rejection::Denylisted(token) => write!(f, "contains denylisted token {:?}", token),
            Rejection::ItemCount { found, min, max } => {
                write!(f, "{} items, expected {}-{}", found, min, max)
            }
            Rejection::WordCount { found, min, max } => {
                write!(f, "{} words, expected {}-{}", found, min, max)
            }
        }
    }
}

/// Outcome of validating one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(String),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Apply a section rule to raw provider output
pub fn validate(raw: &str, rule: SectionRule) -> Verdict {
    match rule {
        SectionRule::FreeForm => validate_free_form(raw),
        SectionRule::List {
            min_items,
            max_items,
        } => validate_list(raw, min_items, max_items),
        SectionRule::ShortName {
            min_words,
            max_words,
        } => validate_short_name(raw, min_words, max_words),
    }
}

fn validate_free_form(raw: &str) -> Verdict {
    let cleaned = normalize(raw);
    if cleaned.is_empty() {
        return Verdict::Rejected(Rejection::Empty);
    }
    if let Some(token) = contains_denylisted(cleaned) {
        return Verdict::Rejected(Rejection::Denylisted(token));
    }
    Verdict::Accepted(cleaned.to_string())
}

fn validate_list(raw: &str, min: usize, max: usize) -> Verdict {
    let items: Vec<String> = raw
        .lines()
        .map(normalize)
        .filter(|line| !line.is_empty())
        .filter(|line| contains_denylisted(line).is_none())
        .map(|line| format!("{}{}", BULLET, line))
        .collect();

    if items.len() < min || items.len() > max {
        return Verdict::Rejected(Rejection::ItemCount {
            found: items.len(),
            min,
            max,
        });
    }

    Verdict::Accepted(items.join(ITEM_SEPARATOR))
}

fn validate_short_name(raw: &str, min: usize, max: usize) -> Verdict {
    let first_line = raw.trim().lines().next().unwrap_or_default();
    let cleaned = normalize(first_line);

    let words = cleaned.split_whitespace().count();
    if words < min || words > max {
        return Verdict::Rejected(Rejection::WordCount {
            found: words,
            min,
            max,
        });
    }

    let name = cleaned
        .trim_matches(|c: char| matches!(c, '/' | '\'' | '"' | '-'))
        .trim();
    if name.is_empty() {
        return Verdict::Rejected(Rejection::Empty);
    }
    if let Some(token) = contains_denylisted(name) {
        return Verdict::Rejected(Rejection::Denylisted(token));
    }

    Verdict::Accepted(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_4_6: SectionRule = SectionRule::List {
        min_items: 4,
        max_items: 6,
    };
    const NAME: SectionRule = SectionRule::ShortName {
        min_words: 1,
        max_words: 5,
    };

    #[test]
    fn test_normalize_strips_markers() {
        assert_eq!(normalize("1. Be kind."), "Be kind");
        assert_eq!(normalize("- [x] `code`"), "x] `code");
        assert_eq!(normalize("  **Bold** \n"), "Bold");
        assert_eq!(normalize("\"Quoted\""), "Quoted");
        assert_eq!(normalize("'Single quoted'"), "Single quoted");
        assert_eq!(normalize("don't stop"), "don't stop");
        assert_eq!(normalize("-*-"), "");
    }

    #[test]
    fn test_denylist() {
        assert_eq!(contains_denylisted("AI: hello"), Some("AI:"));
        assert_eq!(contains_denylisted("an LLM wrote this"), Some("LLM"));
        assert_eq!(contains_denylisted("plain"), None);
    }

    #[test]
    fn test_free_form() {
        assert_eq!(
            validate("  You are a helpful cook.  ", SectionRule::FreeForm),
            Verdict::Accepted("You are a helpful cook".to_string())
        );
        assert_eq!(
            validate("- - -", SectionRule::FreeForm),
            Verdict::Rejected(Rejection::Empty)
        );
        assert_eq!(
            validate("User: make me an app", SectionRule::FreeForm),
            Verdict::Rejected(Rejection::Denylisted("User:"))
        );
    }

    #[test]
    fn test_single_quotes_are_stripped() {
        assert_eq!(
            validate("'You are a patient tutor.'", SectionRule::FreeForm),
            Verdict::Accepted("You are a patient tutor".to_string())
        );
        assert_eq!(
            validate("- 'one'\n- 'two'\n- 'three'\n- 'four'", LIST_4_6),
            Verdict::Accepted("- one<br>\n- two<br>\n- three<br>\n- four".to_string())
        );
    }

    #[test]
    fn test_list_accepts_within_range() {
        let raw = "1. First\n2. Second\n\n* Third\n- Fourth\n";
        assert_eq!(
            validate(raw, LIST_4_6),
            Verdict::Accepted("- First<br>\n- Second<br>\n- Third<br>\n- Fourth".to_string())
        );
    }

    #[test]
    fn test_list_rejects_out_of_range() {
        assert_eq!(
            validate("- one\n- two", LIST_4_6),
            Verdict::Rejected(Rejection::ItemCount {
                found: 2,
                min: 4,
                max: 6
            })
        );
        let seven = (1..=7).map(|i| format!("- item {}x", i)).collect::<Vec<_>>().join("\n");
        assert!(!validate(&seven, LIST_4_6).is_accepted());
    }

    #[test]
    fn test_list_drops_denylisted_items() {
        let raw = "- a\n- b\n- c\n- d\n- AI: e";
        match validate(raw, LIST_4_6) {
            Verdict::Accepted(text) => {
                assert_eq!(text.matches(BULLET).count(), 4);
                assert!(!text.contains("AI:"));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }

        // Dropping leaves too few items
        let raw = "- a\n- b\n- c\n```";
        assert!(!validate(raw, LIST_4_6).is_accepted());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(
            validate("\"Recipe Keeper\"\nSome explanation", NAME),
            Verdict::Accepted("Recipe Keeper".to_string())
        );
        assert_eq!(
            validate("'ChefMate'", NAME),
            Verdict::Accepted("ChefMate".to_string())
        );
        assert_eq!(
            validate("One two three four five six", NAME),
            Verdict::Rejected(Rejection::WordCount {
                found: 6,
                min: 1,
                max: 5
            })
        );
        assert!(!validate("   \n", NAME).is_accepted());
        assert!(!validate("/'/", NAME).is_accepted());
    }
}
