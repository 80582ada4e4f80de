//! Whitespace normalization and section splitting.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Heading fragments that mark a section as method-relevant.
const METHOD_VOCABULARY: &[&str] = &[
    "method",
    "materials",
    "statistical analys",
    "statistics",
    "data analys",
    "data processing",
    "computational",
    "experimental procedure",
    "experimental design",
    "study design",
    "pipeline",
    "bioinformatic",
    "machine learning",
    "model training",
    "software",
    "code availability",
    "data availability",
    "implementation",
];

/// Common section names recognized even without numbering or markdown.
const KNOWN_HEADINGS: &[&str] = &[
    "abstract",
    "background",
    "introduction",
    "results",
    "discussion",
    "conclusion",
    "conclusions",
    "references",
    "acknowledgements",
    "acknowledgments",
    "supplementary information",
    "funding",
    "author contributions",
];

/// A titled run of text. The preamble before any heading has an empty heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

impl Section {
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.body
            .split("\n\n")
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
    }
}

/// Clean up extraction artifacts without changing the words.
///
/// Unifies line endings, re-joins lowercase words hyphenated across a line
/// break, drops control and zero-width characters, collapses runs of
/// spaces/tabs, trims line ends and collapses 3+ newlines to one blank line.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let unified = hyphen_break_re().replace_all(&unified, "$1$2");

    let lines: Vec<String> = unified
        .lines()
        .map(|line| {
            line.chars()
                .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}'))
                .map(|c| if c == '\t' || c == '\u{A0}' { ' ' } else { c })
                .filter(|c| !c.is_control())
                .collect::<String>()
                .split(' ')
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        blank_run = 0;
        out.push_str(&line);
    }
    out
}

/// Whether a heading names a section worth mining for methods.
pub fn is_method_heading(heading: &str) -> bool {
    let lower = heading.to_lowercase();
    METHOD_VOCABULARY.iter().any(|v| lower.contains(v))
}

fn hyphen_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\p{Ll})-[ \t]*\n[ \t]*(\p{Ll})").expect("hyphen break regex is valid")
    })
}

fn numbered_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\d+(?:\.\d+)*\.?|[IVX]+\.)\s+(\p{Lu}[^.!?]{0,78})$")
            .expect("numbered heading regex is valid")
    })
}

/// Recognize a heading line, returning the heading text.
fn heading_of(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with('#') {
        let text = trimmed.trim_start_matches('#').trim();
        return (!text.is_empty()).then(|| text.to_string());
    }

    if let Some(cap) = numbered_heading_re().captures(trimmed) {
        let text = cap[1].trim();
        if text.split_whitespace().count() <= 10 {
            return Some(text.to_string());
        }
    }

    let bare = trimmed.trim_end_matches(':').trim();
    let words = bare.split_whitespace().count();
    if words == 0 || bare.ends_with(['.', '!', '?', ',', ';']) {
        return None;
    }

    let letters: Vec<char> = bare.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 3 && words <= 8 && letters.iter().all(|c| c.is_uppercase()) {
        return Some(bare.to_string());
    }

    let starts_upper = bare.chars().next().is_some_and(|c| c.is_uppercase());
    let lower = bare.to_lowercase();
    if starts_upper
        && words <= 5
        && (KNOWN_HEADINGS.contains(&lower.as_str()) || is_method_heading(&lower))
    {
        return Some(bare.to_string());
    }

    None
}

/// Split normalized text into sections in document order.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading = String::new();
    let mut body = String::new();

    for line in text.lines() {
        if let Some(next) = heading_of(line) {
            if !body.trim().is_empty() || !heading.is_empty() {
                sections.push(Section {
                    heading: std::mem::take(&mut heading),
                    body: body.trim().to_string(),
                });
            }
            heading = next;
            body.clear();
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    if !body.trim().is_empty() || !heading.is_empty() {
        sections.push(Section {
            heading,
            body: body.trim().to_string(),
        });
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        let raw = "Line  one\t here \r\n\r\n\r\n\r\nLine two\u{200B}\rLine three";
        assert_eq!(normalize_text(raw), "Line one here\n\nLine two\nLine three");
    }

    #[test]
    fn test_normalize_rejoins_hyphenated_words() {
        assert_eq!(
            normalize_text("a random for-\nest classifier"),
            "a random forest classifier"
        );
        // capitalized continuation is left alone
        assert_eq!(normalize_text("RNA-\nSeq"), "RNA-\nSeq");
    }

    #[test]
    fn test_heading_forms() {
        assert_eq!(heading_of("## Methods"), Some("Methods".to_string()));
        assert_eq!(
            heading_of("2.3 Statistical analysis"),
            Some("Statistical analysis".to_string())
        );
        assert_eq!(
            heading_of("MATERIALS AND METHODS"),
            Some("MATERIALS AND METHODS".to_string())
        );
        assert_eq!(heading_of("Results:"), Some("Results".to_string()));
        assert_eq!(heading_of("We used 100 trees."), None);
        assert_eq!(heading_of("Statistical analysis was performed using R"), None);
        assert_eq!(heading_of("10 mg of compound was added."), None);
    }

    #[test]
    fn test_split_sections_keeps_order() {
        let text = "Preamble text\n\nIntroduction\nWhy we care.\n\n2. Methods\nWe used R.\n\nResults\nIt worked.";
        let sections = split_sections(text);
        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["", "Introduction", "Methods", "Results"]);
        assert_eq!(sections[2].body, "We used R.");
    }

    #[test]
    fn test_method_heading_vocabulary() {
        assert!(is_method_heading("Materials and Methods"));
        assert!(is_method_heading("Statistical Analysis"));
        assert!(is_method_heading("Code availability"));
        assert!(!is_method_heading("Discussion"));
    }
}
