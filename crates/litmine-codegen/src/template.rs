//! Code templates: typed placeholders and the `{{ }}` token grammar.
//!
//! A body is plain source text with two kinds of token:
//! - `{{name}}`: a placeholder, replaced by a rendered literal or context text
//! - `{{> name}}`: a shared fragment, expanded before placeholders are bound

use litmine_model::{MethodCategory, ParamValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholders every template may use without declaring them.
///
/// Their values come from the method record and the paper rather than from
/// extracted parameters.
pub const CONTEXT_PLACEHOLDERS: &[&str] = &[
    "paper_title",
    "method_name",
    "method_description",
    "datasets",
    "tools",
    "parameters",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    R,
}

impl Language {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "python" | "py" | "python3" => Some(Language::Python),
            "r" => Some(Language::R),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::R => "r",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::R => "R",
        }
    }

    pub fn null_literal(&self) -> &'static str {
        match self {
            Language::Python => "None",
            Language::R => "NULL",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape a placeholder value is coerced into before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    Text,
    Integer,
    Float,
    Bool,
    TextList,
    NumberList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub name: String,
    pub kind: PlaceholderKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<ParamValue>,
    /// Other parameter spellings papers use for the same setting.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Placeholder {
    pub fn required(name: &str, kind: PlaceholderKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            default: None,
            aliases: Vec::new(),
        }
    }

    pub fn optional(name: &str, kind: PlaceholderKind, default: Option<ParamValue>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            default,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Declared name followed by aliases.
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// A parametrized analysis skeleton for one method family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeTemplate {
    pub id: String,
    pub category: MethodCategory,
    pub language: Language,
    pub description: String,
    pub placeholders: Vec<Placeholder>,
    /// Packages the body itself imports.
    pub dependencies: Vec<String>,
    /// Words in a method's name or description that favour this template.
    pub keywords: Vec<String>,
    /// Run instructions; `{script}` is replaced by the output file name.
    pub usage: String,
    /// Generic template used when no category-specific one applies.
    #[serde(default)]
    pub fallback: bool,
    pub body: String,
}

impl CodeTemplate {
    pub fn placeholder(&self, name: &str) -> Option<&Placeholder> {
        self.placeholders.iter().find(|p| p.name == name)
    }

    /// Fragment names referenced by the body, in order of first use.
    pub fn fragment_refs(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        if let Ok(segments) = segments(&self.body) {
            for segment in segments {
                if let Segment::Fragment(name) = segment {
                    if !out.iter().any(|n| n == name) {
                        out.push(name.to_string());
                    }
                }
            }
        }
        out
    }
}

/// A piece of a template body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
    Fragment(&'a str),
}

/// Split a body into text and tokens.
///
/// `Err` carries the byte offset of a `{{` with no closing `}}`.
pub(crate) fn segments(body: &str) -> Result<Vec<Segment<'_>>, usize> {
    let mut out = Vec::new();
    let mut rest = body;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            out.push(Segment::Text(&rest[..open]));
        }
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or(offset + open)?;
        let inner = after[..close].trim();
        match inner.strip_prefix('>') {
            Some(name) => out.push(Segment::Fragment(name.trim())),
            None => out.push(Segment::Placeholder(inner)),
        }
        let consumed = open + 2 + close + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }
    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    Ok(out)
}

/// Whether `name` is a well-formed placeholder or fragment identifier.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        let segs = segments("{{> header}}\nALPHA = {{ alpha }}\n").unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Fragment("header"),
                Segment::Text("\nALPHA = "),
                Segment::Placeholder("alpha"),
                Segment::Text("\n"),
            ]
        );
    }

    #[test]
    fn test_unclosed_token() {
        assert_eq!(segments("x = 1\ny = {{alpha\n"), Err(10));
    }

    #[test]
    fn test_plain_braces_are_text() {
        let segs = segments("d = {'a': 1}\nfunction(x) { x }\n").unwrap();
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("n_estimators"));
        assert!(is_identifier("alpha2"));
        assert!(!is_identifier("N"));
        assert!(!is_identifier("2alpha"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("Python3"), Some(Language::Python));
        assert_eq!(Language::parse("R"), Some(Language::R));
        assert_eq!(Language::parse("julia"), None);
        assert_eq!(Language::R.extension(), "R");
    }
}
