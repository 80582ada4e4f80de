//! Paper metadata as handed over by the acquisition collaborator.

use serde::{Deserialize, Serialize};

/// Full text shorter than this many characters counts as partial.
pub const PARTIAL_TEXT_THRESHOLD: usize = 3_000;

/// How much of the paper's text is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCompleteness {
    Full,
    Partial,
    AbstractOnly,
}

impl TextCompleteness {
    /// Multiplier applied to extraction confidence for this much source text.
    pub fn confidence_factor(&self) -> f64 {
        match self {
            TextCompleteness::Full => 1.0,
            TextCompleteness::Partial => 0.85,
            TextCompleteness::AbstractOnly => 0.7,
        }
    }

    pub fn is_reduced(&self) -> bool {
        !matches!(self, TextCompleteness::Full)
    }
}

/// Bibliographic record plus text of one paper. Built once, then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    /// May be empty when only the abstract could be acquired.
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub pubmed_id: Option<String>,
}

impl PaperMetadata {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            abstract_text: String::new(),
            full_text: String::new(),
            journal: None,
            year: None,
            doi: None,
            pubmed_id: None,
        }
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = text.into();
        self
    }

    pub fn with_full_text(mut self, text: impl Into<String>) -> Self {
        self.full_text = text.into();
        self
    }

    pub fn with_journal(mut self, journal: impl Into<String>, year: Option<String>) -> Self {
        self.journal = Some(journal.into());
        self.year = year;
        self
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_pubmed_id(mut self, pmid: impl Into<String>) -> Self {
        self.pubmed_id = Some(pmid.into());
        self
    }

    pub fn completeness(&self) -> TextCompleteness {
        let chars = self.full_text.trim().chars().count();
        if chars == 0 {
            TextCompleteness::AbstractOnly
        } else if chars < PARTIAL_TEXT_THRESHOLD {
            TextCompleteness::Partial
        } else {
            TextCompleteness::Full
        }
    }

    /// True when neither abstract nor body carries any text.
    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty() && self.abstract_text.trim().is_empty()
    }
}
