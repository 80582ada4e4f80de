//! Paper ingestion boundary for litmine
//!
//! Takes text already acquired by a collaborator (PDF extraction, PubMed,
//! DOI lookup) and turns it into:
//! - a [`PaperMetadata`] record with a [`TextCompleteness`] classification
//! - method-relevant [`Passage`]s sized to a model's context budget
//!
//! Partial and abstract-only papers are accepted; downstream stages lower
//! their expected confidence instead of rejecting them.

use serde::{Deserialize, Serialize};

pub mod paper;
pub mod sections;
pub mod segment;

pub use paper::{PaperMetadata, TextCompleteness};
pub use sections::{is_method_heading, normalize_text, split_sections, Section};
pub use segment::{NormalizerConfig, Segmentation, TextNormalizer};

// ============================================================================
// Passage representation
// ============================================================================

/// A context-budget-sized slice of paper text submitted in one extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub paper_id: String,
    pub index: usize,
    /// Headings of the sections contributing to this passage, in order.
    pub sections: Vec<String>,
    pub text: String,
}

impl Passage {
    pub fn passage_id(&self) -> String {
        format!("{}_p{}", self.paper_id, self.index)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Caller-supplied hint naming a section worth extracting from.
///
/// Hints replace the built-in method-section vocabulary when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionHint(pub String);

impl SectionHint {
    pub fn new(heading: impl Into<String>) -> Self {
        Self(heading.into())
    }

    /// Case-insensitive containment in either direction.
    pub fn matches(&self, heading: &str) -> bool {
        let hint = self.0.trim().to_lowercase();
        let heading = heading.trim().to_lowercase();
        !hint.is_empty()
            && !heading.is_empty()
            && (heading.contains(&hint) || hint.contains(&heading))
    }
}
