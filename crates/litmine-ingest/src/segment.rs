//! Passage segmentation: method-relevant sections packed to a context budget.

use crate::paper::PaperMetadata;
use crate::sections::{is_method_heading, normalize_text, split_sections, Section};
use crate::{Passage, SectionHint};
use serde::{Deserialize, Serialize};

/// Sizing knobs for [`TextNormalizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Upper bound on a passage's length, in characters.
    pub max_passage_chars: usize,
    /// Passages past this count are dropped and counted in [`Segmentation::dropped`].
    pub max_passages: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_passage_chars: 12_000,
            max_passages: 32,
        }
    }
}

/// Result of segmenting one paper.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segmentation {
    pub passages: Vec<Passage>,
    /// Passages cut by `max_passages`; their text is never extracted.
    pub dropped: usize,
}

impl Segmentation {
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

/// Splits a paper into [`Passage`]s for extraction.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    config: NormalizerConfig,
}

struct Unit {
    heading: String,
    text: String,
}

impl TextNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Segment `paper` into passages.
    ///
    /// The abstract always opens passage 0. Body sections are kept when their
    /// heading matches a hint (or, without hints, the method vocabulary); if
    /// none match, the whole body is kept. Paragraphs are packed greedily up to
    /// `max_passage_chars`, splitting oversized ones at sentence boundaries and
    /// then at a hard character limit.
    pub fn segment(&self, paper: &PaperMetadata, hints: &[SectionHint]) -> Vec<Passage> {
        self.segmentation(paper, hints).passages
    }

    /// [`segment`](Self::segment), also reporting how many passages the
    /// `max_passages` limit cut.
    pub fn segmentation(&self, paper: &PaperMetadata, hints: &[SectionHint]) -> Segmentation {
        let budget = self.config.max_passage_chars.max(1);
        let abstract_text = normalize_text(&paper.abstract_text);
        let body = normalize_text(&paper.full_text);

        let mut units = Vec::new();
        if !abstract_text.is_empty() {
            for piece in split_oversized(&abstract_text, budget) {
                units.push(Unit {
                    heading: "Abstract".to_string(),
                    text: piece,
                });
            }
        }

        let sections = select_sections(split_sections(&body), hints, !abstract_text.is_empty());
        for section in &sections {
            for (i, paragraph) in section.paragraphs().enumerate() {
                let text = if i == 0 && !section.heading.is_empty() {
                    format!("{}\n{}", section.heading, paragraph)
                } else {
                    paragraph.to_string()
                };
                for piece in split_oversized(&text, budget) {
                    units.push(Unit {
                        heading: section.heading.clone(),
                        text: piece,
                    });
                }
            }
            if section.body.is_empty() && !section.heading.is_empty() {
                units.push(Unit {
                    heading: section.heading.clone(),
                    text: section.heading.clone(),
                });
            }
        }

        let mut passages = pack_units(&paper.id, units, budget);
        let dropped = passages.len().saturating_sub(self.config.max_passages);

        if dropped > 0 {
            tracing::warn!(
                paper = %paper.id,
                passages = passages.len(),
                limit = self.config.max_passages,
                "dropping passages past the configured limit"
            );
            passages.truncate(self.config.max_passages);
        }

        tracing::debug!(
            paper = %paper.id,
            sections = sections.len(),
            passages = passages.len(),
            completeness = ?paper.completeness(),
            "segmented paper"
        );

        Segmentation { passages, dropped }
    }
}

fn select_sections(sections: Vec<Section>, hints: &[SectionHint], has_abstract: bool) -> Vec<Section> {
    let relevant = |s: &Section| {
        if hints.is_empty() {
            is_method_heading(&s.heading)
        } else {
            hints.iter().any(|h| h.matches(&s.heading))
        }
    };

    if sections.iter().any(relevant) {
        return sections.into_iter().filter(relevant).collect();
    }

    // No relevant heading: keep everything except a duplicated abstract.
    sections
        .into_iter()
        .filter(|s| !(has_abstract && s.heading.eq_ignore_ascii_case("abstract")))
        .collect()
}

fn pack_units(paper_id: &str, units: Vec<Unit>, budget: usize) -> Vec<Passage> {
    let mut passages: Vec<Passage> = Vec::new();
    let mut text = String::new();
    let mut len = 0usize;
    let mut headings: Vec<String> = Vec::new();

    let flush = |passages: &mut Vec<Passage>, text: &mut String, headings: &mut Vec<String>| {
        if !text.is_empty() {
            passages.push(Passage {
                paper_id: paper_id.to_string(),
                index: passages.len(),
                sections: std::mem::take(headings),
                text: std::mem::take(text),
            });
        }
    };

    for unit in units {
        let unit_len = unit.text.chars().count();
        let sep = if text.is_empty() { 0 } else { 2 };
        if len + sep + unit_len > budget {
            flush(&mut passages, &mut text, &mut headings);
            len = 0;
        }
        if !text.is_empty() {
            text.push_str("\n\n");
            len += 2;
        }
        text.push_str(&unit.text);
        len += unit_len;
        if headings.last() != Some(&unit.heading) {
            headings.push(unit.heading);
        }
    }
    flush(&mut passages, &mut text, &mut headings);

    passages
}

/// Split text longer than `budget` chars at sentence ends, then hard.
fn split_oversized(text: &str, budget: usize) -> Vec<String> {
    if text.chars().count() <= budget {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut len = 0usize;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();
        if sentence_len > budget {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
                len = 0;
            }
            out.extend(hard_split(sentence, budget));
            continue;
        }
        let sep = if current.is_empty() { 0 } else { 1 };
        if len + sep + sentence_len > budget {
            out.push(std::mem::take(&mut current));
            len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            len += 1;
        }
        current.push_str(sentence);
        len += sentence_len;
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0;

    for (k, &(_, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '?' | '!') {
            continue;
        }
        if let Some(&(next_at, next)) = chars.get(k + 1) {
            if next.is_whitespace() {
                let sentence = text[start..next_at].trim();
                if !sentence.is_empty() {
                    out.push(sentence);
                }
                start = next_at;
            }
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        out.push(rest);
    }
    out
}

fn hard_split(text: &str, budget: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(budget)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper_with_body(body: &str) -> PaperMetadata {
        PaperMetadata::new("p1", "A study")
            .with_abstract("We study things with methods.")
            .with_full_text(body)
    }

    #[test]
    fn test_abstract_opens_first_passage() {
        let paper = paper_with_body("Methods\nWe trained a random forest.\n\nResults\nIt worked.");
        let passages = TextNormalizer::default().segment(&paper, &[]);
        assert_eq!(passages.len(), 1);
        assert!(passages[0].text.starts_with("We study things"));
        assert!(passages[0].text.contains("random forest"));
        assert!(!passages[0].text.contains("It worked"));
        assert_eq!(passages[0].sections, vec!["Abstract", "Methods"]);
    }

    #[test]
    fn test_whole_text_kept_without_method_sections() {
        let paper = paper_with_body("Introduction\nBackground.\n\nResults\nFindings.");
        let passages = TextNormalizer::default().segment(&paper, &[]);
        let all: String = passages.iter().map(|p| p.text.as_str()).collect();
        assert!(all.contains("Background."));
        assert!(all.contains("Findings."));
    }

    #[test]
    fn test_hints_replace_vocabulary() {
        let paper = paper_with_body("Methods\nMethod text.\n\nResults\nResult text.");
        let hints = vec![SectionHint::new("results")];
        let passages = TextNormalizer::default().segment(&paper, &hints);
        let all: String = passages.iter().map(|p| p.text.as_str()).collect();
        assert!(all.contains("Result text."));
        assert!(!all.contains("Method text."));
    }

    #[test]
    fn test_abstract_only_paper() {
        let paper = PaperMetadata::new("p2", "T").with_abstract("Only an abstract here.");
        let passages = TextNormalizer::default().segment(&paper, &[]);
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "Only an abstract here.");
        assert_eq!(passages[0].passage_id(), "p2_p0");
    }

    #[test]
    fn test_empty_paper_has_no_passages() {
        let paper = PaperMetadata::new("p3", "T");
        assert!(TextNormalizer::default().segment(&paper, &[]).is_empty());
    }

    #[test]
    fn test_budget_splits_sentences_then_hard() {
        let normalizer = TextNormalizer::new(NormalizerConfig {
            max_passage_chars: 20,
            max_passages: 100,
        });
        let paper = PaperMetadata::new("p4", "T")
            .with_abstract("First sentence. Second one here. Averyveryverylongwordwithoutbreaks.");
        let passages = normalizer.segment(&paper, &[]);
        assert!(passages.len() >= 3);
        for p in &passages {
            assert!(p.char_len() <= 20, "passage too long: {:?}", p.text);
        }
        for (i, p) in passages.iter().enumerate() {
            assert_eq!(p.index, i);
        }
    }

    #[test]
    fn test_passage_limit() {
        let normalizer = TextNormalizer::new(NormalizerConfig {
            max_passage_chars: 10,
            max_passages: 2,
        });
        let paper = PaperMetadata::new("p5", "T").with_abstract("a. b. c. d. e. f. g. h. i. j. k. l.");
        let segmentation = normalizer.segmentation(&paper, &[]);
        assert_eq!(segmentation.passages.len(), 2);
        assert!(segmentation.is_truncated());
        assert!(segmentation.dropped >= 1);
        assert_eq!(normalizer.segment(&paper, &[]), segmentation.passages);
    }

    #[test]
    fn test_untruncated_segmentation_drops_nothing() {
        let paper = paper_with_body("Methods
We trained a random forest.");
        let segmentation = TextNormalizer::default().segmentation(&paper, &[]);
        assert_eq!(segmentation.dropped, 0);
        assert!(!segmentation.is_truncated());
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("One. Two? Three! v1.2 stays"),
            vec!["One.", "Two?", "Three!", "v1.2 stays"]
        );
    }
}
