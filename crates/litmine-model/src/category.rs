//! Method categories and their normalization from model text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse family a computational method belongs to.
///
/// Ordering is the declaration order and is used for deterministic sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodCategory {
    Statistical,
    MachineLearning,
    Bioinformatics,
    Other,
}

impl MethodCategory {
    pub const ALL: [MethodCategory; 4] = [
        MethodCategory::Statistical,
        MethodCategory::MachineLearning,
        MethodCategory::Bioinformatics,
        MethodCategory::Other,
    ];

    /// Interpret a category label as written by a model or a human.
    ///
    /// Unrecognized labels map to [`MethodCategory::Other`]; the template
    /// registry's generic fallback covers that case.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let joined = words.join(" ");

        let has_word = |w: &str| words.iter().any(|x| *x == w);

        if joined.contains("machine learning")
            || joined.contains("deep learning")
            || has_word("ml")
            || has_word("ai")
            || joined.contains("neural")
            || joined.contains("classif")
            || joined.contains("clustering")
        {
            return MethodCategory::MachineLearning;
        }

        if joined.contains("bioinformatic")
            || joined.contains("genom")
            || joined.contains("sequenc")
            || joined.contains("transcriptom")
            || joined.contains("proteom")
            || joined.contains("phylogen")
            || joined.contains("omics")
        {
            return MethodCategory::Bioinformatics;
        }

        if joined.contains("statistic")
            || joined.contains("data analysis")
            || joined.contains("biostat")
            || joined.contains("regression")
            || joined.contains("hypothesis")
        {
            return MethodCategory::Statistical;
        }

        MethodCategory::Other
    }

    /// Stable snake_case label, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodCategory::Statistical => "statistical",
            MethodCategory::MachineLearning => "machine_learning",
            MethodCategory::Bioinformatics => "bioinformatics",
            MethodCategory::Other => "other",
        }
    }

    /// Short prefix used in method ids.
    pub fn slug(&self) -> &'static str {
        match self {
            MethodCategory::Statistical => "stat",
            MethodCategory::MachineLearning => "ml",
            MethodCategory::Bioinformatics => "bio",
            MethodCategory::Other => "other",
        }
    }

    /// Nearest related category, consulted when no template exists for `self`.
    pub fn related(&self) -> Option<MethodCategory> {
        match self {
            MethodCategory::Statistical => Some(MethodCategory::MachineLearning),
            MethodCategory::MachineLearning => Some(MethodCategory::Statistical),
            MethodCategory::Bioinformatics => Some(MethodCategory::Statistical),
            MethodCategory::Other => None,
        }
    }
}

impl fmt::Display for MethodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_spellings() {
        assert_eq!(
            MethodCategory::parse("machine_learning"),
            MethodCategory::MachineLearning
        );
        assert_eq!(
            MethodCategory::parse("Machine-Learning"),
            MethodCategory::MachineLearning
        );
        assert_eq!(MethodCategory::parse("ML"), MethodCategory::MachineLearning);
        assert_eq!(
            MethodCategory::parse("statistical_analysis"),
            MethodCategory::Statistical
        );
        assert_eq!(
            MethodCategory::parse("data_analysis"),
            MethodCategory::Statistical
        );
        assert_eq!(
            MethodCategory::parse("Bioinformatics"),
            MethodCategory::Bioinformatics
        );
        assert_eq!(
            MethodCategory::parse("genomics pipeline"),
            MethodCategory::Bioinformatics
        );
    }

    #[test]
    fn test_unknown_labels_are_other() {
        assert_eq!(MethodCategory::parse("image_analysis"), MethodCategory::Other);
        assert_eq!(MethodCategory::parse(""), MethodCategory::Other);
        // "ml" only counts as a whole word
        assert_eq!(MethodCategory::parse("html scraping"), MethodCategory::Other);
    }

    #[test]
    fn test_serde_matches_as_str() {
        for category in MethodCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_related_never_self() {
        for category in MethodCategory::ALL {
            assert_ne!(category.related(), Some(category));
        }
    }
}
