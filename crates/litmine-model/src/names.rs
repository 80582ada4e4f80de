//! Name normalization and fuzzy matching for method records.

use std::collections::HashMap;

/// Normalize a method name for comparison.
///
/// Lowercases, drops parenthetical asides such as abbreviations
/// (`"Random Forest (RF)"`), replaces punctuation with spaces and collapses
/// whitespace.
pub fn normalize_name(s: &str) -> String {
    let mut depth = 0usize;
    let mut kept = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => kept.push(c),
            _ => {}
        }
    }

    kept.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hyphenated slug of the normalized name.
pub fn slugify(s: &str) -> String {
    let normalized = normalize_name(s);
    if normalized.is_empty() {
        "unnamed".to_string()
    } else {
        normalized.replace(' ', "-")
    }
}

fn bigrams(s: &str) -> HashMap<(char, char), usize> {
    let compact: Vec<char> = normalize_name(s).chars().filter(|c| *c != ' ').collect();
    let mut counts = HashMap::new();
    for pair in compact.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

/// Sørensen–Dice coefficient over character bigrams of the normalized names.
///
/// Returns a value in `[0, 1]`; identical normalized names score `1.0`.
pub fn dice_similarity(a: &str, b: &str) -> f64 {
    let na = normalize_name(a);
    let nb = normalize_name(b);
    if na == nb {
        return 1.0;
    }

    let ba = bigrams(&na);
    let bb = bigrams(&nb);
    let total: usize = ba.values().sum::<usize>() + bb.values().sum::<usize>();
    if total == 0 {
        return 0.0;
    }

    let shared: usize = ba
        .iter()
        .map(|(gram, count)| (*count).min(bb.get(gram).copied().unwrap_or(0)))
        .sum();

    2.0 * shared as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_drops_abbreviations() {
        assert_eq!(normalize_name("Random Forest (RF)"), "random forest");
        assert_eq!(normalize_name("  t-test,  two-sided "), "t test two sided");
        assert_eq!(normalize_name("DESeq2 [v1.30]"), "deseq2");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Random Forest Classifier"), "random-forest-classifier");
        assert_eq!(slugify("(RF)"), "unnamed");
    }

    #[test]
    fn test_dice_identical_after_normalization() {
        assert_relative_eq!(dice_similarity("Random forest", "random-forest (RF)"), 1.0);
    }

    #[test]
    fn test_dice_near_duplicates_score_high() {
        let s = dice_similarity("random forest classifier", "random forests classifier");
        assert!(s >= 0.8, "got {s}");
    }

    #[test]
    fn test_dice_unrelated_score_low() {
        let s = dice_similarity("random forest", "student t test");
        assert!(s < 0.3, "got {s}");
    }

    #[test]
    fn test_dice_short_names() {
        assert_relative_eq!(dice_similarity("a", "b"), 0.0);
        assert_relative_eq!(dice_similarity("PCA", "pca"), 1.0);
    }
}
