//! Property-based tests for extraction
//!
//! 1. Merging is order-stable and idempotent for unambiguous names
//! 2. Merged confidence is the maximum of the group
//! 3. Extraction output does not depend on the concurrency limit

use litmine_ingest::{PaperMetadata, Passage};
use litmine_llm::extraction::{merge_methods, DEFAULT_MERGE_SIMILARITY};
use litmine_llm::*;
use litmine_model::{normalize_name, ExtractedMethod, MethodCategory};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

// ============================================================================
// Strategies
// ============================================================================

const NAMES: &[(&str, MethodCategory)] = &[
    ("Random forest", MethodCategory::MachineLearning),
    ("Logistic regression", MethodCategory::Statistical),
    ("Kaplan Meier estimator", MethodCategory::Statistical),
    ("Gene set enrichment", MethodCategory::Bioinformatics),
    ("Hierarchical clustering", MethodCategory::MachineLearning),
];

fn method_strategy() -> impl Strategy<Value = ExtractedMethod> {
    (0..NAMES.len(), any::<bool>(), 0.0f64..=1.0, 0usize..8).prop_map(
        |(i, upper, confidence, passage)| {
            let (name, category) = NAMES[i];
            let spelled = if upper {
                name.to_uppercase()
            } else {
                name.to_string()
            };
            let mut m = ExtractedMethod::new(category, spelled);
            m.confidence = confidence;
            m.source_passages = vec![passage];
            m
        },
    )
}

proptest! {
    #[test]
    fn prop_merge_groups_by_normalized_name(records in prop::collection::vec(method_strategy(), 0..30)) {
        let distinct: BTreeSet<String> = records.iter().map(|m| normalize_name(&m.name)).collect();
        let merged = merge_methods(records.clone(), DEFAULT_MERGE_SIMILARITY);
        prop_assert_eq!(merged.len(), distinct.len());

        for m in &merged {
            let key = normalize_name(&m.name);
            let group: Vec<&ExtractedMethod> = records
                .iter()
                .filter(|r| normalize_name(&r.name) == key)
                .collect();
            let best = group.iter().map(|r| r.confidence).fold(0.0f64, f64::max);
            prop_assert!((m.confidence - best).abs() < 1e-12);

            let passages: BTreeSet<usize> =
                group.iter().flat_map(|r| r.source_passages.iter().copied()).collect();
            prop_assert_eq!(m.source_passages.clone(), passages.into_iter().collect::<Vec<_>>());
        }
    }

    #[test]
    fn prop_merge_is_idempotent(records in prop::collection::vec(method_strategy(), 0..30)) {
        let once = merge_methods(records, DEFAULT_MERGE_SIMILARITY);
        let twice = merge_methods(once.clone(), DEFAULT_MERGE_SIMILARITY);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_merge_keeps_first_appearance_order(records in prop::collection::vec(method_strategy(), 1..30)) {
        let mut first_seen: Vec<String> = Vec::new();
        for r in &records {
            let key = normalize_name(&r.name);
            if !first_seen.contains(&key) {
                first_seen.push(key);
            }
        }
        let merged = merge_methods(records, DEFAULT_MERGE_SIMILARITY);
        let order: Vec<String> = merged.iter().map(|m| normalize_name(&m.name)).collect();
        prop_assert_eq!(order, first_seen);
    }
}

// ============================================================================
// Concurrency
// ============================================================================

fn scripted_provider() -> Arc<MockProvider> {
    Arc::new(MockProvider::with_handler(|request, _| {
        let prompt = request.last_user_message();
        let (name, category) = NAMES
            .iter()
            .enumerate()
            .find(|(i, _)| prompt.contains(&format!("Passage {} of", i + 1)))
            .map(|(_, entry)| *entry)
            .unwrap_or(NAMES[0]);
        Ok(json!({
            "computational_methods": [{
                "name": name,
                "category": category.as_str(),
                "tools": ["R"],
                "confidence": 0.7
            }]
        })
        .to_string())
    }))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_report_independent_of_concurrency(limit in 1usize..8, n in 1usize..6) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let paper = PaperMetadata::new("p", "Concurrency").with_abstract("abstract");
        let passages: Vec<Passage> = (0..n)
            .map(|index| Passage {
                paper_id: "p".to_string(),
                index,
                sections: vec![],
                text: format!("text {index}"),
            })
            .collect();

        let serial = ExtractorConfig { max_concurrent_passages: 1, ..ExtractorConfig::default() };
        let parallel = ExtractorConfig { max_concurrent_passages: limit, ..ExtractorConfig::default() };

        let a = runtime.block_on(
            MethodExtractor::new(scripted_provider(), serial).extract_passages(&paper, passages.clone()),
        );
        let b = runtime.block_on(
            MethodExtractor::new(scripted_provider(), parallel).extract_passages(&paper, passages),
        );
        prop_assert_eq!(a.methods.len(), n);
        prop_assert_eq!(a, b);
    }
}
