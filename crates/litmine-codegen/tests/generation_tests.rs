//! Generation tests over the built-in registry
//!
//! 1. No rendered script contains a template token, whatever the input text
//! 2. Dependencies are exactly template ∪ fragments ∪ tool packages
//! 3. Missing required values are reported, not guessed

use litmine_codegen::*;
use litmine_model::{ExtractedMethod, MethodCategory, ParamValue};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn method(category: MethodCategory, name: &str, tools: &[&str]) -> ExtractedMethod {
    let mut m = ExtractedMethod::new(category, name);
    m.tools = tools.iter().map(|t| t.to_string()).collect();
    m
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_random_forest_scenario() {
    let mut m = method(
        MethodCategory::MachineLearning,
        "random forest classifier",
        &["scikit-learn"],
    );
    m.parameters
        .insert("n_estimators".to_string(), ParamValue::Number(100.0));

    let scripts = CodeGenerator::default().generate(&[m], "Predicting outcomes with forests");
    assert_eq!(scripts.len(), 1);
    let script = &scripts[0];

    assert_eq!(script.template_id, "ml_random_forest");
    assert_eq!(script.bindings["n_estimators"], "100");
    assert!(script.code.contains("N_ESTIMATORS = 100"));
    assert!(script.dependencies.contains(&"scikit-learn".to_string()));
    assert!(script.code.contains("# Analysis skeleton reconstructed from: Predicting outcomes with forests"));
    assert!(script.usage.contains("ml_random_forest_classifier.py"));
    assert!(script.usage.starts_with("pip install"));
    assert!(script.is_complete());
}

#[test]
fn test_bioinformatics_related_and_r() {
    let mut de = method(
        MethodCategory::Bioinformatics,
        "Differential expression analysis",
        &["DESeq2"],
    );
    de.parameters
        .insert("design_factor".to_string(), ParamValue::Text("condition".to_string()));

    let python = CodeGenerator::default().generate_one(&de, "RNA study").unwrap();
    assert_eq!(python.template_id, "bio_differential_expression");
    assert_eq!(python.match_kind, MatchKind::Exact);
    assert!(python.dependencies.contains(&"pydeseq2".to_string()));
    assert_eq!(python.bindings["design_factor"], "\"condition\"");

    let r = CodeGenerator::new(
        TemplateRegistry::builtin(),
        GeneratorConfig {
            language: Language::R,
        },
    )
    .generate_one(&de, "RNA study")
    .unwrap();
    assert_eq!(r.template_id, "bio_differential_expression_r");
    assert!(r.dependencies.contains(&"DESeq2".to_string()));
    assert!(r.file_name.ends_with(".R"));
}

#[test]
fn test_dependency_union_is_exact() {
    let registry = TemplateRegistry::builtin();
    let generator = CodeGenerator::default();
    let m = method(
        MethodCategory::Statistical,
        "Pearson correlation",
        &["SciPy", "matplotlib", "SPSS"],
    );
    let script = generator.generate_one(&m, "T").unwrap();
    let template = registry.get(&script.template_id).unwrap();

    let mut expected: BTreeSet<String> = template.dependencies.iter().cloned().collect();
    for name in template.fragment_refs() {
        let fragment = registry.fragments().get(&name, template.language).unwrap();
        expected.extend(fragment.dependencies.iter().cloned());
    }
    expected.insert("scipy".to_string());
    expected.insert("matplotlib".to_string());

    assert_eq!(script.dependencies, expected.into_iter().collect::<Vec<_>>());
}

#[test]
fn test_missing_required_annotated() {
    let m = method(MethodCategory::Statistical, "Linear regression", &[]);
    let script = CodeGenerator::default().generate_one(&m, "T").unwrap();
    assert_eq!(script.template_id, "stat_regression");
    assert_eq!(script.status, ScriptStatus::Incomplete);
    assert_eq!(script.missing, vec!["target_column"]);
    assert!(script.code.contains("# WARNING: required parameters not stated in the paper: target_column"));
    assert!(script.code.contains("TARGET_COLUMN = None"));
}

#[test]
fn test_every_category_generates() {
    let generator = CodeGenerator::default();
    let methods: Vec<ExtractedMethod> = MethodCategory::ALL
        .iter()
        .map(|c| method(*c, "Some analysis", &[]))
        .collect();
    let scripts = generator.generate(&methods, "T");
    assert_eq!(scripts.len(), methods.len());
    for script in &scripts {
        assert!(!script.code.is_empty());
        assert!(!script.code.contains("{{"));
    }
    assert_eq!(requirements(&scripts).len(), {
        let all: BTreeSet<&String> = scripts.iter().flat_map(|s| &s.dependencies).collect();
        all.len()
    });
}

#[test]
fn test_scripts_serialize() {
    let m = method(MethodCategory::MachineLearning, "k-means clustering", &[]);
    let script = CodeGenerator::default().generate_one(&m, "T").unwrap();
    let value = serde_json::to_value(&script).unwrap();
    assert_eq!(value["status"], "incomplete");
    assert_eq!(value["match_kind"]["kind"], "exact");
    assert_eq!(value["language"], "python");
}

// ============================================================================
// Properties
// ============================================================================

fn param_value() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        ".{0,24}".prop_map(ParamValue::Text),
        (-1.0e6f64..1.0e6).prop_map(ParamValue::Number),
        prop::collection::vec(".{0,8}".prop_map(ParamValue::Text), 0..4).prop_map(ParamValue::List),
        any::<bool>().prop_map(|b| ParamValue::Unknown(serde_json::Value::Bool(b))),
    ]
}

fn category() -> impl Strategy<Value = MethodCategory> {
    prop::sample::select(MethodCategory::ALL.to_vec())
}

const KEYS: &[&str] = &[
    "n_estimators",
    "max_depth",
    "alpha",
    "k",
    "design_factor",
    "target_column",
    "feature_columns",
    "equal_var",
    "free_form",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_no_unfilled_tokens(
        cat in category(),
        name in ".{1,40}",
        description in ".{0,60}",
        title in ".{0,60}",
        tools in prop::collection::vec(".{0,12}", 0..3),
        params in prop::collection::vec((prop::sample::select(KEYS.to_vec()), param_value()), 0..5),
        r in any::<bool>(),
    ) {
        let mut m = ExtractedMethod::new(cat, name);
        m.description = description;
        m.tools = tools;
        for (k, v) in params {
            m.parameters.insert(k.to_string(), v);
        }
        let language = if r { Language::R } else { Language::Python };
        let generator = CodeGenerator::new(TemplateRegistry::builtin(), GeneratorConfig { language });

        let script = generator.generate_one(&m, &title).unwrap();
        prop_assert!(!script.code.contains("{{"));
        prop_assert!(!script.code.contains("}}"));
        prop_assert_eq!(script.is_complete(), script.missing.is_empty());
        for p in &script.missing {
            prop_assert!(script.bindings.contains_key(p));
        }
        let mut sorted = script.dependencies.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted, script.dependencies.clone());
    }

    #[test]
    fn prop_generation_is_deterministic(cat in category(), name in "[a-z ]{1,30}", title in ".{0,30}") {
        let m = ExtractedMethod::new(cat, name);
        let generator = CodeGenerator::default();
        let a = generator.generate_one(&m, &title).unwrap();
        let b = generator.generate_one(&m, &title).unwrap();
        prop_assert_eq!(a, b);
    }
}
