//! End-to-end tests for extraction and grounded sessions
//!
//! These run the full pipeline against a scripted mock provider:
//! 1. Passage fan-out with one malformed reply
//! 2. Transient provider failures recovered by retry
//! 3. Whole-paper extraction feeding a grounded session
//! 4. History windowing and session isolation

use litmine_ingest::{PaperMetadata, Passage, TextCompleteness};
use litmine_llm::llm::LLMError;
use litmine_llm::*;
use litmine_model::{MethodCategory, MethodId, ParamValue};
use serde_json::json;
use std::sync::Arc;

fn method_reply(name: &str, category: &str, tool: &str) -> String {
    json!({
        "computational_methods": [{
            "name": name,
            "category": category,
            "description": format!("{name} as described"),
            "parameters": {},
            "tools": [tool],
            "confidence": 0.8
        }]
    })
    .to_string()
}

fn passages(paper_id: &str, n: usize) -> Vec<Passage> {
    (0..n)
        .map(|index| Passage {
            paper_id: paper_id.to_string(),
            index,
            sections: vec!["Methods".to_string()],
            text: format!("Methods passage number {index}."),
        })
        .collect()
}

fn quick_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

fn full_paper() -> PaperMetadata {
    let body = "Methods\n\nWe trained a random forest classifier with 100 trees in scikit-learn.\n\n"
        .repeat(60);
    PaperMetadata::new("pmid-42", "Forests for tumours")
        .with_authors(vec!["A. Author".to_string()])
        .with_abstract("We classify tumours.")
        .with_full_text(body)
}

#[tokio::test]
async fn test_malformed_passage_is_isolated() {
    let replies = [
        method_reply("Random forest", "machine_learning", "scikit-learn"),
        method_reply("Welch t-test", "statistical", "SciPy"),
        "Sorry, I cannot help with that.".to_string(),
        method_reply("DESeq2 differential expression", "bioinformatics", "DESeq2"),
        method_reply("Kaplan-Meier estimator", "statistical", "lifelines"),
    ];
    let provider = Arc::new(MockProvider::with_handler(move |request, _| {
        let prompt = request.last_user_message();
        let index = (1..=5)
            .find(|i| prompt.contains(&format!("Passage {i} of 5")))
            .unwrap_or(1);
        Ok(replies[index - 1].clone())
    }));

    let paper = full_paper();
    let extractor = MethodExtractor::new(provider.clone(), ExtractorConfig::default());
    let report = extractor
        .extract_passages(&paper, passages(&paper.id, 5))
        .await;

    assert_eq!(provider.calls(), 5);
    assert_eq!(report.passages.len(), 5);
    assert_eq!(report.methods.len(), 4);
    assert!(report.is_partial());

    let failed: Vec<&PassageOutcome> = report.failed_passages().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 2);
    assert!(matches!(failed[0].status, PassageStatus::Malformed { .. }));

    let names: Vec<&str> = report.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Random forest",
            "Welch t-test",
            "DESeq2 differential expression",
            "Kaplan-Meier estimator"
        ]
    );
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let provider = Arc::new(MockProvider::with_handler(|_, call| {
        if call < 2 {
            Err(LLMError::RateLimited { retry_after_ms: 1 })
        } else {
            Ok(method_reply("Random forest", "machine_learning", "scikit-learn"))
        }
    }));
    let config = ExtractorConfig {
        retry: quick_retry(),
        ..ExtractorConfig::default()
    };

    let paper = full_paper();
    let report = MethodExtractor::new(provider.clone(), config)
        .extract_passages(&paper, passages(&paper.id, 1))
        .await;

    assert_eq!(provider.calls(), 3);
    assert!(!report.is_partial());
    assert_eq!(report.methods.len(), 1);
}

#[tokio::test]
async fn test_exhausted_retries_mark_provider_failure() {
    let provider = Arc::new(MockProvider::failing(LLMError::Network("reset".into())));
    let config = ExtractorConfig {
        retry: quick_retry(),
        ..ExtractorConfig::default()
    };

    let paper = full_paper();
    let report = MethodExtractor::new(provider.clone(), config)
        .extract_passages(&paper, passages(&paper.id, 2))
        .await;

    assert_eq!(provider.calls(), 8);
    assert!(report.methods.is_empty());
    for outcome in &report.passages {
        assert!(matches!(
            outcome.status,
            PassageStatus::ProviderFailed { attempts: 4, .. }
        ));
    }
}

#[tokio::test]
async fn test_extraction_feeds_grounded_session() {
    let reply = json!({
        "computational_methods": [{
            "name": "Random forest",
            "category": "machine learning",
            "description": "Tree ensemble for tumour classification",
            "parameters": {"n_estimators": 100, "max_depth": {"tuned": true}},
            "datasets": ["TCGA-BRCA"],
            "tools": ["scikit-learn"],
            "languages": ["Python"],
            "code_available": true,
            "confidence": 0.9
        }],
        "key_findings": ["Accuracy of 0.91"]
    })
    .to_string();

    let paper = full_paper();
    assert_eq!(paper.completeness(), TextCompleteness::Full);

    let extractor = MethodExtractor::new(
        Arc::new(MockProvider::always(&reply)),
        ExtractorConfig::default(),
    );
    let report = extractor.extract(&paper, &[]).await;
    assert!(!report.methods.is_empty());

    let id = MethodId::new(MethodCategory::MachineLearning, "Random forest");
    let rf = report.method(&id).expect("random forest extracted");
    assert_eq!(rf.parameter("n_estimators"), Some(&ParamValue::Number(100.0)));
    assert!(rf.parameter("max_depth").unwrap().is_unknown());
    assert!(rf.code_available);
    assert_eq!(report.key_findings, vec!["Accuracy of 0.91"]);

    let qa = Arc::new(MockProvider::always(
        "The random forest used 100 trees from scikit-learn.",
    ));
    let mut session =
        QaSession::grounded(qa.clone(), SessionConfig::default(), &paper, &report).unwrap();
    let turn = session.ask("How many trees were used?").await.unwrap();
    assert_eq!(turn.referenced_methods, vec![id]);

    let prompt = &qa.prompts()[0];
    assert!(prompt.contains("Paper title: Forests for tumours"));
    assert!(prompt.contains("n_estimators=100"));
    assert!(prompt.contains("Accuracy of 0.91"));
}

fn small_paper(id: &str) -> (PaperMetadata, ExtractionReport) {
    let paper = PaperMetadata::new(id, format!("Paper {id}"))
        .with_abstract("A short abstract about classifiers.");
    let report = ExtractionReport {
        paper_id: paper.id.clone(),
        paper_title: paper.title.clone(),
        completeness: paper.completeness(),
        methods: Vec::new(),
        datasets: Vec::new(),
        workflows: Vec::new(),
        key_findings: Vec::new(),
        reproducibility_notes: Vec::new(),
        passages: Vec::new(),
        truncated_passages: 0,
    };
    (paper, report)
}

#[tokio::test]
async fn test_history_window_limits_prompt_not_export() {
    let provider = Arc::new(MockProvider::with_handler(|_, call| Ok(format!("reply {call}"))));
    let (paper, report) = small_paper("p1");
    let mut session =
        QaSession::grounded(provider.clone(), SessionConfig::default(), &paper, &report).unwrap();

    let questions = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];
    for q in questions {
        session.ask(&format!("Question {q}?")).await.unwrap();
    }

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 6);
    let last = &prompts[5];
    assert!(!last.contains("Question alpha?"));
    assert!(!last.contains("Question bravo?"));
    assert!(last.contains("user: Question charlie?"));
    assert!(last.contains("assistant: reply 2"));
    assert!(last.contains("user: Question delta?"));
    assert!(last.contains("user: Question echo?"));
    assert!(last.ends_with("user: Question foxtrot?"));

    let export = session.export();
    assert_eq!(export.turns.len(), 6);
    assert_eq!(export.session_id, session.id());
    assert_eq!(export.paper.as_ref().map(|p| p.id.as_str()), Some("p1"));
    let asked: Vec<String> = export.turns.iter().map(|t| t.question.clone()).collect();
    assert_eq!(asked[0], "Question alpha?");
    assert_eq!(asked[5], "Question foxtrot?");
}

#[tokio::test]
async fn test_sessions_do_not_share_history() {
    let provider = Arc::new(MockProvider::always("ok"));
    let (p1, r1) = small_paper("p1");
    let (p2, r2) = small_paper("p2");
    let mut first = QaSession::grounded(provider.clone(), SessionConfig::default(), &p1, &r1).unwrap();
    let mut second =
        QaSession::grounded(provider.clone(), SessionConfig::default(), &p2, &r2).unwrap();

    first.ask("What about zebrafish?").await.unwrap();
    second.ask("What about yeast?").await.unwrap();

    let prompts = provider.prompts();
    assert!(!prompts[1].contains("zebrafish"));
    assert!(prompts[1].contains("Paper title: Paper p2"));
    assert_eq!(first.turns().len(), 1);
    assert_eq!(second.turns().len(), 1);
    assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn test_grounding_is_fixed_across_turns() {
    let provider = Arc::new(MockProvider::always("ok"));
    let (paper, report) = small_paper("p1");
    let mut session =
        QaSession::grounded(provider, SessionConfig::default(), &paper, &report).unwrap();

    let before = session.grounding().unwrap().clone();
    session.ask("First?").await.unwrap();
    session.ask("Second?").await.unwrap();
    let after = session.grounding().unwrap();

    assert_eq!(before.text_digest, after.text_digest);
    assert!(Arc::ptr_eq(&before.methods, &after.methods));
    assert!(Arc::ptr_eq(&before.key_findings, &after.key_findings));
}

#[test]
fn test_report_serializes_passage_status() {
    let outcome = PassageOutcome {
        index: 0,
        passage_id: "p_p0".to_string(),
        sections: vec![],
        status: PassageStatus::Malformed {
            reason: "no JSON object in response".to_string(),
        },
        issues: vec![],
    };
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["status"]["status"], "malformed");
}
