//! Method extraction
//!
//! Drives a language model over a paper's passages and turns the replies into
//! validated [`ExtractedMethod`] records:
//!
//! ```text
//! paper ─► TextNormalizer ─► passages ─► bounded pool of completion calls
//!                                             │ (retry + per-attempt timeout)
//!                                             ▼
//!                                  defensive parse per passage
//!                                             │
//!                          barrier: all passages returned
//!                                             ▼
//!                          confidence scaling + merge ─► ExtractionReport
//! ```
//!
//! Passage failures are isolated: a malformed reply or an exhausted provider
//! leaves a [`PassageOutcome`] explaining what happened, and the remaining
//! passages still contribute.

use crate::llm::config::{env_f64, env_usize};
use crate::llm::{CompletionRequest, ConfigError, LLMProvider};
use crate::retry::{complete_with_retry, RetryConfig, RetryError};
use litmine_ingest::{NormalizerConfig, PaperMetadata, Passage, SectionHint, TextCompleteness, TextNormalizer};
use litmine_model::{
    clamp_confidence, DatasetRecord, ExtractedMethod, MethodFlag, MethodId, Workflow,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

mod merge;
mod parse;

pub use merge::{merge_methods, same_method, DEFAULT_MERGE_SIMILARITY};
pub use parse::{SchemaIssue, DEFAULT_CONFIDENCE};

pub const LITMINE_MAX_CONCURRENT_PASSAGES_ENV: &str = "LITMINE_MAX_CONCURRENT_PASSAGES";
pub const LITMINE_MAX_PASSAGE_CHARS_ENV: &str = "LITMINE_MAX_PASSAGE_CHARS";
pub const LITMINE_MAX_PASSAGES_ENV: &str = "LITMINE_MAX_PASSAGES";
pub const LITMINE_MERGE_SIMILARITY_ENV: &str = "LITMINE_MERGE_SIMILARITY";
pub const LITMINE_MAX_RETRIES_ENV: &str = "LITMINE_MAX_RETRIES";
pub const LITMINE_LLM_TIMEOUT_SECS_ENV: &str = "LITMINE_LLM_TIMEOUT_SECS";

const EXTRACTION_SYSTEM_PROMPT: &str = "\
You read scientific papers and report the computational methods they use.
Only report what the text states. Do not invent parameters, tools or datasets.
Answer with a single JSON object that follows the requested structure and nothing else.";

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub normalizer: NormalizerConfig,
    /// Upper bound on passage calls in flight at once.
    pub max_concurrent_passages: usize,
    /// Dice similarity at or above which same-category records merge.
    pub merge_similarity: f64,
    pub retry: RetryConfig,
    /// Per-attempt budget for one passage call.
    pub request_timeout_secs: u64,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            max_concurrent_passages: 4,
            merge_similarity: DEFAULT_MERGE_SIMILARITY,
            retry: RetryConfig::default(),
            request_timeout_secs: 60,
            max_tokens: 4_000,
            temperature: 0.0,
        }
    }
}

impl ExtractorConfig {
    /// Defaults overridden by `LITMINE_*` environment variables, clamped to sane ranges.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            normalizer: NormalizerConfig {
                max_passage_chars: env_usize(
                    LITMINE_MAX_PASSAGE_CHARS_ENV,
                    defaults.normalizer.max_passage_chars,
                    500,
                    200_000,
                )?,
                max_passages: env_usize(
                    LITMINE_MAX_PASSAGES_ENV,
                    defaults.normalizer.max_passages,
                    1,
                    1_000,
                )?,
            },
            max_concurrent_passages: env_usize(
                LITMINE_MAX_CONCURRENT_PASSAGES_ENV,
                defaults.max_concurrent_passages,
                1,
                64,
            )?,
            merge_similarity: env_f64(
                LITMINE_MERGE_SIMILARITY_ENV,
                defaults.merge_similarity,
                0.5,
                1.0,
            )?,
            retry: RetryConfig {
                max_retries: env_usize(
                    LITMINE_MAX_RETRIES_ENV,
                    defaults.retry.max_retries as usize,
                    0,
                    10,
                )? as u32,
                ..defaults.retry.clone()
            },
            request_timeout_secs: env_usize(
                LITMINE_LLM_TIMEOUT_SECS_ENV,
                defaults.request_timeout_secs as usize,
                1,
                3_600,
            )? as u64,
            ..defaults
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// Report types
// ============================================================================

/// What happened to one passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassageStatus {
    /// Parsed; `dropped` entries had no usable name.
    Extracted { records: usize, dropped: usize },
    /// The reply held no readable JSON object.
    Malformed { reason: String },
    /// Retries ran out or the error was permanent.
    ProviderFailed { attempts: u32, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageOutcome {
    pub index: usize,
    pub passage_id: String,
    pub sections: Vec<String>,
    pub status: PassageStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<SchemaIssue>,
}

impl PassageOutcome {
    pub fn is_failed(&self) -> bool {
        !matches!(self.status, PassageStatus::Extracted { .. })
    }
}

/// Merged result of extracting one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub paper_id: String,
    pub paper_title: String,
    pub completeness: TextCompleteness,
    pub methods: Vec<ExtractedMethod>,
    pub datasets: Vec<DatasetRecord>,
    pub workflows: Vec<Workflow>,
    pub key_findings: Vec<String>,
    pub reproducibility_notes: Vec<String>,
    pub passages: Vec<PassageOutcome>,
    /// Passages cut by the passage limit and never sent for extraction.
    #[serde(default)]
    pub truncated_passages: usize,
}

impl ExtractionReport {
    fn empty(paper: &PaperMetadata) -> Self {
        Self {
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
        }
    }

    pub fn method(&self, id: &MethodId) -> Option<&ExtractedMethod> {
        self.methods.iter().find(|m| &m.id == id)
    }

    pub fn failed_passages(&self) -> impl Iterator<Item = &PassageOutcome> {
        self.passages.iter().filter(|p| p.is_failed())
    }

    /// True when part of the paper contributed nothing: a passage failed or
    /// the passage limit cut text before extraction.
    pub fn is_partial(&self) -> bool {
        self.truncated_passages > 0 || self.failed_passages().next().is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extraction did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

// ============================================================================
// Extractor
// ============================================================================

pub struct MethodExtractor {
    provider: Arc<dyn LLMProvider>,
    normalizer: TextNormalizer,
    config: ExtractorConfig,
}

impl MethodExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ExtractorConfig) -> Self {
        Self {
            provider,
            normalizer: TextNormalizer::new(config.normalizer.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Segment `paper` and extract from every passage.
    pub async fn extract(&self, paper: &PaperMetadata, hints: &[SectionHint]) -> ExtractionReport {
        let segmentation = self.normalizer.segmentation(paper, hints);
        let mut report = self.extract_passages(paper, segmentation.passages).await;
        if segmentation.dropped > 0 {
            tracing::warn!(
                paper = %paper.id,
                truncated = segmentation.dropped,
                "report covers only the leading passages"
            );
        }
        report.truncated_passages = segmentation.dropped;
        report
    }

    /// [`extract`](Self::extract) under a wall-clock deadline.
    ///
    /// On expiry every in-flight passage call is aborted and no report is
    /// produced.
    pub async fn extract_within(
        &self,
        paper: &PaperMetadata,
        hints: &[SectionHint],
        deadline: Duration,
    ) -> Result<ExtractionReport, ExtractError> {
        tokio::time::timeout(deadline, self.extract(paper, hints))
            .await
            .map_err(|_| {
                tracing::warn!(paper = %paper.id, deadline_ms = deadline.as_millis() as u64, "extraction deadline exceeded");
                ExtractError::DeadlineExceeded(deadline)
            })
    }

    /// Extract from already segmented passages.
    pub async fn extract_passages(
        &self,
        paper: &PaperMetadata,
        passages: Vec<Passage>,
    ) -> ExtractionReport {
        let mut report = ExtractionReport::empty(paper);
        if passages.is_empty() {
            tracing::warn!(paper = %paper.id, "no text to extract from");
            return report;
        }

        let total = passages.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_passages.max(1)));
        let mut tasks = JoinSet::new();

        for passage in passages.iter().cloned() {
            let request = self.build_request(paper, &passage, total);
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let retry = self.config.retry.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = complete_with_retry(provider.as_ref(), &request, &retry).await;
                (passage.index, result)
            });
        }

        // Barrier: nothing is merged until every passage has returned.
        let mut results: Vec<(usize, Result<String, RetryError>)> = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results.push((index, result.map(|r| r.content))),
                Err(e) => tracing::error!(paper = %paper.id, error = %e, "passage task failed"),
            }
        }
        results.sort_by_key(|(index, _)| *index);

        let completeness = paper.completeness();
        let mut collected: Vec<ExtractedMethod> = Vec::new();

        for passage in &passages {
            let result = results
                .iter()
                .position(|(index, _)| *index == passage.index)
                .map(|pos| results[pos].1.clone());

            let mut outcome = PassageOutcome {
                index: passage.index,
                passage_id: passage.passage_id(),
                sections: passage.sections.clone(),
                status: PassageStatus::Extracted {
                    records: 0,
                    dropped: 0,
                },
                issues: Vec::new(),
            };

            match result {
                None => {
                    outcome.status = PassageStatus::ProviderFailed {
                        attempts: 0,
                        error: "passage task did not complete".to_string(),
                    };
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        paper = %paper.id,
                        passage = passage.index,
                        attempts = e.attempts,
                        error = %e.error,
                        "passage contributes no records: provider failed"
                    );
                    outcome.status = PassageStatus::ProviderFailed {
                        attempts: e.attempts,
                        error: e.error.to_string(),
                    };
                }
                Some(Ok(content)) => match parse::parse_response(&content, passage.index) {
                    Err(reason) => {
                        tracing::warn!(
                            paper = %paper.id,
                            passage = passage.index,
                            reason = %reason,
                            "passage contributes no records: malformed response"
                        );
                        outcome.status = PassageStatus::Malformed { reason };
                    }
                    Ok(parsed) => {
                        tracing::debug!(
                            paper = %paper.id,
                            passage = passage.index,
                            records = parsed.methods.len(),
                            dropped = parsed.dropped,
                            issues = parsed.issues.len(),
                            "parsed passage"
                        );
                        outcome.status = PassageStatus::Extracted {
                            records: parsed.methods.len(),
                            dropped: parsed.dropped,
                        };
                        outcome.issues = parsed.issues;
                        collected.extend(
                            parsed
                                .methods
                                .into_iter()
                                .map(|m| scale_for_completeness(m, completeness)),
                        );
                        merge::merge_datasets(&mut report.datasets, parsed.datasets);
                        merge::merge_workflows(&mut report.workflows, parsed.workflows);
                        merge::union_text(&mut report.key_findings, parsed.key_findings);
                        merge::union_text(
                            &mut report.reproducibility_notes,
                            parsed.reproducibility_notes,
                        );
                    }
                },
            }

            report.passages.push(outcome);
        }

        report.methods = merge_methods(collected, self.config.merge_similarity);

        tracing::info!(
            paper = %paper.id,
            passages = total,
            failed = report.failed_passages().count(),
            methods = report.methods.len(),
            completeness = ?completeness,
            "extraction finished"
        );

        report
    }

    fn build_request(&self, paper: &PaperMetadata, passage: &Passage, total: usize) -> CompletionRequest {
        let contract = output_contract();
        let contract_text =
            serde_json::to_string_pretty(&contract).unwrap_or_else(|_| contract.to_string());

        let mut prompt = String::new();
        prompt.push_str(&format!("Paper title: {}\n", paper.title));
        prompt.push_str(&format!(
            "Passage {} of {} (sections: {})\n\n",
            passage.index + 1,
            total,
            if passage.sections.is_empty() {
                "unlabelled".to_string()
            } else {
                passage.sections.join(", ")
            }
        ));
        prompt.push_str("Passage text:\n");
        prompt.push_str(&passage.text);
        prompt.push_str("\n\nReport every computational method, statistical test, algorithm or analysis pipeline in this passage.\n");
        prompt.push_str("For each method give its category (statistical, machine_learning, bioinformatics or other), ");
        prompt.push_str("the parameters exactly as stated, the datasets and software tools it uses, whether code is available, ");
        prompt.push_str("and your confidence between 0 and 1.\n");
        prompt.push_str("Also list datasets, workflows, key computational findings and reproducibility notes.\n\n");
        prompt.push_str("Return one JSON object with this structure:\n");
        prompt.push_str(&contract_text);

        CompletionRequest::system_user(EXTRACTION_SYSTEM_PROMPT, prompt)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_json_schema(contract)
            .with_timeout(self.config.request_timeout())
    }
}

/// Scale confidence for partial or abstract-only source text.
fn scale_for_completeness(mut method: ExtractedMethod, completeness: TextCompleteness) -> ExtractedMethod {
    if completeness.is_reduced() {
        method.confidence = clamp_confidence(method.confidence * completeness.confidence_factor());
        if !method.has_flag(&MethodFlag::ReducedSourceText) {
            method.flags.push(MethodFlag::ReducedSourceText);
        }
    }
    method
}

/// The structure a passage reply must follow.
pub fn output_contract() -> serde_json::Value {
    serde_json::json!({
        "computational_methods": [{
            "name": "string",
            "category": "statistical | machine_learning | bioinformatics | other",
            "description": "string",
            "parameters": {"parameter_name": "number, string or list"},
            "datasets": ["string"],
            "tools": ["string"],
            "languages": ["string"],
            "code_available": "boolean",
            "confidence": "number between 0 and 1"
        }],
        "datasets": [{
            "name": "string",
            "description": "string",
            "source": "string",
            "format": "string",
            "size": "string"
        }],
        "workflows": [{
            "name": "string",
            "steps": ["string"],
            "input_data": ["string"],
            "output_data": ["string"],
            "dependencies": ["string"]
        }],
        "key_findings": ["string"],
        "reproducibility_notes": ["string"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, LLMError, ModelInfo};
    use crate::providers::MockProvider;
    use approx::assert_relative_eq;
    use litmine_model::MethodCategory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RF_REPLY: &str = r#"{"computational_methods": [{
        "name": "Random forest classifier",
        "category": "machine_learning",
        "parameters": {"n_estimators": 100},
        "tools": ["scikit-learn"],
        "confidence": 0.8
    }]}"#;

    fn passages(paper: &str, texts: &[&str]) -> Vec<Passage> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Passage {
                paper_id: paper.to_string(),
                index: i,
                sections: vec!["Methods".to_string()],
                text: t.to_string(),
            })
            .collect()
    }

    fn fast_config() -> ExtractorConfig {
        ExtractorConfig {
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 1,
                max_backoff_ms: 2,
                jitter: false,
                ..RetryConfig::default()
            },
            ..ExtractorConfig::default()
        }
    }

    /// Tracks how many calls are in flight at once.
    struct GaugeProvider {
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    impl GaugeProvider {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                started: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
            }
        }
    }

    struct Leave<'a>(&'a AtomicUsize);

    impl Drop for Leave<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl LLMProvider for GaugeProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LLMError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _leave = Leave(&self.in_flight);
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse::text(RF_REPLY.to_string(), "gauge"))
        }

        fn model_info(&self) -> ModelInfo {
            ModelInfo {
                name: "gauge".to_string(),
                max_tokens: 1_000,
                supports_json_mode: true,
            }
        }
    }

    fn full_paper() -> PaperMetadata {
        PaperMetadata::new("p1", "Forests").with_full_text("x".repeat(5_000))
    }

    #[tokio::test]
    async fn test_same_method_across_passages_merges() {
        let provider = Arc::new(MockProvider::with_handler(|req, _| {
            Ok(if req.last_user_message().contains("second") {
                RF_REPLY.replace("0.8", "0.95").replace("scikit-learn", "pandas")
            } else {
                RF_REPLY.to_string()
            })
        }));
        let extractor = MethodExtractor::new(provider, fast_config());
        let report = extractor
            .extract_passages(&full_paper(), passages("p1", &["first", "second"]))
            .await;

        assert_eq!(report.methods.len(), 1);
        let m = &report.methods[0];
        assert_eq!(m.confidence, 0.95);
        assert_eq!(m.tools, vec!["pandas", "scikit-learn"]);
        assert_eq!(m.source_passages, vec![0, 1]);
        assert!(!report.is_partial());
    }

    #[tokio::test]
    async fn test_abstract_only_scales_confidence() {
        let provider = Arc::new(MockProvider::always(RF_REPLY));
        let extractor = MethodExtractor::new(provider, fast_config());
        let paper = PaperMetadata::new("p2", "T").with_abstract("We used a random forest.");
        let report = extractor.extract(&paper, &[]).await;

        assert_eq!(report.completeness, TextCompleteness::AbstractOnly);
        let m = &report.methods[0];
        assert_relative_eq!(m.confidence, 0.8 * 0.7, epsilon = 1e-9);
        assert!(m.has_flag(&MethodFlag::ReducedSourceText));
        assert_eq!(m.category, MethodCategory::MachineLearning);
    }

    #[tokio::test]
    async fn test_permanent_provider_failure_is_isolated() {
        let provider = Arc::new(MockProvider::with_handler(|req, _| {
            if req.last_user_message().contains("bad") {
                Err(crate::llm::LLMError::Auth("nope".into()))
            } else {
                Ok(RF_REPLY.to_string())
            }
        }));
        let extractor = MethodExtractor::new(provider.clone(), fast_config());
        let report = extractor
            .extract_passages(&full_paper(), passages("p1", &["good", "bad"]))
            .await;

        assert_eq!(report.methods.len(), 1);
        assert_eq!(
            report.passages[1].status,
            PassageStatus::ProviderFailed {
                attempts: 1,
                error: "Authentication failed: nope".to_string()
            }
        );
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_request_carries_contract_and_budget() {
        let provider = Arc::new(MockProvider::always("{}"));
        let extractor = MethodExtractor::new(provider, fast_config());
        let paper = full_paper();
        let segmented = passages("p1", &["text"]);
        let request = extractor.build_request(&paper, &segmented[0], 1);
        assert!(request.json_schema.is_some());
        assert_eq!(request.timeout, Duration::from_secs(60));
        assert!(request.last_user_message().contains("computational_methods"));
        assert!(request.last_user_message().contains("Paper title: Forests"));
    }

    #[tokio::test]
    async fn test_empty_paper_yields_empty_report() {
        let provider = Arc::new(MockProvider::always(RF_REPLY));
        let extractor = MethodExtractor::new(provider.clone(), fast_config());
        let report = extractor.extract(&PaperMetadata::new("p3", "T"), &[]).await;
        assert!(report.methods.is_empty());
        assert!(report.passages.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_passage_limit_marks_report_partial() {
        let provider = Arc::new(MockProvider::always(RF_REPLY));
        let config = ExtractorConfig {
            normalizer: NormalizerConfig {
                max_passage_chars: 80,
                max_passages: 2,
            },
            ..fast_config()
        };
        let body: Vec<String> = (0..10)
            .map(|i| format!("Paragraph {i} describes another preprocessing step in detail."))
            .collect();
        let paper = PaperMetadata::new("p4", "Long methods")
            .with_full_text(format!("Methods\n{}", body.join("\n\n")));

        let report = MethodExtractor::new(provider.clone(), config).extract(&paper, &[]).await;

        assert_eq!(report.passages.len(), 2);
        assert_eq!(provider.calls(), 2);
        assert!(report.truncated_passages > 0);
        assert_eq!(report.failed_passages().count(), 0);
        assert!(report.is_partial());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["truncated_passages"], report.truncated_passages);
    }

    #[tokio::test]
    async fn test_deadline_aborts_in_flight_passages() {
        let provider = Arc::new(GaugeProvider::new(Duration::from_millis(200)));
        let extractor = MethodExtractor::new(provider.clone(), fast_config());
        let paper = PaperMetadata::new("p5", "T").with_abstract("We used a random forest.");

        let err = extractor
            .extract_within(&paper, &[], Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::DeadlineExceeded(d) if d == Duration::from_millis(10)));
        assert_eq!(provider.started.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(provider.finished.load(Ordering::SeqCst), 0);
        assert_eq!(provider.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_calls_stay_within_limit() {
        let provider = Arc::new(GaugeProvider::new(Duration::from_millis(20)));
        let config = ExtractorConfig {
            max_concurrent_passages: 3,
            ..fast_config()
        };
        let texts = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        let report = MethodExtractor::new(provider.clone(), config)
            .extract_passages(&full_paper(), passages("p1", &texts))
            .await;

        assert_eq!(report.passages.len(), 10);
        assert_eq!(provider.finished.load(Ordering::SeqCst), 10);
        let peak = provider.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeded the limit");
        assert!(peak >= 2, "passages ran one at a time");
    }

    #[test]
    fn test_from_env_defaults() {
        let config = ExtractorConfig::from_env().unwrap();
        assert!(config.max_concurrent_passages >= 1);
        assert!((0.5..=1.0).contains(&config.merge_similarity));
    }
}
