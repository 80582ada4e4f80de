//! Paper-grounded question answering.
//!
//! A [`QaSession`] is bound to exactly one paper. Its [`GroundingSnapshot`] is
//! fixed when the paper is loaded and shared by reference afterwards; the turn
//! log only ever grows. The model sees the grounding plus the last
//! `history_window` answered turns, while [`QaSession::export`] returns the
//! whole log.

use crate::extraction::ExtractionReport;
use crate::llm::{CompletionRequest, LLMProvider, Message};
use crate::retry::{complete_with_retry, RetryConfig};
use chrono::{DateTime, Utc};
use litmine_ingest::PaperMetadata;
use litmine_model::{normalize_name, DatasetRecord, ExtractedMethod, MethodCategory, MethodId, Workflow};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Paper-level questions offered once every method has been covered.
const GENERIC_QUESTIONS: &[&str] = &[
    "What computational methods were used in this study?",
    "What software tools and programming languages were employed?",
    "How was the data preprocessed?",
    "What were the key parameters used in the analysis?",
    "Is the code available for reproduction?",
    "What datasets were used and where can I access them?",
    "What are the main computational findings?",
];

const QA_SYSTEM_PREAMBLE: &str = "\
You are a research assistant answering questions about one scientific paper's \
methodology and computational approach. Answer only from the paper material \
below. If the material does not answer the question, say so and name what \
additional information would be needed.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Answered turns forwarded to the model with each question.
    pub history_window: usize,
    /// Characters of full text included in the grounding excerpt.
    pub max_context_chars: usize,
    pub max_suggestions: usize,
    pub max_tokens: usize,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_window: 3,
            max_context_chars: 8_000,
            max_suggestions: 7,
            max_tokens: 2_000,
            temperature: 0.2,
            request_timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no paper loaded; load a paper before asking questions")]
    NoPaperLoaded,
    #[error("session is grounded on paper {loaded:?}, not {requested:?}")]
    PaperMismatch { loaded: String, requested: String },
    #[error("question is empty")]
    EmptyQuestion,
    #[error("no answer within {0:?}")]
    DeadlineExceeded(Duration),
}

// ============================================================================
// Grounding
// ============================================================================

/// Fixed material a session reasons over.
#[derive(Debug, Clone)]
pub struct GroundingSnapshot {
    pub paper_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub year: Option<String>,
    pub doi: Option<String>,
    pub abstract_text: String,
    pub text_excerpt: String,
    /// Hex SHA-256 of the abstract and full text.
    pub text_digest: String,
    pub methods: Arc<[ExtractedMethod]>,
    pub datasets: Arc<[DatasetRecord]>,
    pub workflows: Arc<[Workflow]>,
    pub key_findings: Arc<[String]>,
    pub reproducibility_notes: Arc<[String]>,
}

impl GroundingSnapshot {
    pub fn new(
        paper: &PaperMetadata,
        report: &ExtractionReport,
        max_context_chars: usize,
    ) -> Result<Self, SessionError> {
        if report.paper_id != paper.id {
            return Err(SessionError::PaperMismatch {
                loaded: paper.id.clone(),
                requested: report.paper_id.clone(),
            });
        }
        Ok(Self {
            paper_id: paper.id.clone(),
            title: paper.title.clone(),
            authors: paper.authors.clone(),
            journal: paper.journal.clone(),
            year: paper.year.clone(),
            doi: paper.doi.clone(),
            abstract_text: paper.abstract_text.clone(),
            text_excerpt: paper.full_text.chars().take(max_context_chars).collect(),
            text_digest: text_digest(paper),
            methods: report.methods.clone().into(),
            datasets: report.datasets.clone().into(),
            workflows: report.workflows.clone().into(),
            key_findings: report.key_findings.clone().into(),
            reproducibility_notes: report.reproducibility_notes.clone().into(),
        })
    }

    fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Paper title: {}\n", self.title));
        if !self.authors.is_empty() {
            out.push_str(&format!("Authors: {}\n", self.authors.join(", ")));
        }
        if let Some(journal) = &self.journal {
            match &self.year {
                Some(year) => out.push_str(&format!("Journal: {journal} ({year})\n")),
                None => out.push_str(&format!("Journal: {journal}\n")),
            }
        }
        if let Some(doi) = &self.doi {
            out.push_str(&format!("DOI: {doi}\n"));
        }
        if !self.abstract_text.is_empty() {
            out.push_str(&format!("\nAbstract:\n{}\n", self.abstract_text));
        }
        if !self.text_excerpt.is_empty() {
            out.push_str(&format!("\nFull text (excerpt):\n{}\n", self.text_excerpt));
        }

        out.push_str("\nExtracted computational methods:\n");
        if self.methods.is_empty() {
            out.push_str("- none extracted\n");
        }
        for m in self.methods.iter() {
            out.push_str(&format!("- {} [{}]: {}\n", m.name, m.category, m.description));
            if !m.tools.is_empty() {
                out.push_str(&format!("  Tools: {}\n", m.tools.join(", ")));
            }
            if !m.languages.is_empty() {
                out.push_str(&format!("  Languages: {}\n", m.languages.join(", ")));
            }
            if !m.parameters.is_empty() {
                let params: Vec<String> = m
                    .parameters
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                out.push_str(&format!("  Parameters: {}\n", params.join(", ")));
            }
        }

        if !self.datasets.is_empty() {
            out.push_str("\nDatasets:\n");
            for d in self.datasets.iter() {
                out.push_str(&format!("- {}: {} (source: {})\n", d.name, d.description, d.source));
            }
        }
        if !self.workflows.is_empty() {
            out.push_str("\nAnalysis workflows:\n");
            for w in self.workflows.iter() {
                out.push_str(&format!("- {}: {}\n", w.name, w.steps.join(" -> ")));
            }
        }
        if !self.key_findings.is_empty() {
            out.push_str("\nKey findings:\n");
            for f in self.key_findings.iter() {
                out.push_str(&format!("- {f}\n"));
            }
        }
        if !self.reproducibility_notes.is_empty() {
            out.push_str("\nReproducibility notes:\n");
            for n in self.reproducibility_notes.iter() {
                out.push_str(&format!("- {n}\n"));
            }
        }
        out
    }
}

fn text_digest(paper: &PaperMetadata) -> String {
    let mut hasher = Sha256::new();
    hasher.update(paper.abstract_text.as_bytes());
    hasher.update([0u8]);
    hasher.update(paper.full_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Turns
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnStatus {
    Answered,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    /// Empty for failed turns.
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub referenced_methods: Vec<MethodId>,
    pub status: TurnStatus,
}

impl ConversationTurn {
    pub fn is_answered(&self) -> bool {
        self.status == TurnStatus::Answered
    }
}

/// Paper identity carried in an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedPaper {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub doi: Option<String>,
    pub text_digest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub paper: Option<ExportedPaper>,
    pub turns: Vec<ConversationTurn>,
}

// ============================================================================
// Session
// ============================================================================

pub struct QaSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    provider: Arc<dyn LLMProvider>,
    config: SessionConfig,
    grounding: Option<GroundingSnapshot>,
    turns: Vec<ConversationTurn>,
    /// Methods already referenced by a turn or offered as a suggestion.
    visited: BTreeSet<MethodId>,
    suggested_generic: BTreeSet<&'static str>,
}

impl QaSession {
    /// An unloaded session; [`ask`](Self::ask) fails until a paper is loaded.
    pub fn new(provider: Arc<dyn LLMProvider>, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            provider,
            config,
            grounding: None,
            turns: Vec::new(),
            visited: BTreeSet::new(),
            suggested_generic: BTreeSet::new(),
        }
    }

    /// A session already grounded on `paper`.
    pub fn grounded(
        provider: Arc<dyn LLMProvider>,
        config: SessionConfig,
        paper: &PaperMetadata,
        report: &ExtractionReport,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(provider, config);
        session.load_paper(paper, report)?;
        Ok(session)
    }

    /// Ground the session. Reloading the same paper is a no-op; any other
    /// paper is refused.
    pub fn load_paper(
        &mut self,
        paper: &PaperMetadata,
        report: &ExtractionReport,
    ) -> Result<(), SessionError> {
        if let Some(existing) = &self.grounding {
            if existing.paper_id == paper.id && existing.text_digest == text_digest(paper) {
                return Ok(());
            }
            return Err(SessionError::PaperMismatch {
                loaded: existing.paper_id.clone(),
                requested: paper.id.clone(),
            });
        }

        let snapshot = GroundingSnapshot::new(paper, report, self.config.max_context_chars)?;
        tracing::info!(
            session = %self.id,
            paper = %snapshot.paper_id,
            methods = snapshot.methods.len(),
            digest = %snapshot.text_digest,
            "session grounded"
        );
        self.grounding = Some(snapshot);
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_loaded(&self) -> bool {
        self.grounding.is_some()
    }

    pub fn grounding(&self) -> Option<&GroundingSnapshot> {
        self.grounding.as_ref()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Ask one question. Provider failures are recorded as a failed turn.
    pub async fn ask(&mut self, question: &str) -> Result<&ConversationTurn, SessionError> {
        self.ask_inner(question, None).await
    }

    /// [`ask`](Self::ask) under a deadline. On expiry nothing is appended.
    pub async fn ask_within(
        &mut self,
        question: &str,
        deadline: Duration,
    ) -> Result<&ConversationTurn, SessionError> {
        self.ask_inner(question, Some(deadline)).await
    }

    async fn ask_inner(
        &mut self,
        question: &str,
        deadline: Option<Duration>,
    ) -> Result<&ConversationTurn, SessionError> {
        let grounding = self.grounding.as_ref().ok_or(SessionError::NoPaperLoaded)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        let request = self.build_request(grounding, question);
        let call = complete_with_retry(self.provider.as_ref(), &request, &self.config.retry);
        let result = match deadline {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| SessionError::DeadlineExceeded(limit))?,
            None => call.await,
        };

        let turn = match result {
            Ok(response) => {
                let answer = response.content.trim().to_string();
                let referenced = referenced_methods(&grounding.methods, question, &answer);
                ConversationTurn {
                    question: question.to_string(),
                    answer,
                    timestamp: Utc::now(),
                    referenced_methods: referenced,
                    status: TurnStatus::Answered,
                }
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.id,
                    attempts = e.attempts,
                    error = %e.error,
                    "question failed"
                );
                ConversationTurn {
                    question: question.to_string(),
                    answer: String::new(),
                    timestamp: Utc::now(),
                    referenced_methods: Vec::new(),
                    status: TurnStatus::Failed {
                        reason: e.to_string(),
                    },
                }
            }
        };

        self.visited.extend(turn.referenced_methods.iter().cloned());
        self.turns.push(turn);
        Ok(&self.turns[self.turns.len() - 1])
    }

    fn build_request(&self, grounding: &GroundingSnapshot, question: &str) -> CompletionRequest {
        let system = format!("{QA_SYSTEM_PREAMBLE}\n\n{}", grounding.render());
        let mut messages = vec![Message::system(system)];

        let answered: Vec<&ConversationTurn> =
            self.turns.iter().filter(|t| t.is_answered()).collect();
        let start = answered.len().saturating_sub(self.config.history_window);
        for turn in &answered[start..] {
            messages.push(Message::user(turn.question.clone()));
            messages.push(Message::assistant(turn.answer.clone()));
        }
        messages.push(Message::user(question));

        CompletionRequest::new(messages)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_timeout(Duration::from_secs(self.config.request_timeout_secs))
    }

    /// Follow-up questions about methods no turn has touched yet.
    ///
    /// Each method is suggested at most once; when all are covered, generic
    /// paper-level questions that have not been asked or offered fill in.
    pub fn suggest_questions(&mut self) -> Result<Vec<String>, SessionError> {
        let grounding = self.grounding.as_ref().ok_or(SessionError::NoPaperLoaded)?;
        let limit = self.config.max_suggestions;
        let mut out = Vec::new();

        for method in grounding.methods.iter() {
            if out.len() >= limit {
                break;
            }
            if self.visited.contains(&method.id) {
                continue;
            }
            out.push(method_question(method));
            self.visited.insert(method.id.clone());
        }

        let asked: BTreeSet<String> = self
            .turns
            .iter()
            .map(|t| normalize_name(&t.question))
            .collect();
        for question in GENERIC_QUESTIONS {
            if out.len() >= limit {
                break;
            }
            if self.suggested_generic.contains(question) || asked.contains(&normalize_name(question)) {
                continue;
            }
            out.push(question.to_string());
            self.suggested_generic.insert(question);
        }

        Ok(out)
    }

    /// Full turn log with paper identity. Does not change the session.
    pub fn export(&self) -> SessionExport {
        SessionExport {
            session_id: self.id,
            created_at: self.created_at,
            paper: self.grounding.as_ref().map(|g| ExportedPaper {
                id: g.paper_id.clone(),
                title: g.title.clone(),
                authors: g.authors.clone(),
                doi: g.doi.clone(),
                text_digest: g.text_digest.clone(),
            }),
            turns: self.turns.clone(),
        }
    }
}

fn method_question(method: &ExtractedMethod) -> String {
    let name = &method.name;
    if !method.parameters.is_empty() {
        let keys: Vec<&str> = method.parameters.keys().map(String::as_str).collect();
        return format!(
            "How were the {} settings chosen for {name}?",
            keys.join(", ")
        );
    }
    match method.category {
        MethodCategory::Statistical => {
            format!("What assumptions does {name} rely on, and how were they checked?")
        }
        MethodCategory::MachineLearning => {
            format!("How was {name} trained and validated?")
        }
        MethodCategory::Bioinformatics => {
            format!("Which reference data and settings were used for {name}?")
        }
        MethodCategory::Other => format!("How was {name} applied in this study?"),
    }
}

/// Methods whose name or tools appear as whole words in the question or answer.
fn referenced_methods(methods: &[ExtractedMethod], question: &str, answer: &str) -> Vec<MethodId> {
    let haystack = format!(" {} {} ", normalize_name(question), normalize_name(answer));
    let mentions = |term: &str| {
        let needle = normalize_name(term);
        !needle.is_empty() && haystack.contains(&format!(" {needle} "))
    };

    let mut out: Vec<MethodId> = Vec::new();
    for method in methods {
        if (mentions(&method.name) || method.tools.iter().any(|t| mentions(t)))
            && !out.contains(&method.id)
        {
            out.push(method.id.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMError;
    use crate::providers::MockProvider;
    use litmine_ingest::TextCompleteness;

    fn paper(id: &str, title: &str) -> PaperMetadata {
        PaperMetadata::new(id, title)
            .with_abstract(format!("Abstract of {title}."))
            .with_full_text(format!("Body of {title}."))
    }

    fn report_for(paper: &PaperMetadata, methods: Vec<ExtractedMethod>) -> ExtractionReport {
        ExtractionReport {
            paper_id: paper.id.clone(),
            paper_title: paper.title.clone(),
            completeness: TextCompleteness::Partial,
            methods,
            datasets: Vec::new(),
            workflows: Vec::new(),
            key_findings: Vec::new(),
            reproducibility_notes: Vec::new(),
            passages: Vec::new(),
            truncated_passages: 0,
        }
    }

    fn rf() -> ExtractedMethod {
        let mut m = ExtractedMethod::new(MethodCategory::MachineLearning, "Random forest");
        m.tools = vec!["scikit-learn".to_string()];
        m
    }

    fn ttest() -> ExtractedMethod {
        ExtractedMethod::new(MethodCategory::Statistical, "Welch t-test")
    }

    fn fast() -> SessionConfig {
        SessionConfig {
            retry: RetryConfig::none(),
            ..SessionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unloaded_session_refuses_without_calling_provider() {
        let provider = Arc::new(MockProvider::always("answer"));
        let mut session = QaSession::new(provider.clone(), fast());
        let err = session.ask("What model was used?").await.unwrap_err();
        assert!(matches!(err, SessionError::NoPaperLoaded));
        assert_eq!(provider.calls(), 0);
        assert!(session.turns().is_empty());
        assert!(matches!(
            session.suggest_questions(),
            Err(SessionError::NoPaperLoaded)
        ));
    }

    #[tokio::test]
    async fn test_answer_references_methods() {
        let provider = Arc::new(MockProvider::always(
            "They used scikit-learn with default settings.",
        ));
        let p = paper("p1", "Forests");
        let mut session =
            QaSession::grounded(provider, fast(), &p, &report_for(&p, vec![rf(), ttest()])).unwrap();
        let turn = session.ask("Which library?").await.unwrap();
        assert!(turn.is_answered());
        assert_eq!(turn.referenced_methods, vec![rf().id]);
    }

    #[tokio::test]
    async fn test_provider_failure_appends_failed_turn() {
        let provider = Arc::new(MockProvider::failing(LLMError::Auth("bad key".into())));
        let p = paper("p1", "Forests");
        let mut session = QaSession::grounded(provider, fast(), &p, &report_for(&p, vec![])).unwrap();
        let turn = session.ask("Anything?").await.unwrap();
        assert!(matches!(turn.status, TurnStatus::Failed { .. }));
        assert_eq!(session.turns().len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_leaves_log_untouched() {
        let provider = Arc::new(MockProvider::always("slow").with_delay(Duration::from_millis(200)));
        let p = paper("p1", "Forests");
        let mut session = QaSession::grounded(provider, fast(), &p, &report_for(&p, vec![])).unwrap();
        let err = session
            .ask_within("Anything?", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::DeadlineExceeded(_)));
        assert!(session.turns().is_empty());
    }

    #[test]
    fn test_second_paper_is_refused() {
        let provider = Arc::new(MockProvider::always("a"));
        let p1 = paper("p1", "One");
        let p2 = paper("p2", "Two");
        let mut session = QaSession::grounded(provider, fast(), &p1, &report_for(&p1, vec![])).unwrap();
        assert!(session.load_paper(&p1, &report_for(&p1, vec![])).is_ok());
        assert!(matches!(
            session.load_paper(&p2, &report_for(&p2, vec![])),
            Err(SessionError::PaperMismatch { .. })
        ));
        assert_eq!(session.grounding().unwrap().paper_id, "p1");
    }

    #[test]
    fn test_report_must_match_paper() {
        let provider = Arc::new(MockProvider::always("a"));
        let p1 = paper("p1", "One");
        let p2 = paper("p2", "Two");
        assert!(QaSession::grounded(provider, fast(), &p1, &report_for(&p2, vec![])).is_err());
    }

    #[tokio::test]
    async fn test_suggestions_skip_visited_methods() {
        let provider = Arc::new(MockProvider::always("Random forest was tuned by grid search."));
        let p = paper("p1", "Forests");
        let mut session =
            QaSession::grounded(provider, fast(), &p, &report_for(&p, vec![rf(), ttest()])).unwrap();
        session.ask("How was the model tuned?").await.unwrap();

        let first = session.suggest_questions().unwrap();
        assert!(first[0].contains("Welch t-test"));
        assert!(!first.iter().any(|q| q.contains("Random forest")));

        let second = session.suggest_questions().unwrap();
        assert!(!second.iter().any(|q| q.contains("Welch t-test")));
        for q in &second {
            assert!(!first.contains(q), "repeated suggestion: {q}");
        }
    }

    #[test]
    fn test_generic_questions_exclude_asked_ones() {
        let provider = Arc::new(MockProvider::always("a"));
        let p = paper("p1", "Forests");
        let mut session = QaSession::grounded(provider, fast(), &p, &report_for(&p, vec![])).unwrap();
        session.turns.push(ConversationTurn {
            question: GENERIC_QUESTIONS[0].to_string(),
            answer: "a".to_string(),
            timestamp: Utc::now(),
            referenced_methods: Vec::new(),
            status: TurnStatus::Answered,
        });
        let suggestions = session.suggest_questions().unwrap();
        assert_eq!(suggestions.len(), GENERIC_QUESTIONS.len() - 1);
        assert!(!suggestions.contains(&GENERIC_QUESTIONS[0].to_string()));
        assert!(session.suggest_questions().unwrap().is_empty());
    }

    #[test]
    fn test_digest_tracks_text() {
        let a = paper("p1", "One");
        let b = a.clone().with_full_text("Different body.");
        assert_ne!(text_digest(&a), text_digest(&b));
        assert_eq!(text_digest(&a).len(), 64);
    }
}
