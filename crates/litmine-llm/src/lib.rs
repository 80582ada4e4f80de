//! Litmine LLM: method extraction and paper-grounded conversation
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        LITMINE LLM PIPELINE                          │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  PaperMetadata ──► TextNormalizer ──► Passage*                       │
//! │                                          │                           │
//! │                                          ▼                           │
//! │                         ┌──────────────────────────────┐             │
//! │                         │ MethodExtractor              │             │
//! │                         │  bounded pool, retry, parse  │──► Report   │
//! │                         └──────────────────────────────┘      │      │
//! │                                          ▲                    │      │
//! │                                          │                    ▼      │
//! │  ┌───────────┐                    ┌──────┴──────┐     ┌───────────┐  │
//! │  │    LLM    │◄───────────────────│ LLMProvider │◄────│ QaSession │  │
//! │  │ (OpenAI,  │                    │   (trait)   │     │ grounding │  │
//! │  │ Anthropic,│                    └─────────────┘     │ + turns   │  │
//! │  │  Local)   │                                        └───────────┘  │
//! │  └───────────┘                                                       │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The provider is a trait object so tests and dry runs use
//! [`providers::MockProvider`] while real runs pick an HTTP client behind the
//! `openai`, `anthropic` or `local` features.

pub mod extraction;
pub mod llm;
pub mod providers;
pub mod retry;
pub mod session;

pub use extraction::{
    output_contract, ExtractError, ExtractionReport, ExtractorConfig, MethodExtractor,
    PassageOutcome, PassageStatus, SchemaIssue,
};
pub use llm::{
    CompletionRequest, CompletionResponse, ConfigError, LLMConfig, LLMError, LLMProvider,
    Message, Provider, Role,
};
pub use providers::{create_provider, MockProvider};
pub use retry::{complete_with_retry, with_retry, RetryConfig, RetryError};
pub use session::{
    ConversationTurn, ExportedPaper, GroundingSnapshot, QaSession, SessionConfig, SessionError,
    SessionExport, TurnStatus,
};
