//! Litmine code generation
//!
//! Turns extracted method records into runnable analysis skeletons.
//!
//! ```text
//! ExtractedMethod ──► TemplateRegistry::lookup ──► keyword choice
//!                                                       │
//!                      parameters ──► coerce ──► bind ──┤
//!                                                       ▼
//!                                  render (fragments spliced) ──► GeneratedScript
//! ```
//!
//! Templates are plain text with `{{name}}` placeholders and `{{> fragment}}`
//! references. Every placeholder a template uses is declared with a kind and
//! an optional default, so a value the paper did not state is either filled
//! from the default or reported as missing. Output never contains an unfilled
//! token.

mod builtin;
pub mod fragments;
pub mod generator;
pub mod packages;
pub mod registry;
pub mod template;

pub use fragments::{Fragment, FragmentLibrary};
pub use generator::{
    requirements, BindingIssue, CodeGenerator, GeneratedScript, GeneratorConfig, ScriptStatus,
};
pub use packages::tool_package;
pub use registry::{validate, MatchKind, RegistryError, TemplateRegistry, TemplateSelection};
pub use template::{CodeTemplate, Language, Placeholder, PlaceholderKind, CONTEXT_PLACEHOLDERS};
