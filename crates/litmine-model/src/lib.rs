//! Litmine data model
//!
//! Structured records describing the computational methods found in a paper.
//! These types are produced once by the extractor and then only read: the code
//! generator binds them into templates and the conversation session grounds on
//! them.
//!
//! ```text
//! raw text ──► passages ──► ExtractedMethod* ──┬──► GeneratedScript*
//!                                              └──► QaSession grounding
//! ```
//!
//! Free-text values coming back from a language model are validated here at the
//! boundary: parameters become a [`ParamValue`], categories become a
//! [`MethodCategory`], and anything that does not fit is flagged rather than
//! coerced.

pub mod category;
pub mod method;
pub mod names;
pub mod value;

pub use category::MethodCategory;
pub use method::{param_key, DatasetRecord, ExtractedMethod, MethodFlag, MethodId, Workflow};
pub use names::{dice_similarity, normalize_name, slugify};
pub use value::{format_number, parse_number, ParamValue};

/// Confidence assigned to records whose model output was structurally damaged.
pub const FORCED_LOW_CONFIDENCE: f64 = 0.25;

/// Clamp a confidence value into `[0, 1]`, mapping non-finite input to zero.
pub fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
