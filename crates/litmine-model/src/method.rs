//! Extracted method records and their companions.

use crate::{normalize_name, slugify, MethodCategory, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deterministic identifier: `<category-slug>:<name-slug>`.
///
/// Identical model output always yields identical ids, which keeps repeated
/// extraction runs comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(String);

impl MethodId {
    pub fn new(category: MethodCategory, name: &str) -> Self {
        Self(format!("{}:{}", category.slug(), slugify(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Annotations attached at the extraction boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "flag", content = "detail", rename_all = "snake_case")]
pub enum MethodFlag {
    /// The entry was structurally damaged; confidence was capped.
    ForcedLowConfidence,
    /// A parameter arrived in a shape no placeholder can bind.
    UnknownParameter(String),
    /// Source text was partial or abstract-only; confidence was scaled down.
    ReducedSourceText,
}

/// One computational method found in a paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMethod {
    pub id: MethodId,
    pub category: MethodCategory,
    pub name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ParamValue>,
    pub datasets: Vec<String>,
    pub tools: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub code_available: bool,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Indices of the passages this record was seen in.
    #[serde(default)]
    pub source_passages: Vec<usize>,
    #[serde(default)]
    pub flags: Vec<MethodFlag>,
}

impl ExtractedMethod {
    /// Minimal record; the id is derived from category and name.
    pub fn new(category: MethodCategory, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: MethodId::new(category, &name),
            category,
            name,
            description: String::new(),
            parameters: BTreeMap::new(),
            datasets: Vec::new(),
            tools: Vec::new(),
            languages: Vec::new(),
            code_available: false,
            confidence: 0.0,
            source_passages: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn has_flag(&self, flag: &MethodFlag) -> bool {
        self.flags.contains(flag)
    }

    /// Case-insensitive tool membership.
    pub fn uses_tool(&self, tool: &str) -> bool {
        let needle = normalize_name(tool);
        self.tools.iter().any(|t| normalize_name(t) == needle)
    }

    /// Look up a parameter by normalized key (`"N estimators"` finds `n_estimators`).
    pub fn parameter(&self, key: &str) -> Option<&ParamValue> {
        let wanted = param_key(key);
        self.parameters
            .iter()
            .find(|(k, _)| param_key(k) == wanted)
            .map(|(_, v)| v)
    }
}

/// Normalize a parameter key to `snake_case` for matching.
pub fn param_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// A dataset referenced by the paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub size: Option<String>,
}

/// An analysis pipeline described in the paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub input_data: Vec<String>,
    #[serde(default)]
    pub output_data: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}
