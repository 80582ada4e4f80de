//! Parameter values as they arrive from model output.
//!
//! Models report parameters as strings, numbers, lists, or whatever else they
//! feel like. [`ParamValue`] pins that down to four shapes; everything outside
//! the first three is kept verbatim as [`ParamValue::Unknown`] so callers can
//! flag it instead of guessing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Loosely-typed parameter value, validated at the extraction boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Text(String),
    Number(f64),
    /// Flat list of text/number scalars.
    List(Vec<ParamValue>),
    /// Any other shape (objects, booleans, nulls, nested lists), kept as-is.
    Unknown(serde_json::Value),
}

impl ParamValue {
    /// Classify a JSON value from a model response.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::from_text(s),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => ParamValue::Number(f),
                _ => ParamValue::Unknown(value.clone()),
            },
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match Self::from_json(item) {
                        scalar @ (ParamValue::Text(_) | ParamValue::Number(_)) => out.push(scalar),
                        _ => return ParamValue::Unknown(value.clone()),
                    }
                }
                ParamValue::List(out)
            }
            other => ParamValue::Unknown(other.clone()),
        }
    }

    /// Classify a free-text value.
    ///
    /// Plain numerals become [`ParamValue::Number`]; bracketed lists
    /// (`"[0.1, 0.5]"`) and all-numeric comma lists (`"10, 50, 100"`) become
    /// [`ParamValue::List`]; everything else stays text.
    pub fn from_text(raw: &str) -> Self {
        let s = raw.trim();

        if let Some(n) = parse_number(s) {
            return ParamValue::Number(n);
        }

        if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let items: Vec<ParamValue> = inner
                .split(',')
                .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\''))
                .filter(|part| !part.is_empty())
                .map(scalar_from_text)
                .collect();
            return ParamValue::List(items);
        }

        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() > 1 && parts.iter().all(|p| parse_number(p).is_some()) {
                return ParamValue::List(
                    parts
                        .iter()
                        .filter_map(|p| parse_number(p))
                        .map(ParamValue::Number)
                        .collect(),
                );
            }
        }

        ParamValue::Text(s.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ParamValue::Unknown(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Text(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Text(_) => "text",
            ParamValue::Number(_) => "number",
            ParamValue::List(_) => "list",
            ParamValue::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{}", format_number(*n)),
            ParamValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            ParamValue::Unknown(v) => write!(f, "{v}"),
        }
    }
}

fn scalar_from_text(s: &str) -> ParamValue {
    match parse_number(s) {
        Some(n) => ParamValue::Number(n),
        None => ParamValue::Text(s.to_string()),
    }
}

/// Parse a plain numeral. Rejects `inf`/`nan` spellings and trailing units.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty()
        || !s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        || !s.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
