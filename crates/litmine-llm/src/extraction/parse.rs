//! Defensive parsing of one passage's extraction response.
//!
//! Model output is not trusted to follow the contract. A response that holds
//! no JSON object at all is malformed; inside a valid object each method entry
//! is judged on its own, so one broken entry never costs the others.

use litmine_model::{
    clamp_confidence, param_key, DatasetRecord, ExtractedMethod, MethodCategory, MethodFlag,
    ParamValue, Workflow, FORCED_LOW_CONFIDENCE,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Confidence assumed when an entry does not report one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A contract violation found while reading a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// Position of the offending method entry, if the issue is entry-level.
    pub entry: Option<usize>,
    pub field: String,
    pub message: String,
}

impl SchemaIssue {
    fn entry(entry: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            entry: Some(entry),
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn top(field: &str, message: impl Into<String>) -> Self {
        Self {
            entry: None,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Everything read out of one passage response.
#[derive(Debug, Default)]
pub(crate) struct PassageExtraction {
    pub methods: Vec<ExtractedMethod>,
    pub datasets: Vec<DatasetRecord>,
    pub workflows: Vec<Workflow>,
    pub key_findings: Vec<String>,
    pub reproducibility_notes: Vec<String>,
    /// Entries discarded for lacking a usable name.
    pub dropped: usize,
    pub issues: Vec<SchemaIssue>,
}

/// Cut the outermost `{ ... }` out of a response, ignoring fences and chatter.
pub(crate) fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a response. `Err` means the passage as a whole is malformed.
pub(crate) fn parse_response(text: &str, passage: usize) -> Result<PassageExtraction, String> {
    let json = locate_json_object(text).ok_or_else(|| "no JSON object in response".to_string())?;
    let value: Value = serde_json::from_str(json).map_err(|e| format!("invalid JSON: {e}"))?;
    let obj = value
        .as_object()
        .ok_or_else(|| "response is not a JSON object".to_string())?;

    let mut out = PassageExtraction::default();

    match obj.get("computational_methods").or_else(|| obj.get("methods")) {
        Some(Value::Array(entries)) => {
            for (i, entry) in entries.iter().enumerate() {
                match parse_method(entry, i, passage, &mut out.issues) {
                    Some(method) => out.methods.push(method),
                    None => out.dropped += 1,
                }
            }
        }
        Some(Value::Null) | None => out
            .issues
            .push(SchemaIssue::top("computational_methods", "missing")),
        Some(other) => {
            return Err(format!(
                "computational_methods is {}, expected an array",
                json_kind(other)
            ))
        }
    }

    if let Some(v) = obj.get("datasets") {
        out.datasets = parse_datasets(v, &mut out.issues);
    }
    if let Some(v) = obj.get("workflows") {
        out.workflows = parse_workflows(v, &mut out.issues);
    }
    if let Some(v) = obj.get("key_findings") {
        out.key_findings = string_list(v).unwrap_or_else(|| {
            out.issues
                .push(SchemaIssue::top("key_findings", "expected a list of strings"));
            Vec::new()
        });
    }
    if let Some(v) = obj.get("reproducibility_notes") {
        out.reproducibility_notes = string_list(v).unwrap_or_default();
    }

    Ok(out)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

/// A list of non-empty strings; a bare string counts as a one-element list.
fn string_list(v: &Value) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        let s = s.trim();
        if !s.is_empty() && !out.iter().any(|x| x.eq_ignore_ascii_case(s)) {
            out.push(s.to_string());
        }
    };
    match v {
        Value::Null => {}
        Value::String(s) => push(s),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => push(s),
                    Value::Number(n) => push(&n.to_string()),
                    _ => return None,
                }
            }
        }
        _ => return None,
    }
    Some(out)
}

fn parse_method(
    entry: &Value,
    index: usize,
    passage: usize,
    issues: &mut Vec<SchemaIssue>,
) -> Option<ExtractedMethod> {
    let Some(obj) = entry.as_object() else {
        issues.push(SchemaIssue::entry(index, "", "entry is not an object"));
        return None;
    };

    let name = match obj.get("name").and_then(Value::as_str).map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => {
            issues.push(SchemaIssue::entry(index, "name", "missing or empty"));
            return None;
        }
    };

    let mut forced = false;
    let mut flags = Vec::new();

    let category = match obj.get("category") {
        Some(Value::String(s)) => MethodCategory::parse(s),
        None | Some(Value::Null) => MethodCategory::Other,
        Some(other) => {
            issues.push(SchemaIssue::entry(
                index,
                "category",
                format!("expected a string, got {}", json_kind(other)),
            ));
            forced = true;
            MethodCategory::Other
        }
    };

    let mut method = ExtractedMethod::new(category, name);

    match obj.get("description") {
        Some(Value::String(s)) => method.description = s.trim().to_string(),
        None | Some(Value::Null) => {}
        Some(other) => {
            issues.push(SchemaIssue::entry(
                index,
                "description",
                format!("expected a string, got {}", json_kind(other)),
            ));
            forced = true;
        }
    }

    match obj.get("parameters") {
        None | Some(Value::Null) => {}
        Some(v) => match parse_parameters(v) {
            Some(params) => {
                for (key, value) in &params {
                    if value.is_unknown() {
                        flags.push(MethodFlag::UnknownParameter(key.clone()));
                    }
                }
                method.parameters = params;
            }
            None => {
                issues.push(SchemaIssue::entry(
                    index,
                    "parameters",
                    format!("expected an object, got {}", json_kind(v)),
                ));
                forced = true;
            }
        },
    }

    for (field, aliases, target) in [
        ("datasets", &["datasets"][..], &mut method.datasets),
        ("tools", &["tools", "software_tools"][..], &mut method.tools),
        (
            "languages",
            &["languages", "programming_languages"][..],
            &mut method.languages,
        ),
    ] {
        if let Some(v) = first(obj, aliases) {
            match string_list(v) {
                Some(list) => *target = list,
                None => {
                    issues.push(SchemaIssue::entry(index, field, "expected a list of strings"));
                    forced = true;
                }
            }
        }
    }

    if let Some(v) = first(obj, &["code_available", "code_availability"]) {
        match v.as_bool().or_else(|| v.as_str().and_then(parse_yes_no)) {
            Some(b) => method.code_available = b,
            None => {
                issues.push(SchemaIssue::entry(
                    index,
                    "code_available",
                    format!("expected a boolean, got {}", json_kind(v)),
                ));
                forced = true;
            }
        }
    }

    let confidence = match obj.get("confidence") {
        None | Some(Value::Null) => DEFAULT_CONFIDENCE,
        Some(v) => match v
            .as_f64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        {
            Some(c) if (0.0..=1.0).contains(&c) => c,
            _ => {
                issues.push(SchemaIssue::entry(
                    index,
                    "confidence",
                    format!("expected a number in [0, 1], got {v}"),
                ));
                forced = true;
                FORCED_LOW_CONFIDENCE
            }
        },
    };

    method.confidence = clamp_confidence(confidence);
    if forced {
        method.confidence = method.confidence.min(FORCED_LOW_CONFIDENCE);
        flags.insert(0, MethodFlag::ForcedLowConfidence);
    }
    method.flags = flags;
    method.source_passages = vec![passage];

    Some(method)
}

fn parse_yes_no(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "available" => Some(true),
        "false" | "no" | "not available" | "unavailable" => Some(false),
        _ => None,
    }
}

/// Parameters as an object, or as a list of `"key=value"` / `"key: value"` strings.
fn parse_parameters(v: &Value) -> Option<BTreeMap<String, ParamValue>> {
    let mut out = BTreeMap::new();
    match v {
        Value::Object(map) => {
            for (k, v) in map {
                let key = param_key(k);
                if !key.is_empty() {
                    out.insert(key, ParamValue::from_json(v));
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let s = item.as_str()?;
                let (k, v) = s.split_once('=').or_else(|| s.split_once(':'))?;
                let key = param_key(k);
                if key.is_empty() {
                    return None;
                }
                out.insert(key, ParamValue::from_text(v));
            }
        }
        _ => return None,
    }
    Some(out)
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_datasets(v: &Value, issues: &mut Vec<SchemaIssue>) -> Vec<DatasetRecord> {
    let Some(items) = v.as_array() else {
        issues.push(SchemaIssue::top("datasets", "expected an array"));
        return Vec::new();
    };
    let mut out = Vec::new();
    for item in items {
        let record = match item {
            Value::String(name) if !name.trim().is_empty() => DatasetRecord {
                name: name.trim().to_string(),
                description: String::new(),
                source: String::new(),
                format: String::new(),
                size: None,
            },
            Value::Object(obj) if !text_field(obj, "name").is_empty() => DatasetRecord {
                name: text_field(obj, "name"),
                description: text_field(obj, "description"),
                source: text_field(obj, "source"),
                format: text_field(obj, "format"),
                size: Some(text_field(obj, "size")).filter(|s| !s.is_empty()),
            },
            _ => {
                issues.push(SchemaIssue::top("datasets", "entry without a name"));
                continue;
            }
        };
        out.push(record);
    }
    out
}

fn parse_workflows(v: &Value, issues: &mut Vec<SchemaIssue>) -> Vec<Workflow> {
    let Some(items) = v.as_array() else {
        issues.push(SchemaIssue::top("workflows", "expected an array"));
        return Vec::new();
    };
    let list = |obj: &Map<String, Value>, key: &str| {
        obj.get(key).and_then(string_list).unwrap_or_default()
    };
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let name = text_field(obj, "name");
            if name.is_empty() {
                issues.push(SchemaIssue::top("workflows", "entry without a name"));
                return None;
            }
            Some(Workflow {
                name,
                steps: list(obj, "steps"),
                input_data: list(obj, "input_data"),
                output_data: list(obj, "output_data"),
                dependencies: list(obj, "dependencies"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_response() {
        let text = "Here you go:\n```json\n{\"computational_methods\": [{\"name\": \"t-test\", \"category\": \"statistical_analysis\", \"confidence\": 0.9}]}\n```";
        let out = parse_response(text, 0).unwrap();
        assert_eq!(out.methods.len(), 1);
        assert_eq!(out.methods[0].category, MethodCategory::Statistical);
        assert_eq!(out.methods[0].confidence, 0.9);
        assert!(out.methods[0].flags.is_empty());
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(parse_response("I could not find any methods.", 0).is_err());
        assert!(parse_response("{not json}", 0).is_err());
        assert!(parse_response("{\"methods\": \"random forest\"}", 0).is_err());
    }

    #[test]
    fn test_nameless_entries_are_dropped() {
        let text = r#"{"methods": [{"category": "ml"}, {"name": "  "}, 42, {"name": "SVM"}]}"#;
        let out = parse_response(text, 3).unwrap();
        assert_eq!(out.methods.len(), 1);
        assert_eq!(out.dropped, 3);
        assert_eq!(out.methods[0].source_passages, vec![3]);
    }

    #[test]
    fn test_malformed_fields_force_low_confidence() {
        let text = r#"{"computational_methods": [
            {"name": "Random forest", "category": "machine_learning", "confidence": "very high",
             "tools": {"lib": "sklearn"}}
        ]}"#;
        let out = parse_response(text, 0).unwrap();
        let m = &out.methods[0];
        assert!(m.has_flag(&MethodFlag::ForcedLowConfidence));
        assert!(m.confidence <= FORCED_LOW_CONFIDENCE);
        assert!(m.tools.is_empty());
        assert_eq!(out.issues.len(), 2);
    }

    #[test]
    fn test_original_field_aliases() {
        let text = r#"{"computational_methods": [{
            "name": "DESeq2 differential expression",
            "category": "bioinformatics",
            "software_tools": ["R", "DESeq2", "r"],
            "programming_languages": ["R"],
            "parameters": {"padj cutoff": "0.05", "design": "~ condition"}
        }], "reproducibility_notes": "Code on GitHub"}"#;
        let out = parse_response(text, 0).unwrap();
        let m = &out.methods[0];
        assert_eq!(m.tools, vec!["R", "DESeq2"]);
        assert_eq!(m.languages, vec!["R"]);
        assert_eq!(m.parameter("padj_cutoff"), Some(&ParamValue::Number(0.05)));
        assert_eq!(m.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(out.reproducibility_notes, vec!["Code on GitHub"]);
    }

    #[test]
    fn test_unknown_parameter_shapes_are_flagged() {
        let text = r#"{"methods": [{"name": "Lasso", "parameters": {"alpha": 0.1, "grid": {"a": 1}}}]}"#;
        let out = parse_response(text, 0).unwrap();
        let m = &out.methods[0];
        assert!(m.has_flag(&MethodFlag::UnknownParameter("grid".to_string())));
        assert!(!m.has_flag(&MethodFlag::ForcedLowConfidence));
        assert!(m.parameters["grid"].is_unknown());
    }

    #[test]
    fn test_parameter_lists_of_assignments() {
        let text = r#"{"methods": [{"name": "RF", "parameters": ["n_estimators=100", "max depth: 5"]}]}"#;
        let out = parse_response(text, 0).unwrap();
        let m = &out.methods[0];
        assert_eq!(m.parameters["n_estimators"], ParamValue::Number(100.0));
        assert_eq!(m.parameters["max_depth"], ParamValue::Number(5.0));
    }

    #[test]
    fn test_side_records() {
        let text = r#"{"methods": [],
            "datasets": ["TCGA-BRCA", {"name": "GSE1234", "source": "GEO", "size": 120}, {"source": "x"}],
            "workflows": [{"name": "QC then DE", "steps": ["qc", "de"]}],
            "key_findings": ["Gene X is up"]}"#;
        let out = parse_response(text, 0).unwrap();
        assert_eq!(out.datasets.len(), 2);
        assert_eq!(out.datasets[1].size.as_deref(), Some("120"));
        assert_eq!(out.workflows[0].steps, vec!["qc", "de"]);
        assert_eq!(out.key_findings, vec!["Gene X is up"]);
        assert_eq!(out.issues.len(), 1);
    }
}
