//! Script generation from extracted method records.
//!
//! Generation is a pure transformation: one [`GeneratedScript`] per method,
//! no filesystem access. Gaps are reported on the script, never guessed and
//! never left as raw tokens in the output.

use crate::packages::tool_package;
use crate::registry::{MatchKind, TemplateRegistry};
use crate::template::{segments, CodeTemplate, Language, Placeholder, PlaceholderKind, Segment};
use litmine_model::{format_number, normalize_name, param_key, parse_number, slugify, ExtractedMethod, MethodId, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Preferred output language; templates in other languages are used
    /// only when none exist in this one.
    pub language: Language,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            language: Language::Python,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStatus {
    Complete,
    /// At least one required placeholder had no usable value.
    Incomplete,
}

/// A parameter that could not be used for a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingIssue {
    pub placeholder: String,
    pub parameter: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedScript {
    pub method_id: MethodId,
    pub method_name: String,
    pub template_id: String,
    pub match_kind: MatchKind,
    pub language: Language,
    pub file_name: String,
    pub code: String,
    /// Sorted, deduplicated.
    pub dependencies: Vec<String>,
    /// Rendered literal per declared placeholder.
    pub bindings: BTreeMap<String, String>,
    pub issues: Vec<BindingIssue>,
    /// Required placeholders rendered as the language's null.
    pub missing: Vec<String>,
    pub status: ScriptStatus,
    pub description: String,
    pub usage: String,
}

impl GeneratedScript {
    pub fn is_complete(&self) -> bool {
        self.status == ScriptStatus::Complete
    }
}

pub struct CodeGenerator {
    registry: TemplateRegistry,
    config: GeneratorConfig,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(TemplateRegistry::builtin(), GeneratorConfig::default())
    }
}

impl CodeGenerator {
    pub fn new(registry: TemplateRegistry, config: GeneratorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// One script per method, in input order.
    pub fn generate(&self, methods: &[ExtractedMethod], paper_title: &str) -> Vec<GeneratedScript> {
        methods
            .iter()
            .filter_map(|m| self.generate_one(m, paper_title))
            .collect()
    }

    /// Script for a single method; `None` only if the registry has no template at all.
    pub fn generate_one(&self, method: &ExtractedMethod, paper_title: &str) -> Option<GeneratedScript> {
        let selection = self.registry.lookup(method.category, Some(self.config.language));
        let template = choose_template(&selection.templates, method)?;
        let language = template.language;

        let mut issues = Vec::new();
        let mut missing = Vec::new();
        let mut bindings = BTreeMap::new();
        for placeholder in &template.placeholders {
            let literal = bind(placeholder, method, language, &mut issues, &mut missing);
            bindings.insert(placeholder.name.clone(), literal);
        }

        let mut values: BTreeMap<&str, String> = bindings
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        values.insert("paper_title", one_line(paper_title));
        values.insert("method_name", one_line(&method.name));
        values.insert("method_description", one_line(&method.description));
        values.insert("datasets", list_or_none(&method.datasets));
        values.insert("tools", list_or_none(&method.tools));
        values.insert("parameters", parameters_literal(method, language));

        let mut code = self.render(template, &values, &mut issues);
        if !missing.is_empty() {
            code = with_missing_banner(code, &missing, language);
        }

        let dependencies = self.dependencies(template, method);
        let file_name = format!(
            "{}_{}.{}",
            method.category.slug(),
            slugify(&method.name).replace('-', "_"),
            language.extension()
        );
        let usage = usage_text(template, &file_name, &dependencies, language);
        let description = format!(
            "{} for {} ({}), from \"{}\"",
            template.description,
            one_line(&method.name),
            method.category,
            one_line(paper_title)
        );
        let status = if missing.is_empty() {
            ScriptStatus::Complete
        } else {
            ScriptStatus::Incomplete
        };

        tracing::debug!(
            method_id = %method.id,
            template = %template.id,
            match_kind = ?selection.match_kind,
            missing = missing.len(),
            issues = issues.len(),
            "script generated"
        );

        Some(GeneratedScript {
            method_id: method.id.clone(),
            method_name: method.name.clone(),
            template_id: template.id.clone(),
            match_kind: selection.match_kind,
            language,
            file_name,
            code,
            dependencies,
            bindings,
            issues,
            missing,
            status,
            description,
            usage,
        })
    }

    /// Template dependencies ∪ its fragments' dependencies ∪ tool-implied packages.
    fn dependencies(&self, template: &CodeTemplate, method: &ExtractedMethod) -> Vec<String> {
        let mut deps: BTreeSet<String> = template.dependencies.iter().cloned().collect();
        for name in template.fragment_refs() {
            if let Some(fragment) = self.registry.fragments().get(&name, template.language) {
                deps.extend(fragment.dependencies.iter().cloned());
            }
        }
        for tool in &method.tools {
            if let Some(package) = tool_package(tool, template.language) {
                deps.insert(package.to_string());
            }
        }
        deps.into_iter().collect()
    }

    fn render(
        &self,
        template: &CodeTemplate,
        values: &BTreeMap<&str, String>,
        issues: &mut Vec<BindingIssue>,
    ) -> String {
        let mut out = String::with_capacity(template.body.len() * 2);
        for segment in parse_or_text(&template.body) {
            match segment {
                Segment::Fragment(name) => {
                    match self.registry.fragments().get(name, template.language) {
                        Some(fragment) => {
                            for inner in parse_or_text(&fragment.body) {
                                emit(inner, values, template.language, &mut out, issues);
                            }
                        }
                        None => issues.push(BindingIssue {
                            placeholder: format!("> {name}"),
                            parameter: None,
                            message: "fragment not found".to_string(),
                        }),
                    }
                }
                other => emit(other, values, template.language, &mut out, issues),
            }
        }
        neutralize(&out)
    }
}

/// Union of every script's dependencies, sorted.
pub fn requirements(scripts: &[GeneratedScript]) -> Vec<String> {
    scripts
        .iter()
        .flat_map(|s| s.dependencies.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Highest keyword score on name and description; ties keep declaration order.
fn choose_template<'a>(candidates: &[&'a CodeTemplate], method: &ExtractedMethod) -> Option<&'a CodeTemplate> {
    let haystack = format!(
        " {} {} ",
        normalize_name(&method.name),
        normalize_name(&method.description)
    );
    let score = |t: &CodeTemplate| {
        t.keywords
            .iter()
            .map(|k| normalize_name(k))
            .filter(|k| !k.is_empty() && haystack.contains(&format!(" {k} ")))
            .count()
    };

    let mut best: Option<(&'a CodeTemplate, usize)> = None;
    for &candidate in candidates {
        let s = score(candidate);
        match best {
            Some((_, top)) if s <= top => {}
            _ => best = Some((candidate, s)),
        }
    }
    best.map(|(t, _)| t)
}

fn parse_or_text(body: &str) -> Vec<Segment<'_>> {
    segments(body).unwrap_or_else(|_| vec![Segment::Text(body)])
}

fn emit(
    segment: Segment<'_>,
    values: &BTreeMap<&str, String>,
    language: Language,
    out: &mut String,
    issues: &mut Vec<BindingIssue>,
) {
    match segment {
        Segment::Text(text) => out.push_str(&neutralize(text)),
        Segment::Placeholder(name) => match values.get(name) {
            Some(value) => out.push_str(&neutralize(value)),
            None => {
                issues.push(BindingIssue {
                    placeholder: name.to_string(),
                    parameter: None,
                    message: "placeholder not declared".to_string(),
                });
                out.push_str(language.null_literal());
            }
        },
        Segment::Fragment(_) => {}
    }
}

/// Break up brace pairs so substituted text can never read as a token.
fn neutralize(text: &str) -> String {
    let mut s = text.to_string();
    while s.contains("{{") || s.contains("}}") {
        s = s.replace("{{", "{ {").replace("}}", "} }");
    }
    s
}

fn bind(
    placeholder: &Placeholder,
    method: &ExtractedMethod,
    language: Language,
    issues: &mut Vec<BindingIssue>,
    missing: &mut Vec<String>,
) -> String {
    let wanted: Vec<String> = placeholder.spellings().map(param_key).collect();
    let found = method
        .parameters
        .iter()
        .find(|(key, _)| wanted.contains(&param_key(key)));

    if let Some((key, value)) = found {
        match coerce(value, placeholder.kind) {
            Ok(literal) => return literal.render(language),
            Err(message) => issues.push(BindingIssue {
                placeholder: placeholder.name.clone(),
                parameter: Some(key.clone()),
                message,
            }),
        }
    }

    if let Some(default) = &placeholder.default {
        match coerce(default, placeholder.kind) {
            Ok(literal) => return literal.render(language),
            Err(message) => issues.push(BindingIssue {
                placeholder: placeholder.name.clone(),
                parameter: None,
                message: format!("default unusable: {message}"),
            }),
        }
    }

    if placeholder.required {
        missing.push(placeholder.name.clone());
    }
    language.null_literal().to_string()
}

/// A value coerced to a placeholder's kind.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    TextList(Vec<String>),
    NumberList(Vec<f64>),
}

impl Literal {
    fn render(&self, language: Language) -> String {
        match (self, language) {
            (Literal::Text(s), _) => quote(s),
            (Literal::Integer(n), _) => n.to_string(),
            (Literal::Float(f), _) => float_literal(*f),
            (Literal::Bool(b), Language::Python) => (if *b { "True" } else { "False" }).to_string(),
            (Literal::Bool(b), Language::R) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            (Literal::TextList(items), _) => {
                sequence(items.iter().map(|s| quote(s)).collect(), language, "character(0)")
            }
            (Literal::NumberList(items), _) => sequence(
                items.iter().map(|n| format_number(*n)).collect(),
                language,
                "numeric(0)",
            ),
        }
    }
}

fn sequence(items: Vec<String>, language: Language, empty_r: &str) -> String {
    match language {
        Language::Python => format!("[{}]", items.join(", ")),
        Language::R if items.is_empty() => empty_r.to_string(),
        Language::R => format!("c({})", items.join(", ")),
    }
}

fn coerce(value: &ParamValue, kind: PlaceholderKind) -> Result<Literal, String> {
    match kind {
        PlaceholderKind::Text => match value {
            ParamValue::Text(s) => Ok(Literal::Text(s.clone())),
            ParamValue::Number(n) => Ok(Literal::Text(format_number(*n))),
            ParamValue::List(items) => Ok(Literal::Text(
                items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", "),
            )),
            ParamValue::Unknown(_) => Err(unusable(value, "text")),
        },
        PlaceholderKind::Integer => match number_of(value) {
            Some(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Ok(Literal::Integer(n as i64)),
            Some(n) => Err(format!("expected an integer, got {}", format_number(n))),
            None => Err(unusable(value, "an integer")),
        },
        PlaceholderKind::Float => number_of(value)
            .map(Literal::Float)
            .ok_or_else(|| unusable(value, "a number")),
        PlaceholderKind::Bool => bool_of(value)
            .map(Literal::Bool)
            .ok_or_else(|| unusable(value, "a boolean")),
        PlaceholderKind::TextList => match value {
            ParamValue::List(items) => Ok(Literal::TextList(items.iter().map(|i| i.to_string()).collect())),
            ParamValue::Text(s) => Ok(Literal::TextList(
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            ParamValue::Number(n) => Ok(Literal::TextList(vec![format_number(*n)])),
            ParamValue::Unknown(_) => Err(unusable(value, "a list of text")),
        },
        PlaceholderKind::NumberList => match value {
            ParamValue::List(items) => items
                .iter()
                .map(|i| i.as_f64().or_else(|| i.as_text().and_then(parse_number)))
                .collect::<Option<Vec<f64>>>()
                .map(Literal::NumberList)
                .ok_or_else(|| unusable(value, "a list of numbers")),
            ParamValue::Number(n) => Ok(Literal::NumberList(vec![*n])),
            ParamValue::Text(s) => match ParamValue::from_text(s) {
                ParamValue::Text(_) => Err(unusable(value, "a list of numbers")),
                parsed => coerce(&parsed, kind),
            },
            ParamValue::Unknown(_) => Err(unusable(value, "a list of numbers")),
        },
    }
}

fn number_of(value: &ParamValue) -> Option<f64> {
    match value {
        ParamValue::Number(n) => Some(*n),
        ParamValue::Text(s) => parse_number(s),
        ParamValue::List(items) if items.len() == 1 => number_of(&items[0]),
        _ => None,
    }
}

fn bool_of(value: &ParamValue) -> Option<bool> {
    match value {
        ParamValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "t" | "1" => Some(true),
            "false" | "no" | "n" | "f" | "0" => Some(false),
            _ => None,
        },
        ParamValue::Number(n) if *n == 1.0 => Some(true),
        ParamValue::Number(n) if *n == 0.0 => Some(false),
        ParamValue::Unknown(serde_json::Value::Bool(b)) => Some(*b),
        _ => None,
    }
}

fn unusable(value: &ParamValue, wanted: &str) -> String {
    format!("{} value {} cannot be used as {wanted}", value.kind(), value)
}

fn float_literal(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Double-quoted string literal, valid in both Python and R.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn param_literal(value: &ParamValue, language: Language) -> String {
    match value {
        ParamValue::Text(s) => quote(s),
        ParamValue::Number(n) => format_number(*n),
        ParamValue::List(items) => sequence(
            items.iter().map(|i| param_literal(i, language)).collect(),
            language,
            "list()",
        ),
        ParamValue::Unknown(_) => language.null_literal().to_string(),
    }
}

fn parameters_literal(method: &ExtractedMethod, language: Language) -> String {
    let entries: Vec<(String, String)> = method
        .parameters
        .iter()
        .map(|(k, v)| (quote(k), param_literal(v, language)))
        .collect();
    match language {
        Language::Python => {
            let body: Vec<String> = entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            format!("{{{}}}", body.join(", "))
        }
        Language::R => {
            let body: Vec<String> = entries.iter().map(|(k, v)| format!("{k} = {v}")).collect();
            format!("list({})", body.join(", "))
        }
    }
}

/// Collapse to one line for use inside comments.
fn one_line(s: &str) -> String {
    let joined = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        "not reported".to_string()
    } else {
        joined
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none reported".to_string()
    } else {
        one_line(&items.join(", "))
    }
}

fn with_missing_banner(code: String, missing: &[String], language: Language) -> String {
    let banner = format!(
        "# WARNING: required parameters not stated in the paper: {}\n# They are set to {} below; fill them in before running.\n",
        missing.join(", "),
        language.null_literal()
    );
    match code.strip_prefix("#!") {
        Some(_) => match code.find('\n') {
            Some(end) => format!("{}{}{}", &code[..=end], banner, &code[end + 1..]),
            None => format!("{code}\n{banner}"),
        },
        None => format!("{banner}{code}"),
    }
}

fn usage_text(template: &CodeTemplate, file_name: &str, deps: &[String], language: Language) -> String {
    let run = template.usage.replace("{script}", file_name);
    if deps.is_empty() {
        return run;
    }
    let install = match language {
        Language::Python => format!("pip install {}", deps.join(" ")),
        Language::R => format!(
            "Rscript -e 'install.packages(c({}))'",
            deps.iter().map(|d| quote(d)).collect::<Vec<_>>().join(", ")
        ),
    };
    format!("{install}\n{run}")
}
