use crate::{read_json, write_json};
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use litmine_codegen::{
    requirements, CodeGenerator, GeneratedScript, GeneratorConfig, Language, PlaceholderKind,
    TemplateRegistry,
};
use litmine_llm::ExtractionReport;
use litmine_model::MethodCategory;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

fn parse_language(raw: &str) -> Result<Language> {
    Language::parse(raw).ok_or_else(|| anyhow!("unknown language `{raw}` (expected python or r)"))
}

pub(crate) fn cmd_generate(
    report_path: &Path,
    out_dir: &Path,
    language: &str,
    title: Option<&str>,
) -> Result<()> {
    let language = parse_language(language)?;
    let report: ExtractionReport = read_json(report_path)?;
    let title = title.unwrap_or(&report.paper_title);

    println!(
        "{} {} scripts for {} methods",
        "Generating".green().bold(),
        language,
        report.methods.len()
    );

    let generator = CodeGenerator::new(TemplateRegistry::builtin(), GeneratorConfig { language });
    let mut scripts = generator.generate(&report.methods, title);
    dedupe_file_names(&mut scripts);

    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    for script in &scripts {
        let path = out_dir.join(&script.file_name);
        fs::write(&path, &script.code).with_context(|| format!("writing {}", path.display()))?;
        let status = if script.is_complete() {
            "ok".green().bold()
        } else {
            "incomplete".yellow().bold()
        };
        println!(
            "  {} {} ← {} ({})",
            status,
            path.display(),
            script.template_id,
            script.method_name
        );
        if !script.missing.is_empty() {
            println!("      missing: {}", script.missing.join(", "));
        }
        for issue in &script.issues {
            println!(
                "      {} {}: {}",
                "note:".yellow(),
                issue.placeholder,
                issue.message
            );
        }
    }

    let manifest = match language {
        Language::Python => "requirements.txt",
        Language::R => "packages.txt",
    };
    let mut deps = requirements(&scripts).join("\n");
    deps.push('\n');
    fs::write(out_dir.join(manifest), deps)?;
    write_json(&out_dir.join("scripts.json"), &scripts)
}

/// Two methods may slugify to the same file name; later ones get a numeric suffix.
fn dedupe_file_names(scripts: &mut [GeneratedScript]) {
    let mut used = BTreeSet::new();
    for script in scripts.iter_mut() {
        if used.insert(script.file_name.clone()) {
            continue;
        }
        let ext = script.language.extension();
        let stem = script
            .file_name
            .strip_suffix(&format!(".{ext}"))
            .unwrap_or(&script.file_name)
            .to_string();
        let mut n = 2;
        while !used.insert(format!("{stem}_{n}.{ext}")) {
            n += 1;
        }
        script.file_name = format!("{stem}_{n}.{ext}");
    }
}

pub(crate) fn cmd_templates(category: Option<&str>, language: Option<&str>) -> Result<()> {
    let category = category.map(MethodCategory::parse);
    let language = language.map(parse_language).transpose()?;
    let registry = TemplateRegistry::builtin();

    for template in registry.templates() {
        if category.is_some_and(|c| c != template.category) || language.is_some_and(|l| l != template.language) {
            continue;
        }
        let marker = if template.fallback { " (fallback)" } else { "" };
        println!(
            "{} [{} / {}]{}",
            template.id.bold(),
            template.category,
            template.language,
            marker
        );
        println!("    {}", template.description);
        for p in &template.placeholders {
            let default = p
                .default
                .as_ref()
                .map(|d| format!(" = {d}"))
                .unwrap_or_default();
            let required = if p.required { " (required)" } else { "" };
            println!("    {} {}: {}{}{}", "-".cyan(), p.name, kind_name(p.kind), default, required);
        }
        if !template.dependencies.is_empty() {
            println!("    deps: {}", template.dependencies.join(", "));
        }
    }
    Ok(())
}

fn kind_name(kind: PlaceholderKind) -> &'static str {
    match kind {
        PlaceholderKind::Text => "text",
        PlaceholderKind::Integer => "integer",
        PlaceholderKind::Float => "float",
        PlaceholderKind::Bool => "bool",
        PlaceholderKind::TextList => "text list",
        PlaceholderKind::NumberList => "number list",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litmine_model::ExtractedMethod;

    #[test]
    fn test_dedupe_file_names() {
        let generator = CodeGenerator::default();
        let a = ExtractedMethod::new(MethodCategory::Statistical, "t test");
        let b = ExtractedMethod::new(MethodCategory::Statistical, "t-test");
        let mut scripts = generator.generate(&[a.clone(), b, a], "T");
        dedupe_file_names(&mut scripts);
        let names: Vec<&str> = scripts.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, vec!["stat_t_test.py", "stat_t_test_2.py", "stat_t_test_3.py"]);
    }

    #[test]
    fn test_parse_language() {
        assert_eq!(parse_language("R").unwrap(), Language::R);
        assert!(parse_language("julia").is_err());
    }
}
