use crate::{provider, read_json, write_json, ProviderArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use litmine_ingest::{PaperMetadata, SectionHint};
use litmine_llm::{ExtractionReport, ExtractorConfig, MethodExtractor, PassageStatus};
use std::path::Path;
use std::time::Duration;
use tokio::runtime::Runtime;

pub(crate) fn cmd_extract(
    rt: &Runtime,
    paper_path: &Path,
    out: &Path,
    sections: &[String],
    deadline: Option<Duration>,
    provider_args: &ProviderArgs,
) -> Result<()> {
    let paper: PaperMetadata = read_json(paper_path)?;
    println!(
        "{} {} ({})",
        "Extracting".green().bold(),
        paper.title,
        paper.id
    );

    let provider = provider::select(provider_args)?;
    let config = ExtractorConfig::from_env().context("reading LITMINE_* settings")?;
    let extractor = MethodExtractor::new(provider, config);
    let hints: Vec<SectionHint> = sections.iter().map(SectionHint::new).collect();

    let report = match deadline {
        Some(d) => rt.block_on(extractor.extract_within(&paper, &hints, d))?,
        None => rt.block_on(extractor.extract(&paper, &hints)),
    };

    print_report(&report);
    write_json(out, &report)
}

fn print_report(report: &ExtractionReport) {
    let failed = report.failed_passages().count();
    println!(
        "  {} methods={} datasets={} workflows={} passages={} failed={} text={:?}",
        "→".cyan(),
        report.methods.len(),
        report.datasets.len(),
        report.workflows.len(),
        report.passages.len(),
        failed,
        report.completeness
    );

    for method in &report.methods {
        let flags = if method.flags.is_empty() {
            String::new()
        } else {
            format!(
                " {}",
                format!("{:?}", method.flags).yellow()
            )
        };
        println!(
            "    {} {} [{}] confidence {:.2}{}",
            "•".cyan(),
            method.name.bold(),
            method.category,
            method.confidence,
            flags
        );
    }

    if report.truncated_passages > 0 {
        println!(
            "    {} {} passages past the passage limit were not extracted",
            "warning:".yellow().bold(),
            report.truncated_passages
        );
    }

    for outcome in report.failed_passages() {
        let detail = match &outcome.status {
            PassageStatus::Malformed { reason } => format!("malformed reply: {reason}"),
            PassageStatus::ProviderFailed { attempts, error } => {
                format!("provider failed after {attempts} attempts: {error}")
            }
            PassageStatus::Extracted { .. } => continue,
        };
        println!(
            "    {} passage {} {}",
            "warning:".yellow().bold(),
            outcome.index + 1,
            detail
        );
    }
}
