use crate::{provider, read_json, write_json, ProviderArgs};
use anyhow::Result;
use colored::Colorize;
use litmine_ingest::PaperMetadata;
use litmine_llm::{ExtractionReport, QaSession, SessionConfig, SessionError, TurnStatus};
use std::path::Path;
use std::time::Duration;
use tokio::runtime::Runtime;

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_ask(
    rt: &Runtime,
    paper_path: &Path,
    report_path: &Path,
    questions: &[String],
    suggest: bool,
    export: Option<&Path>,
    deadline: Option<Duration>,
    provider_args: &ProviderArgs,
) -> Result<()> {
    let paper: PaperMetadata = read_json(paper_path)?;
    let report: ExtractionReport = read_json(report_path)?;
    let provider = provider::select(provider_args)?;

    let mut session = QaSession::grounded(provider, SessionConfig::default(), &paper, &report)?;
    println!(
        "{} {} (session {})",
        "Grounded on".green().bold(),
        paper.title,
        session.id()
    );

    for question in questions {
        let asked = match deadline {
            Some(d) => rt.block_on(session.ask_within(question, d)),
            None => rt.block_on(session.ask(question)),
        };
        match asked {
            Ok(turn) => {
                println!("\n{} {}", "Q:".cyan().bold(), turn.question);
                match &turn.status {
                    TurnStatus::Answered => {
                        println!("{} {}", "A:".green().bold(), turn.answer);
                        if !turn.referenced_methods.is_empty() {
                            let refs: Vec<&str> =
                                turn.referenced_methods.iter().map(|m| m.as_str()).collect();
                            println!("   {} {}", "methods:".dimmed(), refs.join(", "));
                        }
                    }
                    TurnStatus::Failed { reason } => {
                        println!("{} {}", "failed:".red().bold(), reason);
                    }
                }
            }
            Err(SessionError::DeadlineExceeded(d)) => {
                println!(
                    "\n{} {} (no answer within {:?})",
                    "skipped:".yellow().bold(),
                    question,
                    d
                );
            }
            Err(SessionError::EmptyQuestion) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    if suggest || questions.is_empty() {
        println!("\n{}", "Suggested questions:".bold());
        for question in session.suggest_questions()? {
            println!("  {} {}", "?".cyan(), question);
        }
    }

    if let Some(path) = export {
        write_json(path, &session.export())?;
    }
    Ok(())
}
