//! Litmine CLI
//!
//! Thin driver over the library crates:
//! - `extract`: paper JSON → extraction report JSON
//! - `generate`: extraction report → analysis scripts plus a package manifest
//! - `ask`: grounded questions about one paper, with optional transcript export
//! - `templates`: list the built-in template registry

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod ask;
mod extract;
mod generate;
mod provider;

#[derive(Parser)]
#[command(name = "litmine")]
#[command(
    author,
    version,
    about = "Litmine: mine computational methods from papers into runnable analysis skeletons"
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

/// Language model selection shared by commands that call one.
#[derive(Args, Debug, Clone)]
pub(crate) struct ProviderArgs {
    /// `auto` (first provider configured in the environment), `mock`,
    /// `openai`, `anthropic` or `local`.
    #[arg(long, default_value = "auto")]
    pub provider: String,
    /// File whose contents the mock provider returns for every request.
    #[arg(long)]
    pub mock_response: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract methods, datasets and workflows from a paper.
    ///
    /// The paper is a JSON object with `id`, `title` and optionally
    /// `authors`, `abstract`, `full_text`, `journal`, `year`, `doi`, `pubmed_id`.
    Extract {
        /// Input paper JSON
        paper: PathBuf,
        /// Output report JSON
        #[arg(short, long)]
        out: PathBuf,
        /// Section heading to extract from (repeatable); replaces the default
        /// methods-section vocabulary.
        #[arg(long = "section")]
        sections: Vec<String>,
        /// Give up on the whole paper after this many seconds.
        #[arg(long)]
        deadline_secs: Option<u64>,
        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Generate analysis scripts from an extraction report.
    Generate {
        /// Input report JSON (from `extract`)
        report: PathBuf,
        /// Directory receiving scripts, `scripts.json` and the package manifest
        #[arg(short, long)]
        out_dir: PathBuf,
        /// Preferred script language: python or r
        #[arg(long, default_value = "python")]
        language: String,
        /// Title to cite in script headers (default: the report's paper title)
        #[arg(long)]
        title: Option<String>,
    },

    /// Ask questions grounded in one paper and its extraction report.
    Ask {
        /// Paper JSON
        paper: PathBuf,
        /// Report JSON (from `extract`)
        report: PathBuf,
        /// Question to ask (repeatable, asked in order)
        #[arg(short, long = "question")]
        questions: Vec<String>,
        /// Print suggested follow-up questions
        #[arg(long)]
        suggest: bool,
        /// Write the session transcript as JSON
        #[arg(long)]
        export: Option<PathBuf>,
        /// Per-question deadline in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// List code templates.
    Templates {
        /// Only templates for this category (statistical, machine_learning, bioinformatics, other)
        #[arg(long)]
        category: Option<String>,
        /// Only templates in this language
        #[arg(long)]
        language: Option<String>,
    },
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    match cli.command {
        Commands::Extract {
            paper,
            out,
            sections,
            deadline_secs,
            provider,
        } => extract::cmd_extract(
            &rt,
            &paper,
            &out,
            &sections,
            deadline_secs.map(Duration::from_secs),
            &provider,
        ),
        Commands::Generate {
            report,
            out_dir,
            language,
            title,
        } => generate::cmd_generate(&report, &out_dir, &language, title.as_deref()),
        Commands::Ask {
            paper,
            report,
            questions,
            suggest,
            export,
            deadline_secs,
            provider,
        } => ask::cmd_ask(
            &rt,
            &paper,
            &report,
            &questions,
            suggest,
            export.as_deref(),
            deadline_secs.map(Duration::from_secs),
            &provider,
        ),
        Commands::Templates { category, language } => {
            generate::cmd_templates(category.as_deref(), language.as_deref())
        }
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))?;
    eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    Ok(())
}
