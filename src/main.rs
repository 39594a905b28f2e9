use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use log::info;
use std::path::{Path, PathBuf};
use terms_analyzer::{logging, AnalysisOrchestrator, AnalysisResult, Config, Severity};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a document and report its sections and risks
    Analyze {
        /// Plain-text document to analyze
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Ask a free-form question about a document
    Ask {
        /// Plain-text document to ask about
        file: PathBuf,

        /// The question
        question: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let orchestrator = AnalysisOrchestrator::from_config(&config)?;

    match cli.command {
        Command::Analyze { file, format } => {
            let document = read_document(&file).await?;
            info!("Analyzing {} ({} bytes)", file.display(), document.len());

            let result = orchestrator.analyze_document(&document).await?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                Format::Text => print_analysis(&result),
            }
        }
        Command::Ask { file, question } => {
            let document = read_document(&file).await?;
            let answer = orchestrator.query_document(&document, &question).await;
            println!("{}", answer);
        }
    }

    Ok(())
}

async fn read_document(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document {}", path.display()))
}

fn print_analysis(result: &AnalysisResult) {
    if result.is_degraded() {
        println!("{}", result.summary.bright_red().bold());
    } else {
        println!("\n{}", "Summary".bright_green().bold());
        println!("{}", result.summary);
    }

    for section in &result.sections {
        println!("\n{}", section.title.bright_cyan().bold());
        println!("{}", section.content);
    }

    println!("\n{}", "Risks".bright_yellow().bold());
    for risk in &result.risks {
        let severity = match risk.severity {
            Severity::High => "HIGH".red().bold(),
            Severity::Medium => "MEDIUM".yellow().bold(),
            Severity::Low => "LOW".green().bold(),
        };
        println!("  [{}] {}", severity, risk.description);
        if !risk.tags.is_empty() {
            println!("         {}", risk.tags.join(", ").dimmed());
        }
    }
}
