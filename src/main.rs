//! `clause-checkr`: locate license text in source files and check obligation clauses against it.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`config::load_config`]).
//! 3. Pick the analyzer: offline rules, or the reasoning backend with `--online` ([`analyzer`]).
//! 4. Extract license blocks and verify obligation clauses, a batch of files at a time.
//! 5. Render the requested report ([`report`]).
//! 6. Exit `0` (clean) or `1` (block not found, clause invalid, or analysis failed).

mod analyzer;
mod backend;
mod cli;
mod config;
mod error;
mod license;
mod models;
mod obligations;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use analyzer::{LicenseAnalyzer, LlmAnalyzer, RuleAnalyzer};
use backend::openai::OpenAiBackend;
use cli::{Cli, Command, ReportFormat};
use config::load_config;
use error::AnalysisError;
use license::spdx::identify;
use models::{FileReport, LicenseBlock, ObligationClause, SourceText};
use obligations::parse_obligations;

/// Files analyzed concurrently.
const BATCH_SIZE: usize = 8;

struct Outcome {
    reports: Vec<FileReport>,
    failures: Vec<(PathBuf, AnalysisError)>,
    /// `false` for `verify`, where the input already is the license text.
    show_block: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let config = load_config(&cwd, cli.config.as_deref())?;

    let outcome = if cli.online {
        let backend = OpenAiBackend::from_config(config.backend.clone())?;
        run(&LlmAnalyzer::new(backend), &cli).await?
    } else {
        run(&RuleAnalyzer::new(&config), &cli).await?
    };

    for (path, err) in &outcome.failures {
        eprintln!("  {} {}: {}", "✗".red(), path.display(), err);
    }

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&outcome.reports, outcome.show_block, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome.reports)?);
        }
        ReportFormat::Raw => {
            print!("{}", report::render_raw(&outcome.reports, outcome.show_block));
        }
    }

    // Exit code: 1 on a missing block, an invalid clause or a failed file
    let failed = !outcome.failures.is_empty()
        || outcome
            .reports
            .iter()
            .any(|r| (outcome.show_block && !r.block.is_found()) || r.has_invalid());

    if failed {
        std::process::exit(1);
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,clause_checkr=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run<A: LicenseAnalyzer>(analyzer: &A, cli: &Cli) -> Result<Outcome> {
    match &cli.command {
        Command::Extract { files, comments } => {
            let inputs = read_inputs(files)?;
            let (reports, failures) = analyze_files(analyzer, inputs, *comments, None, cli).await?;
            Ok(Outcome {
                reports,
                failures,
                show_block: true,
            })
        }
        Command::Verify {
            license,
            obligations,
        } => {
            let text = read_file(license)?;
            let clauses = read_obligations(obligations, cli.quiet)?;

            let (reports, failures) = match analyzer.verify(&text, &clauses).await {
                Ok(assessments) => {
                    let block = if text.trim().is_empty() {
                        LicenseBlock::NotFound
                    } else {
                        LicenseBlock::Found(text.clone())
                    };
                    let report = FileReport {
                        path: license.clone(),
                        identity: identify(&text),
                        block,
                        assessments: Some(assessments),
                    };
                    (vec![report], Vec::new())
                }
                Err(e) => (Vec::new(), vec![(license.clone(), e)]),
            };

            Ok(Outcome {
                reports,
                failures,
                show_block: false,
            })
        }
        Command::Check {
            files,
            obligations,
            comments,
        } => {
            let clauses = read_obligations(obligations, cli.quiet)?;
            let inputs = read_inputs(files)?;
            let (reports, failures) =
                analyze_files(analyzer, inputs, *comments, Some(&clauses), cli).await?;
            Ok(Outcome {
                reports,
                failures,
                show_block: true,
            })
        }
    }
}

async fn analyze_files<A: LicenseAnalyzer>(
    analyzer: &A,
    inputs: Vec<(PathBuf, String)>,
    comments: bool,
    obligations: Option<&[ObligationClause]>,
    cli: &Cli,
) -> Result<(Vec<FileReport>, Vec<(PathBuf, AnalysisError)>)> {
    if !cli.quiet {
        eprintln!(
            "  {} {} file(s) with {}",
            "→".cyan(),
            inputs.len(),
            if cli.online {
                "the reasoning backend"
            } else {
                "offline rules"
            }
        );
    }

    let pb = if cli.online && !cli.quiet {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for batch in inputs.chunks(BATCH_SIZE) {
        let futures: Vec<_> = batch
            .iter()
            .map(|(path, content)| analyze_file(analyzer, path, content, comments, obligations))
            .collect();

        let results = join_all(futures).await;

        for ((path, _), result) in batch.iter().zip(results) {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Analysis failed");
                    failures.push((path.clone(), e));
                }
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    Ok((reports, failures))
}

/// Extract, then verify the found block when obligations were given.
async fn analyze_file<A: LicenseAnalyzer>(
    analyzer: &A,
    path: &Path,
    content: &str,
    comments: bool,
    obligations: Option<&[ObligationClause]>,
) -> Result<FileReport, AnalysisError> {
    let block = analyzer.extract(&SourceText::new(content, comments)).await?;
    let identity = block.as_text().and_then(identify);

    let assessments = match (block.as_text(), obligations) {
        (Some(text), Some(clauses)) => Some(analyzer.verify(text, clauses).await?),
        _ => None,
    };

    Ok(FileReport {
        path: path.to_path_buf(),
        block,
        identity,
        assessments,
    })
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_inputs(files: &[PathBuf]) -> Result<Vec<(PathBuf, String)>> {
    files
        .iter()
        .map(|path| read_file(path).map(|content| (path.clone(), content)))
        .collect()
}

fn read_obligations(path: &Path, quiet: bool) -> Result<Vec<ObligationClause>> {
    let clauses = parse_obligations(&read_file(path)?);
    tracing::debug!(path = %path.display(), count = clauses.len(), "Parsed obligations");

    if clauses.is_empty() && !quiet {
        eprintln!(
            "  {} no obligation clauses in {}",
            "⚠".yellow(),
            path.display()
        );
    }
    Ok(clauses)
}
