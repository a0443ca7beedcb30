use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "clause-checkr",
    about = "Locate license text in source files and check obligation clauses against it",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ask the configured reasoning backend instead of the offline rules
    #[arg(long, global = true)]
    pub online: bool,

    /// Config file [default: ./.clause-checkr/config.toml, fallback ~/.config/clause-checkr/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, global = true, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Show full license blocks and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Locate the license block in each file
    Extract {
        /// Files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Inputs hold comment text already extracted from source files
        #[arg(long)]
        comments: bool,
    },

    /// Check obligation clauses against a license text
    Verify {
        /// License text file
        #[arg(long, value_name = "FILE")]
        license: PathBuf,

        /// Obligation list: one clause per line, or a JSON array of strings
        #[arg(long, value_name = "FILE")]
        obligations: PathBuf,
    },

    /// Locate the license block in each file, then check obligations against it
    Check {
        /// Files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Obligation list: one clause per line, or a JSON array of strings
        #[arg(long, value_name = "FILE")]
        obligations: PathBuf,

        /// Inputs hold comment text already extracted from source files
        #[arg(long)]
        comments: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
    /// The fenced block and Clause/Result/Explanation entries, unadorned
    Raw,
}
