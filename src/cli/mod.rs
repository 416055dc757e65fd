//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for mailprep using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Mailprep - email canonicalization and PII redaction
#[derive(Parser, Debug)]
#[command(name = "mailprep")]
#[command(version, about, long_about = None)]
#[command(author = "Mailprep Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mailprep.toml", env = "MAILPREP_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "MAILPREP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Canonicalize and redact a message body, printing the outcome as JSON
    Process(commands::process::ProcessArgs),

    /// Print the canonical form of a subject line
    Subject(commands::subject::SubjectArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
