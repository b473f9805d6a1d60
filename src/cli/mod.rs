//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for PHDC using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// PHDC - Public Health Case Report Exporter
#[derive(Parser, Debug)]
#[command(name = "phdc")]
#[command(version, about, long_about = None)]
#[command(author = "PHDC Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "phdc.toml", env = "PHDC_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PHDC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a patient snapshot to a ZIP archive of PHDC documents
    Export(commands::export::ExportArgs),

    /// Verify an exported archive
    Verify(commands::verify::VerifyArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
