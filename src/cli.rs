//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// NewsLens - regional news analysis explorer
///
/// Enter a topic, pick a US state, and read an analyzed article set
/// with aggregate sentiment and suggested follow-up questions, then
/// refine it conversationally.
///
/// Examples:
///   newslens
///   newslens --topic tariffs
///   newslens --topic tariffs --region California
///   newslens --service-url http://10.0.0.5:8000 --verbose
///   newslens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Topic to analyze, entered up front instead of at the prompt
    #[arg(short, long, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Region to select immediately (requires --topic)
    #[arg(short, long, value_name = "NAME", requires = "topic")]
    pub region: Option<String>,

    /// Analysis service base URL
    ///
    /// Can also be set via NEWSLENS_SERVICE_URL or .newslens.toml.
    #[arg(long, value_name = "URL", env = "NEWSLENS_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .newslens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    ///
    /// The backend runs a search plus per-article analysis, so slow
    /// responses are normal. Default: from config or 120s.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .newslens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.service_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Service URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref topic) = self.topic {
            if topic.trim().is_empty() {
                return Err("Topic must not be empty".to_string());
            }
        }

        if let Some(ref region) = self.region {
            if region.trim().is_empty() {
                return Err("Region must not be empty".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
