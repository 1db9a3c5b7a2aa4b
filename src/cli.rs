//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::access::{Role, UserClass};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// caredash - Customer Care dashboard in your terminal
///
/// Fetches table metadata, per-site customer counts and per-site energy
/// statistics from the Customer Care API and renders them as a
/// Markdown or JSON dashboard.
///
/// Examples:
///   caredash --api-url https://care.example.com --token $TOKEN
///   caredash --user thabo --role manager --format json --output dash.json
///   caredash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the Customer Care API
    ///
    /// Overrides `api.base_url` from .caredash.toml.
    #[arg(long, value_name = "URL", env = "CAREDASH_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the API
    #[arg(long, value_name = "TOKEN", env = "CAREDASH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Name of the signed-in user
    #[arg(short, long, value_name = "NAME")]
    pub user: Option<String>,

    /// Account category of the signed-in user
    #[arg(long, value_name = "CLASS")]
    pub user_class: Option<UserClassArg>,

    /// Roles held by the user (comma-separated or repeated)
    ///
    /// Values: admin, manager, agent, viewer
    #[arg(short, long, value_name = "ROLES", value_delimiter = ',')]
    pub role: Vec<String>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the dashboard
    ///
    /// Printed to stdout when not set.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .caredash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not show the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Generate a default .caredash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// User class as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UserClassArg {
    Employee,
    Customer,
}

impl From<UserClassArg> for UserClass {
    fn from(arg: UserClassArg) -> Self {
        match arg {
            UserClassArg::Employee => UserClass::Employee,
            UserClassArg::Customer => UserClass::Customer,
        }
    }
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

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
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

        for role in &self.role {
            role.parse::<Role>()?;
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

    /// Whether to draw the progress spinner.
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}
