//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.caredash.toml` files.

use crate::access::{expiry, Role, UserClass};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".caredash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Signed-in user settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Connection settings for the Customer Care API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_tables_path")]
    pub tables_path: String,

    #[serde(default = "default_sites_path")]
    pub sites_path: String,

    /// Path of the summary statistics endpoint.
    #[serde(default = "default_stats_path")]
    pub stats_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            tables_path: default_tables_path(),
            sites_path: default_sites_path(),
            stats_path: default_stats_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_tables_path() -> String {
    "/api/tables".to_string()
}

fn default_sites_path() -> String {
    "/api/sites".to_string()
}

fn default_stats_path() -> String {
    "/api/stats/summary".to_string()
}

/// Who is signed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub user_class: UserClass,

    #[serde(default)]
    pub roles: Vec<Role>,

    /// Session lifetime in minutes.
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            user_class: UserClass::default(),
            roles: Vec::new(),
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

fn default_username() -> String {
    "anonymous".to_string()
}

fn default_ttl_minutes() -> i64 {
    60
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file. Reports go to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Number of sites in the "Top sites" card.
    #[serde(default = "default_top_sites")]
    pub top_sites: usize,

    /// Decimals shown for MWh/customer ratios.
    #[serde(default = "default_ratio_precision")]
    pub ratio_precision: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output: None,
            top_sites: default_top_sites(),
            ratio_precision: default_ratio_precision(),
        }
    }
}

fn default_top_sites() -> usize {
    5
}

fn default_ratio_precision() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        expiry(chrono::Utc::now(), self.session.ttl_minutes)
            .context("Invalid [session] ttl_minutes")?;
        Ok(())
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.caredash.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        self.api.base_url = self.api.base_url.trim_end_matches('/').to_string();

        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if let Some(ref user) = args.user {
            self.session.username = user.clone();
        }
        if let Some(class) = args.user_class {
            self.session.user_class = class.into();
        }
        if !args.role.is_empty() {
            // Already checked by Args::validate
            self.session.roles = args.role.iter().filter_map(|r| r.parse().ok()).collect();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.display().to_string());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use crate::cli::UserClassArg;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.api.stats_path, "/api/stats/summary");
        assert_eq!(config.session.user_class, UserClass::Employee);
        assert_eq!(config.report.ratio_precision, 2);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[api]
base_url = "https://care.example.com"
timeout_seconds = 10

[session]
username = "mpho"
user_class = "customer"
roles = ["viewer", "agent"]

[report]
format = "json"
top_sites = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "https://care.example.com");
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.api.tables_path, "/api/tables");
        assert_eq!(config.session.username, "mpho");
        assert_eq!(config.session.user_class, UserClass::Customer);
        assert_eq!(config.session.roles, vec![Role::Viewer, Role::Agent]);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.top_sites, 3);
        assert_eq!(config.report.output, None);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[api]\nbase_url = \"http://api.internal\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.api.base_url, "http://api.internal");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[api\nbroken").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_validate_session_ttl() {
        assert!(Config::default().validate().is_ok());

        for ttl in ["0", "-5", "10000000000000"] {
            let config: Config = toml::from_str(&format!("[session]\nttl_minutes = {}", ttl)).unwrap();
            let err = config.validate().unwrap_err();
            assert!(format!("{:#}", err).contains("ttl_minutes"), "ttl {}", ttl);
        }
    }

    #[test]
    fn test_load_rejects_unusable_ttl() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[session]\nttl_minutes = -5\n",
        )
        .unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        args.api_url = Some("https://care.example.com/".to_string());
        args.timeout = Some(5);
        args.user = Some("neo".to_string());
        args.user_class = Some(UserClassArg::Customer);
        args.role = vec!["admin".to_string(), "viewer".to_string()];
        args.format = Some(OutputFormat::Json);

        config.merge_with_args(&args);

        assert_eq!(config.api.base_url, "https://care.example.com");
        assert_eq!(config.api.timeout_seconds, 5);
        assert_eq!(config.session.username, "neo");
        assert_eq!(config.session.user_class, UserClass::Customer);
        assert_eq!(config.session.roles, vec![Role::Admin, Role::Viewer]);
        assert_eq!(config.report.format, OutputFormat::Json);
    }

    #[test]
    fn test_merge_keeps_file_values_without_flags() {
        let mut config = Config::default();
        config.api.timeout_seconds = 99;
        config.session.roles = vec![Role::Manager];

        config.merge_with_args(&make_args());

        assert_eq!(config.api.timeout_seconds, 99);
        assert_eq!(config.session.roles, vec![Role::Manager]);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[session]"));
        assert!(toml_str.contains("[report]"));
    }
}
