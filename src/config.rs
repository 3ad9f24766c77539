//! Configuration file support for catalog-compiler.
//!
//! Provides YAML-based configuration through `catalog-compiler.config.yml`
//! files, including data structures, file loading, validation and the
//! resolved settings the binary runs with.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use catalog_compiler::adapters::outbound::network::{
    DEFAULT_GITHUB_API_URL, DEFAULT_KNOWLEDGE_BASE_URL,
};
use catalog_compiler::application::coordinator::DEFAULT_MAX_FULL_RECOMPILATION_ATTEMPTS;
use catalog_compiler::application::use_cases::DEFAULT_MAX_CONCURRENT_RECORDS;
use catalog_compiler::shared::Result;

pub const CONFIG_FILENAME: &str = "catalog-compiler.config.yml";

const DEFAULT_CATALOG_PATH: &str = "catalog.json";
const DEFAULT_COMPILED_PATH: &str = "compiled.json";
const DEFAULT_PROJECT_DIRECTORY_URL: &str =
    "https://comptoir-du-libre.org/public/export/comptoir-du-libre_export_v1.json";
const DEFAULT_GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
const DEFAULT_CACHE_TTL_HOURS: u64 = 3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RECOMPILATION_INTERVAL_HOURS: u64 = 4;

/// Upper bound for every hour-valued setting (one leap year)
pub const MAX_HOURS: u64 = 24 * 366;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub catalog_path: Option<PathBuf>,
    pub compiled_path: Option<PathBuf>,
    pub knowledge_base_url: Option<String>,
    pub languages: Option<Vec<String>>,
    pub project_directory_url: Option<String>,
    pub service_providers_url: Option<String>,
    pub github_api_url: Option<String>,
    /// Name of the environment variable holding the GitHub token
    pub github_token_env: Option<String>,
    pub cache_ttl_hours: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_concurrent_records: Option<usize>,
    pub recompilation_interval_hours: Option<u64>,
    pub max_full_recompilation_attempts: Option<usize>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    ensure_positive("cache_ttl_hours", config.cache_ttl_hours)?;
    ensure_positive("request_timeout_secs", config.request_timeout_secs)?;
    ensure_positive(
        "max_concurrent_records",
        config.max_concurrent_records.map(|v| v as u64),
    )?;
    ensure_positive(
        "recompilation_interval_hours",
        config.recompilation_interval_hours,
    )?;
    ensure_at_most_max_hours("cache_ttl_hours", config.cache_ttl_hours)?;
    ensure_at_most_max_hours(
        "recompilation_interval_hours",
        config.recompilation_interval_hours,
    )?;
    ensure_positive(
        "max_full_recompilation_attempts",
        config.max_full_recompilation_attempts.map(|v| v as u64),
    )?;

    let urls = [
        ("knowledge_base_url", &config.knowledge_base_url),
        ("project_directory_url", &config.project_directory_url),
        ("service_providers_url", &config.service_providers_url),
        ("github_api_url", &config.github_api_url),
    ];
    for (field, value) in urls {
        if let Some(url) = value {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                bail!(
                    "Invalid config: {} must be an http(s) URL, got '{}'.\n\n💡 Hint: Use a full URL such as \"https://www.wikidata.org\".",
                    field,
                    url
                );
            }
        }
    }

    if let Some(ref languages) = config.languages {
        if languages.is_empty() || languages.iter().any(|l| l.trim().is_empty()) {
            bail!(
                "Invalid config: languages must list at least one non-empty language code.\n\n\
                 💡 Hint: Use codes such as \"en\" or \"fr\", most preferred first."
            );
        }
    }

    Ok(())
}

fn ensure_positive(field: &str, value: Option<u64>) -> Result<()> {
    if value == Some(0) {
        bail!(
            "Invalid config: {} must be greater than 0.\n\n💡 Hint: Remove the field to use the default value.",
            field
        );
    }
    Ok(())
}

fn ensure_at_most_max_hours(field: &str, value: Option<u64>) -> Result<()> {
    if let Some(hours) = value.filter(|&hours| hours > MAX_HOURS) {
        bail!(
            "Invalid config: {} must be at most {} hours, got {}.",
            field,
            MAX_HOURS,
            hours
        );
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}

/// Effective settings after applying defaults to the config file
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub catalog_path: PathBuf,
    pub compiled_path: PathBuf,
    pub knowledge_base_url: String,
    pub languages: Vec<String>,
    pub project_directory_url: String,
    pub service_providers_url: Option<String>,
    pub github_api_url: String,
    pub github_token_env: String,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub max_concurrent_records: usize,
    pub recompilation_interval: Duration,
    pub max_full_recompilation_attempts: usize,
}

impl Settings {
    pub fn from_config(config: ConfigFile) -> Self {
        Self {
            catalog_path: config
                .catalog_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
            compiled_path: config
                .compiled_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPILED_PATH)),
            knowledge_base_url: config
                .knowledge_base_url
                .unwrap_or_else(|| DEFAULT_KNOWLEDGE_BASE_URL.to_string()),
            languages: config
                .languages
                .unwrap_or_else(|| vec!["en".to_string()]),
            project_directory_url: config
                .project_directory_url
                .unwrap_or_else(|| DEFAULT_PROJECT_DIRECTORY_URL.to_string()),
            service_providers_url: config.service_providers_url,
            github_api_url: config
                .github_api_url
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            github_token_env: config
                .github_token_env
                .unwrap_or_else(|| DEFAULT_GITHUB_TOKEN_ENV.to_string()),
            cache_ttl: hours(config.cache_ttl_hours.unwrap_or(DEFAULT_CACHE_TTL_HOURS)),
            request_timeout: Duration::from_secs(
                config
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            max_concurrent_records: config
                .max_concurrent_records
                .unwrap_or(DEFAULT_MAX_CONCURRENT_RECORDS),
            recompilation_interval: hours(
                config
                    .recompilation_interval_hours
                    .unwrap_or(DEFAULT_RECOMPILATION_INTERVAL_HOURS),
            ),
            max_full_recompilation_attempts: config
                .max_full_recompilation_attempts
                .unwrap_or(DEFAULT_MAX_FULL_RECOMPILATION_ATTEMPTS),
        }
    }

    /// GitHub token read from the configured environment variable, if set
    pub fn github_token(&self) -> Option<String> {
        std::env::var(&self.github_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(ConfigFile::default())
    }
}

pub fn hours(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(60 * 60))
}
