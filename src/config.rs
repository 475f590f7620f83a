//! Configuration file support for cpescan.
//!
//! Provides TOML-based configuration through `cpescan.config.toml`
//! files, including data structures, file loading, and validation.
//! API keys may come from the config file or from the environment.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::shared::Result;

const CONFIG_FILENAME: &str = "cpescan.config.toml";

const DEFAULT_CACHE_DIR: &str = "cache";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub cache_dir: Option<PathBuf>,
    pub nvd_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub model: Option<String>,
    pub quota: Option<QuotaConfig>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, toml::Value>,
}

/// Free-tier ceilings for the vulnerability database API.
#[derive(Debug, Deserialize)]
pub struct QuotaConfig {
    pub per_minute: Option<usize>,
    pub per_day: Option<usize>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\nHint: check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = toml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\nHint: ensure the file contains valid TOML syntax.",
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

fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(ref quota) = config.quota {
        if quota.per_minute == Some(0) || quota.per_day == Some(0) {
            bail!(
                "Invalid config: quota limits must be greater than zero.\n\n\
                 Hint: omit the [quota] table to use the documented free-tier limits."
            );
        }
    }
    if let Some(ref model) = config.model {
        if model.trim().is_empty() {
            bail!("Invalid config: model must not be empty.");
        }
    }
    Ok(())
}

fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!("Warning: unknown config field '{}' will be ignored.", key);
    }
}

/// Fully resolved runtime settings.
///
/// Precedence for each value: config file, then environment, then the
/// built-in default. The mapping key is required; the database key is
/// optional but recommended (keyless access shares a global quota).
#[derive(Debug)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub nvd_api_key: Option<String>,
    pub gemini_api_key: String,
    pub model: String,
    pub quota_per_minute: Option<usize>,
    pub quota_per_day: Option<usize>,
}

impl Settings {
    pub fn resolve(config: Option<ConfigFile>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let gemini_api_key = config
            .gemini_api_key
            .or_else(|| std::env::var("GENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty());
        let Some(gemini_api_key) = gemini_api_key else {
            bail!(
                "No mapping service API key configured.\n\n\
                 Hint: set gemini_api_key in {CONFIG_FILENAME} or export GENAI_API_KEY."
            );
        };

        let nvd_api_key = config
            .nvd_api_key
            .or_else(|| std::env::var("NVD_API_KEY").ok())
            .filter(|k| !k.trim().is_empty());

        let (quota_per_minute, quota_per_day) = match config.quota {
            Some(quota) => (quota.per_minute, quota.per_day),
            None => (None, None),
        };

        Ok(Self {
            cache_dir: config
                .cache_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            nvd_api_key,
            gemini_api_key,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            quota_per_minute,
            quota_per_day,
        })
    }
}
