//! Configuration loading for the pager TUI.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use pager_core::PagerConfig;
use pager_http::HttpConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    /// Page URL with `{page}`, `{offset}` and `{limit}` placeholders.
    pub url_template: String,
    /// Key or JSON pointer of the item array. Empty means the body is the array.
    pub items_field: String,
    pub total_field: Option<String>,
    /// Key or JSON pointer rendered for each row.
    pub label_field: String,
    pub page_size: usize,
    pub prefetch_radius: usize,
    pub request_timeout_ms: u64,
    pub tick_ms: u64,
    pub log_path: PathBuf,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or PAGER_TUI_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: TuiConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url_template.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "url_template",
                reason: "must not be empty".to_string(),
            });
        }
        if !["{page}", "{offset}"]
            .iter()
            .any(|placeholder| self.url_template.contains(placeholder))
        {
            return Err(ConfigError::InvalidValue {
                field: "url_template",
                reason: "must contain {page} or {offset}".to_string(),
            });
        }
        if self.label_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "label_field",
                reason: "must not be empty".to_string(),
            });
        }
        if matches!(&self.total_field, Some(field) if field.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "total_field",
                reason: "must not be empty when set".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_path",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn pager_config(&self) -> PagerConfig {
        PagerConfig::new(self.page_size, self.prefetch_radius)
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            request_timeout_ms: self.request_timeout_ms,
            headers: self.headers.clone(),
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("PAGER_TUI_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
