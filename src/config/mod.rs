//! Configuration module for Resource Uploadr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.

use crate::upload::{UploadSettings, CHUNK_SIZE, MAX_FILE_SIZE, MIN_PART_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value (which may be empty)
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("MY_VAR", "value");
/// let result = expand_env_vars("prefix-${MY_VAR}-suffix");
/// assert_eq!(result, "prefix-value-suffix");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") {
        Ok(re) => re,
        Err(_) => return s.to_string(),
    };
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.api.base_url) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid API base_url '{}': must start with http:// or https://",
                self.api.base_url
            )));
        }

        let endpoints = [
            ("direct_upload", &self.api.endpoints.direct_upload),
            ("initiate", &self.api.endpoints.initiate),
            ("upload_part", &self.api.endpoints.upload_part),
            ("complete", &self.api.endpoints.complete),
        ];
        for (name, path) in endpoints {
            if path.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Endpoint '{}' cannot be empty",
                    name
                )));
            }
        }

        if self.upload.part_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.part_size must be greater than zero".into(),
            ));
        }

        if self.upload.max_file_size < self.upload.part_size {
            return Err(ConfigError::ValidationError(format!(
                "upload.max_file_size ({}) must be at least upload.part_size ({})",
                self.upload.max_file_size, self.upload.part_size
            )));
        }

        let max_parts = self.upload.max_file_size.div_ceil(self.upload.part_size);
        if max_parts > u64::from(u32::MAX) {
            return Err(ConfigError::ValidationError(format!(
                "upload.max_file_size ({}) split by upload.part_size ({}) needs {} parts; at most {} are numbered",
                self.upload.max_file_size,
                self.upload.part_size,
                max_parts,
                u32::MAX
            )));
        }

        if self.upload.part_size < MIN_PART_SIZE {
            tracing::warn!(
                part_size = self.upload.part_size,
                minimum = MIN_PART_SIZE,
                "Part size is below the usual server minimum; multipart commits may be rejected"
            );
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level '{}': must be one of trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format '{}': must be 'json' or 'pretty'",
                    self.logging.format
                )))
            }
        }

        Ok(())
    }

    /// Protocol constants for the upload orchestrator
    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            part_size: self.upload.part_size,
            max_file_size: self.upload.max_file_size,
            part_timeout: match self.upload.part_timeout_seconds {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Resource API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when set
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Whole-request timeout. 0 disables.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            bearer_token: None,
            request_timeout_seconds: default_request_timeout(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

/// Paths of the four upload endpoints, relative to `base_url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_direct_upload_path")]
    pub direct_upload: String,
    #[serde(default = "default_initiate_path")]
    pub initiate: String,
    #[serde(default = "default_upload_part_path")]
    pub upload_part: String,
    #[serde(default = "default_complete_path")]
    pub complete: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            direct_upload: default_direct_upload_path(),
            initiate: default_initiate_path(),
            upload_part: default_upload_part_path(),
            complete: default_complete_path(),
        }
    }
}

fn default_direct_upload_path() -> String {
    "/api/resources/upload".to_string()
}

fn default_initiate_path() -> String {
    "/api/resources/upload/initiate".to_string()
}

fn default_upload_part_path() -> String {
    "/api/resources/upload/part".to_string()
}

fn default_complete_path() -> String {
    "/api/resources/upload/complete".to_string()
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_part_size")]
    pub part_size: u64,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// 0 disables the per-part timeout
    #[serde(default = "default_part_timeout")]
    pub part_timeout_seconds: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            part_size: default_part_size(),
            max_file_size: default_max_file_size(),
            part_timeout_seconds: default_part_timeout(),
        }
    }
}

fn default_part_size() -> u64 {
    CHUNK_SIZE
}

fn default_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

fn default_part_timeout() -> u64 {
    120
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}
