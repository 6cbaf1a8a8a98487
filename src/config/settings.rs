use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_METADATA_TIMEOUT_MS, DEFAULT_STORE_PATH, METADATA_BASE_URL, METADATA_HEADER_NAME,
    METADATA_HEADER_VALUE,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    /// SQLite file holding persisted credentials
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// timeout applied to every refresh / assertion request
    pub http_timeout_ms: Option<u64>,
    /// credentials expiring within this window are treated as expired
    pub expiry_skew_seconds: Option<u64>,
    #[serde(default)]
    pub metadata: MetadataConfig,
    pub logging: Option<LoggingConfig>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            http_timeout_ms: None,
            expiry_skew_seconds: None,
            metadata: MetadataConfig::default(),
            logging: None,
        }
    }
}

/// ================================
/// Instance metadata endpoint
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct MetadataConfig {
    /// directory holding the `token`, `scopes` and `email` entries
    #[serde(default = "default_metadata_base_url")]
    pub base_url: String,
    #[serde(default = "default_metadata_header_name")]
    pub header_name: String,
    #[serde(default = "default_metadata_header_value")]
    pub header_value: String,
    #[serde(default = "default_metadata_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: default_metadata_base_url(),
            header_name: default_metadata_header_name(),
            header_value: default_metadata_header_value(),
            timeout_ms: default_metadata_timeout_ms(),
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level: level, format: format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

fn default_store_path() -> String {
    DEFAULT_STORE_PATH.to_string()
}

fn default_metadata_base_url() -> String {
    METADATA_BASE_URL.to_string()
}

fn default_metadata_header_name() -> String {
    METADATA_HEADER_NAME.to_string()
}

fn default_metadata_header_value() -> String {
    METADATA_HEADER_VALUE.to_string()
}

fn default_metadata_timeout_ms() -> u64 {
    DEFAULT_METADATA_TIMEOUT_MS
}
