//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * settings (store path, timeouts, metadata endpoint, logging level)
//!   * every configured credential source descriptor
//!   * discovery search places

use http::{HeaderName, HeaderValue};
use std::path::Path;
use tracing::{error, info};

use crate::config::settings::{MetadataConfig, SettingsConfig};
use crate::config::sources::{DiscoveryConfig, ServiceConfig};
use crate::resolvers::descriptor::SourceDescriptor;

const MAX_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    for (src_name, descriptor) in &cfg.sources {
        validate_descriptor(src_name, descriptor, &mut errors);
    }

    validate_discovery(&cfg.discovery, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.store_path.trim().is_empty() {
        errors.push("settings.store_path must not be empty".to_string());
    }

    if let Some(timeout) = settings.http_timeout_ms {
        validate_timeout("settings.http_timeout_ms", timeout, errors);
    }

    // skew sane bounds
    if let Some(s) = settings.expiry_skew_seconds {
        if s > 60 * 60 {
            errors.push(format!(
                "settings.expiry_skew_seconds ({}) is larger than a token lifetime",
                s
            ));
        }
    }

    validate_metadata(&settings.metadata, errors);

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_metadata(metadata: &MetadataConfig, errors: &mut Vec<String>) {
    if !metadata.base_url.starts_with("http://") && !metadata.base_url.starts_with("https://") {
        errors.push(format!(
            "settings.metadata.base_url '{}' must be an http(s) url",
            metadata.base_url
        ));
    }
    if HeaderName::from_bytes(metadata.header_name.as_bytes()).is_err() {
        errors.push(format!(
            "settings.metadata.header_name '{}' is not a valid header name",
            metadata.header_name
        ));
    }
    if HeaderValue::from_str(&metadata.header_value).is_err() {
        errors.push(format!(
            "settings.metadata.header_value '{}' is not a valid header value",
            metadata.header_value
        ));
    }
    validate_timeout("settings.metadata.timeout_ms", metadata.timeout_ms, errors);
}

fn validate_timeout(path: &str, timeout_ms: u64, errors: &mut Vec<String>) {
    if timeout_ms == 0 {
        errors.push(format!("{} must be > 0; network calls are always bounded", path));
    } else if timeout_ms > MAX_TIMEOUT_MS {
        errors.push(format!("{} ({}) exceeds {} ms", path, timeout_ms, MAX_TIMEOUT_MS));
    }
}

/// SOURCE VALIDATION
fn validate_descriptor(src_name: &str, descriptor: &SourceDescriptor, errors: &mut Vec<String>) {
    match descriptor {
        SourceDescriptor::File { path, .. } => {
            if path.as_os_str().is_empty() {
                errors.push(format!("source['{}'].path must not be empty", src_name));
            }
        }
        SourceDescriptor::Metadata => {}
        SourceDescriptor::Token {
            access_token,
            refresh_token,
            token_uri,
            ..
        } => {
            if access_token.is_empty() && refresh_token.is_none() {
                errors.push(format!(
                    "source['{}'].access_token is empty and no refresh_token is provided",
                    src_name
                ));
            }
            if let Some(uri) = token_uri {
                if !uri.starts_with("http://") && !uri.starts_with("https://") {
                    errors.push(format!(
                        "source['{}'].token_uri '{}' must be an http(s) url",
                        src_name, uri
                    ));
                }
            }
        }
        SourceDescriptor::ParsedKey { data, .. } => {
            if !data.is_object() {
                errors.push(format!("source['{}'].data must be a mapping", src_name));
            }
        }
    }
}

fn validate_discovery(discovery: &DiscoveryConfig, errors: &mut Vec<String>) {
    if !discovery.enabled {
        return;
    }
    if discovery.search_places.is_empty() {
        errors.push("discovery.search_places must not be empty when discovery is enabled".to_string());
    }
    for place in &discovery.search_places {
        if !Path::new(place).is_absolute() {
            errors.push(format!(
                "discovery.search_places entry '{}' must be an absolute path",
                place
            ));
        }
    }
}
