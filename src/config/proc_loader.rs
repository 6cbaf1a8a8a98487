use std::path::Path;
use crate::config::settings::{LogFormat, LoggingConfig};
use crate::config::sources::ServiceConfig;
use crate::config::proc_validator;
use crate::utils::constants::DEFAULT_EXPIRY_SKEW_SECS;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error};

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config '{}'", path.display()))?;

    let expanded = expand_env_vars(&content)?;
    parse_config(expanded)
}

pub fn parse_config(content: String) -> Result<ServiceConfig> {
    let mut service_config: ServiceConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| {
            error!("parse config error: {}", e);
        })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::new("info".to_owned(), LogFormat::from_env()));
    }
    if service_config.settings.expiry_skew_seconds.is_none() {
        service_config.settings.expiry_skew_seconds = Some(DEFAULT_EXPIRY_SKEW_SECS);
    }

    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config)
        .map_err(|errors| anyhow!("invalid config:\n  - {}", errors.join("\n  - ")))?;

    Ok(service_config)
}

/// Replace `${VAR}` and `${VAR:default}` with values from the environment.
fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::descriptor::SourceDescriptor;
    use serial_test::serial;

    #[test]
    #[serial]
    fn environment_values_win_over_defaults() {
        std::env::set_var("CREDENTIAL_RESOLVER_STORE", "/var/lib/creds.db");
        let out = expand_env_vars("store_path: ${CREDENTIAL_RESOLVER_STORE:/tmp/creds.db}").unwrap();
        std::env::remove_var("CREDENTIAL_RESOLVER_STORE");
        assert_eq!(out, "store_path: /var/lib/creds.db");
    }

    #[test]
    fn expands_defaults_for_unset_variables() {
        let out = expand_env_vars("path: ${CREDENTIAL_RESOLVER_UNSET_VAR:/tmp/creds.db}").unwrap();
        assert_eq!(out, "path: /tmp/creds.db");
    }

    #[test]
    fn parses_sources_and_applies_defaults() {
        let yaml = r#"
settings:
  store_path: /tmp/creds.db
sources:
  svc:
    kind: file
    path: /keys/svc.json
  gce:
    kind: metadata
  user:
    kind: token
    access_token: ya29.token
    scopes: ["a", "b"]
"#;
        let config = parse_config(yaml.to_owned()).unwrap();
        assert_eq!(config.settings.store_path, "/tmp/creds.db");
        assert_eq!(config.settings.expiry_skew_seconds, Some(DEFAULT_EXPIRY_SKEW_SECS));
        assert!(config.settings.logging.is_some());
        assert!(matches!(config.sources.get("gce"), Some(SourceDescriptor::Metadata)));
        assert!(matches!(config.sources.get("svc"), Some(SourceDescriptor::File { .. })));
        assert!(!config.discovery.enabled);
        assert_eq!(config.discovery.search_places, vec!["/home/", "/root/"]);
    }

    #[test]
    fn rejects_invalid_config_with_all_problems_listed() {
        let yaml = r#"
settings:
  store_path: ""
  metadata:
    header_name: "bad header"
sources:
  user:
    kind: token
    access_token: ""
"#;
        let err = parse_config(yaml.to_owned()).unwrap_err().to_string();
        assert!(err.contains("store_path"), "{err}");
        assert!(err.contains("header_name"), "{err}");
        assert!(err.contains("access_token"), "{err}");
    }
}
