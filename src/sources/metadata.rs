use std::time::Duration;

use reqwest::Client;

use crate::config::settings::MetadataConfig;
use crate::credential::Scopes;
use crate::error::{AuthError, Result};
use crate::sources::{TokenGrant, TokenResponse};
use crate::utils::constants::{METADATA_EMAIL_PATH, METADATA_SCOPES_PATH, METADATA_TOKEN_PATH};

/// Location of the instance metadata server and the sentinel header it demands.
#[derive(Debug, Clone)]
pub struct MetadataEndpoint {
    pub base_url: String,
    pub header_name: String,
    pub header_value: String,
    pub timeout: Duration,
}

impl MetadataEndpoint {
    pub fn from_config(cfg: &MetadataConfig) -> Self {
        Self {
            base_url: cfg.base_url.clone(),
            header_name: cfg.header_name.clone(),
            header_value: cfg.header_value.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }

    /// Same endpoint layout served from another host, e.g. a local fake.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn token_url(&self) -> String {
        self.url(METADATA_TOKEN_PATH)
    }

    pub fn scopes_url(&self) -> String {
        self.url(METADATA_SCOPES_PATH)
    }

    pub fn email_url(&self) -> String {
        self.url(METADATA_EMAIL_PATH)
    }

    fn url(&self, entry: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), entry)
    }
}

/// Token, scopes and identity of the instance's attached service account.
/// The three lookups run in order; any failure aborts the whole exchange.
pub(crate) async fn exchange(client: &Client, endpoint: &MetadataEndpoint) -> Result<TokenGrant> {
    let token_body = get(client, endpoint, &endpoint.token_url()).await?;
    let token: TokenResponse = serde_json::from_str(&token_body)
        .map_err(|e| AuthError::MetadataUnavailable(format!("invalid token response: {}", e)))?;

    let scopes = Scopes::parse(&get(client, endpoint, &endpoint.scopes_url()).await?);

    let email = get(client, endpoint, &endpoint.email_url()).await?.trim().to_owned();
    if email.is_empty() {
        return Err(AuthError::MetadataUnavailable("metadata server returned an empty email".into()));
    }

    let expires_in = token.expires_in;
    let mut grant = token.into_grant().ok_or_else(|| {
        AuthError::MetadataUnavailable(format!("unusable expires_in in token response: {}", expires_in))
    })?;
    grant.scopes = Some(scopes);
    grant.identity = Some(email);
    Ok(grant)
}

async fn get(client: &Client, endpoint: &MetadataEndpoint, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .header(endpoint.header_name.as_str(), endpoint.header_value.as_str())
        .timeout(endpoint.timeout)
        .send()
        .await
        .map_err(|e| AuthError::MetadataUnavailable(format!("GET {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(AuthError::MetadataUnavailable(format!(
            "GET {} failed: {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| AuthError::MetadataUnavailable(format!("GET {}: {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_points_at_the_metadata_host() {
        let endpoint = MetadataEndpoint::default();
        assert_eq!(
            endpoint.token_url(),
            "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
        );
        assert_eq!(endpoint.header_name, "Metadata-Flavor");
        assert_eq!(endpoint.header_value, "Google");
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let endpoint = MetadataEndpoint::default().with_base_url("http://127.0.0.1:9000/sa/");
        assert_eq!(endpoint.email_url(), "http://127.0.0.1:9000/sa/email");
    }
}
