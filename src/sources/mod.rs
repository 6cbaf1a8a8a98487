/// Token sources
///
/// `TokenSource` exchanges renewal material for a short-lived access token.
/// It holds no mutable state; one instance may serve any number of concurrent
/// exchanges.

pub mod assertion;
pub mod metadata;
pub mod oauth2;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::settings::{MetadataConfig, SettingsConfig};
use crate::credential::{Credential, Scopes, SigningKey, SourceKind};
use crate::error::Result;
use crate::helpers::time::{expiry_from_now, get_instant};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::DEFAULT_HTTP_TIMEOUT_MS;

use metadata::MetadataEndpoint;

/// Input accepted by [`TokenSource::exchange`].
#[derive(Debug, Clone, Copy)]
pub enum RenewalMaterial<'a> {
    /// OAuth refresh-token grant.
    RefreshToken {
        refresh_token: &'a str,
        token_uri: &'a str,
        client_id: &'a str,
        client_secret: &'a str,
    },
    /// Service-account JWT bearer grant signed locally.
    Assertion {
        signing_key: &'a SigningKey,
        identity: &'a str,
        token_uri: &'a str,
        scopes: &'a Scopes,
    },
    /// Query of the instance metadata endpoint.
    Metadata,
}

impl<'a> RenewalMaterial<'a> {
    /// Renewal material carried by a credential, refresh token first.
    /// Metadata credentials yield `None`: they are renewed by resolving again.
    pub fn from_credential(credential: &'a Credential) -> Option<Self> {
        if credential.source_kind == SourceKind::Metadata {
            return None;
        }
        if let (Some(refresh_token), Some(token_uri), Some(client_id), Some(client_secret)) = (
            credential.refresh_token.as_deref(),
            credential.token_uri.as_deref(),
            credential.client_id.as_deref(),
            credential.client_secret.as_deref(),
        ) {
            return Some(RenewalMaterial::RefreshToken {
                refresh_token,
                token_uri,
                client_id,
                client_secret,
            });
        }
        match (&credential.signing_key, credential.token_uri.as_deref()) {
            (Some(signing_key), Some(token_uri)) if !credential.identity.is_empty() => {
                Some(RenewalMaterial::Assertion {
                    signing_key,
                    identity: &credential.identity,
                    token_uri,
                    scopes: &credential.scopes,
                })
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RenewalMaterial::RefreshToken { .. } => "refresh_token",
            RenewalMaterial::Assertion { .. } => "assertion",
            RenewalMaterial::Metadata => "metadata",
        }
    }
}

/// Result of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expiry: DateTime<Utc>,
    /// Scopes reported by the server, when it reports any.
    pub scopes: Option<Scopes>,
    /// Account the token belongs to (metadata exchange only).
    pub identity: Option<String>,
}

/// JSON body of OAuth token endpoints and of the metadata token entry.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// `None` when `expires_in` cannot be turned into a timestamp.
    pub(crate) fn into_grant(self) -> Option<TokenGrant> {
        Some(TokenGrant {
            expiry: expiry_from_now(self.expires_in)?,
            access_token: self.access_token,
            scopes: self.scope.as_deref().map(Scopes::parse),
            identity: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TokenSource {
    client: Client,
    metadata: MetadataEndpoint,
}

impl TokenSource {
    pub fn new(http_timeout: Duration, metadata: MetadataEndpoint) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .connect_timeout(http_timeout)
            .build()?;
        Ok(Self { client, metadata })
    }

    pub fn from_settings(settings: &SettingsConfig) -> reqwest::Result<Self> {
        let timeout = Duration::from_millis(settings.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS));
        Self::new(timeout, MetadataEndpoint::from_config(&settings.metadata))
    }

    /// Exchange renewal material for an access token. Never retries.
    pub async fn exchange(&self, material: RenewalMaterial<'_>) -> Result<TokenGrant> {
        let metrics = get_metrics().await;
        let kind = material.kind();
        let start = get_instant();

        let result = match material {
            RenewalMaterial::RefreshToken {
                refresh_token,
                token_uri,
                client_id,
                client_secret,
            } => {
                oauth2::refresh(&self.client, token_uri, refresh_token, client_id, client_secret).await
            }
            RenewalMaterial::Assertion {
                signing_key,
                identity,
                token_uri,
                scopes,
            } => oauth2::exchange_assertion(&self.client, signing_key, identity, token_uri, scopes).await,
            RenewalMaterial::Metadata => metadata::exchange(&self.client, &self.metadata).await,
        };

        metrics
            .exchange_duration
            .with_label_values(&[kind])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => {
                metrics.exchange_requests.with_label_values(&[kind, "ok"]).inc();
                debug!(kind, "token exchange succeeded");
            }
            // callers log failures with their source context
            Err(err) => metrics.exchange_requests.with_label_values(&[kind, err.kind()]).inc(),
        }
        result
    }

    /// Scopes granted to a refresh token, as reported by the token endpoint.
    /// Nothing is persisted and no credential is modified.
    pub async fn granted_scopes(&self, material: RenewalMaterial<'_>) -> Result<Scopes> {
        let grant = self.exchange(material).await?;
        Ok(grant.scopes.unwrap_or_default())
    }
}

impl Default for MetadataEndpoint {
    fn default() -> Self {
        MetadataEndpoint::from_config(&MetadataConfig::default())
    }
}
