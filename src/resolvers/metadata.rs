use tracing::info;

use crate::credential::{Credential, SourceKind};
use crate::error::{AuthError, Result};
use crate::sources::{RenewalMaterial, TokenSource};

/// Token and identity of the service account attached to the current instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataResolver;

impl MetadataResolver {
    pub async fn resolve(&self, token_source: &TokenSource) -> Result<Credential> {
        info!("Retrieving access token from instance metadata");
        let grant = token_source.exchange(RenewalMaterial::Metadata).await?;

        let identity = grant
            .identity
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthError::MetadataUnavailable("metadata server returned no email".into()))?;

        info!(
            identity = %identity,
            access_token_len = grant.access_token.len(),
            scopes = %grant.scopes.as_ref().map(|s| s.joined()).unwrap_or_default(),
            "Successfully retrieved instance metadata"
        );

        let mut credential = Credential::new(identity, SourceKind::Metadata, grant.scopes.unwrap_or_default());
        credential.access_token = grant.access_token;
        credential.expiry = Some(grant.expiry);
        Ok(credential)
    }
}
