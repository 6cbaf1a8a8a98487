use tracing::warn;

use crate::credential::{Credential, Scopes, SourceKind};

/// Caller supplied token pair wrapped into the uniform shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTokenResolver;

impl RawTokenResolver {
    /// Never fails. A refresh token without the rest of the renewal fields is
    /// kept but the credential will not be renewable.
    pub fn resolve(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        token_uri: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
        scopes: Scopes,
    ) -> Credential {
        if refresh_token.is_some() {
            let missing: Vec<&str> = [
                ("token_uri", token_uri.is_none()),
                ("client_id", client_id.is_none()),
                ("client_secret", client_secret.is_none()),
            ]
            .iter()
            .filter(|(_, absent)| *absent)
            .map(|(name, _)| *name)
            .collect();
            if !missing.is_empty() {
                warn!(missing = ?missing, "refresh_token supplied without renewal fields; credential is not renewable");
            }
        }

        let mut credential = Credential::new(String::new(), SourceKind::RawToken, scopes);
        credential.access_token = access_token;
        credential.refresh_token = refresh_token;
        credential.token_uri = token_uri;
        credential.client_id = client_id;
        credential.client_secret = client_secret;
        credential
    }
}
