use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::credential::{Credential, Scopes, SourceKind};
use crate::error::Result;
use crate::resolvers::key::credential_from_key;

/// Key material that already arrived deserialized, e.g. from a credential
/// database or an upstream channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsedKeyResolver;

impl ParsedKeyResolver {
    pub fn resolve(
        &self,
        data: Value,
        access_token: Option<String>,
        expiry: Option<DateTime<Utc>>,
        identity: Option<&str>,
        scopes: Scopes,
    ) -> Result<Credential> {
        let mut credential = credential_from_key(data, SourceKind::ParsedKey, identity, scopes)?;
        if let Some(access_token) = access_token {
            credential.access_token = access_token;
            credential.expiry = expiry;
        }
        Ok(credential)
    }
}
