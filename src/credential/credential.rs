use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::scopes::Scopes;

/// Origin of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    FileKey,
    Metadata,
    RawToken,
    ParsedKey,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::FileKey => "file_key",
            SourceKind::Metadata => "metadata",
            SourceKind::RawToken => "raw_token",
            SourceKind::ParsedKey => "parsed_key",
        }
    }
}

/// PEM encoded private key of a service account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(pem: impl Into<String>) -> Self {
        Self(pem.into())
    }

    pub fn pem(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Bearer token bundle plus optional renewal material and identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Account the credential authenticates as. Empty when unknown.
    pub identity: String,
    pub source_kind: SourceKind,
    /// Short-lived bearer token, empty until first use for signing-key sources.
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scopes: Scopes,
    /// `None` means the token was never validated, not that it never expires.
    pub expiry: Option<DateTime<Utc>>,
    pub signing_key: Option<SigningKey>,
}

impl Credential {
    /// Bare credential of the given kind; resolvers fill in the rest.
    pub fn new(identity: impl Into<String>, source_kind: SourceKind, scopes: Scopes) -> Self {
        Self {
            identity: identity.into(),
            source_kind,
            access_token: String::new(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes,
            expiry: None,
            signing_key: None,
        }
    }

    /// Copy of this credential carrying a new token and expiry.
    /// Identity, scopes and origin are never touched.
    pub fn with_token(&self, access_token: String, expiry: DateTime<Utc>) -> Self {
        Self {
            access_token,
            expiry: Some(expiry),
            ..self.clone()
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_with_skew(0)
    }

    /// Expired, or about to expire within `skew_seconds`. Unknown expiry never counts.
    pub fn is_expired_with_skew(&self, skew_seconds: u64) -> bool {
        let skew = i64::try_from(skew_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        // a window reaching past the earliest timestamp covers every expiry
        self.expiry
            .map(|expiry| expiry.checked_sub_signed(skew).map_or(true, |due| due <= Utc::now()))
            .unwrap_or(false)
    }

    /// Refresh-token renewal needs all four fields.
    pub fn has_refresh_material(&self) -> bool {
        self.refresh_token.is_some()
            && self.token_uri.is_some()
            && self.client_id.is_some()
            && self.client_secret.is_some()
    }

    pub fn has_signing_material(&self) -> bool {
        self.signing_key.is_some() && self.token_uri.is_some() && !self.identity.is_empty()
    }

    /// Metadata credentials are renewed by querying the instance again, never here.
    pub fn is_renewable(&self) -> bool {
        match self.source_kind {
            SourceKind::Metadata => false,
            _ => self.has_refresh_material() || self.has_signing_material(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("source_kind", &self.source_kind)
            .field("access_token_len", &self.access_token.len())
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .field("signing_key", &self.signing_key)
            .finish()
    }
}
