use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::SourceKind;

/// Where a credential comes from. Mirrors the `kind`-tagged mappings accepted in
/// configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Service-account JSON key on disk.
    File {
        path: PathBuf,
        #[serde(default)]
        scopes: Option<Vec<String>>,
    },
    /// Instance metadata server of the current VM.
    Metadata,
    /// Caller supplied access token with optional refresh material.
    Token {
        access_token: String,
        #[serde(default)]
        refresh_token: Option<String>,
        #[serde(default)]
        token_uri: Option<String>,
        #[serde(default)]
        client_id: Option<String>,
        #[serde(default)]
        client_secret: Option<String>,
        #[serde(default)]
        scopes: Option<Vec<String>>,
    },
    /// Already deserialized key material (service account or authorized user).
    ParsedKey {
        data: serde_json::Value,
        #[serde(default)]
        access_token: Option<String>,
        #[serde(default)]
        expiry: Option<DateTime<Utc>>,
        #[serde(default)]
        identity: Option<String>,
        #[serde(default)]
        scopes: Option<Vec<String>>,
    },
}

impl SourceDescriptor {
    /// Raw token descriptor without renewal material.
    pub fn token(access_token: impl Into<String>) -> Self {
        SourceDescriptor::Token {
            access_token: access_token.into(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: None,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::File {
            path: path.into(),
            scopes: None,
        }
    }

    pub fn parsed_key(data: serde_json::Value) -> Self {
        SourceDescriptor::ParsedKey {
            data,
            access_token: None,
            expiry: None,
            identity: None,
            scopes: None,
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        match self {
            SourceDescriptor::File { .. } => SourceKind::FileKey,
            SourceDescriptor::Metadata => SourceKind::Metadata,
            SourceDescriptor::Token { .. } => SourceKind::RawToken,
            SourceDescriptor::ParsedKey { .. } => SourceKind::ParsedKey,
        }
    }
}
