use std::io::ErrorKind;
use std::path::Path;

use tracing::info;

use crate::credential::{Credential, Scopes, SourceKind};
use crate::error::{AuthError, Result};
use crate::resolvers::key::credential_from_key;

/// Service-account JSON key read from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl FileResolver {
    pub async fn resolve(&self, path: &Path, scopes: Scopes) -> Result<Credential> {
        info!("Retrieving credentials from {}", path.display());

        // tokio::fs runs the read on the blocking pool
        let content = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AuthError::SourceNotFound(format!("{} does not exist", path.display())),
            _ => AuthError::SourceNotFound(format!("{} is not readable: {}", path.display(), e)),
        })?;

        let data: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| AuthError::MalformedKey(format!("{} is not valid JSON: {}", path.display(), e)))?;

        credential_from_key(data, SourceKind::FileKey, None, scopes)
    }
}
