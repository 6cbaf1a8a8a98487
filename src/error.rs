//! Error taxonomy shared by token sources, resolvers, the registry and the store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Local file or input is missing.
    #[error("credential source not found: {0}")]
    SourceNotFound(String),

    /// Key material could not be parsed or is missing required fields.
    #[error("malformed key material: {0}")]
    MalformedKey(String),

    /// Instance metadata endpoint is unreachable or answered with an error.
    /// Expected whenever the process is not running on the cloud compute fabric.
    #[error("instance metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// Token endpoint refused to renew the credential.
    #[error("token renewal rejected: {0}")]
    RefreshRejected(String),

    /// Credential is expired and carries no renewal material.
    #[error("credential for '{identity}' is stale and cannot be renewed")]
    Stale { identity: String },

    /// No record stored under the requested account id.
    #[error("no credential stored for '{0}'")]
    NotFound(String),

    /// Persistence layer failure.
    #[error("credential store I/O error: {0}")]
    StoreIOError(String),
}

impl AuthError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::SourceNotFound(_) => "source_not_found",
            AuthError::MalformedKey(_) => "malformed_key",
            AuthError::MetadataUnavailable(_) => "metadata_unavailable",
            AuthError::RefreshRejected(_) => "refresh_rejected",
            AuthError::Stale { .. } => "stale",
            AuthError::NotFound(_) => "not_found",
            AuthError::StoreIOError(_) => "store_io",
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::StoreIOError(err.to_string())
    }
}
