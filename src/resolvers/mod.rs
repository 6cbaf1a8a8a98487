//! Resolvers turn one credential source into a [`Credential`].
//!
//! Resolvers never touch the store; persisting is the registry's job.

pub mod descriptor;
pub mod file;
pub mod key;
pub mod metadata;
pub mod parsed_key;
pub mod raw_token;

use tracing::{debug, error, info, warn};

use crate::credential::{Credential, Scopes, SourceKind};
use crate::error::{AuthError, Result};
use crate::observability::metrics::get_metrics;
use crate::sources::TokenSource;
use crate::utils::constants::DEFAULT_SCOPE;

pub use descriptor::SourceDescriptor;
pub use file::FileResolver;
pub use metadata::MetadataResolver;
pub use parsed_key::ParsedKeyResolver;
pub use raw_token::RawTokenResolver;

/// Run the resolver matching `descriptor`.
pub async fn resolve(descriptor: &SourceDescriptor, token_source: &TokenSource) -> Result<Credential> {
    let source_kind = descriptor.source_kind();
    let result = match descriptor.clone() {
        SourceDescriptor::File { path, scopes } => {
            FileResolver.resolve(&path, key_scopes(scopes)).await
        }
        SourceDescriptor::Metadata => MetadataResolver.resolve(token_source).await,
        SourceDescriptor::Token {
            access_token,
            refresh_token,
            token_uri,
            client_id,
            client_secret,
            scopes,
        } => Ok(RawTokenResolver.resolve(
            access_token,
            refresh_token,
            token_uri,
            client_id,
            client_secret,
            scopes.map(Scopes::from).unwrap_or_default(),
        )),
        SourceDescriptor::ParsedKey {
            data,
            access_token,
            expiry,
            identity,
            scopes,
        } => ParsedKeyResolver.resolve(data, access_token, expiry, identity.as_deref(), key_scopes(scopes)),
    }
    .and_then(|credential| check_identity(credential));

    let metrics = get_metrics().await;
    match &result {
        Ok(credential) => {
            metrics.resolutions.with_label_values(&[source_kind.as_str()]).inc();
            debug!(identity = %credential.identity, source_kind = source_kind.as_str(), "credential resolved");
        }
        Err(err) => {
            metrics
                .resolution_failures
                .with_label_values(&[source_kind.as_str(), err.kind()])
                .inc();
            log_failure(source_kind, err);
        }
    }
    result
}

/// Key-based sources default to the broad cloud-platform scope.
fn key_scopes(scopes: Option<Vec<String>>) -> Scopes {
    scopes
        .map(Scopes::from)
        .unwrap_or_else(|| Scopes::from(vec![DEFAULT_SCOPE.to_owned()]))
}

fn check_identity(credential: Credential) -> Result<Credential> {
    match credential.source_kind {
        SourceKind::FileKey if credential.identity.is_empty() => {
            Err(AuthError::MalformedKey("key carries no client_email".into()))
        }
        SourceKind::Metadata if credential.identity.is_empty() => {
            Err(AuthError::MetadataUnavailable("metadata server returned no email".into()))
        }
        _ => Ok(credential),
    }
}

/// Expected failures stay quiet, input and lifecycle problems are loud.
pub(crate) fn log_failure(source_kind: SourceKind, err: &AuthError) {
    match err {
        AuthError::MetadataUnavailable(_) => {
            debug!(source_kind = source_kind.as_str(), error = %err, "credential source unavailable")
        }
        AuthError::MalformedKey(_) | AuthError::RefreshRejected(_) => {
            error!(source_kind = source_kind.as_str(), error = %err, "credential resolution failed")
        }
        AuthError::SourceNotFound(_) => {
            warn!(source_kind = source_kind.as_str(), error = %err, "credential resolution failed")
        }
        _ => info!(source_kind = source_kind.as_str(), error = %err, "credential resolution failed"),
    }
}
