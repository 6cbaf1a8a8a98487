//! Discovery of credentials left behind by local gcloud installations.

pub mod gcloud;

pub use gcloud::{extract_credentials, find_credential_dbs, DiscoveredCredential};

use tracing::warn;

use crate::config::sources::DiscoveryConfig;

/// Scan every configured search place and extract what can be read.
/// Unreadable databases are logged and skipped.
pub async fn discover(config: &DiscoveryConfig) -> Vec<DiscoveredCredential> {
    let mut discovered = Vec::new();
    for db_path in find_credential_dbs(&config.search_places).await {
        match extract_credentials(&db_path).await {
            Ok(mut found) => discovered.append(&mut found),
            Err(e) => warn!(path = %db_path.display(), error = %e, "failed to read credential database"),
        }
    }
    discovered
}
