use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::credential::Credential;

/// Identity-aware credential cache: identity -> latest known credential
#[derive(Debug, Clone, Default)]
pub struct CredentialCache {
    inner: Arc<RwLock<HashMap<String, Credential>>>
}

impl CredentialCache {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Insert or replace the credential held for its identity.
    /// Returns the number of held credentials.
    pub async fn set(&self, credential: Credential) -> usize {
        let mut map = self.inner.write().await;
        map.insert(credential.identity.clone(), credential);
        map.len()
    }

    /// Get credential if it exists and is not expired (within `skew_seconds`)
    pub async fn get(&self, identity: &str, skew_seconds: u64) -> Option<Credential> {
        let map = self.inner.read().await;
        map.get(identity)
            .filter(|c| !c.is_expired_with_skew(skew_seconds))
            .cloned()
    }

    /// Get credential regardless of expiry
    pub async fn get_any(&self, identity: &str) -> Option<Credential> {
        self.inner.read().await.get(identity).cloned()
    }

    pub async fn remove(&self, identity: &str) -> Option<Credential> {
        self.inner.write().await.remove(identity)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.inner.read().await.keys().cloned().collect();
        identities.sort();
        identities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Scopes, SourceKind};
    use chrono::{Duration, Utc};

    fn credential(identity: &str, expires_in: i64) -> Credential {
        let mut credential = Credential::new(identity, SourceKind::RawToken, Scopes::new());
        credential.expiry = Some(Utc::now() + Duration::seconds(expires_in));
        credential
    }

    #[tokio::test]
    async fn expired_entries_are_hidden_but_kept() {
        let cache = CredentialCache::new();
        assert_eq!(cache.set(credential("b@x", 3600)).await, 1);
        assert_eq!(cache.set(credential("a@x", 10)).await, 2);

        assert!(cache.get("b@x", 30).await.is_some());
        // inside the skew window
        assert!(cache.get("a@x", 30).await.is_none());
        assert!(cache.get_any("a@x").await.is_some());
        assert_eq!(cache.identities().await, vec!["a@x".to_owned(), "b@x".to_owned()]);

        assert!(cache.remove("a@x").await.is_some());
        assert_eq!(cache.len().await, 1);
    }
}
