use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cache::credential_cache::CredentialCache;
use crate::credential::Credential;
use crate::error::{AuthError, Result};
use crate::observability::metrics::get_metrics;
use crate::registry::locks::IdentityLocks;
use crate::registry::state::CredentialState;
use crate::resolvers::{self, log_failure, SourceDescriptor};
use crate::sources::{RenewalMaterial, TokenSource};
use crate::store::CredentialStore;
use crate::utils::constants::DEFAULT_EXPIRY_SKEW_SECS;

/// Hands out live credentials.
///
/// Resolution runs without coordination; everything that follows for a given
/// identity (choosing between a fresh and a stored record, persisting, renewing)
/// is serialized on that identity.
#[derive(Debug)]
pub struct CredentialRegistry {
    token_source: TokenSource,
    store: CredentialStore,
    held: CredentialCache,
    locks: IdentityLocks,
    failures: RwLock<HashMap<String, &'static str>>,
    expiry_skew_seconds: u64,
}

impl CredentialRegistry {
    pub fn new(token_source: TokenSource, store: CredentialStore) -> Self {
        Self {
            token_source,
            store,
            held: CredentialCache::new(),
            locks: IdentityLocks::new(),
            failures: RwLock::new(HashMap::new()),
            expiry_skew_seconds: DEFAULT_EXPIRY_SKEW_SECS,
        }
    }

    /// Credentials expiring within `seconds` are treated as already expired.
    pub fn with_expiry_skew(mut self, seconds: u64) -> Self {
        self.expiry_skew_seconds = seconds;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn token_source(&self) -> &TokenSource {
        &self.token_source
    }

    /// Resolve `descriptor` and converge with whatever is already known for the
    /// resulting identity.
    ///
    /// The first successful write for an identity wins. A later resolution only
    /// replaces the stored record when that record is expired or the new one
    /// expires strictly later; otherwise the new resolution is discarded.
    pub async fn get_or_resolve(&self, descriptor: &SourceDescriptor) -> Result<Credential> {
        let resolved = resolvers::resolve(descriptor, &self.token_source).await?;

        if resolved.identity.is_empty() {
            debug!(
                source_kind = resolved.source_kind.as_str(),
                "identity unknown; credential is neither held nor persisted"
            );
            return Ok(resolved);
        }

        let identity = resolved.identity.clone();
        let _guard = self.locks.lock(&identity).await;

        if let Some(held) = self.held.get(&identity, self.expiry_skew_seconds).await {
            debug!(identity = %identity, "returning held credential, discarding new resolution");
            return Ok(held);
        }

        let (chosen, replace) = match self.store.find(&identity).await? {
            None => (resolved, true),
            Some(stored) if stored.is_expired_with_skew(self.expiry_skew_seconds) => {
                debug!(identity = %identity, "stored credential expired, taking the new resolution");
                (resolved, true)
            }
            Some(stored) if expires_later(resolved.expiry, stored.expiry) => {
                debug!(identity = %identity, "stored credential superseded by a later expiry");
                (resolved, true)
            }
            Some(stored) => {
                debug!(identity = %identity, "stored credential kept, discarding new resolution");
                (stored, false)
            }
        };

        // an expired pick is persisted only once renewed
        if chosen.is_expired_with_skew(self.expiry_skew_seconds) {
            return self.renew_locked(&chosen).await;
        }
        if replace {
            self.store.put(&identity, &chosen).await?;
            info!(identity = %identity, source_kind = chosen.source_kind.as_str(), "credential stored");
        }
        self.hold(chosen.clone()).await;
        Ok(chosen)
    }

    /// Resolve several sources concurrently. Failures are reported per source.
    pub async fn resolve_all(
        self: &Arc<Self>,
        sources: &HashMap<String, SourceDescriptor>,
    ) -> Vec<(String, Result<Credential>)> {
        let mut tasks = JoinSet::new();
        for (name, descriptor) in sources {
            let registry = Arc::clone(self);
            let name = name.clone();
            let descriptor = descriptor.clone();
            tasks.spawn(async move {
                let result = registry.get_or_resolve(&descriptor).await;
                (name, result)
            });
        }

        let mut results = Vec::with_capacity(sources.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => warn!(error = %err, "resolution task aborted"),
            }
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// Renew `credential` when it is expired.
    ///
    /// Unknown or future expiry: returned unchanged. Expired with renewal
    /// material: exchanged, persisted and returned. Expired without it:
    /// [`AuthError::Stale`], nothing persisted. Concurrent refreshes of one
    /// identity are serialized and only the first performs an exchange.
    pub async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        if !credential.is_expired_with_skew(self.expiry_skew_seconds) {
            return Ok(credential.clone());
        }

        let _guard = self.locks.lock(&credential.identity).await;

        if !credential.identity.is_empty() {
            if let Some(stored) = self.store.find(&credential.identity).await? {
                if !stored.is_expired_with_skew(self.expiry_skew_seconds)
                    && expires_later(stored.expiry, credential.expiry)
                {
                    debug!(identity = %credential.identity, "already refreshed by a concurrent caller");
                    self.hold(stored.clone()).await;
                    return Ok(stored);
                }
            }
        }

        self.renew_locked(credential).await
    }

    /// Exchange renewal material now, regardless of expiry. Used for the first
    /// token of a signing-key credential whose `access_token` is still empty.
    pub async fn renew(&self, credential: &Credential) -> Result<Credential> {
        let _guard = self.locks.lock(&credential.identity).await;
        self.renew_locked(credential).await
    }

    /// Caller must hold the identity lock.
    async fn renew_locked(&self, credential: &Credential) -> Result<Credential> {
        let metrics = get_metrics().await;
        let identity = credential.identity.as_str();

        let Some(material) = RenewalMaterial::from_credential(credential) else {
            metrics.refreshes.with_label_values(&["stale"]).inc();
            self.mark_failed(identity, "stale").await;
            warn!(identity, source_kind = credential.source_kind.as_str(), "credential is stale; re-resolve its source");
            return Err(AuthError::Stale {
                identity: identity.to_owned(),
            });
        };

        let grant = match self.token_source.exchange(material).await {
            Ok(grant) => grant,
            Err(err) => {
                metrics.refreshes.with_label_values(&[err.kind()]).inc();
                self.mark_failed(identity, err.kind()).await;
                log_failure(credential.source_kind, &err);
                return Err(err);
            }
        };

        let refreshed = credential.with_token(grant.access_token, grant.expiry);
        if !identity.is_empty() {
            self.store.put(identity, &refreshed).await?;
            self.hold(refreshed.clone()).await;
        }
        metrics.refreshes.with_label_values(&["ok"]).inc();
        info!(identity, expiry = %grant.expiry, "credential refreshed");
        Ok(refreshed)
    }

    /// Live credential for `identity` from memory or the store.
    pub async fn lookup(&self, identity: &str) -> Result<Credential> {
        if let Some(held) = self.held.get_any(identity).await {
            return Ok(held);
        }
        let stored = self.store.get(identity).await?;
        self.hold(stored.clone()).await;
        Ok(stored)
    }

    /// Hold every stored credential in memory. Returns how many were loaded.
    pub async fn load_from_store(&self) -> Result<usize> {
        let mut loaded = 0;
        for entry in self.store.list().await? {
            let (account_id, credential) = entry?;
            if account_id != credential.identity {
                warn!(account_id = %account_id, identity = %credential.identity, "stored record keyed under a different identity; skipped");
                continue;
            }
            self.hold(credential).await;
            loaded += 1;
        }
        info!(loaded, "credentials loaded from store");
        Ok(loaded)
    }

    /// Drop the credential for `identity` from memory and from the store.
    pub async fn delete(&self, identity: &str) -> Result<bool> {
        let guard = self.locks.lock(identity).await;
        self.held.remove(identity).await;
        self.failures.write().await.remove(identity);
        let removed = self.store.delete(identity).await;
        get_metrics().await.held_credentials.set(self.held.len().await as i64);
        drop(guard);
        self.locks.forget(identity).await;
        removed
    }

    pub async fn state(&self, identity: &str) -> CredentialState {
        if self.locks.is_locked(identity).await {
            return CredentialState::Resolving;
        }
        if self.failures.read().await.contains_key(identity) {
            return CredentialState::Failed;
        }
        match self.held.get_any(identity).await {
            Some(credential) if credential.is_expired_with_skew(self.expiry_skew_seconds) => CredentialState::Expired,
            Some(_) => CredentialState::Valid,
            None => CredentialState::Unresolved,
        }
    }

    /// Identities currently held in memory, sorted.
    pub async fn identities(&self) -> Vec<String> {
        self.held.identities().await
    }

    async fn hold(&self, credential: Credential) {
        let identity = credential.identity.clone();
        let held = self.held.set(credential).await;
        self.failures.write().await.remove(&identity);
        get_metrics().await.held_credentials.set(held as i64);
    }

    async fn mark_failed(&self, identity: &str, reason: &'static str) {
        if identity.is_empty() {
            return;
        }
        self.failures.write().await.insert(identity.to_owned(), reason);
    }
}

/// `new` expires strictly after `old`. A known expiry beats an unknown one.
fn expires_later(new: Option<DateTime<Utc>>, old: Option<DateTime<Utc>>) -> bool {
    match (new, old) {
        (Some(new), Some(old)) => new > old,
        (Some(_), None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::expires_later;
    use chrono::{Duration, Utc};

    #[test]
    fn later_expiry_comparison() {
        let now = Utc::now();
        assert!(expires_later(Some(now + Duration::seconds(1)), Some(now)));
        assert!(!expires_later(Some(now), Some(now)));
        assert!(expires_later(Some(now), None));
        assert!(!expires_later(None, Some(now)));
        assert!(!expires_later(None, None));
    }
}
