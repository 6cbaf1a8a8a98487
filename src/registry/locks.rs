use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per identity.
///
/// Keyed on the identity string, so every in-memory copy of a credential for the
/// same account contends on the same lock.
#[derive(Debug, Default)]
pub struct IdentityLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, identity: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(identity.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop the entry for `identity` unless some task holds or awaits it.
    pub async fn forget(&self, identity: &str) -> bool {
        let mut locks = self.locks.lock().await;
        match locks.get(identity) {
            Some(lock) if Arc::strong_count(lock) == 1 => {
                locks.remove(identity);
                true
            }
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Whether some task currently holds the lock for `identity`.
    pub async fn is_locked(&self, identity: &str) -> bool {
        let locks = self.locks.lock().await;
        locks
            .get(identity)
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }
}
