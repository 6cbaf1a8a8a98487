use std::sync::Arc;

use crate::credential::Credential;
use crate::error::Result;
use crate::store::credential_store::decode;

/// Snapshot of the credential table taken when [`CredentialStore::list`] ran.
///
/// Yields `(account_id, Credential)` in first-insert order, decoding each payload
/// on demand. Writes committed after the snapshot are not observed. Cloning or
/// calling [`restart`](Self::restart) starts over from the first record.
///
/// [`CredentialStore::list`]: crate::store::CredentialStore::list
#[derive(Debug, Clone)]
pub struct CredentialListing {
    rows: Arc<Vec<(String, Vec<u8>)>>,
    position: usize,
}

impl CredentialListing {
    pub(crate) fn new(rows: Arc<Vec<(String, Vec<u8>)>>) -> Self {
        Self { rows, position: 0 }
    }

    pub fn restart(&mut self) {
        self.position = 0;
    }

    /// Fresh cursor over the same snapshot.
    pub fn restarted(&self) -> Self {
        Self::new(self.rows.clone())
    }

    pub fn account_ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(id, _)| id.as_str())
    }
}

impl Iterator for CredentialListing {
    type Item = Result<(String, Credential)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (account_id, payload) = self.rows.get(self.position)?;
        self.position += 1;
        Some(decode(account_id, payload).map(|credential| (account_id.clone(), credential)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rows.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CredentialListing {}
