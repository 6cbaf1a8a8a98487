use std::path::Path;
use std::sync::Arc;

use sqlx::Row;
use tracing::{debug, error};

use crate::credential::Credential;
use crate::error::{AuthError, Result};
use crate::observability::metrics::get_metrics;
use crate::store::listing::CredentialListing;
use crate::store::{begin_immediate, init_pool, init_write_pool, run_migrations, DbPool, WritePool};

/// Persistent `account_id -> Credential` table.
///
/// `put` is an upsert that fully replaces the payload; the row keeps the
/// position of its first write, so `list` enumerates in first-insert order.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    pool: DbPool,
    write_pool: WritePool,
}

impl CredentialStore {
    /// Open (creating when missing) the store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let write_pool = init_write_pool(path).await?;
        run_migrations(&write_pool).await?;
        let pool = init_pool(path).await?;
        debug!("credential store opened at {}", path.display());
        Ok(Self { pool, write_pool })
    }

    /// Insert or fully replace the record for `account_id`.
    pub async fn put(&self, account_id: &str, credential: &Credential) -> Result<()> {
        let payload = encode(credential)?;
        let result = self.upsert(account_id, &payload).await;
        self.record_write("put", &result).await;
        result
    }

    async fn upsert(&self, account_id: &str, payload: &[u8]) -> Result<()> {
        let mut tx = begin_immediate(&self.write_pool).await?;
        let res = sqlx::query(
            r#"
            INSERT INTO credentials (account_id, payload) VALUES (?, ?)
            ON CONFLICT(account_id) DO UPDATE SET payload = excluded.payload
            "#,
        )
        .bind(account_id)
        .bind(payload)
        .execute(&mut *tx)
        .await;

        match res {
            Ok(_) => {
                tx.commit().await?;
                debug!(account_id, "credential stored");
                Ok(())
            }
            Err(err) => {
                tx.rollback().await?;
                Err(err.into())
            }
        }
    }

    /// Record for `account_id`, or [`AuthError::NotFound`].
    pub async fn get(&self, account_id: &str) -> Result<Credential> {
        self.find(account_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(account_id.to_owned()))
    }

    /// Record for `account_id`, `None` when absent.
    pub async fn find(&self, account_id: &str) -> Result<Option<Credential>> {
        let row = sqlx::query("SELECT payload FROM credentials WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| error!(account_id, error = %e, "credential lookup failed"))?;

        row.map(|row| decode(account_id, &row.get::<Vec<u8>, _>("payload")))
            .transpose()
    }

    /// Point-in-time snapshot of every record in first-insert order.
    /// Payloads are decoded as the listing is consumed.
    pub async fn list(&self) -> Result<CredentialListing> {
        let rows = sqlx::query("SELECT account_id, payload FROM credentials ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| error!(error = %e, "credential listing failed"))?;

        let rows = rows
            .into_iter()
            .map(|row| (row.get::<String, _>("account_id"), row.get::<Vec<u8>, _>("payload")))
            .collect::<Vec<_>>();
        Ok(CredentialListing::new(Arc::new(rows)))
    }

    /// Remove the record for `account_id`. Returns whether one existed.
    pub async fn delete(&self, account_id: &str) -> Result<bool> {
        let result = self.remove(account_id).await;
        self.record_write("delete", &result).await;
        result
    }

    async fn remove(&self, account_id: &str) -> Result<bool> {
        let mut tx = begin_immediate(&self.write_pool).await?;
        let res = sqlx::query("DELETE FROM credentials WHERE account_id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await;

        match res {
            Ok(done) => {
                tx.commit().await?;
                Ok(done.rows_affected() > 0)
            }
            Err(err) => {
                tx.rollback().await?;
                Err(err.into())
            }
        }
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM credentials")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn record_write<T>(&self, operation: &str, result: &Result<T>) {
        let metrics = get_metrics().await;
        match result {
            Ok(_) => metrics.store_writes.with_label_values(&[operation]).inc(),
            Err(err) => {
                metrics.store_failures.with_label_values(&[operation]).inc();
                error!(operation, error = %err, "credential store write failed");
            }
        }
    }
}

fn encode(credential: &Credential) -> Result<Vec<u8>> {
    serde_json::to_vec(credential)
        .map_err(|e| AuthError::StoreIOError(format!("failed to serialize credential: {}", e)))
}

pub(crate) fn decode(account_id: &str, payload: &[u8]) -> Result<Credential> {
    serde_json::from_slice(payload).map_err(|e| {
        AuthError::StoreIOError(format!("corrupt payload for '{}': {}", account_id, e))
    })
}
