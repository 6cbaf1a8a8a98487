use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, Row, SqliteConnection};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::resolvers::SourceDescriptor;
use crate::utils::constants::{GCLOUD_ACCESS_TOKENS_DB, GCLOUD_CONFIG_DIR, GCLOUD_CREDENTIALS_DB};

/// Credential found in a gcloud credential database.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredCredential {
    pub account_id: String,
    pub db_path: PathBuf,
    pub descriptor: SourceDescriptor,
}

/// Locate gcloud `credentials.db` files under each search place.
///
/// A place is checked both as a home directory itself and as a parent of home
/// directories, so `/root/` and `/home/` are handled alike.
pub async fn find_credential_dbs(search_places: &[String]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for place in search_places {
        let place = Path::new(place);
        push_if_exists(&mut found, credentials_db_in(place)).await;

        let mut entries = match tokio::fs::read_dir(place).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(place = %place.display(), error = %e, "search place not readable");
                continue;
            }
        };
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
                    if is_dir {
                        push_if_exists(&mut found, credentials_db_in(&entry.path())).await;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(place = %place.display(), error = %e, "failed to list search place");
                    break;
                }
            }
        }
    }
    info!(found = found.len(), "credential databases discovered");
    found
}

fn credentials_db_in(home: &Path) -> PathBuf {
    home.join(GCLOUD_CONFIG_DIR).join(GCLOUD_CREDENTIALS_DB)
}

async fn push_if_exists(found: &mut Vec<PathBuf>, path: PathBuf) {
    if tokio::fs::try_exists(&path).await.unwrap_or(false) && !found.contains(&path) {
        debug!(path = %path.display(), "found credential database");
        found.push(path);
    }
}

/// Read every account out of a gcloud `credentials.db`, joining cached access
/// tokens from the sibling `access_tokens.db` when present.
///
/// Records whose payload is not JSON are logged and skipped.
pub async fn extract_credentials(db_path: &Path) -> Result<Vec<DiscoveredCredential>> {
    let mut conn = open_read_only(db_path).await?;
    let rows = sqlx::query("SELECT account_id, CAST(value AS BLOB) AS value FROM credentials")
        .fetch_all(&mut conn)
        .await?;
    conn.close().await?;

    let tokens = match db_path.parent().map(|dir| dir.join(GCLOUD_ACCESS_TOKENS_DB)) {
        Some(tokens_path) if tokio::fs::try_exists(&tokens_path).await.unwrap_or(false) => {
            read_access_tokens(&tokens_path).await.unwrap_or_else(|e| {
                warn!(path = %tokens_path.display(), error = %e, "access token database unreadable");
                HashMap::new()
            })
        }
        _ => HashMap::new(),
    };

    let mut discovered = Vec::with_capacity(rows.len());
    for row in rows {
        let account_id: String = row.try_get("account_id")?;
        let value: Vec<u8> = row.try_get("value")?;
        let data: serde_json::Value = match serde_json::from_slice(&value) {
            Ok(data) => data,
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "skipping undecodable credential record");
                continue;
            }
        };
        let (access_token, expiry) = tokens.get(&account_id).cloned().unwrap_or((None, None));
        discovered.push(DiscoveredCredential {
            descriptor: SourceDescriptor::ParsedKey {
                data,
                access_token,
                expiry,
                identity: Some(account_id.clone()),
                scopes: None,
            },
            account_id,
            db_path: db_path.to_path_buf(),
        });
    }
    info!(path = %db_path.display(), accounts = discovered.len(), "credentials extracted");
    Ok(discovered)
}

type CachedToken = (Option<String>, Option<DateTime<Utc>>);

async fn read_access_tokens(path: &Path) -> Result<HashMap<String, CachedToken>> {
    let mut conn = open_read_only(path).await?;
    let rows = sqlx::query(
        "SELECT account_id, access_token, CAST(token_expiry AS TEXT) AS token_expiry FROM access_tokens",
    )
    .fetch_all(&mut conn)
    .await?;
    conn.close().await?;

    let mut tokens = HashMap::with_capacity(rows.len());
    for row in rows {
        let account_id: String = row.try_get("account_id")?;
        let access_token: Option<String> = row.try_get("access_token")?;
        let expiry: Option<String> = row.try_get("token_expiry")?;
        tokens.insert(account_id, (access_token, expiry.as_deref().and_then(parse_gcloud_timestamp)));
    }
    Ok(tokens)
}

async fn open_read_only(path: &Path) -> Result<SqliteConnection> {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    Ok(SqliteConnection::connect_with(&options).await?)
}

/// gcloud keeps naive UTC timestamps such as `2024-05-01 10:00:00.123456`.
fn parse_gcloud_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
