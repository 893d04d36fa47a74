//! Sync checkpoint repository implementation

use chrono::{DateTime, Utc};
use libsql::Connection;

use crate::error::{Error, Result};
use crate::models::SyncCheckpoint;

const LAST_PUSH_KEY: &str = "last_push_at";
const LAST_PULL_KEY: &str = "last_pull_at";

/// Trait for sync checkpoint storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SyncStateRepository {
    /// Load the last confirmed push/pull times
    async fn load(&self) -> Result<SyncCheckpoint>;

    /// Record a confirmed push
    async fn record_push(&self, at: DateTime<Utc>) -> Result<()>;

    /// Record a confirmed pull
    async fn record_pull(&self, at: DateTime<Utc>) -> Result<()>;
}

/// libSQL implementation of `SyncStateRepository`
pub struct LibSqlSyncStateRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncStateRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SyncStateRepository for LibSqlSyncStateRepository<'_> {
    async fn load(&self) -> Result<SyncCheckpoint> {
        Ok(SyncCheckpoint {
            last_push_at: read_timestamp(self.conn, LAST_PUSH_KEY).await?,
            last_pull_at: read_timestamp(self.conn, LAST_PULL_KEY).await?,
        })
    }

    async fn record_push(&self, at: DateTime<Utc>) -> Result<()> {
        write_timestamp(self.conn, LAST_PUSH_KEY, at).await
    }

    async fn record_pull(&self, at: DateTime<Utc>) -> Result<()> {
        write_timestamp(self.conn, LAST_PULL_KEY, at).await
    }
}

/// Record a confirmed pull on an existing connection or open transaction
pub(crate) async fn record_pull_on(conn: &Connection, at: DateTime<Utc>) -> Result<()> {
    write_timestamp(conn, LAST_PULL_KEY, at).await
}

async fn read_timestamp(conn: &Connection, key: &str) -> Result<Option<DateTime<Utc>>> {
    let mut rows = conn
        .query("SELECT value FROM sync_state WHERE key = ?", [key])
        .await?;

    let Some(row) = rows.next().await? else {
        return Ok(None);
    };
    let value: String = row.get(0)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| Some(timestamp.with_timezone(&Utc)))
        .map_err(|error| Error::Store(format!("Invalid sync checkpoint '{key}': {error}")))
}

async fn write_timestamp(conn: &Connection, key: &str, at: DateTime<Utc>) -> Result<()> {
    let value = at.to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO sync_state (key, value) VALUES (?, ?)",
        [key, value.as_str()],
    )
    .await?;
    Ok(())
}
