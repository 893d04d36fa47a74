//! Durable document set held by the API process

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use joblog_core::models::ApplicationDocument;
use libsql::{Builder, Connection, Database};
use thiserror::Error;
use tokio::sync::Mutex;

/// `JOBLOG_API_DB_PATH` value that keeps documents in memory only
pub const IN_MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
    #[error("Stored document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document count: {0}")]
    Count(i64),
}

/// Documents keyed by application id, stored as JSON bodies in libSQL.
///
/// The body is kept exactly as written so that a later read returns the same
/// document the client sent.
pub struct DocumentStore {
    _db: Database,
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("DocumentStore").finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Open (or create) the store file at `path`; `:memory:` opens a throwaway store
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.as_os_str() == IN_MEMORY_PATH {
            return Self::open_in_memory().await;
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!("Opening document store at {}", path.display());
        let db = Builder::new_local(path).build().await?;
        Self::initialize(db).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let db = Builder::new_local(IN_MEMORY_PATH).build().await?;
        Self::initialize(db).await
    }

    async fn initialize(db: Database) -> Result<Self, StoreError> {
        let conn = db.connect()?;
        // WAL is unavailable for in-memory databases
        conn.execute("PRAGMA journal_mode = WAL;", ()).await.ok();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                stored_at TEXT NOT NULL
            )",
            (),
        )
        .await?;
        Ok(Self {
            _db: db,
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace a document; returns `true` when it was new
    pub async fn upsert(&self, id: &str, document: &ApplicationDocument) -> Result<bool, StoreError> {
        let body = serde_json::to_string(document)?;
        let stored_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let conn = self.conn.lock().await;
        let existed = {
            let mut rows = conn
                .query("SELECT EXISTS(SELECT 1 FROM documents WHERE id = ?)", [id])
                .await?;
            match rows.next().await? {
                Some(row) => row.get::<i64>(0)? != 0,
                None => false,
            }
        };
        conn.execute(
            "INSERT INTO documents (id, body, stored_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body, stored_at = excluded.stored_at",
            [id, body.as_str(), stored_at.as_str()],
        )
        .await?;
        Ok(!existed)
    }

    /// Remove a document; returns `false` when it was absent
    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().await;
        let removed = conn
            .execute("DELETE FROM documents WHERE id = ?", [id])
            .await?;
        Ok(removed > 0)
    }

    pub async fn get(&self, id: &str) -> Result<Option<ApplicationDocument>, StoreError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query("SELECT body FROM documents WHERE id = ?", [id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_body(&row)?)),
            None => Ok(None),
        }
    }

    /// Every document, ordered by id
    pub async fn all(&self) -> Result<Vec<ApplicationDocument>, StoreError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query("SELECT body FROM documents ORDER BY id", ())
            .await?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            documents.push(parse_body(&row)?);
        }
        Ok(documents)
    }

    pub async fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().await;
        let mut rows = conn.query("SELECT COUNT(*) FROM documents", ()).await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|_| StoreError::Count(count))
    }

    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }
}

fn parse_body(row: &libsql::Row) -> Result<ApplicationDocument, StoreError> {
    let body: String = row.get(0)?;
    Ok(serde_json::from_str(&body)?)
}
