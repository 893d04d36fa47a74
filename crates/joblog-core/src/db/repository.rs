//! Application repository implementation

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::Connection;

use super::sync_state_repository;
use crate::error::{Error, Result};
use crate::models::{
    parse_day, Application, ApplicationDraft, ApplicationId, MailStatus, PendingDeletion,
    ResponseState, ResumeFormat,
};

const APPLICATION_COLUMNS: &str = "id, company, day, mail_delivered, resume_format, mail_status, \
     response, platforms, created_at, updated_at, synced";

/// Trait for application storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ApplicationRepository {
    /// Create a new dirty record from a draft
    async fn create(&self, draft: &ApplicationDraft) -> Result<Application>;

    /// Get a record by ID
    async fn get(&self, id: &ApplicationId) -> Result<Option<Application>>;

    /// List all records
    async fn list(&self) -> Result<Vec<Application>>;

    /// Replace a record's user fields and mark it dirty
    async fn update(&self, id: &ApplicationId, draft: &ApplicationDraft) -> Result<Application>;

    /// Remove a record and leave a pending deletion marker
    async fn delete(&self, id: &ApplicationId) -> Result<()>;

    /// Records changed locally since their last confirmed push
    async fn list_dirty(&self) -> Result<Vec<Application>>;

    /// Local deletes the remote has not confirmed
    async fn list_pending_deletions(&self) -> Result<Vec<PendingDeletion>>;

    /// Mark a pushed record synced unless it changed after the push snapshot
    async fn mark_synced(&self, id: &ApplicationId, pushed_updated_at: DateTime<Utc>)
        -> Result<bool>;

    /// Drop a deletion marker once the remote confirmed the delete
    async fn clear_pending_deletion(&self, id: &ApplicationId) -> Result<()>;

    /// Replace every record and marker with the remote set
    async fn replace_all(&self, records: &[Application]) -> Result<()>;

    /// Ids starting with `prefix`, sorted
    async fn list_ids_by_prefix(&self, prefix: &str) -> Result<Vec<ApplicationId>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;
}

/// libSQL implementation of `ApplicationRepository`
pub struct LibSqlApplicationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlApplicationRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Persist a fully built record.
    ///
    /// This is the store-level guard: a record without an id or company never
    /// reaches the table.
    async fn insert(&self, app: &Application) -> Result<()> {
        if app.id.as_str().trim().is_empty() {
            return Err(Error::Store("record is missing an id".into()));
        }
        if app.company.trim().is_empty() {
            return Err(Error::Store(format!("record {} is missing a company", app.id)));
        }

        self.conn
            .execute(
                "INSERT INTO applications (id, company, day, mail_delivered, resume_format, mail_status, response, platforms, created_at, updated_at, synced)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    app.id.as_str(),
                    app.company.as_str(),
                    app.day_string(),
                    i64::from(app.mail_delivered),
                    encode_resume_format(&app.resume_format)?,
                    app.mail_status.label(),
                    app.response.as_str(),
                    encode_platforms(&app.platforms)?,
                    format_timestamp(app.created_at),
                    format_timestamp(app.updated_at),
                    i64::from(app.synced),
                ],
            )
            .await?;
        Ok(())
    }

    async fn exists(&self, id: &ApplicationId) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT EXISTS(SELECT 1 FROM applications WHERE id = ?)",
                [id.as_str()],
            )
            .await?;
        Ok(match rows.next().await? {
            Some(row) => row.get::<i64>(0)? != 0,
            None => false,
        })
    }

    async fn query_applications(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Vec<Application>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut applications = Vec::new();
        while let Some(row) = rows.next().await? {
            applications.push(Self::parse_application(&row)?);
        }
        Ok(applications)
    }

    /// Parse an application from a database row
    fn parse_application(row: &libsql::Row) -> Result<Application> {
        let id: String = row.get(0)?;
        let day: String = row.get(2)?;
        let resume_format: String = row.get(4)?;
        let mail_status: String = row.get(5)?;
        let response: String = row.get(6)?;
        let platforms: String = row.get(7)?;
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;

        Ok(Application {
            id: id.parse()?,
            company: row.get(1)?,
            day: parse_day(&day).map_err(|error| Error::Store(error.to_string()))?,
            mail_delivered: row.get::<i64>(3)? != 0,
            resume_format: serde_json::from_str::<BTreeSet<ResumeFormat>>(&resume_format)?,
            mail_status: MailStatus::from_label(&mail_status).unwrap_or_default(),
            response: ResponseState::new(response),
            platforms: serde_json::from_str::<BTreeSet<String>>(&platforms)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
            synced: row.get::<i64>(10)? != 0,
        })
    }

    /// Re-using the id of a deleted record supersedes its deletion marker:
    /// the next push upserts the whole record over the remote copy.
    async fn create_in_transaction(&self, app: &Application) -> Result<()> {
        if self.exists(&app.id).await? {
            return Err(Error::Validation(format!(
                "Application {} already exists",
                app.id
            )));
        }

        let superseded = self
            .conn
            .execute("DELETE FROM pending_deletions WHERE id = ?", [app.id.as_str()])
            .await?;
        if superseded > 0 {
            tracing::debug!("Recreated {} over its pending deletion", app.id);
        }
        self.insert(app).await
    }

    async fn delete_in_transaction(&self, id: &ApplicationId, deleted_at: DateTime<Utc>) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM applications WHERE id = ?", [id.as_str()])
            .await?;
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        let deleted_at = format_timestamp(deleted_at);
        self.conn
            .execute(
                "INSERT OR REPLACE INTO pending_deletions (id, deleted_at) VALUES (?, ?)",
                [id.as_str(), deleted_at.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn replace_in_transaction(&self, records: &[Application], now: DateTime<Utc>) -> Result<()> {
        self.conn.execute("DELETE FROM applications", ()).await?;
        self.conn.execute("DELETE FROM pending_deletions", ()).await?;

        for record in records {
            let mut record = record.clone();
            record.synced = true;
            self.insert(&record).await?;
        }

        sync_state_repository::record_pull_on(self.conn, now).await
    }

    /// Commit on success, roll back on failure
    async fn finish_transaction(&self, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                if let Err(error) = self.conn.execute("COMMIT", ()).await {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(error.into());
                }
                Ok(())
            }
            Err(error) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(error)
            }
        }
    }
}

impl ApplicationRepository for LibSqlApplicationRepository<'_> {
    async fn create(&self, draft: &ApplicationDraft) -> Result<Application> {
        let app = Application::from_draft(draft, Utc::now())?;

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = self.create_in_transaction(&app).await;
        self.finish_transaction(result).await?;

        tracing::debug!("Created application {}", app.id);
        Ok(app)
    }

    async fn get(&self, id: &ApplicationId) -> Result<Option<Application>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?");
        Ok(self
            .query_applications(&sql, [id.as_str()])
            .await?
            .into_iter()
            .next())
    }

    async fn list(&self) -> Result<Vec<Application>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications ORDER BY created_at DESC");
        self.query_applications(&sql, ()).await
    }

    async fn update(&self, id: &ApplicationId, draft: &ApplicationDraft) -> Result<Application> {
        let mut app = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        app.apply_draft(draft, Utc::now())?;

        let rows = self
            .conn
            .execute(
                "UPDATE applications
                 SET company = ?, day = ?, mail_delivered = ?, resume_format = ?, mail_status = ?,
                     response = ?, platforms = ?, updated_at = ?, synced = 0
                 WHERE id = ?",
                libsql::params![
                    app.company.as_str(),
                    app.day_string(),
                    i64::from(app.mail_delivered),
                    encode_resume_format(&app.resume_format)?,
                    app.mail_status.label(),
                    app.response.as_str(),
                    encode_platforms(&app.platforms)?,
                    format_timestamp(app.updated_at),
                    app.id.as_str(),
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        tracing::debug!("Updated application {}", app.id);
        Ok(app)
    }

    async fn delete(&self, id: &ApplicationId) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = self.delete_in_transaction(id, Utc::now()).await;
        self.finish_transaction(result).await?;

        tracing::debug!("Deleted application {id}; remote delete pending");
        Ok(())
    }

    async fn list_dirty(&self) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE synced = 0 ORDER BY updated_at ASC"
        );
        self.query_applications(&sql, ()).await
    }

    async fn list_pending_deletions(&self) -> Result<Vec<PendingDeletion>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, deleted_at FROM pending_deletions ORDER BY deleted_at ASC",
                (),
            )
            .await?;

        let mut deletions = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            let deleted_at: String = row.get(1)?;
            deletions.push(PendingDeletion {
                id: id.parse()?,
                deleted_at: parse_timestamp(&deleted_at)?,
            });
        }
        Ok(deletions)
    }

    async fn mark_synced(
        &self,
        id: &ApplicationId,
        pushed_updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let pushed_updated_at = format_timestamp(pushed_updated_at);
        let rows = self
            .conn
            .execute(
                "UPDATE applications SET synced = 1 WHERE id = ? AND updated_at = ? AND synced = 0",
                [id.as_str(), pushed_updated_at.as_str()],
            )
            .await?;

        if rows == 0 {
            tracing::debug!("Skipped marking {id} synced; record changed or vanished since push");
        }
        Ok(rows > 0)
    }

    async fn clear_pending_deletion(&self, id: &ApplicationId) -> Result<()> {
        self.conn
            .execute("DELETE FROM pending_deletions WHERE id = ?", [id.as_str()])
            .await?;
        Ok(())
    }

    async fn replace_all(&self, records: &[Application]) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = self.replace_in_transaction(records, Utc::now()).await;
        self.finish_transaction(result).await?;

        tracing::info!("Replaced local store with {} remote record(s)", records.len());
        Ok(())
    }

    async fn list_ids_by_prefix(&self, prefix: &str) -> Result<Vec<ApplicationId>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        // substr avoids LIKE wildcard escaping for ids containing % or _
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM applications WHERE substr(id, 1, length(?1)) = ?1 ORDER BY id",
                [prefix],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            ids.push(id.parse()?);
        }
        Ok(ids)
    }

    async fn count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM applications", ())
            .await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|error| Error::Store(error.to_string()))
    }
}

/// Timestamps are stored with fixed nanosecond precision so that equality
/// checks in SQL match the in-memory value exactly.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| Error::Store(format!("Invalid timestamp '{raw}': {error}")))
}

fn encode_resume_format(formats: &BTreeSet<ResumeFormat>) -> Result<String> {
    Ok(serde_json::to_string(formats)?)
}

fn encode_platforms(platforms: &BTreeSet<String>) -> Result<String> {
    Ok(serde_json::to_string(platforms)?)
}
