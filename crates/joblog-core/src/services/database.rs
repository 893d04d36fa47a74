//! Shared database service wrapper used across clients.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::db::{
    ApplicationRepository, Database, LibSqlApplicationRepository, LibSqlSyncStateRepository,
    SyncStateRepository,
};
use crate::models::{Application, ApplicationDraft, ApplicationId, PendingDeletion, SyncCheckpoint};
use crate::sync::RecordStore;
use crate::{Error, Result};

/// Counts shown by `status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatus {
    pub records: usize,
    pub dirty: usize,
    pub pending_deletions: usize,
    pub checkpoint: SyncCheckpoint,
}

/// Thread-safe service for DB and repository operations.
///
/// Every read and write goes through one mutex, so a push completing never
/// interleaves with a local edit.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening local store at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing file, if any
    #[must_use]
    pub fn db_path(&self) -> Option<&std::path::Path> {
        self.db_path.as_deref()
    }

    /// Create a new application.
    pub async fn create_application(&self, draft: &ApplicationDraft) -> Result<Application> {
        let db = self.db.lock().await;
        let repo = LibSqlApplicationRepository::new(db.connection());
        repo.create(draft).await
    }

    /// Fetch an application by id.
    pub async fn get_application(&self, id: &ApplicationId) -> Result<Option<Application>> {
        let db = self.db.lock().await;
        let repo = LibSqlApplicationRepository::new(db.connection());
        repo.get(id).await
    }

    /// List applications newest-first.
    pub async fn list_applications(&self) -> Result<Vec<Application>> {
        let db = self.db.lock().await;
        let repo = LibSqlApplicationRepository::new(db.connection());
        repo.list().await
    }

    /// Update an application.
    pub async fn update_application(
        &self,
        id: &ApplicationId,
        draft: &ApplicationDraft,
    ) -> Result<Application> {
        let db = self.db.lock().await;
        let repo = LibSqlApplicationRepository::new(db.connection());
        repo.update(id, draft).await
    }

    /// Delete an application, leaving a pending deletion marker.
    pub async fn delete_application(&self, id: &ApplicationId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlApplicationRepository::new(db.connection());
        repo.delete(id).await
    }

    /// Resolve a full id or a unique id prefix.
    pub async fn resolve_id(&self, id_or_prefix: &str) -> Result<ApplicationId> {
        let wanted: ApplicationId = id_or_prefix.parse()?;
        let db = self.db.lock().await;
        let repo = LibSqlApplicationRepository::new(db.connection());

        if repo.get(&wanted).await?.is_some() {
            return Ok(wanted);
        }

        let mut matches = repo.list_ids_by_prefix(wanted.as_str()).await?;
        match matches.len() {
            0 => Err(Error::NotFound(wanted.to_string())),
            1 => Ok(matches.remove(0)),
            count => Err(Error::Validation(format!(
                "Id prefix '{wanted}' is ambiguous ({count} matches)"
            ))),
        }
    }

    /// Record counts and sync checkpoints.
    pub async fn status(&self) -> Result<StoreStatus> {
        let db = self.db.lock().await;
        let repo = LibSqlApplicationRepository::new(db.connection());
        Ok(StoreStatus {
            records: repo.count().await?,
            dirty: repo.list_dirty().await?.len(),
            pending_deletions: repo.list_pending_deletions().await?.len(),
            checkpoint: LibSqlSyncStateRepository::new(db.connection()).load().await?,
        })
    }
}

impl RecordStore for DatabaseService {
    async fn list_dirty(&self) -> Result<Vec<Application>> {
        let db = self.db.lock().await;
        LibSqlApplicationRepository::new(db.connection())
            .list_dirty()
            .await
    }

    async fn list_pending_deletions(&self) -> Result<Vec<PendingDeletion>> {
        let db = self.db.lock().await;
        LibSqlApplicationRepository::new(db.connection())
            .list_pending_deletions()
            .await
    }

    async fn mark_synced(
        &self,
        id: &ApplicationId,
        pushed_updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlApplicationRepository::new(db.connection())
            .mark_synced(id, pushed_updated_at)
            .await
    }

    async fn clear_pending_deletion(&self, id: &ApplicationId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlApplicationRepository::new(db.connection())
            .clear_pending_deletion(id)
            .await
    }

    async fn replace_all(&self, records: &[Application]) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlApplicationRepository::new(db.connection())
            .replace_all(records)
            .await
    }

    async fn count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        LibSqlApplicationRepository::new(db.connection())
            .count()
            .await
    }

    async fn sync_checkpoint(&self) -> Result<SyncCheckpoint> {
        let db = self.db.lock().await;
        LibSqlSyncStateRepository::new(db.connection()).load().await
    }

    async fn record_push(&self, at: DateTime<Utc>) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncStateRepository::new(db.connection())
            .record_push(at)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn draft(company: &str) -> ApplicationDraft {
        ApplicationDraft::new(company, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn in_memory_create_and_list_roundtrip() {
        let service = DatabaseService::open_in_memory().await.unwrap();

        service.create_application(&draft("Acme")).await.unwrap();
        let apps = service.list_applications().await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].company, "Acme");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("joblog.db");

        let service = DatabaseService::open_path(&db_path).await.unwrap();
        service.create_application(&draft("Acme")).await.unwrap();
        assert!(db_path.exists());
        assert_eq!(service.db_path(), Some(db_path.as_path()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_id_accepts_unique_prefix() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        for id in ["job-100", "job-200", "job-201"] {
            service
                .create_application(&draft("Acme").with_id(id.parse().unwrap()))
                .await
                .unwrap();
        }

        assert_eq!(service.resolve_id("job-1").await.unwrap().as_str(), "job-100");
        assert_eq!(service.resolve_id("job-200").await.unwrap().as_str(), "job-200");
        assert!(matches!(
            service.resolve_id("job-2").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            service.resolve_id("nope").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_counts_dirty_and_deleted() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let first = service.create_application(&draft("First")).await.unwrap();
        let second = service.create_application(&draft("Second")).await.unwrap();
        service.mark_synced(&first.id, first.updated_at).await.unwrap();
        service.delete_application(&second.id).await.unwrap();

        let status = service.status().await.unwrap();
        assert_eq!(
            status,
            StoreStatus {
                records: 1,
                dirty: 0,
                pending_deletions: 1,
                checkpoint: SyncCheckpoint::default(),
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_writers_are_serialized() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let mut handles = Vec::new();
        for index in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create_application(&draft(&format!("Company {index}")))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(service.count().await.unwrap(), 8);
    }
}
