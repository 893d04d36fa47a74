//! Push/pull reconciliation between the local store and the remote store.
//!
//! Conflict policy is coarse on purpose: the full local record wins on push,
//! the full remote set wins on pull, and a pull is refused while any local
//! change is still unpushed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::{Application, ApplicationId, PendingDeletion, SyncCheckpoint};
use crate::remote::{BatchOutcome, RemoteError, RemoteStore};

/// Local store operations the sync engine depends on
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn list_dirty(&self) -> Result<Vec<Application>>;

    async fn list_pending_deletions(&self) -> Result<Vec<PendingDeletion>>;

    /// Returns whether the record was flipped to synced
    async fn mark_synced(&self, id: &ApplicationId, pushed_updated_at: DateTime<Utc>)
        -> Result<bool>;

    async fn clear_pending_deletion(&self, id: &ApplicationId) -> Result<()>;

    /// Atomically replace all records and drop all deletion markers
    async fn replace_all(&self, records: &[Application]) -> Result<()>;

    async fn count(&self) -> Result<usize>;

    async fn sync_checkpoint(&self) -> Result<SyncCheckpoint>;

    async fn record_push(&self, at: DateTime<Utc>) -> Result<()>;
}

/// Knobs for pull behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Let an empty remote wipe a store that never exchanged data with it
    pub allow_empty_remote_overwrite: bool,
}

/// What a push did, record by record
#[derive(Debug, Default)]
pub struct PushReport {
    /// Accepted by the remote and marked synced locally
    pub pushed: Vec<ApplicationId>,
    /// Accepted by the remote but edited locally meanwhile; still dirty
    pub superseded: Vec<ApplicationId>,
    /// Rejected by the remote; still dirty
    pub failed: Vec<(ApplicationId, String)>,
    /// Remote delete confirmed; marker cleared
    pub deleted: Vec<ApplicationId>,
    /// Remote delete failed; marker kept
    pub failed_deletions: Vec<(ApplicationId, String)>,
}

impl PushReport {
    /// Whether any record was marked synced or any deletion confirmed
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.pushed.is_empty() || !self.deleted.is_empty()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.failed_deletions.is_empty()
    }

    fn reached_remote(&self) -> bool {
        self.changed() || !self.superseded.is_empty()
    }
}

fn note_failure(
    error: RemoteError,
    remote_answered: &mut bool,
    transport_error: &mut Option<RemoteError>,
) {
    if error.is_transport() {
        transport_error.get_or_insert(error);
    } else {
        *remote_answered = true;
    }
}

/// Result of a push followed by a pull
#[derive(Debug)]
pub struct FullSyncReport {
    pub push: PushReport,
    pub pulled: usize,
}

/// Drives push and pull over a record store and a remote store
pub struct SyncEngine<S, R> {
    store: S,
    remote: R,
    policy: SyncPolicy,
}

impl<S: RecordStore, R: RemoteStore> SyncEngine<S, R> {
    pub const fn new(store: S, remote: R) -> Self {
        Self {
            store,
            remote,
            policy: SyncPolicy {
                allow_empty_remote_overwrite: false,
            },
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Push dirty records and pending deletions.
    ///
    /// Returns `true` iff anything was marked synced or any deletion was
    /// confirmed, `false` when there was nothing to push.
    pub async fn push(&self) -> Result<bool> {
        Ok(self.push_report().await?.changed())
    }

    /// Push, reporting the outcome for every record and marker
    pub async fn push_report(&self) -> Result<PushReport> {
        let dirty = self.store.list_dirty().await?;
        let markers = self.store.list_pending_deletions().await?;
        let mut report = PushReport::default();

        if dirty.is_empty() && markers.is_empty() {
            tracing::debug!("Nothing to push");
            return Ok(report);
        }

        tracing::info!(
            "Pushing {} record(s) and {} deletion(s)",
            dirty.len(),
            markers.len()
        );

        // Transport failures only fail the push when no call got an answer.
        let mut remote_answered = false;
        let mut transport_error: Option<RemoteError> = None;

        if !dirty.is_empty() {
            match self.remote.put_many(&dirty).await {
                Ok(outcome) => {
                    remote_answered = true;
                    self.settle_puts(&dirty, outcome, &mut report).await?;
                }
                Err(error) => {
                    tracing::warn!("Pushing {} record(s) failed: {error}", dirty.len());
                    report.failed.extend(
                        dirty
                            .iter()
                            .map(|record| (record.id.clone(), error.to_string())),
                    );
                    note_failure(error, &mut remote_answered, &mut transport_error);
                }
            }
        }

        for marker in markers {
            match self.remote.delete_many(std::slice::from_ref(&marker.id)).await {
                Ok(outcome) => {
                    remote_answered = true;
                    for id in outcome.succeeded {
                        self.store.clear_pending_deletion(&id).await?;
                        report.deleted.push(id);
                    }
                    report.failed_deletions.extend(
                        outcome
                            .failed
                            .into_iter()
                            .map(|(id, error)| (id, error.to_string())),
                    );
                }
                Err(error) => {
                    tracing::warn!("Remote delete of {} failed: {error}", marker.id);
                    report.failed_deletions.push((marker.id, error.to_string()));
                    note_failure(error, &mut remote_answered, &mut transport_error);
                }
            }
        }

        if !remote_answered {
            if let Some(error) = transport_error {
                return Err(error.into());
            }
        }

        if report.reached_remote() {
            self.store.record_push(Utc::now()).await?;
        }

        tracing::info!(
            "Push finished: {} synced, {} superseded, {} failed, {} deleted, {} deletion(s) failed",
            report.pushed.len(),
            report.superseded.len(),
            report.failed.len(),
            report.deleted.len(),
            report.failed_deletions.len()
        );
        Ok(report)
    }

    async fn settle_puts(
        &self,
        dirty: &[Application],
        outcome: BatchOutcome,
        report: &mut PushReport,
    ) -> Result<()> {
        let pushed_at: BTreeMap<&ApplicationId, DateTime<Utc>> = dirty
            .iter()
            .map(|record| (&record.id, record.updated_at))
            .collect();

        for id in outcome.succeeded {
            let Some(updated_at) = pushed_at.get(&id).copied() else {
                tracing::warn!("Remote acknowledged unknown record {id}");
                continue;
            };
            if self.store.mark_synced(&id, updated_at).await? {
                report.pushed.push(id);
            } else {
                report.superseded.push(id);
            }
        }
        report.failed.extend(
            outcome
                .failed
                .into_iter()
                .map(|(id, error)| (id, error.to_string())),
        );
        Ok(())
    }

    /// Replace the local store with the remote set.
    ///
    /// Refused while local changes are unpushed. Returns the number of records
    /// now stored locally.
    pub async fn sync(&self) -> Result<usize> {
        let dirty = self.store.list_dirty().await?;
        let markers = self.store.list_pending_deletions().await?;
        if !dirty.is_empty() || !markers.is_empty() {
            return Err(Error::UnsyncedChanges {
                dirty_ids: dirty.into_iter().map(|record| record.id).collect(),
                pending_deletion_ids: markers.into_iter().map(|marker| marker.id).collect(),
            });
        }

        let documents = self.remote.get_all().await?;
        let mut records: BTreeMap<ApplicationId, Application> = BTreeMap::new();
        for document in documents {
            let record = Application::try_from(document)?;
            if let Some(existing) = records.get(&record.id) {
                tracing::warn!("Remote returned {} more than once; keeping the newest", record.id);
                if existing.updated_at > record.updated_at {
                    continue;
                }
            }
            records.insert(record.id.clone(), record);
        }
        let records: Vec<Application> = records.into_values().collect();

        // An empty remote may be a reset or misconfigured server; never let it
        // wipe local records unless the caller opted in.
        if records.is_empty() && !self.policy.allow_empty_remote_overwrite {
            let local_records = self.store.count().await?;
            if local_records > 0 {
                let previously_exchanged = self.store.sync_checkpoint().await?.has_exchanged();
                return Err(Error::EmptyRemote {
                    local_records,
                    previously_exchanged,
                });
            }
        }

        self.store.replace_all(&records).await?;
        tracing::info!("Pulled {} record(s) from remote", records.len());
        Ok(records.len())
    }

    /// Push then pull
    pub async fn full_sync(&self) -> Result<FullSyncReport> {
        let push = self.push_report().await?;
        let pulled = self.sync().await?;
        Ok(FullSyncReport { push, pulled })
    }
}
