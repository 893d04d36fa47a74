//! In-process remote store with failure injection.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{BatchOutcome, RemoteError, RemoteResult, RemoteStore};
use crate::models::{Application, ApplicationDocument, ApplicationId};

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<String, ApplicationDocument>,
    failing_ids: BTreeSet<ApplicationId>,
    timing_out_ids: BTreeSet<ApplicationId>,
    offline: bool,
    put_calls: usize,
    delete_calls: usize,
    get_all_calls: usize,
}

/// Remote store kept in memory.
///
/// Clones share the same documents, so a test can keep one handle to inspect
/// the store while the sync engine owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemoteStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with documents as if another client had pushed them
    #[must_use]
    pub fn with_documents(documents: impl IntoIterator<Item = ApplicationDocument>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for document in documents {
                let key = document.id().unwrap_or_default().to_string();
                state.documents.insert(key, document);
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every call fail as if the network were down
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Reject puts and deletes for `id` until cleared
    pub fn fail_id(&self, id: &ApplicationId) {
        self.lock().failing_ids.insert(id.clone());
    }

    /// Let calls touching `id` time out until cleared
    pub fn time_out_id(&self, id: &ApplicationId) {
        self.lock().timing_out_ids.insert(id.clone());
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_ids.clear();
        state.timing_out_ids.clear();
    }

    #[must_use]
    pub fn documents(&self) -> Vec<ApplicationDocument> {
        self.lock().documents.values().cloned().collect()
    }

    #[must_use]
    pub fn document(&self, id: &ApplicationId) -> Option<ApplicationDocument> {
        self.lock().documents.get(id.as_str()).cloned()
    }

    #[must_use]
    pub fn put_calls(&self) -> usize {
        self.lock().put_calls
    }

    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }

    #[must_use]
    pub fn get_all_calls(&self) -> usize {
        self.lock().get_all_calls
    }

    /// Total number of calls of any kind
    #[must_use]
    pub fn call_count(&self) -> usize {
        let state = self.lock();
        state.put_calls + state.delete_calls + state.get_all_calls
    }
}

fn offline_error() -> RemoteError {
    RemoteError::Unreachable("remote store is offline".to_string())
}

fn check_id(state: &State, id: &ApplicationId) -> RemoteResult<()> {
    if state.timing_out_ids.contains(id) {
        return Err(RemoteError::Unreachable(format!("request for {id} timed out")));
    }
    if state.failing_ids.contains(id) {
        return Err(RemoteError::Rejected {
            id: id.clone(),
            reason: "injected failure".to_string(),
        });
    }
    Ok(())
}

impl RemoteStore for InMemoryRemoteStore {
    async fn put_many(&self, records: &[Application]) -> RemoteResult<BatchOutcome> {
        let mut state = self.lock();
        state.put_calls += 1;
        if state.offline {
            return Err(offline_error());
        }

        let mut outcome = BatchOutcome::default();
        for record in records {
            let result = check_id(&state, &record.id).map(|()| {
                state
                    .documents
                    .insert(record.id.to_string(), ApplicationDocument::from(record));
            });
            outcome.record(record.id.clone(), result);
        }
        outcome.into_result()
    }

    async fn delete_many(&self, ids: &[ApplicationId]) -> RemoteResult<BatchOutcome> {
        let mut state = self.lock();
        state.delete_calls += 1;
        if state.offline {
            return Err(offline_error());
        }

        let mut outcome = BatchOutcome::default();
        for id in ids {
            let result = check_id(&state, id).map(|()| {
                state.documents.remove(id.as_str());
            });
            outcome.record(id.clone(), result);
        }
        outcome.into_result()
    }

    async fn get_all(&self) -> RemoteResult<Vec<ApplicationDocument>> {
        let mut state = self.lock();
        state.get_all_calls += 1;
        if state.offline {
            return Err(offline_error());
        }
        Ok(state.documents.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationDraft;
    use chrono::{NaiveDate, Utc};

    fn record(company: &str) -> Application {
        let draft = ApplicationDraft::new(company, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        Application::from_draft(&draft, Utc::now()).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn put_get_delete_round_trip() {
        let remote = InMemoryRemoteStore::new();
        let app = record("Acme");

        let outcome = remote.put_many(std::slice::from_ref(&app)).await.unwrap();
        assert_eq!(outcome.succeeded, vec![app.id.clone()]);
        assert_eq!(remote.document(&app.id).unwrap().synced, Some(true));

        let documents = remote.get_all().await.unwrap();
        assert_eq!(documents.len(), 1);

        // Deleting twice is idempotent
        remote.delete_many(&[app.id.clone()]).await.unwrap();
        let outcome = remote.delete_many(&[app.id.clone()]).await.unwrap();
        assert!(outcome.is_complete());
        assert!(remote.documents().is_empty());
        assert_eq!(remote.call_count(), 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn injected_failures_are_per_record() {
        let remote = InMemoryRemoteStore::new();
        let good = record("Good");
        let bad = record("Bad");
        remote.fail_id(&bad.id);

        let outcome = remote.put_many(&[good.clone(), bad.clone()]).await.unwrap();
        assert_eq!(outcome.succeeded, vec![good.id]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, bad.id);
        assert!(remote.document(&bad.id).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lone_timed_out_record_fails_the_call() {
        let remote = InMemoryRemoteStore::new();
        let slow = record("Slow");
        let fast = record("Fast");
        remote.time_out_id(&slow.id);

        let single = remote.delete_many(std::slice::from_ref(&slow.id)).await;
        assert!(matches!(single, Err(RemoteError::Unreachable(_))));

        let outcome = remote.put_many(&[slow.clone(), fast.clone()]).await.unwrap();
        assert_eq!(outcome.succeeded, vec![fast.id]);
        assert!(outcome.failed[0].1.is_transport());

        remote.clear_failures();
        assert!(remote.put_many(&[slow]).await.unwrap().is_complete());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_store_fails_every_call() {
        let remote = InMemoryRemoteStore::new();
        remote.set_offline(true);

        assert!(matches!(
            remote.get_all().await,
            Err(RemoteError::Unreachable(_))
        ));
        assert!(remote.put_many(&[record("Acme")]).await.is_err());
        assert_eq!(remote.get_all_calls(), 1);
        assert_eq!(remote.put_calls(), 1);
    }
}
