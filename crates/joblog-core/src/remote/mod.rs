//! Remote store client contract and implementations.
//!
//! The remote store is the authoritative copy of every application. Clients
//! are stateless beyond connection and auth details: they upsert full
//! documents, delete by id, and read the whole set back.

mod http;
mod memory;

use thiserror::Error;

use crate::models::{Application, ApplicationDocument, ApplicationId};

pub use http::HttpRemoteStore;
pub use memory::InMemoryRemoteStore;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
    #[error("Remote store rejected {id}: {reason}")]
    Rejected { id: ApplicationId, reason: String },
}

impl RemoteError {
    /// Whether the failure happened before the remote could answer
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Unreachable(_) => true,
            Self::Http(error) => error.is_connect() || error.is_timeout(),
            _ => false,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Per-record result of a batch call
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<ApplicationId>,
    pub failed: Vec<(ApplicationId, RemoteError)>,
}

impl BatchOutcome {
    pub(crate) fn record(&mut self, id: ApplicationId, result: RemoteResult<()>) {
        match result {
            Ok(()) => self.succeeded.push(id),
            Err(error) => {
                tracing::warn!("Remote call for {id} failed: {error}");
                self.failed.push((id, error));
            }
        }
    }

    /// Collapse a batch where nothing reached the remote into one error
    pub(crate) fn into_result(self) -> RemoteResult<Self> {
        let unreachable = self.succeeded.is_empty()
            && !self.failed.is_empty()
            && self.failed.iter().all(|(_, error)| error.is_transport());
        if unreachable {
            let reason = self
                .failed
                .first()
                .map(|(_, error)| error.to_string())
                .unwrap_or_default();
            return Err(RemoteError::Unreachable(reason));
        }
        Ok(self)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Operations the sync engine needs from the remote store
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Upsert full documents keyed by id; idempotent
    async fn put_many(&self, records: &[Application]) -> RemoteResult<BatchOutcome>;

    /// Delete documents by id; a missing id counts as deleted
    async fn delete_many(&self, ids: &[ApplicationId]) -> RemoteResult<BatchOutcome>;

    /// The full remote document set
    async fn get_all(&self) -> RemoteResult<Vec<ApplicationDocument>>;
}
