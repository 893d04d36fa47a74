//! Local bookkeeping for sync: deletion markers and checkpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::application::ApplicationId;

/// Records a local delete that the remote store has not confirmed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeletion {
    pub id: ApplicationId,
    pub deleted_at: DateTime<Utc>,
}

/// Times of the last confirmed exchange with the remote store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCheckpoint {
    pub last_push_at: Option<DateTime<Utc>>,
    pub last_pull_at: Option<DateTime<Utc>>,
}

impl SyncCheckpoint {
    /// Whether this store ever completed a push or a pull
    #[must_use]
    pub const fn has_exchanged(&self) -> bool {
        self.last_push_at.is_some() || self.last_pull_at.is_some()
    }
}
