//! Error types for joblog-core

use thiserror::Error;

use crate::models::ApplicationId;
use crate::remote::RemoteError;

/// Result type alias using joblog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in joblog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required field missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Application not found
    #[error("Application not found: {0}")]
    NotFound(String),

    /// Remote store failure
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Pull refused because local changes have not been pushed
    #[error(
        "Unsynced local changes; push first (dirty: {}; pending deletions: {})",
        join_ids(.dirty_ids),
        join_ids(.pending_deletion_ids)
    )]
    UnsyncedChanges {
        dirty_ids: Vec<ApplicationId>,
        pending_deletion_ids: Vec<ApplicationId>,
    },

    /// Pull refused because an empty remote would wipe local records
    #[error(
        "Remote store is empty but {local_records} local application(s) exist{}; refusing to overwrite",
        empty_remote_hint(.previously_exchanged)
    )]
    EmptyRemote {
        local_records: usize,
        /// A push or pull succeeded before, so the remote may have lost its data
        previously_exchanged: bool,
    },

    /// Local storage error
    #[error("Store error: {0}")]
    Store(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error came from local durable storage
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::LibSql(_) | Self::Io(_) | Self::Serialization(_)
        )
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn empty_remote_hint(previously_exchanged: &bool) -> &'static str {
    if *previously_exchanged {
        " (it held data at the last sync; was it reset?)"
    } else {
        ""
    }
}

fn join_ids(ids: &[ApplicationId]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(ApplicationId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsynced_changes_message_lists_ids() {
        let error = Error::UnsyncedChanges {
            dirty_ids: vec!["a".parse().unwrap(), "b".parse().unwrap()],
            pending_deletion_ids: Vec::new(),
        };
        assert_eq!(
            error.to_string(),
            "Unsynced local changes; push first (dirty: a, b; pending deletions: none)"
        );
    }

    #[test]
    fn empty_remote_message_hints_at_reset() {
        let fresh = Error::EmptyRemote {
            local_records: 2,
            previously_exchanged: false,
        };
        assert_eq!(
            fresh.to_string(),
            "Remote store is empty but 2 local application(s) exist; refusing to overwrite"
        );

        let reset = Error::EmptyRemote {
            local_records: 2,
            previously_exchanged: true,
        };
        assert!(reset.to_string().contains("was it reset?"));
    }

    #[test]
    fn store_errors_are_classified() {
        assert!(Error::Store("disk full".into()).is_store_error());
        assert!(!Error::NotFound("x".into()).is_store_error());
    }
}
