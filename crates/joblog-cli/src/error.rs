use std::io;

use joblog_core::remote::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] joblog_core::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Application ID cannot be empty")]
    EmptyApplicationId,
    #[error("Could not resolve a data directory; pass --db-path or set JOBLOG_DB_PATH")]
    NoDataDir,
    #[error(
        "Sync is not configured. Set JOBLOG_REMOTE_URL (and JOBLOG_REMOTE_TOKEN if the server requires one) to enable `joblog push` and `joblog sync`."
    )]
    SyncNotConfigured,
}
