use std::path::Path;

use joblog_core::config::RemoteConfig;
use joblog_core::services::StoreStatus;

use crate::commands::common::{format_timestamp, open_database};
use crate::error::CliError;

pub async fn run_status(db_path: &Path, remote: Option<&RemoteConfig>) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let status = db.status().await?;

    for line in format_status_lines(&status, db_path, remote) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_status_lines(
    status: &StoreStatus,
    db_path: &Path,
    remote: Option<&RemoteConfig>,
) -> Vec<String> {
    let never = || "never".to_string();
    vec![
        format!("Database:          {}", db_path.display()),
        format!(
            "Remote:            {}",
            remote.map_or_else(|| "not configured".to_string(), |config| config.base_url.clone())
        ),
        format!("Applications:      {}", status.records),
        format!("Unsynced:          {}", status.dirty),
        format!("Pending deletions: {}", status.pending_deletions),
        format!(
            "Last push:         {}",
            status.checkpoint.last_push_at.map_or_else(never, format_timestamp)
        ),
        format!(
            "Last sync:         {}",
            status.checkpoint.last_pull_at.map_or_else(never, format_timestamp)
        ),
    ]
}
