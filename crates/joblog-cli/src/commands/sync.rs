use std::path::Path;

use joblog_core::config::RemoteConfig;
use joblog_core::sync::SyncPolicy;

use crate::commands::common::{format_push_report, open_sync_engine};
use crate::error::CliError;

pub async fn run_push(db_path: &Path, remote: Option<&RemoteConfig>) -> Result<(), CliError> {
    let engine = open_sync_engine(db_path, remote, SyncPolicy::default()).await?;
    let report = engine.push_report().await?;

    for line in format_push_report(&report) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_sync(
    db_path: &Path,
    remote: Option<&RemoteConfig>,
    force: bool,
) -> Result<(), CliError> {
    let policy = SyncPolicy {
        allow_empty_remote_overwrite: force,
    };
    let engine = open_sync_engine(db_path, remote, policy).await?;

    let pulled = match engine.sync().await {
        Err(error @ joblog_core::Error::EmptyRemote { .. }) => {
            eprintln!("Run `joblog sync --force` to accept the empty remote.");
            return Err(error.into());
        }
        result => result?,
    };
    println!("Sync completed: {pulled} application(s) stored locally");
    Ok(())
}
