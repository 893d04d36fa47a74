//! Database layer for joblog

mod connection;
mod migrations;
mod repository;
mod sync_state_repository;

pub use connection::Database;
pub use repository::{ApplicationRepository, LibSqlApplicationRepository};
pub use sync_state_repository::{LibSqlSyncStateRepository, SyncStateRepository};
