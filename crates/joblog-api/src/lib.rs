//! Remote document store for joblog sync
//!
//! Serves the `/v1/applications` contract that `joblog_core::remote::HttpRemoteStore`
//! talks to. Documents are normalized on write and kept in a libSQL file
//! (`JOBLOG_API_DB_PATH`), so a restart serves the same set.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod store;

pub use config::AppConfig;
pub use routes::{app_router, AppState};
pub use store::{DocumentStore, StoreError};
