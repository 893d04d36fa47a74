//! joblog-core - Core library for joblog
//!
//! This crate contains the application model, the local record store, the
//! remote store client, and the sync engine used by the joblog CLI and API.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod search;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Application, ApplicationDraft, ApplicationId};
