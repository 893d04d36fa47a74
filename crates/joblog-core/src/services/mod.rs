//! Service layer shared by the CLI and tests

mod database;

pub use database::{DatabaseService, StoreStatus};
