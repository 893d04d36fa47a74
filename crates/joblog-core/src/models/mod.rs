//! Data models for joblog

mod application;
mod document;
mod sync_state;

pub use application::{
    normalize_platform, parse_day, Application, ApplicationDraft, ApplicationId, MailStatus,
    ResponseStage, ResponseState, ResumeFormat, DAY_FORMAT, KNOWN_PLATFORMS,
};
pub use document::{ApplicationDocument, OneOrMany};
pub use sync_state::{PendingDeletion, SyncCheckpoint};
