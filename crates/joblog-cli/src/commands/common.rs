use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use joblog_core::config::RemoteConfig;
use joblog_core::models::{Application, ApplicationDraft, ApplicationId};
use joblog_core::remote::HttpRemoteStore;
use joblog_core::services::DatabaseService;
use joblog_core::sync::{PushReport, SyncEngine, SyncPolicy};
use serde::Serialize;

use crate::cli::{AddArgs, EditArgs};
use crate::error::CliError;

pub const DB_PATH_ENV: &str = "JOBLOG_DB_PATH";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListItem {
    pub id: String,
    pub company: String,
    pub day: String,
    pub mail_delivered: bool,
    pub resume_format: Vec<String>,
    pub mail_status: String,
    pub response: String,
    pub platforms: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub relative_time: String,
    pub synced: bool,
}

pub fn application_to_list_item(app: &Application) -> ApplicationListItem {
    ApplicationListItem {
        id: app.id.to_string(),
        company: app.company.clone(),
        day: app.day_string(),
        mail_delivered: app.mail_delivered,
        resume_format: app
            .resume_format
            .iter()
            .map(|format| format.label().to_string())
            .collect(),
        mail_status: app.mail_status.label().to_string(),
        response: app.response.to_string(),
        platforms: app.platforms.iter().cloned().collect(),
        created_at: app.created_at.to_rfc3339(),
        updated_at: app.updated_at.to_rfc3339(),
        relative_time: format_relative_time(app.created_at, Utc::now()),
        synced: app.synced,
    }
}

pub fn short_id(id: &ApplicationId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// One line per application; unsynced ones are flagged with `*`
pub fn format_application_lines(applications: &[Application]) -> Vec<String> {
    let now = Utc::now();
    applications
        .iter()
        .map(|app| {
            let short_id = short_id(&app.id);
            let company = truncate(&app.company, 28);
            let response = truncate(app.response.as_str(), 20);
            let relative_time = format_relative_time(app.created_at, now);
            let marker = if app.synced { ' ' } else { '*' };

            format!(
                "{marker} {short_id:<13}  {company:<28}  {}  {:<7}  {response:<20}  {relative_time}",
                app.day_string(),
                app.mail_status.label()
            )
        })
        .collect()
}

pub fn format_application_details(app: &Application) -> Vec<String> {
    let join = |values: Vec<String>| {
        if values.is_empty() {
            "-".to_string()
        } else {
            values.join(", ")
        }
    };

    vec![
        format!("ID:             {}", app.id),
        format!("Company:        {}", app.company),
        format!("Date:           {}", app.day_string()),
        format!(
            "Mail delivered: {}",
            if app.mail_delivered { "yes" } else { "no" }
        ),
        format!(
            "Resume format:  {}",
            join(
                app.resume_format
                    .iter()
                    .map(|format| format.label().to_string())
                    .collect()
            )
        ),
        format!("Mail status:    {}", app.mail_status),
        format!("Response:       {}", app.response),
        format!(
            "Platforms:      {}",
            join(app.platforms.iter().cloned().collect())
        ),
        format!("Created:        {}", format_timestamp(app.created_at)),
        format!("Updated:        {}", format_timestamp(app.updated_at)),
        format!(
            "Synced:         {}",
            if app.synced { "yes" } else { "no (push pending)" }
        ),
    ]
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(at).num_milliseconds().max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn format_push_report(report: &PushReport) -> Vec<String> {
    if !report.changed() && report.is_complete() && report.superseded.is_empty() {
        return vec!["Nothing to push".to_string()];
    }

    let mut lines = vec![format!(
        "Pushed {} application(s), confirmed {} deletion(s)",
        report.pushed.len(),
        report.deleted.len()
    )];
    lines.extend(
        report
            .superseded
            .iter()
            .map(|id| format!("Changed during push, still unsynced: {id}")),
    );
    lines.extend(
        report
            .failed
            .iter()
            .map(|(id, reason)| format!("Failed to push {id}: {reason}")),
    );
    lines.extend(
        report
            .failed_deletions
            .iter()
            .map(|(id, reason)| format!("Failed to delete {id}: {reason}")),
    );
    lines
}

pub fn normalize_application_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyApplicationId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub async fn resolve_application(
    query: &str,
    db: &DatabaseService,
) -> Result<Application, CliError> {
    let query = normalize_application_identifier(query)?;
    let id = db.resolve_id(&query).await?;
    db.get_application(&id)
        .await?
        .ok_or_else(|| joblog_core::Error::NotFound(query).into())
}

pub fn draft_from_add_args(args: &AddArgs, today: chrono::NaiveDate) -> Result<ApplicationDraft, CliError> {
    let mut draft = ApplicationDraft::new(args.company.clone(), args.date.unwrap_or(today))
        .with_mail_delivered(args.delivered)
        .with_mail_status(args.mail_status.unwrap_or_default());

    if let Some(id) = &args.id {
        draft = draft.with_id(normalize_application_identifier(id)?.parse()?);
    }
    for format in &args.resume_format {
        draft = draft.with_resume_format(*format);
    }
    for platform in &args.platforms {
        draft = draft.with_platform(platform);
    }
    if let Some(response) = &args.response {
        draft = draft.with_response(response.clone());
    }
    Ok(draft)
}

/// Start from the stored record and overlay only the flags that were given
pub fn draft_from_edit_args(current: &Application, args: &EditArgs) -> ApplicationDraft {
    let mut draft = current.to_draft();

    if let Some(company) = &args.company {
        draft.company.clone_from(company);
    }
    if let Some(date) = args.date {
        draft.day = Some(date);
    }
    if args.clear_resume || !args.resume_format.is_empty() {
        draft.resume_format = args.resume_format.iter().copied().collect();
    }
    if args.clear_platforms || !args.platforms.is_empty() {
        draft.platforms.clear();
        for platform in &args.platforms {
            draft = draft.with_platform(platform);
        }
    }
    if let Some(status) = args.mail_status {
        draft.mail_status = status;
    }
    if let Some(delivered) = args.delivered {
        draft.mail_delivered = delivered;
    }
    if let Some(response) = &args.response {
        draft = draft.with_response(response.clone());
    }
    draft
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("joblog").join("joblog.db"))
        .ok_or(CliError::NoDataDir)
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path.to_path_buf()).await?)
}

pub async fn open_sync_engine(
    db_path: &Path,
    remote: Option<&RemoteConfig>,
    policy: SyncPolicy,
) -> Result<SyncEngine<DatabaseService, HttpRemoteStore>, CliError> {
    let Some(remote) = remote else {
        return Err(CliError::SyncNotConfigured);
    };

    let remote = HttpRemoteStore::new(remote)?;
    let db = open_database(db_path).await?;
    tracing::debug!("Using remote store at {}", remote.base_url());
    Ok(SyncEngine::new(db, remote).with_policy(policy))
}
