//! Application record model

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Calendar date format used for `day` everywhere (storage, wire, filters)
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Platform tags offered by default; other values are kept as free text
pub const KNOWN_PLATFORMS: [&str; 5] = ["LinkedIn", "Indeed", "Company Website", "Email", "Other"];

/// Opaque identifier of an application record.
///
/// Ids generated locally are UUID v7 (time-sortable). Ids pulled from the
/// remote store are accepted as any non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Create a new unique id using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("Application id cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Resume variants sent with an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResumeFormat {
    #[serde(rename = "ATS Friendly")]
    AtsFriendly,
    #[serde(rename = "Human Friendly")]
    HumanFriendly,
}

impl ResumeFormat {
    pub const ALL: [Self; 2] = [Self::AtsFriendly, Self::HumanFriendly];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AtsFriendly => "ATS Friendly",
            Self::HumanFriendly => "Human Friendly",
        }
    }

    /// Parse a label case-insensitively; short forms `ats` and `human` are accepted
    #[must_use]
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ats friendly" | "ats" => Some(Self::AtsFriendly),
            "human friendly" | "human" => Some(Self::HumanFriendly),
            _ => None,
        }
    }
}

impl fmt::Display for ResumeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResumeFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s)
            .ok_or_else(|| Error::Validation(format!("Unknown resume format: {}", s.trim())))
    }
}

/// Delivery state of the application mail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MailStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl MailStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Sent, Self::Failed];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Sent => "Sent",
            Self::Failed => "Failed",
        }
    }

    /// Parse a label case-insensitively.
    ///
    /// `delivered` and `bounced` are historical spellings of `Sent` and `Failed`.
    #[must_use]
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "sent" | "delivered" => Some(Self::Sent),
            "failed" | "bounced" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for MailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MailStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s)
            .ok_or_else(|| Error::Validation(format!("Unknown mail status: {}", s.trim())))
    }
}

/// Coarse classification of a free-form response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStage {
    Waiting,
    InProgress,
    Positive,
    Negative,
    Other,
}

/// Employer response, kept as free text and compared case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseState(String);

impl ResponseState {
    pub const NO_RESPONSE: &'static str = "No Response";

    /// Suggested values offered by clients
    pub const SUGGESTED: [&'static str; 7] = [
        "No Response",
        "Applied",
        "Callback",
        "Interview Scheduled",
        "Offer Received",
        "Hired",
        "Rejected",
    ];

    /// Create a response; blank input falls back to `No Response`
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::default()
        } else {
            Self(trimmed.to_string())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a label
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        self.0.eq_ignore_ascii_case(label.trim())
    }

    #[must_use]
    pub fn stage(&self) -> ResponseStage {
        match self.0.to_ascii_lowercase().as_str() {
            "no response" | "pending" | "applied" => ResponseStage::Waiting,
            "callback" | "interviewed" | "interview scheduled" => ResponseStage::InProgress,
            "offer" | "offer received" | "accepted" | "hired" => ResponseStage::Positive,
            "rejected" | "declined" => ResponseStage::Negative,
            _ => ResponseStage::Other,
        }
    }
}

impl Default for ResponseState {
    fn default() -> Self {
        Self(Self::NO_RESPONSE.to_string())
    }
}

impl fmt::Display for ResponseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize a platform tag.
///
/// Known platforms are matched case-insensitively and returned with their
/// canonical spelling; anything else is trimmed. Blank input yields `None`.
#[must_use]
pub fn normalize_platform(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let canonical = KNOWN_PLATFORMS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(trimmed))
        .map_or(trimmed, |known| *known);
    Some(canonical.to_string())
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT)
        .map_err(|error| Error::Validation(format!("Invalid date '{}': {error}", value.trim())))
}

/// User-supplied fields for creating or updating an application.
///
/// `id` is only honoured on create; updates address the record by id and
/// never change it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub id: Option<ApplicationId>,
    pub company: String,
    pub day: Option<NaiveDate>,
    pub mail_delivered: bool,
    pub resume_format: BTreeSet<ResumeFormat>,
    pub mail_status: MailStatus,
    pub response: ResponseState,
    pub platforms: BTreeSet<String>,
}

impl ApplicationDraft {
    #[must_use]
    pub fn new(company: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            company: company.into(),
            day: Some(day),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: ApplicationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: &str) -> Self {
        if let Some(platform) = normalize_platform(platform) {
            self.platforms.insert(platform);
        }
        self
    }

    #[must_use]
    pub fn with_resume_format(mut self, format: ResumeFormat) -> Self {
        self.resume_format.insert(format);
        self
    }

    #[must_use]
    pub const fn with_mail_status(mut self, status: MailStatus) -> Self {
        self.mail_status = status;
        self
    }

    #[must_use]
    pub const fn with_mail_delivered(mut self, delivered: bool) -> Self {
        self.mail_delivered = delivered;
        self
    }

    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = ResponseState::new(response);
        self
    }

    /// Check required fields, returning the trimmed company and the day
    pub fn validate(&self) -> Result<(String, NaiveDate)> {
        let company = self.company.trim();
        if company.is_empty() {
            return Err(Error::Validation("Company is required".into()));
        }
        let day = self
            .day
            .ok_or_else(|| Error::Validation("Date is required".into()))?;
        Ok((company.to_string(), day))
    }

    fn normalized_platforms(&self) -> BTreeSet<String> {
        self.platforms
            .iter()
            .filter_map(|platform| normalize_platform(platform))
            .collect()
    }
}

/// A tracked job application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Unique identifier, immutable once assigned
    pub id: ApplicationId,
    pub company: String,
    /// Application date
    pub day: NaiveDate,
    pub mail_delivered: bool,
    pub resume_format: BTreeSet<ResumeFormat>,
    pub mail_status: MailStatus,
    pub response: ResponseState,
    pub platforms: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// True iff the remote copy is known to match this one
    pub synced: bool,
}

impl Application {
    /// Build a fresh, unsynced record from a validated draft
    pub fn from_draft(draft: &ApplicationDraft, now: DateTime<Utc>) -> Result<Self> {
        let (company, day) = draft.validate()?;
        Ok(Self {
            id: draft.id.clone().unwrap_or_default(),
            company,
            day,
            mail_delivered: draft.mail_delivered,
            resume_format: draft.resume_format.clone(),
            mail_status: draft.mail_status,
            response: draft.response.clone(),
            platforms: draft.normalized_platforms(),
            created_at: now,
            updated_at: now,
            synced: false,
        })
    }

    /// Replace all user fields from a draft and mark the record dirty.
    ///
    /// `id` and `created_at` are preserved.
    pub fn apply_draft(&mut self, draft: &ApplicationDraft, now: DateTime<Utc>) -> Result<()> {
        let (company, day) = draft.validate()?;
        if let Some(id) = &draft.id {
            if id != &self.id {
                return Err(Error::Validation(format!(
                    "Application id is immutable ({} != {id})",
                    self.id
                )));
            }
        }

        self.company = company;
        self.day = day;
        self.mail_delivered = draft.mail_delivered;
        self.resume_format.clone_from(&draft.resume_format);
        self.mail_status = draft.mail_status;
        self.response = draft.response.clone();
        self.platforms = draft.normalized_platforms();
        self.updated_at = now.max(self.created_at);
        self.synced = false;
        Ok(())
    }

    /// Draft carrying this record's current field values
    #[must_use]
    pub fn to_draft(&self) -> ApplicationDraft {
        ApplicationDraft {
            id: Some(self.id.clone()),
            company: self.company.clone(),
            day: Some(self.day),
            mail_delivered: self.mail_delivered,
            resume_format: self.resume_format.clone(),
            mail_status: self.mail_status,
            response: self.response.clone(),
            platforms: self.platforms.clone(),
        }
    }

    /// `day` rendered as `YYYY-MM-DD`
    #[must_use]
    pub fn day_string(&self) -> String {
        self.day.format(DAY_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(value: &str) -> NaiveDate {
        parse_day(value).unwrap()
    }

    #[test]
    fn test_application_id_unique() {
        let ids = (0..64).map(|_| ApplicationId::new()).collect::<BTreeSet<_>>();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn test_application_id_rejects_blank() {
        assert!(" \t".parse::<ApplicationId>().is_err());
        assert_eq!(" abc ".parse::<ApplicationId>().unwrap().as_str(), "abc");
    }

    #[test]
    fn test_from_draft_sets_dirty_and_timestamps() {
        let now = Utc::now();
        let draft = ApplicationDraft::new("  Acme  ", day("2025-01-10"));
        let app = Application::from_draft(&draft, now).unwrap();

        assert_eq!(app.company, "Acme");
        assert!(!app.synced);
        assert_eq!(app.created_at, now);
        assert_eq!(app.updated_at, now);
        assert_eq!(app.response.as_str(), "No Response");
        assert_eq!(app.mail_status, MailStatus::Pending);
    }

    #[test]
    fn test_from_draft_keeps_supplied_id() {
        let id: ApplicationId = "fixed-id".parse().unwrap();
        let draft = ApplicationDraft::new("Acme", day("2025-01-10")).with_id(id.clone());
        let app = Application::from_draft(&draft, Utc::now()).unwrap();
        assert_eq!(app.id, id);
    }

    #[test]
    fn test_validation_requires_company_and_day() {
        let missing_company = ApplicationDraft::new("   ", day("2025-01-10"));
        assert!(matches!(
            missing_company.validate(),
            Err(Error::Validation(message)) if message.contains("Company")
        ));

        let missing_day = ApplicationDraft {
            company: "Acme".into(),
            ..ApplicationDraft::default()
        };
        assert!(matches!(
            missing_day.validate(),
            Err(Error::Validation(message)) if message.contains("Date")
        ));
    }

    #[test]
    fn test_apply_draft_preserves_identity() {
        let created = Utc::now();
        let mut app =
            Application::from_draft(&ApplicationDraft::new("Acme", day("2025-01-10")), created)
                .unwrap();
        app.synced = true;

        let later = created + chrono::Duration::seconds(5);
        let draft = ApplicationDraft::new("Acme Corp", day("2025-01-11"))
            .with_response("Interview Scheduled");
        app.apply_draft(&draft, later).unwrap();

        assert_eq!(app.company, "Acme Corp");
        assert_eq!(app.created_at, created);
        assert_eq!(app.updated_at, later);
        assert!(!app.synced);
    }

    #[test]
    fn test_apply_draft_rejects_id_change() {
        let mut app = Application::from_draft(
            &ApplicationDraft::new("Acme", day("2025-01-10")),
            Utc::now(),
        )
        .unwrap();
        let draft = ApplicationDraft::new("Acme", day("2025-01-10"))
            .with_id("other".parse().unwrap());
        assert!(app.apply_draft(&draft, Utc::now()).is_err());
    }

    #[test]
    fn test_normalize_platform() {
        assert_eq!(normalize_platform("linkedin").as_deref(), Some("LinkedIn"));
        assert_eq!(
            normalize_platform(" company website ").as_deref(),
            Some("Company Website")
        );
        assert_eq!(normalize_platform(" Wellfound ").as_deref(), Some("Wellfound"));
        assert_eq!(normalize_platform("  "), None);
    }

    #[test]
    fn test_response_matching_is_case_insensitive() {
        let response = ResponseState::new("interview scheduled");
        assert!(response.matches("Interview Scheduled"));
        assert_eq!(response.stage(), ResponseStage::InProgress);
        assert_eq!(ResponseState::new("HIRED").stage(), ResponseStage::Positive);
        assert_eq!(ResponseState::new("").as_str(), "No Response");
        assert_eq!(ResponseState::new("Ghosted").stage(), ResponseStage::Other);
    }

    #[test]
    fn test_enum_labels() {
        assert_eq!(
            ResumeFormat::from_label("ats friendly"),
            Some(ResumeFormat::AtsFriendly)
        );
        assert_eq!(MailStatus::from_label("Bounced"), Some(MailStatus::Failed));
        assert!("unknown".parse::<MailStatus>().is_err());
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let app = Application::from_draft(
            &ApplicationDraft::new("Acme", day("2025-01-10"))
                .with_resume_format(ResumeFormat::AtsFriendly)
                .with_platform("LinkedIn"),
            Utc::now(),
        )
        .unwrap();
        let value = serde_json::to_value(&app).unwrap();

        assert_eq!(value["day"], "2025-01-10");
        assert_eq!(value["mailStatus"], "Pending");
        assert_eq!(value["resumeFormat"][0], "ATS Friendly");
        assert_eq!(value["platforms"][0], "LinkedIn");
        assert_eq!(value["synced"], false);
    }
}
