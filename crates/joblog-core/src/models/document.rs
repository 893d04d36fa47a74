//! Wire document exchanged with the remote store
//!
//! Remote documents may predate the current record shape: older clients wrote
//! `atsResume`/`humanResume` booleans instead of a `resumeFormat` set and
//! sometimes stored `platforms` as a single string. Conversion into
//! [`Application`] maps every such shape once, here.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::application::{
    normalize_platform, Application, ApplicationId, MailStatus, ResponseState, ResumeFormat,
    DAY_FORMAT,
};
use crate::error::{Error, Result};

/// A list field that older documents stored as a bare string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_values(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Application as stored by the remote store.
///
/// Every field is optional on read; [`Application::try_from`] decides what is
/// required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub mail_delivered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_format: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ats_resume: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_resume: Option<bool>,
    #[serde(default)]
    pub mail_status: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<OneOrMany>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub synced: Option<bool>,
}

impl ApplicationDocument {
    /// Id carried by the document, if any
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

impl From<&Application> for ApplicationDocument {
    /// Canonical document for a record; the remote copy is synced by definition
    fn from(app: &Application) -> Self {
        Self {
            id: Some(app.id.to_string()),
            company: Some(app.company.clone()),
            day: Some(app.day_string()),
            mail_delivered: Some(app.mail_delivered),
            resume_format: Some(OneOrMany::Many(
                app.resume_format
                    .iter()
                    .map(|format| format.label().to_string())
                    .collect(),
            )),
            ats_resume: None,
            human_resume: None,
            mail_status: Some(app.mail_status.label().to_string()),
            response: Some(app.response.to_string()),
            platforms: Some(OneOrMany::Many(app.platforms.iter().cloned().collect())),
            created_at: Some(app.created_at.to_rfc3339()),
            updated_at: Some(app.updated_at.to_rfc3339()),
            synced: Some(true),
        }
    }
}

impl TryFrom<ApplicationDocument> for Application {
    type Error = Error;

    fn try_from(doc: ApplicationDocument) -> Result<Self> {
        let id = doc
            .id()
            .ok_or_else(|| Error::Store("remote document is missing an id".into()))?
            .parse::<ApplicationId>()?;

        let company = doc
            .company
            .as_deref()
            .map(str::trim)
            .filter(|company| !company.is_empty())
            .ok_or_else(|| Error::Store(format!("remote document {id} is missing a company")))?
            .to_string();

        let day = doc
            .day
            .as_deref()
            .and_then(parse_document_day)
            .ok_or_else(|| Error::Store(format!("remote document {id} has no valid day")))?;

        let resume_format = normalize_resume_format(
            doc.resume_format,
            doc.ats_resume.unwrap_or(false),
            doc.human_resume.unwrap_or(false),
        );

        let mail_status = match doc.mail_status.as_deref() {
            None => MailStatus::default(),
            Some(raw) => MailStatus::from_label(raw).unwrap_or_else(|| {
                tracing::warn!("Unknown mail status '{raw}' on {id}; using Pending");
                MailStatus::default()
            }),
        };

        let platforms = doc
            .platforms
            .map(OneOrMany::into_values)
            .unwrap_or_default()
            .iter()
            .filter_map(|platform| normalize_platform(platform))
            .collect();

        let created_at = doc.created_at.as_deref().and_then(parse_timestamp);
        let updated_at = doc.updated_at.as_deref().and_then(parse_timestamp);
        let now = Utc::now();
        let created_at = created_at.or(updated_at).unwrap_or(now);
        let updated_at = updated_at.unwrap_or(created_at);

        Ok(Self {
            id,
            company,
            day,
            mail_delivered: doc.mail_delivered.unwrap_or(false),
            resume_format,
            mail_status,
            response: ResponseState::new(doc.response.unwrap_or_default()),
            platforms,
            created_at,
            updated_at,
            synced: true,
        })
    }
}

fn normalize_resume_format(
    listed: Option<OneOrMany>,
    ats_resume: bool,
    human_resume: bool,
) -> BTreeSet<ResumeFormat> {
    if let Some(listed) = listed {
        return listed
            .into_values()
            .iter()
            .filter(|value| !value.trim().is_empty())
            .filter_map(|value| {
                let parsed = ResumeFormat::from_label(value);
                if parsed.is_none() {
                    tracing::warn!("Dropping unknown resume format '{value}'");
                }
                parsed
            })
            .collect();
    }

    let mut formats = BTreeSet::new();
    if ats_resume {
        formats.insert(ResumeFormat::AtsFriendly);
    }
    if human_resume {
        formats.insert(ResumeFormat::HumanFriendly);
    }
    formats
}

fn parse_document_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DAY_FORMAT).ok().or_else(|| {
        raw.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, DAY_FORMAT).ok())
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationDraft;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> ApplicationDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn canonical_document_round_trips() {
        let draft = ApplicationDraft::new("Acme", NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
            .with_resume_format(ResumeFormat::HumanFriendly)
            .with_platform("Indeed")
            .with_response("Callback");
        let app = Application::from_draft(&draft, Utc::now()).unwrap();

        let doc = ApplicationDocument::from(&app);
        assert_eq!(doc.synced, Some(true));

        let restored = Application::try_from(doc).unwrap();
        assert_eq!(restored.id, app.id);
        assert_eq!(restored.company, app.company);
        assert_eq!(restored.resume_format, app.resume_format);
        assert_eq!(restored.platforms, app.platforms);
        assert_eq!(restored.created_at, app.created_at);
        assert!(restored.synced);
    }

    #[test]
    fn legacy_boolean_resume_flags_become_tags() {
        let doc = parse(
            r#"{"id":"a1","company":"Acme","day":"2024-11-02","atsResume":true,"humanResume":true}"#,
        );
        let app = Application::try_from(doc).unwrap();
        assert_eq!(
            app.resume_format,
            BTreeSet::from([ResumeFormat::AtsFriendly, ResumeFormat::HumanFriendly])
        );
    }

    #[test]
    fn resume_format_list_wins_over_legacy_flags() {
        let doc = parse(
            r#"{"id":"a1","company":"Acme","day":"2024-11-02","resumeFormat":["Human Friendly"],"atsResume":true}"#,
        );
        let app = Application::try_from(doc).unwrap();
        assert_eq!(app.resume_format, BTreeSet::from([ResumeFormat::HumanFriendly]));
    }

    #[test]
    fn single_string_lists_are_wrapped() {
        let doc = parse(
            r#"{"id":"a1","company":"Acme","day":"2024-11-02","platforms":"linkedin","resumeFormat":"ATS Friendly"}"#,
        );
        let app = Application::try_from(doc).unwrap();
        assert_eq!(app.platforms, BTreeSet::from(["LinkedIn".to_string()]));
        assert_eq!(app.resume_format, BTreeSet::from([ResumeFormat::AtsFriendly]));

        let empty = parse(r#"{"id":"a2","company":"Acme","day":"2024-11-02","platforms":""}"#);
        assert!(Application::try_from(empty).unwrap().platforms.is_empty());
    }

    #[test]
    fn missing_optional_fields_get_defaults() {
        let doc = parse(
            r#"{"id":"a1","company":" Acme ","day":"2024-11-02","updatedAt":"2024-11-03T10:00:00Z"}"#,
        );
        let app = Application::try_from(doc).unwrap();
        assert_eq!(app.company, "Acme");
        assert_eq!(app.mail_status, MailStatus::Pending);
        assert_eq!(app.response.as_str(), "No Response");
        assert_eq!(app.created_at, app.updated_at);
        assert!(!app.mail_delivered);
    }

    #[test]
    fn timestamp_day_is_truncated_to_date() {
        let doc = parse(r#"{"id":"a1","company":"Acme","day":"2024-11-02T00:00:00.000Z"}"#);
        let app = Application::try_from(doc).unwrap();
        assert_eq!(app.day_string(), "2024-11-02");
    }

    #[test]
    fn documents_without_id_or_company_are_rejected() {
        let no_id = parse(r#"{"company":"Acme","day":"2024-11-02"}"#);
        assert!(matches!(Application::try_from(no_id), Err(Error::Store(_))));

        let blank_company = parse(r#"{"id":"a1","company":"  ","day":"2024-11-02"}"#);
        assert!(matches!(
            Application::try_from(blank_company),
            Err(Error::Store(_))
        ));

        let bad_day = parse(r#"{"id":"a1","company":"Acme","day":"soon"}"#);
        assert!(matches!(Application::try_from(bad_day), Err(Error::Store(_))));
    }
}
