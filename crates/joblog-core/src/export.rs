//! Export helpers: the application list as JSON or a Markdown table.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::Application;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Flat row used by both formats, one per application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
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
}

impl From<&Application> for ExportRow {
    fn from(app: &Application) -> Self {
        Self {
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
        }
    }
}

/// Render applications as pretty-printed JSON.
pub fn render_json_export(applications: &[Application]) -> serde_json::Result<String> {
    let rows = applications
        .iter()
        .map(ExportRow::from)
        .collect::<Vec<ExportRow>>();
    serde_json::to_string_pretty(&rows)
}

/// Render applications as a Markdown table.
#[must_use]
pub fn render_markdown_export(applications: &[Application]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "| Company | Date | Mail Delivered | Resume Format | Mail Status | Response | Platforms |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|");

    for row in applications.iter().map(ExportRow::from) {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} | {} |",
            escape_cell(&row.company),
            row.day,
            if row.mail_delivered { "Yes" } else { "No" },
            escape_cell(&row.resume_format.join(", ")),
            row.mail_status,
            escape_cell(&row.response),
            escape_cell(&row.platforms.join(", ")),
        );
    }

    output
}

/// Render applications in the selected format.
pub fn render_export(
    applications: &[Application],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(applications),
        ExportFormat::Markdown => Ok(render_markdown_export(applications)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("joblog-export-{timestamp_ms}.{}", format.extension())
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\n', '\r'], " ")
}
