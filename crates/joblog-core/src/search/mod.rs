//! Read-only filtering over stored applications
//!
//! Filters are pure projections: they never touch the store and never affect
//! sync state.

use chrono::NaiveDate;

use crate::models::Application;
use crate::util::normalize_text_option;

/// Company substring plus an inclusive date range; empty fields match all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub company: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ApplicationFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = normalize_text_option(Some(company.into()));
        self
    }

    #[must_use]
    pub const fn start_date(mut self, day: NaiveDate) -> Self {
        self.start_date = Some(day);
        self
    }

    #[must_use]
    pub const fn end_date(mut self, day: NaiveDate) -> Self {
        self.end_date = Some(day);
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.company.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    #[must_use]
    pub fn matches(&self, app: &Application) -> bool {
        let company_matches = self.company.as_deref().is_none_or(|needle| {
            app.company
                .to_lowercase()
                .contains(&needle.trim().to_lowercase())
        });

        company_matches
            && self.start_date.is_none_or(|start| app.day >= start)
            && self.end_date.is_none_or(|end| app.day <= end)
    }

    /// Keep matching applications, preserving input order
    #[must_use]
    pub fn apply(&self, applications: Vec<Application>) -> Vec<Application> {
        if self.is_empty() {
            return applications;
        }
        applications
            .into_iter()
            .filter(|app| self.matches(app))
            .collect()
    }
}

/// Newest first by creation time, then by id for a stable order
pub fn sort_newest_first(applications: &mut [Application]) {
    applications.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationDraft;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn day(value: &str) -> NaiveDate {
        crate::models::parse_day(value).unwrap()
    }

    fn app(company: &str, on: &str) -> Application {
        Application::from_draft(&ApplicationDraft::new(company, day(on)), Utc::now()).unwrap()
    }

    fn companies(apps: &[Application]) -> Vec<&str> {
        apps.iter().map(|app| app.company.as_str()).collect()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let apps = vec![app("Acme", "2025-01-10"), app("Globex", "2024-12-01")];
        assert_eq!(ApplicationFilter::new().apply(apps.clone()), apps);
    }

    #[test]
    fn company_is_case_insensitive_substring() {
        let apps = vec![
            app("Acme Corp", "2025-01-10"),
            app("Globex", "2025-01-10"),
            app("ACME Labs", "2025-01-10"),
        ];
        let filtered = ApplicationFilter::new().company("acme").apply(apps);
        assert_eq!(companies(&filtered), vec!["Acme Corp", "ACME Labs"]);
    }

    #[test]
    fn blank_company_is_ignored() {
        let filter = ApplicationFilter::new().company("   ");
        assert!(filter.is_empty());
    }

    #[test]
    fn date_range_is_inclusive() {
        let apps = vec![
            app("Before", "2025-01-09"),
            app("Start", "2025-01-10"),
            app("Middle", "2025-01-15"),
            app("End", "2025-01-20"),
            app("After", "2025-01-21"),
        ];
        let filtered = ApplicationFilter::new()
            .start_date(day("2025-01-10"))
            .end_date(day("2025-01-20"))
            .apply(apps);
        assert_eq!(companies(&filtered), vec!["Start", "Middle", "End"]);
    }

    #[test]
    fn open_ended_ranges() {
        let apps = vec![app("Old", "2024-06-01"), app("New", "2025-06-01")];
        let since = ApplicationFilter::new()
            .start_date(day("2025-01-01"))
            .apply(apps.clone());
        assert_eq!(companies(&since), vec!["New"]);

        let until = ApplicationFilter::new().end_date(day("2025-01-01")).apply(apps);
        assert_eq!(companies(&until), vec!["Old"]);
    }

    #[test]
    fn sort_newest_first_uses_created_at() {
        let mut older = app("Older", "2025-01-10");
        older.created_at -= Duration::hours(1);
        let newer = app("Newer", "2025-01-01");

        let mut apps = vec![older, newer];
        sort_newest_first(&mut apps);
        assert_eq!(companies(&apps), vec!["Newer", "Older"]);
    }
}
