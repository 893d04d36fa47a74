//! Remote store configuration.
//!
//! The remote is optional: without `JOBLOG_REMOTE_URL` the tracker works
//! purely locally and push/sync are unavailable.

use std::time::Duration;

use crate::remote::{RemoteError, RemoteResult};
use crate::util::normalize_text_option;

pub const REMOTE_URL_ENV: &str = "JOBLOG_REMOTE_URL";
pub const REMOTE_TOKEN_ENV: &str = "JOBLOG_REMOTE_TOKEN";
pub const REMOTE_TIMEOUT_ENV: &str = "JOBLOG_REMOTE_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection details for the remote store
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RemoteConfig {
    /// Create a config for `base_url` with the default timeout and no token
    pub fn new(base_url: impl Into<String>) -> RemoteResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.into())?,
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = normalize_text_option(Some(token.into()));
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the config from process environment variables.
    ///
    /// Returns `Ok(None)` when no remote URL is configured.
    pub fn from_env() -> RemoteResult<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the config through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RemoteResult<Option<Self>> {
        let Some(base_url) = normalize_text_option(lookup(REMOTE_URL_ENV)) else {
            return Ok(None);
        };

        let mut config = Self::new(base_url)?;
        if let Some(token) = normalize_text_option(lookup(REMOTE_TOKEN_ENV)) {
            config = config.with_auth_token(token);
        }
        if let Some(raw) = normalize_text_option(lookup(REMOTE_TIMEOUT_ENV)) {
            let seconds = raw.parse::<u64>().ok().filter(|seconds| *seconds > 0).ok_or_else(|| {
                RemoteError::InvalidConfiguration(format!(
                    "{REMOTE_TIMEOUT_ENV} must be a positive number of seconds, got '{raw}'"
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(seconds));
        }

        Ok(Some(config))
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("remote URL must not be empty".to_string())
    })?;
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "remote URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn missing_url_means_local_only() {
        assert_eq!(RemoteConfig::from_lookup(lookup(&[])).unwrap(), None);
        assert_eq!(
            RemoteConfig::from_lookup(lookup(&[(REMOTE_URL_ENV, "  ")])).unwrap(),
            None
        );
    }

    #[test]
    fn reads_all_variables() {
        let config = RemoteConfig::from_lookup(lookup(&[
            (REMOTE_URL_ENV, " https://jobs.example.com/ "),
            (REMOTE_TOKEN_ENV, "secret"),
            (REMOTE_TIMEOUT_ENV, "3"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.base_url, "https://jobs.example.com");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(RemoteConfig::from_lookup(lookup(&[(REMOTE_URL_ENV, "jobs.example.com")])).is_err());
        assert!(RemoteConfig::from_lookup(lookup(&[
            (REMOTE_URL_ENV, "http://localhost:8787"),
            (REMOTE_TIMEOUT_ENV, "0"),
        ]))
        .is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let config = RemoteConfig::new("http://localhost:8787")
            .unwrap()
            .with_auth_token("secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
