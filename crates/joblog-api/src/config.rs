use std::collections::HashMap;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const BIND_ADDR_VAR: &str = "JOBLOG_API_BIND_ADDR";
const API_TOKEN_VAR: &str = "JOBLOG_API_TOKEN";
const DB_PATH_VAR: &str = "JOBLOG_API_DB_PATH";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_DB_PATH: &str = "joblog-api.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// libSQL file holding the documents; `:memory:` keeps them for the process lifetime only
    pub db_path: PathBuf,
    /// Bearer token every `/v1` request must carry; open access when unset
    pub api_token: Option<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("db_path", &self.db_path)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            api_token: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, BIND_ADDR_VAR, DEFAULT_BIND_ADDR);
        if bind_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "{BIND_ADDR_VAR} must be a socket address like {DEFAULT_BIND_ADDR}, got '{bind_addr}'"
            )));
        }

        Ok(Self {
            bind_addr,
            db_path: PathBuf::from(value_or_default(&lookup, DB_PATH_VAR, DEFAULT_DB_PATH)),
            api_token: optional_trimmed(&lookup, API_TOKEN_VAR),
        })
    }

    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_defaults_to_local_open_server() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn config_reads_db_path() {
        let config = config_from(&[(DB_PATH_VAR, " /var/lib/joblog/api.db ")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/joblog/api.db"));
    }

    #[test]
    fn config_reads_bind_addr_and_token() {
        let config = config_from(&[
            (BIND_ADDR_VAR, " 0.0.0.0:9000 "),
            (API_TOKEN_VAR, "shared-secret"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.api_token.as_deref(), Some("shared-secret"));
    }

    #[test]
    fn config_treats_blank_token_as_unset() {
        let config = config_from(&[(API_TOKEN_VAR, "   ")]).unwrap();
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn config_rejects_malformed_bind_addr() {
        let err = config_from(&[(BIND_ADDR_VAR, "localhost")]).unwrap_err();
        assert!(err.to_string().contains(BIND_ADDR_VAR));
    }

    #[test]
    fn config_redacts_sensitive_debug_fields() {
        let config = config_from(&[(API_TOKEN_VAR, "sensitive-api-token")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-api-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
