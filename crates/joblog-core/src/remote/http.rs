//! HTTP client for the joblog remote API.

use reqwest::StatusCode;
use serde::Deserialize;

use super::{BatchOutcome, RemoteError, RemoteResult, RemoteStore};
use crate::config::RemoteConfig;
use crate::models::{Application, ApplicationDocument, ApplicationId};
use crate::util::compact_text;

const APPLICATIONS_PATH: &str = "/v1/applications";

/// Remote store reached over HTTP.
///
/// Batches are sent one request per record so that one bad record never
/// blocks the rest.
#[derive(Clone)]
pub struct HttpRemoteStore {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpRemoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpRemoteStore")
            .field("base_url", &self.base_url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            auth_token: config.auth_token.clone(),
            client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}{APPLICATIONS_PATH}", self.base_url)
    }

    fn document_url(&self, id: &ApplicationId) -> String {
        format!(
            "{}{APPLICATIONS_PATH}/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn put_one(&self, record: &Application) -> RemoteResult<()> {
        let document = ApplicationDocument::from(record);
        let response = self
            .authorize(self.client.put(self.document_url(&record.id)))
            .header("Accept", "application/json")
            .json(&document)
            .send()
            .await
            .map_err(classify_send_error)?;

        ensure_success(response).await
    }

    async fn delete_one(&self, id: &ApplicationId) -> RemoteResult<()> {
        let response = self
            .authorize(self.client.delete(self.document_url(id)))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(classify_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Remote had no document {id}; treating delete as confirmed");
            return Ok(());
        }
        ensure_success(response).await
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn put_many(&self, records: &[Application]) -> RemoteResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for record in records {
            outcome.record(record.id.clone(), self.put_one(record).await);
        }
        outcome.into_result()
    }

    async fn delete_many(&self, ids: &[ApplicationId]) -> RemoteResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for id in ids {
            outcome.record(id.clone(), self.delete_one(id).await);
        }
        outcome.into_result()
    }

    async fn get_all(&self) -> RemoteResult<Vec<ApplicationDocument>> {
        let response = self
            .authorize(self.client.get(self.collection_url()))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(classify_send_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body = response.text().await?;
        let payload: ApplicationsResponse = serde_json::from_str(&body).map_err(|error| {
            RemoteError::InvalidPayload(format!("{error}: {}", compact_text(&body)))
        })?;
        Ok(payload.into_documents())
    }
}

/// `GET /v1/applications` body; a bare array is accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApplicationsResponse {
    Wrapped {
        applications: Vec<ApplicationDocument>,
    },
    Bare(Vec<ApplicationDocument>),
}

impl ApplicationsResponse {
    fn into_documents(self) -> Vec<ApplicationDocument> {
        match self {
            Self::Wrapped { applications } | Self::Bare(applications) => applications,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn classify_send_error(error: reqwest::Error) -> RemoteError {
    if error.is_connect() || error.is_timeout() {
        RemoteError::Unreachable(error.to_string())
    } else {
        RemoteError::Http(error)
    }
}

async fn ensure_success(response: reqwest::Response) -> RemoteResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: reqwest::Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    RemoteError::Api {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpRemoteStore {
        let config = RemoteConfig::new("http://127.0.0.1:9/").unwrap();
        HttpRemoteStore::new(&config).unwrap()
    }

    #[test]
    fn document_urls_escape_ids() {
        let store = store();
        assert_eq!(store.collection_url(), "http://127.0.0.1:9/v1/applications");
        assert_eq!(
            store.document_url(&"a/b c".parse().unwrap()),
            "http://127.0.0.1:9/v1/applications/a%2Fb%20c"
        );
    }

    #[test]
    fn parse_api_error_prefers_json_message() {
        assert_eq!(
            parse_api_error(StatusCode::UNAUTHORIZED, r#"{"error":"missing token"}"#),
            "missing token"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "Bad Gateway");
        assert_eq!(parse_api_error(StatusCode::BAD_REQUEST, "plain"), "plain");
    }

    #[test]
    fn applications_response_accepts_both_shapes() {
        let wrapped: ApplicationsResponse =
            serde_json::from_str(r#"{"applications":[{"id":"a"}]}"#).unwrap();
        assert_eq!(wrapped.into_documents().len(), 1);

        let bare: ApplicationsResponse = serde_json::from_str(r#"[{"id":"a"},{"id":"b"}]"#).unwrap();
        assert_eq!(bare.into_documents().len(), 2);
    }

    #[test]
    fn debug_redacts_token() {
        let config = RemoteConfig::new("http://127.0.0.1:9")
            .unwrap()
            .with_auth_token("secret");
        let store = HttpRemoteStore::new(&config).unwrap();
        assert!(!format!("{store:?}").contains("secret"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_server_fails_the_whole_batch() {
        let ids: Vec<ApplicationId> = vec!["a".parse().unwrap(), "b".parse().unwrap()];
        let result = store().delete_many(&ids).await;
        assert!(matches!(result, Err(RemoteError::Unreachable(_))));
    }
}
