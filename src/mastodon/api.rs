//! Thin Mastodon REST client and the response models the bridge reads.
//!
//! Only the fields actually used are modelled; everything else in the
//! payloads is ignored by serde.

use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::error::SocialError;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str = concat!("troet-bridge/", env!("CARGO_PKG_VERSION"));

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("404 Not Found")]
    NotFound,

    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("invalid request url: {0}")]
    Url(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<ApiError> for SocialError {
    fn from(err: ApiError) -> Self {
        SocialError::Remote(err.to_string())
    }
}

// ============================================================================
// Response models
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    /// `user` for local accounts, `user@domain` for remote ones.
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
}

impl Account {
    /// Display name, or the handle when none is set.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.acct
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub id: String,
    /// HTML body.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    pub account: Account,
    #[serde(default)]
    pub media_attachments: Vec<Attachment>,
    #[serde(default)]
    pub reblogged: bool,
    #[serde(default)]
    pub favourited: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub statuses: Vec<Status>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub account: Account,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppRegistration {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
}

/// Error body returned by Mastodon for failed requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// ============================================================================
// Client
// ============================================================================

/// HTTP access to one Mastodon instance.
pub struct Api {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Api {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::Url(e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        self.execute(Method::GET, url, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.execute(Method::POST, url, Some(body)).await
    }

    /// DELETE; the response body is not needed.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path, &[])?;
        self.execute::<serde_json::Value>(Method::DELETE, url, None)
            .await
            .map(drop)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(ApiError::Status { status, message });
        }

        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_tolerates_missing_fields() {
        let status: Status = serde_json::from_value(json!({
            "id": "1",
            "url": null,
            "account": {"id": "9", "username": "bot", "acct": "bot"}
        }))
        .unwrap();
        assert!(status.url.is_none());
        assert!(!status.reblogged);
        assert_eq!(status.account.name(), "bot");
    }

    #[tokio::test]
    async fn test_error_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/v1/statuses")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Validation failed: Text can't be blank"}"#)
            .create_async()
            .await;

        let api = Api::new(&server.url()).unwrap();
        let err = api
            .post::<Status>("/api/v1/statuses", &json!({"status": ""}))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "422 Unprocessable Entity: Validation failed: Text can't be blank"
        );
    }

    #[tokio::test]
    async fn test_not_found_and_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/statuses/5")
            .match_header("authorization", "Bearer secret")
            .with_status(404)
            .create_async()
            .await;

        let mut api = Api::new(&server.url()).unwrap();
        api.set_token("secret".into());
        let err = api.get::<Status>("/api/v1/statuses/5", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
