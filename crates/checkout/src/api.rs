//! Authenticated HTTP client for the platform API.
//!
//! Every request is bearer-token authenticated, tenant-scoped via the
//! `X-Tenant` header, and localized via `Accept-Language`. All three are
//! threaded in from [`StorefrontConfig`] at construction time; nothing is
//! read from ambient globals.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::StorefrontConfig;

/// Errors from the platform API boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request did not complete.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request completed with a non-success application-level result.
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Parse(String),
}

/// Client for the platform's JSON REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    upload_url: String,
}

impl ApiClient {
    /// Create a new API client with the session's default headers.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value is malformed or the HTTP client
    /// fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ApiError::Parse(format!("invalid bearer token: {e}")))?,
        );
        headers.insert(
            "X-Tenant",
            HeaderValue::from_str(&config.tenant)
                .map_err(|e| ApiError::Parse(format!("invalid tenant: {e}")))?,
        );
        headers.insert(
            "Accept-Language",
            HeaderValue::from_str(&config.language)
                .map_err(|e| ApiError::Parse(format!("invalid language: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            upload_url: config.upload_url.clone(),
        })
    }

    /// Execute a GET request and decode the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    /// Execute a POST request with a JSON body and decode the response.
    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// Execute a PUT request with a JSON body and decode the response.
    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// Execute a DELETE request and decode the JSON response.
    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.delete(self.url(path)).send().await?;
        Self::decode(response).await
    }

    /// Execute a multipart POST against the configured upload endpoint.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Decode a response, mapping non-success statuses to `Rejected`.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let text = response.text().await?;

        if !status.is_success() {
            return Err(rejection(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&text),
                "failed to decode API response"
            );
            ApiError::Parse(e.to_string())
        })
    }
}

/// Shared acknowledgement envelope for mutation endpoints.
///
/// The backend answers some mutations with `{ success, message }` and a 200
/// status; `success: false` is still a rejection.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    pub(crate) fn into_result(self) -> Result<(), ApiError> {
        if self.success == Some(false) {
            return Err(ApiError::Rejected {
                status: 200,
                message: self
                    .message
                    .unwrap_or_else(|| "request rejected".to_string()),
            });
        }
        Ok(())
    }
}

/// Build a `Rejected` error, preferring the backend's own message.
fn rejection(status: StatusCode, body: &str) -> ApiError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| excerpt(body), |parsed| parsed.message);
    ApiError::Rejected {
        status: status.as_u16(),
        message,
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(200).collect()
}
