//! API client for communicating with the recipe service.
//!
//! This module provides the `ApiClient` struct for the account endpoints
//! and the envelope-aware request helpers the recipe repository builds on.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::User;

use super::ApiError;

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// `{ data, message }` wrapper around every recipe service response
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    pub user: Option<User>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// API client for the recipe service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<Arc<str>>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: Some(token.into()),
        }
    }

    /// Same client with no bearer token attached
    pub fn without_token(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: None,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client, shared with the image host
    pub fn http(&self) -> &Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidResponse("token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        path: &str,
    ) -> Result<Envelope<T>, ApiError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Envelope { data: None, message: None });
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// Send a request and unwrap the service envelope
    pub(crate) async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>, ApiError> {
        debug!(method = %method, path = path, authenticated = self.has_token(), "API request");

        let mut request = self
            .client
            .request(method, self.url(path))
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        Self::read_envelope(response, path).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    // ===== Account Endpoints =====

    /// Fetch the user the current token belongs to. `Ok(None)` means the
    /// server answered but did not recognise the session.
    pub async fn get_user(&self) -> Result<Option<User>, ApiError> {
        let envelope: Envelope<User> = self.get("/users/getUser").await?;
        Ok(envelope.data)
    }

    /// Exchange credentials for a token.
    ///
    /// The login endpoint is unauthenticated, so a 401 here is a rejected
    /// password rather than an expired token and keeps the server's message.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let path = "/users/login";
        debug!(path = path, "API request");

        let response = self
            .client
            .post(self.url(path))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: ApiError::server_message(&body),
            });
        }

        let envelope: Envelope<LoginResponse> = Self::read_envelope(response, path).await?;
        envelope.data.ok_or_else(|| {
            ApiError::InvalidResponse(
                envelope
                    .message
                    .unwrap_or_else(|| "login response had no data".to_string()),
            )
        })
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let _: Envelope<serde_json::Value> = self.get("/users/logout").await?;
        Ok(())
    }
}
