use reqwest::{header, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tower_cookies::cookie::Cookie;

use crate::auth::AUTH_COOKIE;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

pub const ENDPOINT_NOT_FOUND: &str = "API endpoint not found. Please check the server configuration.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Non-2xx response; `message` is the server's envelope message, empty when absent
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Rejected locally before any request was sent
    #[error("{0}")]
    Invalid(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message to show the user; `fallback` covers responses without a usable message
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Api { status: 404, .. } => ENDPOINT_NOT_FOUND.to_string(),
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Invalid(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// `{success, data?, message?}` as sent by every API route
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// HTTP client for the Discountify API; clones share one session token
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session token captured from the last `Set-Cookie: token=...`
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.data(self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        self.data(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.data(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.data(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.data(self.request(Method::DELETE, path)).await
    }

    /// For routes that answer `{success, message}` without data
    pub async fn send_for_message<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ClientError> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let envelope: Envelope<serde_json::Value> = self.envelope(builder).await?;
        Ok(envelope.message.unwrap_or_default())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.token() {
            builder = builder.header(header::COOKIE, format!("{}={}", AUTH_COOKIE, token));
        }
        builder
    }

    async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        self.envelope::<T>(builder)
            .await?
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
    }

    async fn envelope<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Envelope<T>, ClientError> {
        let response = builder.send().await?;
        self.capture_token(&response);

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(envelope)
    }

    fn capture_token(&self, response: &Response) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            if let Some(token) = session_token_from_set_cookie(raw) {
                self.set_token(token);
            }
        }
    }
}

/// `Some(Some(token))` for a fresh session cookie, `Some(None)` for a removal,
/// `None` when the header is about another cookie
pub fn session_token_from_set_cookie(raw: &str) -> Option<Option<String>> {
    let cookie = Cookie::parse(raw.to_string()).ok()?;
    if cookie.name() != AUTH_COOKIE {
        return None;
    }

    let removed = cookie.value().is_empty()
        || cookie
            .max_age()
            .map(|age| age.is_zero() || age.is_negative())
            .unwrap_or(false);

    if removed {
        Some(None)
    } else {
        Some(Some(cookie.value().to_string()))
    }
}
