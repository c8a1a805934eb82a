//! Optional external rate-limit / bot-detection check in front of every route.

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::app::AppState;
use crate::config::RateGuardConfig;
use crate::error::ApiError;

/// What the guard is asked about for each inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardRequest {
    pub ip: String,
    pub method: String,
    pub path: String,
    pub user_agent: Option<String>,
    pub requested: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    RateLimited,
    Bot,
    SpoofedBot,
    Deny,
}

impl GuardDecision {
    /// Rejection to send instead of running the route, if any
    pub fn rejection(&self) -> Option<ApiError> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::RateLimited => Some(ApiError::too_many_requests("Too Many Requests")),
            GuardDecision::Bot => Some(ApiError::forbidden("Bot access denied")),
            GuardDecision::SpoofedBot => Some(ApiError::forbidden("Spoofed bot detected")),
            GuardDecision::Deny => Some(ApiError::forbidden("Forbidden")),
        }
    }
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Rate guard request failed: {0}")]
    Transport(String),

    #[error("Rate guard returned status {0}")]
    Status(u16),

    #[error("Rate guard response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait RateGuard: Send + Sync {
    async fn check(&self, request: &GuardRequest) -> Result<GuardDecision, GuardError>;
}

#[derive(Debug, Deserialize)]
struct GuardResponse {
    decision: GuardDecision,
}

/// Guard backed by a hosted HTTP decision endpoint
pub struct HttpRateGuard {
    client: reqwest::Client,
    url: String,
    key: Option<String>,
}

impl HttpRateGuard {
    /// `None` when no guard URL is configured
    pub fn from_config(config: &RateGuardConfig) -> Result<Option<Self>, GuardError> {
        let Some(url) = &config.url else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| GuardError::Transport(e.to_string()))?;

        Ok(Some(Self {
            client,
            url: url.clone(),
            key: config.key.clone(),
        }))
    }
}

#[async_trait]
impl RateGuard for HttpRateGuard {
    async fn check(&self, request: &GuardRequest) -> Result<GuardDecision, GuardError> {
        let mut call = self.client.post(&self.url).json(request);
        if let Some(key) = &self.key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| GuardError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GuardError::Status(response.status().as_u16()));
        }

        let body: GuardResponse = response
            .json()
            .await
            .map_err(|e| GuardError::Decode(e.to_string()))?;
        Ok(body.decision)
    }
}

/// Consult the configured guard; errors fail closed
pub async fn rate_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(guard) = state.rate_guard.clone() else {
        return next.run(request).await;
    };

    let guard_request = GuardRequest {
        ip: client_ip(&request),
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        user_agent: request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        requested: 1,
    };

    match guard.check(&guard_request).await {
        Ok(decision) => match decision.rejection() {
            None => next.run(request).await,
            Some(rejection) => {
                tracing::warn!(
                    "Rate guard denied {} {} from {}: {:?}",
                    guard_request.method,
                    guard_request.path,
                    guard_request.ip,
                    decision
                );
                rejection.into_response()
            }
        },
        Err(e) => {
            tracing::error!("Rate guard check failed: {}", e);
            ApiError::internal_server_error("Internal Server Error").into_response()
        }
    }
}

/// First `X-Forwarded-For` hop, else the socket peer address
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
