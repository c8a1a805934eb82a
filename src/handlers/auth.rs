use axum::extract::State;
use chrono::Duration;
use tower_cookies::Cookies;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{self, Claims};
use crate::database::models::Shop;
use crate::error::ApiError;
use crate::handlers::payload::LoginPayload;
use crate::middleware::{ApiMessage, ApiResponse, ApiResult, Principal, ValidJson};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// POST /api/auth/login - Verify credentials and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidJson(payload): ValidJson<LoginPayload>,
) -> ApiResult<Shop> {
    let credentials = payload.validate()?;

    // Unknown email and wrong password produce the same response
    let Some(found) = state.shops().find_by_email(&credentials.email).await? else {
        warn!("Login failed: unknown email");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };
    if !auth::verify_password(&credentials.password, &found.password_hash).await? {
        warn!("Login failed: wrong password for shop {}", found.shop.id);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let security = &state.config.security;
    let claims = Claims::new(
        found.shop.id,
        &found.shop.shop_name,
        Duration::days(security.token_ttl_days),
    );
    let token = auth::issue_token(&claims, &security.jwt_secret)?;
    cookies.add(auth::auth_cookie(token, security.secure_cookies, security.token_ttl_days));

    info!("Shop {} logged in", found.shop.id);
    Ok(ApiResponse::success(found.shop))
}

/// POST /api/auth/logout - Clear the session cookie; always succeeds
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> ApiMessage {
    cookies.add(auth::removal_cookie(state.config.security.secure_cookies));
    ApiMessage::new("Logged out successfully")
}

/// GET /api/auth/check-auth - Identity attached by the auth middleware
pub async fn check_auth(principal: Principal) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal))
}
