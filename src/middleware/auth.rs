use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::app::AppState;
use crate::auth::{self, Claims, AUTH_COOKIE};
use crate::error::ApiError;

/// Authenticated shop identity attached to the request
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Principal {
    pub id: i32,
    pub shop_name: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.shop_id,
            shop_name: claims.shop_name,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}

/// Reject the request with 401 unless a valid session token is present
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&cookies, request.headers()) else {
        return ApiError::unauthorized("Unauthorized").into_response();
    };

    match auth::verify_token(&token, &state.config.security.jwt_secret) {
        Ok(claims) => {
            request.extensions_mut().insert(Principal::from(claims));
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Attach a principal when the token verifies; otherwise continue anonymously
pub async fn optional_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&cookies, request.headers()) {
        match auth::verify_token(&token, &state.config.security.jwt_secret) {
            Ok(claims) => {
                request.extensions_mut().insert(Principal::from(claims));
            }
            Err(e) => tracing::debug!("Ignoring invalid token on optional route: {}", e),
        }
    }
    next.run(request).await
}

/// Session token from the auth cookie, falling back to `Authorization: Bearer`
fn extract_token(cookies: &Cookies, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = cookies.get(AUTH_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
