//! Credential service: password hashing, signed session tokens and the auth cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_cookies::cookie::{time, Cookie, SameSite};

/// Name of the cookie carrying the session token
pub const AUTH_COOKIE: &str = "token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password worker failed: {0}")]
    Worker(String),
}

/// Payload of the signed session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub shop_id: i32,
    pub shop_name: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(shop_id: i32, shop_name: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            shop_id,
            shop_name: shop_name.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Hash at the default cost on the blocking pool
pub async fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    let plaintext = plaintext.to_owned();
    off_runtime(move || hash_password_with_cost(&plaintext, bcrypt::DEFAULT_COST)).await?
}

pub fn hash_password_with_cost(plaintext: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(plaintext, cost)?)
}

/// Compare on the blocking pool; see `password_matches`
pub async fn verify_password(plaintext: &str, hashed: &str) -> Result<bool, AuthError> {
    let plaintext = plaintext.to_owned();
    let hashed = hashed.to_owned();
    off_runtime(move || password_matches(&plaintext, &hashed)).await
}

/// A malformed stored hash verifies as false rather than erroring
pub fn password_matches(plaintext: &str, hashed: &str) -> bool {
    match bcrypt::verify(plaintext, hashed) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        }
    }
}

// Run on tokio's blocking pool, off the async workers
async fn off_runtime<T, F>(work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::Worker(e.to_string()))
}

pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Check signature and expiry, returning the embedded claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// httpOnly, same-site lax session cookie; `secure` is set in production
pub fn auth_cookie(token: String, secure: bool, ttl_days: i64) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::days(ttl_days))
        .build()
}

/// Expired, empty session cookie; attributes must match `auth_cookie`
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::ZERO)
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .build()
}
