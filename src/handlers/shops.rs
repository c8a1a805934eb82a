use axum::extract::{Path, State};
use tower_cookies::Cookies;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth;
use crate::database::models::Shop;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::handlers::payload::{PasswordPayload, RegisterPayload, ShopInfoPayload};
use crate::middleware::{ApiMessage, ApiResponse, ApiResult, Principal, ValidJson};

const EMAIL_TAKEN: &str = "Email already exists. Please use a different email.";

fn email_conflict(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::UniqueViolation(constraint) => {
            warn!("Duplicate email rejected by {}", constraint);
            ApiError::conflict(EMAIL_TAKEN)
        }
        other => other.into(),
    }
}

/// Only the shop itself may change or remove its account
fn ensure_self(principal: &Principal, id: i32) -> Result<(), ApiError> {
    if principal.id == id {
        Ok(())
    } else {
        warn!("Shop {} attempted to modify shop {}", principal.id, id);
        Err(ApiError::forbidden("You can only modify your own shop"))
    }
}

/// GET /api/shops - All shops, newest first
pub async fn list_shops(State(state): State<AppState>) -> ApiResult<Vec<Shop>> {
    let shops = state.shops().select_all().await?;
    Ok(ApiResponse::success(shops))
}

/// GET /api/shops/:id
pub async fn get_shop(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Shop> {
    let id = parse_id(&id, "shop")?;
    let shop = state.shops().select_404(id).await?;
    Ok(ApiResponse::success(shop))
}

/// POST /api/shops/register - Create a shop with a hashed password
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterPayload>,
) -> ApiResult<Shop> {
    let new_shop = payload.validate()?;
    let password_hash = auth::hash_password(&new_shop.password).await?;

    let shop = state
        .shops()
        .insert(&new_shop, &password_hash)
        .await
        .map_err(email_conflict)?;

    info!("Registered shop {} ({})", shop.id, shop.shop_name);
    Ok(ApiResponse::created(shop))
}

/// PUT /api/shops/:id/info - Replace name, email and city
pub async fn update_info(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<ShopInfoPayload>,
) -> ApiResult<Shop> {
    let id = parse_id(&id, "shop")?;
    ensure_self(&principal, id)?;
    let info = payload.validate()?;

    let shop = state
        .shops()
        .update_info(id, &info)
        .await
        .map_err(email_conflict)?;
    Ok(ApiResponse::success(shop))
}

/// PUT /api/shops/:id/password - Verify the current password, then store the new one
pub async fn update_password(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<PasswordPayload>,
) -> Result<ApiMessage, ApiError> {
    let id = parse_id(&id, "shop")?;
    ensure_self(&principal, id)?;
    let change = payload.validate()?;
    let shops = state.shops();

    let Some(stored) = shops.password_hash(id).await? else {
        return Err(ApiError::not_found("Shop not found"));
    };
    if !auth::verify_password(&change.current_password, &stored).await? {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let new_hash = auth::hash_password(&change.new_password).await?;
    if !shops.replace_password_hash(id, &stored, &new_hash).await? {
        // The hash we verified against was replaced or deleted in the meantime
        warn!("Password for shop {} changed during update", id);
        return match shops.password_hash(id).await? {
            Some(_) => Err(ApiError::unauthorized("Current password is incorrect")),
            None => Err(ApiError::not_found("Shop not found")),
        };
    }

    info!("Shop {} changed its password", id);
    Ok(ApiMessage::new("Password updated successfully"))
}

/// DELETE /api/shops/:id - Remove the shop and, by cascade, its discounts
pub async fn delete_shop(
    State(state): State<AppState>,
    principal: Principal,
    cookies: Cookies,
    Path(id): Path<String>,
) -> ApiResult<Shop> {
    let id = parse_id(&id, "shop")?;
    ensure_self(&principal, id)?;

    let shop = state.shops().delete(id).await?;
    cookies.add(auth::removal_cookie(state.config.security.secure_cookies));

    info!("Deleted shop {}", id);
    Ok(ApiResponse::success(shop))
}
