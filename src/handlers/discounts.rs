use axum::extract::{Path, Query, State};
use tracing::{debug, warn};

use crate::app::AppState;
use crate::database::models::{Discount, DiscountListing};
use crate::database::{DatabaseError, DiscountRepository};
use crate::error::ApiError;
use crate::filter::{DiscountFilter, DiscountQuery, ListingOrder, SortDirection};
use crate::handlers::parse_id;
use crate::handlers::payload::{DiscountPayload, DiscountUpdatePayload};
use crate::middleware::{ApiResponse, ApiResult, Principal, ValidJson};

fn discount_write_error(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::ForeignKeyViolation(constraint) => {
            warn!("Discount references a missing shop ({})", constraint);
            ApiError::conflict("Invalid shop_id")
        }
        DatabaseError::CheckViolation(constraint) => {
            debug!("Discount rejected by {}", constraint);
            ApiError::invalid_field(
                "discount_percentage",
                "Discount percentage must be between 0 and 100",
            )
        }
        other => other.into(),
    }
}

fn parse_filter(query: DiscountQuery) -> Result<DiscountFilter, ApiError> {
    DiscountFilter::try_from(query).map_err(|e| ApiError::invalid_field("date", e.to_string()))
}

/// NotFound when the discount is missing, Forbidden when another shop owns it
async fn ensure_owner(repo: &DiscountRepository, id: i32, principal: &Principal) -> Result<(), ApiError> {
    match repo.owner_of(id).await? {
        None => Err(ApiError::not_found("Discount not found")),
        Some(owner) if owner == principal.id => Ok(()),
        Some(owner) => {
            warn!(
                "Shop {} attempted to modify discount {} owned by shop {}",
                principal.id, id, owner
            );
            Err(ApiError::forbidden("You can only modify your own discounts"))
        }
    }
}

/// GET /api/discounts - Public board with search, category, city and date filters
pub async fn list_discounts(
    State(state): State<AppState>,
    principal: Option<Principal>,
    Query(query): Query<DiscountQuery>,
) -> ApiResult<Vec<DiscountListing>> {
    let filter = parse_filter(query)?;
    if let Some(principal) = &principal {
        debug!("Discount board requested by shop {}", principal.id);
    }

    let discounts = state
        .discounts()
        .select_listings(filter, ListingOrder::StartDate(SortDirection::Asc))
        .await?;
    Ok(ApiResponse::success(discounts))
}

/// GET /api/discounts/my - The caller's own discounts, newest first
pub async fn list_my_discounts(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<DiscountQuery>,
) -> ApiResult<Vec<DiscountListing>> {
    let filter = parse_filter(query)?.for_shop(principal.id);
    let discounts = state
        .discounts()
        .select_listings(filter, ListingOrder::CreatedAt(SortDirection::Desc))
        .await?;
    Ok(ApiResponse::success(discounts))
}

/// GET /api/discounts/:id
pub async fn get_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DiscountListing> {
    let id = parse_id(&id, "discount")?;
    let discount = state.discounts().select_listing_404(id).await?;
    Ok(ApiResponse::success(discount))
}

/// POST /api/discounts/add - Create a discount for the caller's shop
pub async fn add_discount(
    State(state): State<AppState>,
    principal: Principal,
    ValidJson(payload): ValidJson<DiscountPayload>,
) -> ApiResult<Discount> {
    let new_discount = payload.validate(principal.id)?;
    if new_discount.shop_id != principal.id {
        warn!(
            "Shop {} attempted to add a discount for shop {}",
            principal.id, new_discount.shop_id
        );
        return Err(ApiError::forbidden("You can only add discounts for your own shop"));
    }

    let discount = state
        .discounts()
        .insert(&new_discount)
        .await
        .map_err(discount_write_error)?;
    Ok(ApiResponse::created(discount))
}

/// PUT /api/discounts/:id - Full replacement of an owned discount
pub async fn update_discount(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<DiscountUpdatePayload>,
) -> ApiResult<Discount> {
    let id = parse_id(&id, "discount")?;
    let repo = state.discounts();
    ensure_owner(&repo, id, &principal).await?;
    let update = payload.validate()?;

    let discount = repo
        .update(id, principal.id, &update)
        .await
        .map_err(discount_write_error)?;
    Ok(ApiResponse::success(discount))
}

/// DELETE /api/discounts/:id
pub async fn delete_discount(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> ApiResult<Discount> {
    let id = parse_id(&id, "discount")?;
    let repo = state.discounts();
    ensure_owner(&repo, id, &principal).await?;

    let discount = repo.delete(id, principal.id).await?;
    Ok(ApiResponse::success(discount))
}
