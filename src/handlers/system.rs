use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::DatabaseManager;

/// GET / - API info
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Discountify API",
            "version": version,
            "description": "Shops publish time-bounded discounts; visitors browse and search them",
            "endpoints": {
                "auth": "/api/auth/login, /api/auth/logout (public), /api/auth/check-auth (protected)",
                "shops": "/api/shops[/:id], /api/shops/register (public), /api/shops/:id/info|password (owner)",
                "discounts": "/api/discounts (public), /api/discounts/my|add|:id (protected)",
                "health": "/health"
            }
        }
    }))
}

/// GET /health - Pings the database
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
