use axum::{
    handler::Handler,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::{DiscountRepository, ShopRepository};
use crate::error::ApiError;
use crate::handlers::{auth, discounts, shops, system};
use crate::middleware::{no_cache, optional_auth, rate_guard, require_auth, with_security_headers, RateGuard};

/// Shared per-request context
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub rate_guard: Option<Arc<dyn RateGuard>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            rate_guard: None,
        }
    }

    pub fn with_rate_guard(mut self, guard: Arc<dyn RateGuard>) -> Self {
        self.rate_guard = Some(guard);
        self
    }

    pub fn shops(&self) -> ShopRepository {
        ShopRepository::new(self.pool.clone())
    }

    pub fn discounts(&self) -> DiscountRepository {
        DiscountRepository::new(self.pool.clone())
    }
}

/// Full application router with the global middleware stack
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(auth_routes(&state))
        .merge(shop_routes(&state))
        .merge(discount_routes(&state));

    router = if config.is_production() {
        let static_dir = Path::new(&config.server.static_dir);
        router.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(static_dir.join("index.html"))),
        )
    } else {
        router.fallback(route_not_found)
    };

    // Layers wrap outward: the last one added sees the request first
    let router = router
        .layer(from_fn(no_cache))
        .layer(from_fn_with_state(state.clone(), rate_guard))
        .layer(CookieManagerLayer::new());

    with_security_headers(router, config.is_production())
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let require = from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/check-auth", get(auth::check_auth.layer(require)))
}

fn shop_routes(state: &AppState) -> Router<AppState> {
    let require = from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/api/shops", get(shops::list_shops))
        .route("/api/shops/register", post(shops::register))
        .route(
            "/api/shops/:id",
            get(shops::get_shop).delete(shops::delete_shop.layer(require.clone())),
        )
        .route("/api/shops/:id/info", put(shops::update_info.layer(require.clone())))
        .route("/api/shops/:id/password", put(shops::update_password.layer(require)))
}

fn discount_routes(state: &AppState) -> Router<AppState> {
    let require = from_fn_with_state(state.clone(), require_auth);
    let optional = from_fn_with_state(state.clone(), optional_auth);

    Router::new()
        .route("/api/discounts", get(discounts::list_discounts.layer(optional)))
        .route("/api/discounts/my", get(discounts::list_my_discounts.layer(require.clone())))
        .route("/api/discounts/add", post(discounts::add_discount.layer(require.clone())))
        .route(
            "/api/discounts/:id",
            get(discounts::get_discount.layer(require.clone()))
                .put(discounts::update_discount.layer(require.clone()))
                .delete(discounts::delete_discount.layer(require)),
        )
}

/// Credentialed CORS for the configured client origin
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match HeaderValue::from_str(&config.security.cors_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(
                "Ignoring invalid CLIENT_URL {:?}: {}",
                config.security.cors_origin,
                e
            );
            cors
        }
    }
}

async fn route_not_found() -> impl IntoResponse {
    ApiError::not_found("Route not found")
}
