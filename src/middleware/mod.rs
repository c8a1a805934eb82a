pub mod auth;
pub mod headers;
pub mod rate_guard;
pub mod response;

pub use auth::{optional_auth, require_auth, Principal};
pub use headers::{no_cache, with_security_headers};
pub use rate_guard::{rate_guard, GuardDecision, GuardError, GuardRequest, HttpRateGuard, RateGuard};
pub use response::{ApiMessage, ApiResponse, ApiResult, ValidJson};
