//! Client-side state containers for the Discountify API.
//!
//! Each store pairs an [`ApiClient`] with a plain state struct. State changes only
//! through `reduce(action)`, so the transitions are testable without a server; the
//! async store methods perform the HTTP call and then dispatch the outcome.

pub mod api;
pub mod auth_store;
pub mod discount_store;
pub mod shop_store;
pub mod status;

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

pub use api::{ApiClient, ClientError, DEFAULT_BASE_URL, ENDPOINT_NOT_FOUND};
pub use auth_store::{AuthAction, AuthState, AuthStore};
pub use discount_store::{DiscountAction, DiscountForm, DiscountFormPatch, DiscountState, DiscountStore};
pub use shop_store::{ShopAction, ShopForm, ShopFormPatch, ShopState, ShopStore};
pub use status::{countdown, days_left, DiscountStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Poisoned locks are recovered; state is only written through reducers
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
