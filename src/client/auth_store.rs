use serde::Serialize;
use std::sync::Mutex;

use super::{lock, ApiClient, ClientError, Notice};
use crate::database::models::Shop;
use crate::middleware::Principal;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub principal: Option<Principal>,
    pub checking: bool,
    pub error: Option<String>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    CheckStarted,
    Authenticated(Principal),
    Unauthenticated,
    LoginFailed(String),
    SignedOut,
}

impl AuthState {
    pub fn reduce(&mut self, action: AuthAction) {
        match action {
            AuthAction::CheckStarted => {
                self.checking = true;
            }
            AuthAction::Authenticated(principal) => {
                self.principal = Some(principal);
                self.checking = false;
                self.error = None;
            }
            AuthAction::Unauthenticated => {
                self.principal = None;
                self.checking = false;
            }
            AuthAction::LoginFailed(message) => {
                self.principal = None;
                self.checking = false;
                self.notices.push(Notice::error(message.clone()));
                self.error = Some(message);
            }
            AuthAction::SignedOut => {
                self.principal = None;
                self.checking = false;
                self.error = None;
                self.notices.push(Notice::success("Logged out successfully"));
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Session state: who is signed in
pub struct AuthStore {
    client: ApiClient,
    state: Mutex<AuthState>,
}

impl AuthStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Mutex::new(AuthState::default()),
        }
    }

    pub fn state(&self) -> AuthState {
        lock(&self.state).clone()
    }

    pub fn dispatch(&self, action: AuthAction) {
        lock(&self.state).reduce(action);
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut lock(&self.state).notices)
    }

    /// Ask the server who the session belongs to; any failure means signed out
    pub async fn check_auth(&self) -> Option<Principal> {
        self.dispatch(AuthAction::CheckStarted);

        match self.client.get::<Principal>("/api/auth/check-auth").await {
            Ok(principal) => {
                self.dispatch(AuthAction::Authenticated(principal.clone()));
                Some(principal)
            }
            Err(e) => {
                if e.status() != Some(401) {
                    tracing::warn!("Auth check failed: {}", e);
                }
                self.client.set_token(None);
                self.dispatch(AuthAction::Unauthenticated);
                None
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Shop, ClientError> {
        self.dispatch(AuthAction::CheckStarted);

        match self
            .client
            .post::<_, Shop>("/api/auth/login", &LoginBody { email, password })
            .await
        {
            Ok(shop) => {
                self.dispatch(AuthAction::Authenticated(Principal {
                    id: shop.id,
                    shop_name: shop.shop_name.clone(),
                }));
                Ok(shop)
            }
            Err(e) => {
                self.dispatch(AuthAction::LoginFailed(login_failure_message(&e)));
                Err(e)
            }
        }
    }

    /// Clears the local session even when the server call fails
    pub async fn logout(&self) {
        if let Err(e) = self
            .client
            .send_for_message::<()>(reqwest::Method::POST, "/api/auth/logout", None)
            .await
        {
            tracing::warn!("Logout request failed: {}", e);
        }
        self.client.set_token(None);
        self.dispatch(AuthAction::SignedOut);
    }
}

pub(crate) fn login_failure_message(err: &ClientError) -> String {
    match err.status() {
        Some(400) => err.user_message("Invalid input data"),
        Some(401) => err.user_message("Invalid email or password"),
        _ => err.user_message("Failed to login"),
    }
}
