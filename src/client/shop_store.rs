use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::auth_store::login_failure_message;
use super::{lock, ApiClient, ClientError, Notice};
use crate::database::models::Shop;

/// Register / login / manage-shop form fields, kept as typed text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopForm {
    pub shop_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub city: String,
    pub current_password: String,
}

impl ShopForm {
    fn clear_secrets(&mut self) {
        self.password.clear();
        self.confirm_password.clear();
        self.current_password.clear();
    }
}

/// Partial form update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopFormPatch {
    pub shop_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub city: Option<String>,
    pub current_password: Option<String>,
}

impl ShopFormPatch {
    fn apply(self, form: &mut ShopForm) {
        let fields = [
            (self.shop_name, &mut form.shop_name),
            (self.email, &mut form.email),
            (self.password, &mut form.password),
            (self.confirm_password, &mut form.confirm_password),
            (self.city, &mut form.city),
            (self.current_password, &mut form.current_password),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopState {
    pub shops: Vec<Shop>,
    pub current_shop: Option<Shop>,
    pub form: ShopForm,
    pub loading: bool,
    pub error: Option<String>,
    pub notices: Vec<Notice>,
    latest_fetch: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShopAction {
    SetForm(ShopFormPatch),
    ResetForm,
    Started,
    /// Failure of a user-initiated action: mirrored into `error` and notified
    Failed(String),
    ShopsFetchStarted(u64),
    ShopsLoaded { seq: u64, shops: Vec<Shop> },
    ShopsFailed { seq: u64, message: String },
    ShopLoaded(Shop),
    ShopLoadFailed(String),
    Registered,
    LoggedIn(Shop),
    InfoUpdated(Shop),
    PasswordUpdated,
    Deleted(i32),
}

impl ShopState {
    pub fn reduce(&mut self, action: ShopAction) {
        match action {
            ShopAction::SetForm(patch) => patch.apply(&mut self.form),
            ShopAction::ResetForm => self.form = ShopForm::default(),
            ShopAction::Started => {
                self.loading = true;
                self.error = None;
            }
            ShopAction::Failed(message) => {
                self.loading = false;
                self.notices.push(Notice::error(message.clone()));
                self.error = Some(message);
            }
            ShopAction::ShopsFetchStarted(seq) => {
                self.latest_fetch = seq;
                self.loading = true;
                self.error = None;
            }
            ShopAction::ShopsLoaded { seq, shops } => {
                if seq == self.latest_fetch {
                    self.shops = shops;
                    self.loading = false;
                }
            }
            ShopAction::ShopsFailed { seq, message } => {
                if seq == self.latest_fetch {
                    self.shops.clear();
                    self.loading = false;
                    self.error = Some(message);
                }
            }
            ShopAction::ShopLoaded(shop) => {
                self.form = ShopForm {
                    shop_name: shop.shop_name.clone(),
                    email: shop.email.clone(),
                    city: shop.city.clone(),
                    ..ShopForm::default()
                };
                self.current_shop = Some(shop);
                self.loading = false;
            }
            ShopAction::ShopLoadFailed(message) => {
                self.current_shop = None;
                self.loading = false;
                self.error = Some(message);
            }
            ShopAction::Registered => {
                self.loading = false;
                self.form = ShopForm::default();
                self.notices.push(Notice::success("Shop account registered successfully"));
            }
            ShopAction::LoggedIn(shop) => {
                self.loading = false;
                self.current_shop = Some(shop);
                self.form.clear_secrets();
                self.notices.push(Notice::success("Logged in successfully"));
            }
            ShopAction::InfoUpdated(shop) => {
                self.loading = false;
                if let Some(listed) = self.shops.iter_mut().find(|s| s.id == shop.id) {
                    *listed = shop.clone();
                }
                self.current_shop = Some(shop);
                self.notices.push(Notice::success("Shop updated successfully"));
            }
            ShopAction::PasswordUpdated => {
                self.loading = false;
                self.form.clear_secrets();
                self.notices.push(Notice::success("Password updated successfully"));
            }
            ShopAction::Deleted(id) => {
                self.loading = false;
                self.shops.retain(|s| s.id != id);
                if self.current_shop.as_ref().map(|s| s.id) == Some(id) {
                    self.current_shop = None;
                }
                self.notices.push(Notice::success("Shop deleted successfully"));
            }
        }
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    shop_name: &'a str,
    email: &'a str,
    password: &'a str,
    city: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct InfoBody<'a> {
    shop_name: &'a str,
    email: &'a str,
    city: &'a str,
}

#[derive(Serialize)]
struct PasswordBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

/// Shop profile, registration and credential state
pub struct ShopStore {
    client: ApiClient,
    state: Mutex<ShopState>,
    fetch_seq: AtomicU64,
}

impl ShopStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Mutex::new(ShopState::default()),
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ShopState {
        lock(&self.state).clone()
    }

    pub fn dispatch(&self, action: ShopAction) {
        lock(&self.state).reduce(action);
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut lock(&self.state).notices)
    }

    pub fn set_form(&self, patch: ShopFormPatch) {
        self.dispatch(ShopAction::SetForm(patch));
    }

    pub fn reset_form(&self) {
        self.dispatch(ShopAction::ResetForm);
    }

    fn fail(&self, err: ClientError, message: String) -> ClientError {
        tracing::debug!("Shop action failed: {}", err);
        self.dispatch(ShopAction::Failed(message));
        err
    }

    /// Register from the form; password and confirmation must match
    pub async fn register(&self) -> Result<Shop, ClientError> {
        let form = self.state().form;
        if form.password != form.confirm_password {
            let err = ClientError::Invalid("Passwords do not match".to_string());
            return Err(self.fail(err, "Passwords do not match".to_string()));
        }

        self.dispatch(ShopAction::Started);
        let body = RegisterBody {
            shop_name: &form.shop_name,
            email: &form.email,
            password: &form.password,
            city: &form.city,
        };
        match self.client.post::<_, Shop>("/api/shops/register", &body).await {
            Ok(shop) => {
                self.dispatch(ShopAction::Registered);
                Ok(shop)
            }
            Err(e) => {
                let message = match e.status() {
                    Some(400) => e.user_message("Invalid input data"),
                    Some(409) => e.user_message("Email already exists"),
                    _ => e.user_message("Failed to register shop"),
                };
                Err(self.fail(e, message))
            }
        }
    }

    /// Login with the form's email and password
    pub async fn login(&self) -> Result<Shop, ClientError> {
        let form = self.state().form;
        self.dispatch(ShopAction::Started);

        let body = LoginBody {
            email: &form.email,
            password: &form.password,
        };
        match self.client.post::<_, Shop>("/api/auth/login", &body).await {
            Ok(shop) => {
                self.dispatch(ShopAction::LoggedIn(shop.clone()));
                Ok(shop)
            }
            Err(e) => {
                let message = login_failure_message(&e);
                Err(self.fail(e, message))
            }
        }
    }

    pub async fn fetch_shops(&self) -> Result<Vec<Shop>, ClientError> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.dispatch(ShopAction::ShopsFetchStarted(seq));

        match self.client.get::<Vec<Shop>>("/api/shops").await {
            Ok(shops) => {
                self.dispatch(ShopAction::ShopsLoaded {
                    seq,
                    shops: shops.clone(),
                });
                Ok(shops)
            }
            Err(e) => {
                let message = e.user_message("Failed to fetch shops");
                self.dispatch(ShopAction::ShopsFailed { seq, message });
                Err(e)
            }
        }
    }

    pub async fn fetch_shop(&self, id: i32) -> Result<Shop, ClientError> {
        self.dispatch(ShopAction::Started);

        match self.client.get::<Shop>(&format!("/api/shops/{}", id)).await {
            Ok(shop) => {
                self.dispatch(ShopAction::ShopLoaded(shop.clone()));
                Ok(shop)
            }
            Err(e) => {
                self.dispatch(ShopAction::ShopLoadFailed(e.user_message("Failed to fetch shop")));
                Err(e)
            }
        }
    }

    /// Save name, email and city from the form
    pub async fn update_info(&self, id: i32) -> Result<Shop, ClientError> {
        let form = self.state().form;
        self.dispatch(ShopAction::Started);

        let body = InfoBody {
            shop_name: &form.shop_name,
            email: &form.email,
            city: &form.city,
        };
        match self.client.put::<_, Shop>(&format!("/api/shops/{}/info", id), &body).await {
            Ok(shop) => {
                self.dispatch(ShopAction::InfoUpdated(shop.clone()));
                Ok(shop)
            }
            Err(e) => {
                let message = e.user_message("Failed to update shop");
                Err(self.fail(e, message))
            }
        }
    }

    /// Change password using `current_password` and `password` / `confirm_password` from the form
    pub async fn update_password(&self, id: i32) -> Result<(), ClientError> {
        let form = self.state().form;
        if form.password != form.confirm_password {
            let err = ClientError::Invalid("Passwords do not match".to_string());
            return Err(self.fail(err, "Passwords do not match".to_string()));
        }

        self.dispatch(ShopAction::Started);
        let body = PasswordBody {
            current_password: &form.current_password,
            new_password: &form.password,
        };
        match self
            .client
            .send_for_message(reqwest::Method::PUT, &format!("/api/shops/{}/password", id), Some(&body))
            .await
        {
            Ok(_) => {
                self.dispatch(ShopAction::PasswordUpdated);
                Ok(())
            }
            Err(e) => {
                let message = e.user_message("Failed to update password");
                Err(self.fail(e, message))
            }
        }
    }

    /// Delete and drop the shop from the local list
    pub async fn delete_shop(&self, id: i32) -> Result<Shop, ClientError> {
        self.dispatch(ShopAction::Started);

        match self.client.delete::<Shop>(&format!("/api/shops/{}", id)).await {
            Ok(shop) => {
                self.dispatch(ShopAction::Deleted(id));
                Ok(shop)
            }
            Err(e) => {
                let message = e.user_message("Failed to delete shop");
                Err(self.fail(e, message))
            }
        }
    }
}
