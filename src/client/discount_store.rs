use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{lock, ApiClient, ClientError, Notice};
use crate::database::models::{Discount, DiscountListing};
use crate::filter::DiscountFilter;

/// Delay before an input-driven search is sent
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Add / edit form fields, kept as typed text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountForm {
    pub title: String,
    pub discount_percentage: String,
    pub category: String,
    pub start_date: String,
    pub end_date: String,
    /// Left empty to publish for the signed-in shop
    pub shop_id: String,
}

impl DiscountForm {
    /// Request body; numeric fields go out as numbers when they parse
    fn to_body(&self, include_shop: bool) -> Value {
        let percentage = match self.discount_percentage.trim().parse::<f64>() {
            Ok(pct) if pct.is_finite() => json!(pct),
            _ => json!(self.discount_percentage),
        };

        let mut body = json!({
            "title": self.title,
            "discount_percentage": percentage,
            "category": self.category,
            "start_date": self.start_date,
            "end_date": self.end_date,
        });

        if include_shop && !self.shop_id.trim().is_empty() {
            body["shop_id"] = match self.shop_id.trim().parse::<i64>() {
                Ok(id) => json!(id),
                Err(_) => json!(self.shop_id),
            };
        }
        body
    }

    fn from_discount(discount: &Discount) -> Self {
        Self {
            title: discount.title.clone(),
            discount_percentage: discount.discount_percentage.normalize().to_string(),
            category: discount.category.clone(),
            start_date: discount.start_date.to_string(),
            end_date: discount.end_date.to_string(),
            shop_id: discount.shop_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountFormPatch {
    pub title: Option<String>,
    pub discount_percentage: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub shop_id: Option<String>,
}

impl DiscountFormPatch {
    fn apply(self, form: &mut DiscountForm) {
        let fields = [
            (self.title, &mut form.title),
            (self.discount_percentage, &mut form.discount_percentage),
            (self.category, &mut form.category),
            (self.start_date, &mut form.start_date),
            (self.end_date, &mut form.end_date),
            (self.shop_id, &mut form.shop_id),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Which listing the store last showed, for refreshes after a write
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListingScope {
    #[default]
    Board,
    Mine,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscountState {
    pub discounts: Vec<DiscountListing>,
    pub current: Option<DiscountListing>,
    pub form: DiscountForm,
    pub filter: DiscountFilter,
    pub scope: ListingScope,
    pub loading: bool,
    pub error: Option<String>,
    pub notices: Vec<Notice>,
    latest_fetch: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscountAction {
    SetForm(DiscountFormPatch),
    ResetForm,
    /// Fill the form from an existing discount for editing
    EditDiscount(Discount),
    Started,
    Failed(String),
    FetchStarted { seq: u64, scope: ListingScope, filter: DiscountFilter },
    Loaded { seq: u64, discounts: Vec<DiscountListing> },
    FetchFailed { seq: u64, message: String },
    DiscountLoaded(DiscountListing),
    DiscountLoadFailed(String),
    Added(Discount),
    Updated(Discount),
    Deleted(i32),
}

impl DiscountState {
    pub fn reduce(&mut self, action: DiscountAction) {
        match action {
            DiscountAction::SetForm(patch) => patch.apply(&mut self.form),
            DiscountAction::ResetForm => self.form = DiscountForm::default(),
            DiscountAction::EditDiscount(discount) => self.form = DiscountForm::from_discount(&discount),
            DiscountAction::Started => {
                self.loading = true;
                self.error = None;
            }
            DiscountAction::Failed(message) => {
                self.loading = false;
                self.notices.push(Notice::error(message));
            }
            DiscountAction::FetchStarted { seq, scope, filter } => {
                self.latest_fetch = seq;
                self.scope = scope;
                self.filter = filter;
                self.loading = true;
                self.error = None;
            }
            DiscountAction::Loaded { seq, discounts } => {
                if seq == self.latest_fetch {
                    self.discounts = discounts;
                    self.loading = false;
                }
            }
            DiscountAction::FetchFailed { seq, message } => {
                if seq == self.latest_fetch {
                    self.loading = false;
                    self.notices.push(Notice::error(message.clone()));
                    self.error = Some(message);
                }
            }
            DiscountAction::DiscountLoaded(listing) => {
                self.current = Some(listing);
                self.loading = false;
            }
            DiscountAction::DiscountLoadFailed(message) => {
                self.current = None;
                self.loading = false;
                self.error = Some(message);
            }
            DiscountAction::Added(_) => {
                self.loading = false;
                self.form = DiscountForm::default();
                self.notices.push(Notice::success("Discount added successfully"));
            }
            DiscountAction::Updated(discount) => {
                self.loading = false;
                for listing in self.discounts.iter_mut().chain(self.current.iter_mut()) {
                    if listing.discount.id == discount.id {
                        listing.discount = discount.clone();
                    }
                }
                self.form = DiscountForm::default();
                self.notices.push(Notice::success("Discount updated successfully"));
            }
            DiscountAction::Deleted(id) => {
                self.loading = false;
                self.discounts.retain(|d| d.discount.id != id);
                if self.current.as_ref().map(|d| d.discount.id) == Some(id) {
                    self.current = None;
                }
                self.notices.push(Notice::success("Discount deleted successfully"));
            }
        }
    }
}

/// Discount board, owner dashboard and add/edit form state
pub struct DiscountStore {
    client: ApiClient,
    state: Mutex<DiscountState>,
    fetch_seq: AtomicU64,
    debounce_seq: AtomicU64,
    debounce: Duration,
}

impl DiscountStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Mutex::new(DiscountState::default()),
            fetch_seq: AtomicU64::new(0),
            debounce_seq: AtomicU64::new(0),
            debounce: SEARCH_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn state(&self) -> DiscountState {
        lock(&self.state).clone()
    }

    pub fn dispatch(&self, action: DiscountAction) {
        lock(&self.state).reduce(action);
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut lock(&self.state).notices)
    }

    pub fn set_form(&self, patch: DiscountFormPatch) {
        self.dispatch(DiscountAction::SetForm(patch));
    }

    pub fn reset_form(&self) {
        self.dispatch(DiscountAction::ResetForm);
    }

    async fn fetch_listing(
        &self,
        path: &str,
        scope: ListingScope,
        filter: DiscountFilter,
        fallback: &str,
    ) -> Result<Vec<DiscountListing>, ClientError> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let query = filter.to_query_pairs();
        self.dispatch(DiscountAction::FetchStarted { seq, scope, filter });

        match self.client.get_with_query::<Vec<DiscountListing>>(path, &query).await {
            Ok(discounts) => {
                self.dispatch(DiscountAction::Loaded {
                    seq,
                    discounts: discounts.clone(),
                });
                Ok(discounts)
            }
            Err(e) => {
                self.dispatch(DiscountAction::FetchFailed {
                    seq,
                    message: e.user_message(fallback),
                });
                Err(e)
            }
        }
    }

    /// Public board with any combination of filters
    pub async fn fetch_discounts(&self, filter: DiscountFilter) -> Result<Vec<DiscountListing>, ClientError> {
        self.fetch_listing("/api/discounts", ListingScope::Board, filter, "Failed to fetch discounts")
            .await
    }

    /// The signed-in shop's own discounts
    pub async fn fetch_my_discounts(&self, search: Option<String>) -> Result<Vec<DiscountListing>, ClientError> {
        let filter = search.map(DiscountFilter::search).unwrap_or_default();
        self.fetch_listing("/api/discounts/my", ListingScope::Mine, filter, "Failed to fetch your discounts")
            .await
    }

    /// Waits out the debounce window; returns `Ok(None)` when a newer search superseded this one
    pub async fn search_debounced(
        &self,
        filter: DiscountFilter,
    ) -> Result<Option<Vec<DiscountListing>>, ClientError> {
        let ticket = self.debounce_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;
        if self.debounce_seq.load(Ordering::SeqCst) != ticket {
            return Ok(None);
        }
        self.fetch_discounts(filter).await.map(Some)
    }

    /// Re-run whichever listing was shown last
    pub async fn refresh(&self) -> Result<Vec<DiscountListing>, ClientError> {
        let state = self.state();
        match state.scope {
            ListingScope::Board => self.fetch_discounts(state.filter).await,
            ListingScope::Mine => self.fetch_my_discounts(state.filter.search).await,
        }
    }

    pub async fn fetch_discount(&self, id: i32) -> Result<DiscountListing, ClientError> {
        self.dispatch(DiscountAction::Started);

        match self.client.get::<DiscountListing>(&format!("/api/discounts/{}", id)).await {
            Ok(listing) => {
                self.dispatch(DiscountAction::DiscountLoaded(listing.clone()));
                Ok(listing)
            }
            Err(e) => {
                self.dispatch(DiscountAction::DiscountLoadFailed(
                    e.user_message("Failed to fetch discount"),
                ));
                Err(e)
            }
        }
    }

    /// Publish the form, then reload the current listing
    pub async fn add_discount(&self) -> Result<Discount, ClientError> {
        let body = self.state().form.to_body(true);
        self.dispatch(DiscountAction::Started);

        let discount = match self.client.post::<_, Discount>("/api/discounts/add", &body).await {
            Ok(discount) => discount,
            Err(e) => {
                self.dispatch(DiscountAction::Failed(e.user_message("Something went wrong")));
                return Err(e);
            }
        };
        self.dispatch(DiscountAction::Added(discount.clone()));

        if let Err(e) = self.refresh().await {
            tracing::warn!("Discount list refresh failed after add: {}", e);
        }
        Ok(discount)
    }

    pub async fn update_discount(&self, id: i32) -> Result<Discount, ClientError> {
        let body = self.state().form.to_body(false);
        self.dispatch(DiscountAction::Started);

        match self.client.put::<_, Discount>(&format!("/api/discounts/{}", id), &body).await {
            Ok(discount) => {
                self.dispatch(DiscountAction::Updated(discount.clone()));
                Ok(discount)
            }
            Err(e) => {
                self.dispatch(DiscountAction::Failed(e.user_message("Failed to update discount")));
                Err(e)
            }
        }
    }

    pub async fn delete_discount(&self, id: i32) -> Result<Discount, ClientError> {
        self.dispatch(DiscountAction::Started);

        match self.client.delete::<Discount>(&format!("/api/discounts/{}", id)).await {
            Ok(discount) => {
                self.dispatch(DiscountAction::Deleted(id));
                Ok(discount)
            }
            Err(e) => {
                self.dispatch(DiscountAction::Failed(e.user_message("Failed to delete discount")));
                Err(e)
            }
        }
    }
}
