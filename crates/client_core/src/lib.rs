use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use futures::future;
use reqwest::Client;
use shared::{
    domain::{MessageId, OrderId, OrderStatus, ProductId},
    error::ApiError,
    protocol::{
        CatalogProductPayload, LineItemPayload, MessagePayload, OrderPayload,
        ReplaceProductsRequest, UpdateDeliveryDateRequest, UpdateDeliveryInstructionsRequest,
        UpdateOrderStatusRequest,
    },
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{error, info, warn};

pub mod filter;
pub mod group;
pub mod join;
pub mod lifecycle;
pub mod store;

pub use filter::{DateRange, FilterState};
pub use group::{InboxGroups, OrderBucket, OrderGroups};
pub use join::{MessageView, OrderDetailView, OrderRow};
pub use store::RecordStore;

pub const DEFAULT_CATALOG_PAGE_SIZE: u32 = 100;
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);
const EVENT_CHANNEL_CAPACITY: usize = 1024;
const NEW_LINE_UNIT: &str = "each";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub catalog_page_size: u32,
    pub debounce_window: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            catalog_page_size: DEFAULT_CATALOG_PAGE_SIZE,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    InboxRefreshed {
        total: usize,
    },
    OrdersRefreshed {
        total: usize,
    },
    OrderOpened {
        order_id: OrderId,
    },
    OrderStatusChanged {
        order_id: OrderId,
        status: OrderStatus,
    },
    DeliveryInstructionsSaved {
        order_id: OrderId,
    },
    DeliveryDateSaved {
        order_id: OrderId,
        delivery_date: Option<NaiveDate>,
    },
    OrderSaved {
        order_id: OrderId,
    },
    /// Blocking user notification for mutation and validation failures.
    Alert(String),
}

/// Locally detected save precondition failures; rejected before any network
/// call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SaveRejection {
    #[error("no line item carries a resolved product")]
    NoResolvedProducts,
    #[error("no persisted line item is available to anchor the replace")]
    MissingAnchorItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub replaced_products: usize,
    /// False when the replace succeeded but the trailing status update did
    /// not; the replace is never rolled back for that.
    pub status_updated: bool,
}

#[derive(Debug, Clone)]
pub struct InboxSnapshot {
    pub groups: InboxGroups,
    pub shown: usize,
    pub total: usize,
}

#[async_trait]
pub trait OrderHubHandle: Send + Sync {
    async fn refresh_inbox(&self) -> Result<()>;
    async fn refresh_orders(&self) -> Result<()>;
    async fn trigger_refresh(&self) -> Result<()>;
    async fn inbox_snapshot(&self, filter: &FilterState) -> InboxSnapshot;
    async fn orders_snapshot(&self) -> OrderGroups;
    async fn open_order(&self, order_id: &OrderId) -> Result<OrderDetailView>;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
}

pub struct OrderHubClient {
    http: Client,
    base_url: String,
    catalog_page_size: u32,
    debounce_window: Duration,
    store: Mutex<RecordStore>,
    pending_instruction_writes: Mutex<HashMap<OrderId, JoinHandle<()>>>,
    events: broadcast::Sender<ClientEvent>,
}

impl OrderHubClient {
    pub fn new(base_url: impl Into<String>) -> Arc<Self> {
        Self::with_options(base_url, ClientOptions::default())
    }

    pub fn with_options(base_url: impl Into<String>, options: ClientOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            catalog_page_size: options.catalog_page_size,
            debounce_window: options.debounce_window,
            store: Mutex::new(RecordStore::default()),
            pending_instruction_writes: Mutex::new(HashMap::new()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Fetches the inbox listing, then resolves each message's linked
    /// orders concurrently. A failed order lookup degrades that one message
    /// to an empty order list; it never blocks its siblings.
    pub async fn refresh_inbox(&self) -> Result<()> {
        let messages: Vec<MessagePayload> = self
            .http
            .get(format!("{}/inbox/items", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("failed to fetch inbox items")?;

        {
            let mut store = self.store.lock().await;
            store.insert_messages(messages.clone());
        }

        let lookups = messages.iter().map(|message| async {
            let item_id = message.item_id.clone();
            let orders = match self.fetch_orders_for_message(&item_id).await {
                Ok(orders) => orders,
                Err(err) => {
                    warn!(item_id = %item_id.0, "inbox: order lookup failed: {err}");
                    Vec::new()
                }
            };
            (item_id, orders)
        });
        let linked = future::join_all(lookups).await;

        let total = {
            let mut store = self.store.lock().await;
            for (item_id, orders) in linked {
                store.link_message_orders(&item_id, orders);
            }
            store.messages().count()
        };

        info!(message_count = total, "inbox: refreshed");
        let _ = self.events.send(ClientEvent::InboxRefreshed { total });
        Ok(())
    }

    /// Fetches the orders board, then enriches every order concurrently
    /// with its originating message (customer name) and line items (item
    /// count). Enrichment failures degrade to missing name / zero count.
    pub async fn refresh_orders(&self) -> Result<()> {
        let orders: Vec<OrderPayload> = self
            .http
            .get(format!("{}/orders", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("failed to fetch orders")?;

        {
            let mut store = self.store.lock().await;
            store.insert_orders(orders.clone());
        }

        let enrichments = orders.iter().map(|order| async {
            let message_lookup = async {
                match &order.inbox_item_id {
                    Some(item_id) => match self.fetch_message(item_id).await {
                        Ok(message) => Some(message),
                        Err(err) => {
                            warn!(
                                order_id = %order.order_id.0,
                                item_id = %item_id.0,
                                "orders: customer lookup failed: {err}"
                            );
                            None
                        }
                    },
                    None => None,
                }
            };
            let items_lookup = async {
                match self.fetch_line_items(&order.order_id).await {
                    Ok(items) => Some(items),
                    Err(err) => {
                        warn!(order_id = %order.order_id.0, "orders: line item lookup failed: {err}");
                        None
                    }
                }
            };
            let (message, items) = future::join(message_lookup, items_lookup).await;
            (order.order_id.clone(), message, items)
        });
        let enriched = future::join_all(enrichments).await;

        let total = {
            let mut store = self.store.lock().await;
            for (order_id, message, items) in enriched {
                if let Some(message) = message {
                    store.insert_message(message);
                }
                if let Some(items) = items {
                    store.set_line_items(&order_id, items);
                }
            }
            store.orders().count()
        };

        info!(order_count = total, "orders: board refreshed");
        let _ = self.events.send(ClientEvent::OrdersRefreshed { total });
        Ok(())
    }

    /// Loads one order's detail view. The order record itself is required;
    /// line items, the originating message, and the catalog page are
    /// fetched concurrently and each tolerated independently. Opening the
    /// view begins review as a guarded side effect.
    pub async fn open_order(&self, order_id: &OrderId) -> Result<OrderDetailView> {
        let order: OrderPayload = self
            .http
            .get(format!("{}/orders/{}", self.base_url, order_id.0))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("failed to fetch order {}", order_id.0))?;

        {
            let mut store = self.store.lock().await;
            store.insert_order(order.clone());
        }

        self.begin_review_if_needed(&order).await;

        let items_lookup = self.fetch_line_items(order_id);
        let message_lookup = async {
            match &order.inbox_item_id {
                Some(item_id) => self.fetch_message(item_id).await.map(Some),
                None => Ok(None),
            }
        };
        let catalog_lookup = self.fetch_catalog_page();
        let (items, message, catalog) =
            future::join3(items_lookup, message_lookup, catalog_lookup).await;

        {
            let mut store = self.store.lock().await;
            match items {
                Ok(items) => store.set_line_items(order_id, items),
                Err(err) => {
                    warn!(order_id = %order_id.0, "order: line item fetch failed: {err}");
                }
            }
            match message {
                Ok(Some(message)) => store.insert_message(message),
                Ok(None) => {}
                Err(err) => {
                    warn!(order_id = %order_id.0, "order: source message fetch failed: {err}");
                }
            }
            match catalog {
                Ok(products) => store.set_catalog(products),
                Err(err) => {
                    warn!(order_id = %order_id.0, "order: catalog fetch failed: {err}");
                }
            }
        }

        let view = {
            let store = self.store.lock().await;
            join::order_detail(&store, order_id)
        }
        .ok_or_else(|| anyhow!("order {} missing from store after fetch", order_id.0))?;

        let _ = self.events.send(ClientEvent::OrderOpened {
            order_id: order_id.clone(),
        });
        Ok(view)
    }

    pub async fn trigger_refresh(&self) -> Result<()> {
        self.http
            .get(format!("{}/refresh", self.base_url))
            .send()
            .await?
            .error_for_status()
            .context("failed to trigger refresh")?;
        info!("refresh: full data refresh triggered");
        Ok(())
    }

    pub async fn inbox_snapshot(&self, filter: &FilterState) -> InboxSnapshot {
        let views = {
            let store = self.store.lock().await;
            join::message_views(&store)
        };
        let total = views.len();
        let shown_views = filter::apply(views, filter, Utc::now().year());
        let shown = shown_views.len();
        InboxSnapshot {
            groups: group::group_messages(shown_views),
            shown,
            total,
        }
    }

    pub async fn orders_snapshot(&self) -> OrderGroups {
        let store = self.store.lock().await;
        group::group_orders(join::order_rows(&store))
    }

    pub async fn order_detail(&self, order_id: &OrderId) -> Option<OrderDetailView> {
        let store = self.store.lock().await;
        join::order_detail(&store, order_id)
    }

    pub async fn increment_quantity(&self, order_id: &OrderId, index: usize) {
        let mut store = self.store.lock().await;
        if let Some(item) = store.line_items_mut(order_id).get_mut(index) {
            item.quantity = item.quantity.saturating_add(1);
        }
    }

    pub async fn decrement_quantity(&self, order_id: &OrderId, index: usize) {
        let mut store = self.store.lock().await;
        if let Some(item) = store.line_items_mut(order_id).get_mut(index) {
            item.quantity = item.quantity.saturating_sub(1);
        }
    }

    /// Direct quantity entry from raw text; anything that does not parse as
    /// a non-negative integer coerces to 0. Local only, persisted by save.
    pub async fn set_quantity_from_input(&self, order_id: &OrderId, index: usize, raw: &str) {
        let quantity = raw.trim().parse::<u32>().unwrap_or(0);
        let mut store = self.store.lock().await;
        if let Some(item) = store.line_items_mut(order_id).get_mut(index) {
            item.quantity = quantity;
        }
    }

    /// Resolves a catalog product onto the line at `index`, or appends a new
    /// line with quantity 1 when `index` is past the end. An id missing from
    /// the loaded catalog page is a silent no-op.
    pub async fn select_product(&self, order_id: &OrderId, index: usize, product_id: &ProductId) {
        let mut store = self.store.lock().await;
        let Some(product) = store.find_product(product_id).cloned() else {
            return;
        };
        let items = store.line_items_mut(order_id);
        if let Some(item) = items.get_mut(index) {
            item.product_id = Some(product.product_id);
            item.product_name = Some(product.product_name);
            item.sku = product.sku;
            item.unit = product.unit;
        } else {
            items.push(LineItemPayload {
                order_id: Some(order_id.clone()),
                product_id: Some(product.product_id),
                product_name: Some(product.product_name),
                sku: product.sku,
                unit: product.unit,
                quantity: 1,
                ..LineItemPayload::default()
            });
        }
    }

    pub async fn add_line_item(&self, order_id: &OrderId) {
        let mut store = self.store.lock().await;
        store.line_items_mut(order_id).push(LineItemPayload {
            order_id: Some(order_id.clone()),
            unit: Some(NEW_LINE_UNIT.to_string()),
            quantity: 1,
            ..LineItemPayload::default()
        });
    }

    /// Applies the keystroke locally right away and schedules the remote
    /// write behind a trailing debounce window; a newer keystroke cancels
    /// the pending timer so only the last value in the window is sent.
    pub async fn edit_delivery_instructions(self: &Arc<Self>, order_id: &OrderId, text: &str) {
        {
            let mut store = self.store.lock().await;
            if let Some(order) = store.order_mut(order_id) {
                order.delivery_instructions = Some(text.to_string());
            }
        }

        let mut pending = self.pending_instruction_writes.lock().await;
        if let Some(timer) = pending.remove(order_id) {
            timer.abort();
        }

        let client = Arc::clone(self);
        let task_order_id = order_id.clone();
        let value = text.to_string();
        let window = self.debounce_window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Once the window has elapsed the write runs to completion on
            // its own task; only the timer stage is cancellable, never an
            // in-flight request.
            let write = tokio::spawn(async move {
                client
                    .flush_delivery_instructions(task_order_id, value)
                    .await;
            });
            let _ = write.await;
        });
        pending.insert(order_id.clone(), timer);
    }

    /// Delivery date is a discrete selection: the write goes out
    /// immediately and local state only moves on confirmation.
    pub async fn set_delivery_date(
        &self,
        order_id: &OrderId,
        delivery_date: Option<NaiveDate>,
    ) -> Result<()> {
        let result = async {
            let response = self
                .http
                .put(format!(
                    "{}/orders/{}/delivery-date",
                    self.base_url, order_id.0
                ))
                .json(&UpdateDeliveryDateRequest { delivery_date })
                .send()
                .await?;
            into_api_result(response).await
        }
        .await;

        match result {
            Ok(_) => {
                {
                    let mut store = self.store.lock().await;
                    if let Some(order) = store.order_mut(order_id) {
                        order.delivery_date = delivery_date;
                    }
                }
                let _ = self.events.send(ClientEvent::DeliveryDateSaved {
                    order_id: order_id.clone(),
                    delivery_date,
                });
                Ok(())
            }
            Err(err) => {
                error!(order_id = %order_id.0, "order: delivery date update failed: {err}");
                let _ = self.events.send(ClientEvent::Alert(format!(
                    "failed to update delivery date: {err}"
                )));
                Err(err)
            }
        }
    }

    /// Replaces the order's product set with every resolved line item, then
    /// advances the order to reviewed. Precondition failures reject locally
    /// without touching the network; a failed status tail is reported but
    /// never rolls back the completed replace.
    pub async fn save_order(&self, order_id: &OrderId) -> Result<SaveOutcome> {
        let (product_ids, anchor) = {
            let store = self.store.lock().await;
            let items = store.line_items(order_id);
            (
                items
                    .iter()
                    .filter_map(|item| item.product_id.clone())
                    .collect::<Vec<_>>(),
                items.first().and_then(|item| item.item_id.clone()),
            )
        };

        if product_ids.is_empty() {
            let rejection = SaveRejection::NoResolvedProducts;
            let _ = self.events.send(ClientEvent::Alert(rejection.to_string()));
            return Err(rejection.into());
        }
        let Some(anchor) = anchor else {
            let rejection = SaveRejection::MissingAnchorItem;
            let _ = self.events.send(ClientEvent::Alert(rejection.to_string()));
            return Err(rejection.into());
        };

        let replaced = product_ids.len();
        let replace = async {
            let response = self
                .http
                .post(format!(
                    "{}/order-items/{}/products",
                    self.base_url, anchor.0
                ))
                .json(&ReplaceProductsRequest { product_ids })
                .send()
                .await?;
            into_api_result(response).await
        }
        .await;
        if let Err(err) = replace {
            error!(order_id = %order_id.0, "order: product replace failed: {err}");
            let _ = self
                .events
                .send(ClientEvent::Alert(format!("failed to save order: {err}")));
            return Err(err);
        }
        info!(order_id = %order_id.0, product_count = replaced, "order: product set replaced");

        let status_updated = match self.put_status(order_id, OrderStatus::Reviewed).await {
            Ok(()) => {
                self.apply_local_status(order_id, OrderStatus::Reviewed)
                    .await;
                true
            }
            Err(err) => {
                error!(order_id = %order_id.0, "order: status update after save failed: {err}");
                let _ = self.events.send(ClientEvent::Alert(format!(
                    "order saved but status update failed: {err}"
                )));
                false
            }
        };

        let _ = self.events.send(ClientEvent::OrderSaved {
            order_id: order_id.clone(),
        });
        Ok(SaveOutcome {
            replaced_products: replaced,
            status_updated,
        })
    }

    async fn begin_review_if_needed(&self, order: &OrderPayload) {
        if !lifecycle::should_begin_review(order.status()) {
            return;
        }
        match self
            .put_status(&order.order_id, OrderStatus::Reviewing)
            .await
        {
            Ok(()) => {
                self.apply_local_status(&order.order_id, OrderStatus::Reviewing)
                    .await;
            }
            Err(err) => {
                warn!(order_id = %order.order_id.0, "order: begin-review transition failed: {err}");
            }
        }
    }

    async fn apply_local_status(&self, order_id: &OrderId, status: OrderStatus) {
        {
            let mut store = self.store.lock().await;
            if let Some(order) = store.order_mut(order_id) {
                order.order_status = status.as_wire().to_string();
            }
        }
        let _ = self.events.send(ClientEvent::OrderStatusChanged {
            order_id: order_id.clone(),
            status,
        });
    }

    async fn put_status(&self, order_id: &OrderId, order_status: OrderStatus) -> Result<()> {
        let response = self
            .http
            .put(format!("{}/orders/{}/status", self.base_url, order_id.0))
            .json(&UpdateOrderStatusRequest { order_status })
            .send()
            .await?;
        into_api_result(response).await?;
        Ok(())
    }

    async fn flush_delivery_instructions(self: Arc<Self>, order_id: OrderId, value: String) {
        let result = async {
            let response = self
                .http
                .put(format!(
                    "{}/orders/{}/delivery-instructions",
                    self.base_url, order_id.0
                ))
                .json(&UpdateDeliveryInstructionsRequest {
                    delivery_instructions: value,
                })
                .send()
                .await?;
            into_api_result(response).await
        }
        .await;

        match result {
            Ok(_) => {
                info!(order_id = %order_id.0, "order: delivery instructions saved");
                let _ = self
                    .events
                    .send(ClientEvent::DeliveryInstructionsSaved { order_id });
            }
            Err(err) => {
                error!(order_id = %order_id.0, "order: delivery instructions update failed: {err}");
                // The last-typed value stays local; the user keeps editing
                // from where they left off.
                let _ = self.events.send(ClientEvent::Alert(format!(
                    "failed to update delivery instructions: {err}"
                )));
            }
        }
    }

    async fn fetch_orders_for_message(&self, item_id: &MessageId) -> Result<Vec<OrderPayload>> {
        Ok(self
            .http
            .get(format!("{}/orders/inbox/{}", self.base_url, item_id.0))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn fetch_line_items(&self, order_id: &OrderId) -> Result<Vec<LineItemPayload>> {
        Ok(self
            .http
            .get(format!(
                "{}/order-items/order/{}",
                self.base_url, order_id.0
            ))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn fetch_message(&self, item_id: &MessageId) -> Result<MessagePayload> {
        Ok(self
            .http
            .get(format!("{}/inbox/items/{}", self.base_url, item_id.0))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn fetch_catalog_page(&self) -> Result<Vec<CatalogProductPayload>> {
        Ok(self
            .http
            .get(format!("{}/catalog/products", self.base_url))
            .query(&[("limit", self.catalog_page_size)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

#[async_trait]
impl OrderHubHandle for OrderHubClient {
    async fn refresh_inbox(&self) -> Result<()> {
        OrderHubClient::refresh_inbox(self).await
    }

    async fn refresh_orders(&self) -> Result<()> {
        OrderHubClient::refresh_orders(self).await
    }

    async fn trigger_refresh(&self) -> Result<()> {
        OrderHubClient::trigger_refresh(self).await
    }

    async fn inbox_snapshot(&self, filter: &FilterState) -> InboxSnapshot {
        OrderHubClient::inbox_snapshot(self, filter).await
    }

    async fn orders_snapshot(&self) -> OrderGroups {
        OrderHubClient::orders_snapshot(self).await
    }

    async fn open_order(&self, order_id: &OrderId) -> Result<OrderDetailView> {
        OrderHubClient::open_order(self, order_id).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

/// Maps a non-2xx response to a readable error, preferring the service's
/// own error envelope over the bare status line.
async fn into_api_result(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match response.json::<ApiError>().await {
        Ok(envelope) => Err(anyhow!(envelope.message)),
        Err(_) => Err(anyhow!("unexpected status {status}")),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
