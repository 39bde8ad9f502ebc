use shared::domain::OrderId;
use shared::protocol::{LineItemPayload, MessagePayload, OrderPayload};

use crate::store::RecordStore;

/// A message stitched together with every order traced back to it. Orders
/// appear in discovery order; a message whose order lookup has not landed
/// yet simply carries an empty list.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub message: MessagePayload,
    pub orders: Vec<OrderPayload>,
    pub tag: Option<String>,
    pub needs_attention: bool,
}

/// One row of the orders board: the order plus the display fields resolved
/// from slower sibling fetches (customer name from the originating message,
/// item count from the order's line items).
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub order: OrderPayload,
    pub customer_name: Option<String>,
    pub item_count: usize,
}

#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub order: OrderPayload,
    pub line_items: Vec<LineItemPayload>,
    pub message: Option<MessagePayload>,
}

pub fn message_views(store: &RecordStore) -> Vec<MessageView> {
    store
        .messages()
        .map(|message| MessageView {
            orders: store
                .orders_for_message(&message.item_id)
                .into_iter()
                .cloned()
                .collect(),
            tag: message.ai_labels.first().cloned(),
            needs_attention: message.error_code.is_some(),
            message: message.clone(),
        })
        .collect()
}

pub fn order_rows(store: &RecordStore) -> Vec<OrderRow> {
    store
        .orders()
        .map(|order| OrderRow {
            customer_name: order
                .inbox_item_id
                .as_ref()
                .and_then(|id| store.message(id))
                .and_then(|message| message.sender_name.clone()),
            item_count: store.line_items(&order.order_id).len(),
            order: order.clone(),
        })
        .collect()
}

pub fn order_detail(store: &RecordStore, order_id: &OrderId) -> Option<OrderDetailView> {
    let order = store.order(order_id)?.clone();
    let line_items = store
        .line_items(order_id)
        .iter()
        // A line that names a different owning order is orphaned here and
        // never reaches the view.
        .filter(|item| item.order_id.as_ref().map_or(true, |owner| owner == order_id))
        .cloned()
        .collect();
    let message = order
        .inbox_item_id
        .as_ref()
        .and_then(|id| store.message(id))
        .cloned();
    Some(OrderDetailView {
        order,
        line_items,
        message,
    })
}
