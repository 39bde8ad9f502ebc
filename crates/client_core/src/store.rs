use std::collections::HashMap;

use shared::domain::{MessageId, OrderId, ProductId};
use shared::protocol::{CatalogProductPayload, LineItemPayload, MessagePayload, OrderPayload};

/// Authoritative local copies of everything fetched from the Order Service,
/// keyed by identity. Discovery order is kept separately so derived views
/// stay stable across re-fetches.
#[derive(Debug, Default)]
pub struct RecordStore {
    messages: HashMap<MessageId, MessagePayload>,
    message_ids: Vec<MessageId>,
    orders: HashMap<OrderId, OrderPayload>,
    order_ids: Vec<OrderId>,
    message_orders: HashMap<MessageId, Vec<OrderId>>,
    line_items: HashMap<OrderId, Vec<LineItemPayload>>,
    catalog: Vec<CatalogProductPayload>,
}

impl RecordStore {
    pub fn insert_message(&mut self, message: MessagePayload) {
        let id = message.item_id.clone();
        if self.messages.insert(id.clone(), message).is_none() {
            self.message_ids.push(id);
        }
    }

    pub fn insert_messages(&mut self, batch: Vec<MessagePayload>) {
        for message in batch {
            self.insert_message(message);
        }
    }

    pub fn insert_order(&mut self, order: OrderPayload) {
        let id = order.order_id.clone();
        if self.orders.insert(id.clone(), order).is_none() {
            self.order_ids.push(id);
        }
    }

    pub fn insert_orders(&mut self, batch: Vec<OrderPayload>) {
        for order in batch {
            self.insert_order(order);
        }
    }

    pub fn link_message_orders(&mut self, message_id: &MessageId, orders: Vec<OrderPayload>) {
        let ids = orders.iter().map(|o| o.order_id.clone()).collect();
        for order in orders {
            self.insert_order(order);
        }
        self.message_orders.insert(message_id.clone(), ids);
    }

    pub fn set_line_items(&mut self, order_id: &OrderId, items: Vec<LineItemPayload>) {
        self.line_items.insert(order_id.clone(), items);
    }

    pub fn set_catalog(&mut self, products: Vec<CatalogProductPayload>) {
        self.catalog = products;
    }

    pub fn message(&self, id: &MessageId) -> Option<&MessagePayload> {
        self.messages.get(id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessagePayload> {
        self.message_ids.iter().filter_map(|id| self.messages.get(id))
    }

    pub fn order(&self, id: &OrderId) -> Option<&OrderPayload> {
        self.orders.get(id)
    }

    pub fn order_mut(&mut self, id: &OrderId) -> Option<&mut OrderPayload> {
        self.orders.get_mut(id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &OrderPayload> {
        self.order_ids.iter().filter_map(|id| self.orders.get(id))
    }

    pub fn orders_for_message(&self, message_id: &MessageId) -> Vec<&OrderPayload> {
        self.message_orders
            .get(message_id)
            .map(|ids| ids.iter().filter_map(|id| self.orders.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn line_items(&self, order_id: &OrderId) -> &[LineItemPayload] {
        self.line_items
            .get(order_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn line_items_mut(&mut self, order_id: &OrderId) -> &mut Vec<LineItemPayload> {
        self.line_items.entry(order_id.clone()).or_default()
    }

    pub fn catalog(&self) -> &[CatalogProductPayload] {
        &self.catalog
    }

    pub fn find_product(&self, product_id: &ProductId) -> Option<&CatalogProductPayload> {
        self.catalog.iter().find(|p| &p.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str) -> MessagePayload {
        serde_json::from_value(serde_json::json!({ "item_id": id })).expect("message")
    }

    fn order(id: &str, status: &str) -> OrderPayload {
        serde_json::from_value(serde_json::json!({
            "order_id": id,
            "order_status": status,
        }))
        .expect("order")
    }

    #[test]
    fn re_inserting_a_message_keeps_discovery_order() {
        let mut store = RecordStore::default();
        store.insert_messages(vec![message("m1"), message("m2")]);
        store.insert_message(message("m1"));

        let ids: Vec<_> = store.messages().map(|m| m.item_id.0.clone()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn re_inserting_an_order_replaces_the_record_in_place() {
        let mut store = RecordStore::default();
        store.insert_orders(vec![order("o1", "new"), order("o2", "new")]);
        store.insert_order(order("o1", "reviewing"));

        let statuses: Vec<_> = store.orders().map(|o| o.order_status.clone()).collect();
        assert_eq!(statuses, vec!["reviewing", "new"]);
    }

    #[test]
    fn linking_orders_to_a_message_also_registers_them_by_identity() {
        let mut store = RecordStore::default();
        store.insert_message(message("m1"));
        store.link_message_orders(&MessageId::new("m1"), vec![order("o1", "new")]);

        assert_eq!(store.orders_for_message(&MessageId::new("m1")).len(), 1);
        assert!(store.order(&OrderId::new("o1")).is_some());
        assert!(store
            .orders_for_message(&MessageId::new("missing"))
            .is_empty());
    }

    #[test]
    fn line_items_default_to_an_empty_slice() {
        let store = RecordStore::default();
        assert!(store.line_items(&OrderId::new("o1")).is_empty());
    }

    #[test]
    fn find_product_scans_the_loaded_catalog_page() {
        let mut store = RecordStore::default();
        store.set_catalog(vec![CatalogProductPayload {
            product_id: ProductId::new("p1"),
            product_name: "whole milk".to_string(),
            sku: Some("MILK-01".to_string()),
            unit: Some("litre".to_string()),
        }]);

        assert!(store.find_product(&ProductId::new("p1")).is_some());
        assert!(store.find_product(&ProductId::new("p2")).is_none());
    }
}
