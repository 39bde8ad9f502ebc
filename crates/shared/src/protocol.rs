use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CustomerId, LineItemId, MessageId, MessageStatus, OrderId, OrderStatus, ProductId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub item_id: MessageId,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub supplier_email: Option<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ai_labels: Vec<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub email_body_text: Option<String>,
    #[serde(default)]
    pub current_status: Option<String>,
}

impl MessagePayload {
    pub fn status(&self) -> MessageStatus {
        self.current_status
            .as_deref()
            .map_or(MessageStatus::NotOrder, MessageStatus::from_wire)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayload {
    pub order_id: OrderId,
    #[serde(default)]
    pub inbox_item_id: Option<MessageId>,
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
    #[serde(default)]
    pub order_status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderPayload {
    pub fn status(&self) -> Option<OrderStatus> {
        self.order_status.parse().ok()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemPayload {
    #[serde(default)]
    pub item_id: Option<LineItemId>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub ai_confidence_score: Option<f64>,
    #[serde(default)]
    pub ai_parsed_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProductPayload {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub order_status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDeliveryInstructionsRequest {
    pub delivery_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDeliveryDateRequest {
    pub delivery_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceProductsRequest {
    pub product_ids: Vec<ProductId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_payload_tolerates_sparse_records() {
        let message: MessagePayload =
            serde_json::from_value(serde_json::json!({ "item_id": "m1" })).expect("deserialize");
        assert_eq!(message.item_id, MessageId::new("m1"));
        assert!(message.subject.is_none());
        assert!(message.ai_labels.is_empty());
        assert_eq!(message.status(), MessageStatus::NotOrder);
    }

    #[test]
    fn message_status_reads_the_wire_enum_string() {
        let message: MessagePayload = serde_json::from_value(serde_json::json!({
            "item_id": "m1",
            "current_status": "InboxStatus.ORDERS",
        }))
        .expect("deserialize");
        assert_eq!(message.status(), MessageStatus::Order);
    }

    #[test]
    fn order_payload_parses_status_and_dates() {
        let order: OrderPayload = serde_json::from_value(serde_json::json!({
            "order_id": "o1",
            "inbox_item_id": "m1",
            "order_status": "reviewing",
            "delivery_date": "2026-03-14",
        }))
        .expect("deserialize");
        assert_eq!(order.status(), Some(OrderStatus::Reviewing));
        assert_eq!(
            order.delivery_date,
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
    }

    #[test]
    fn order_payload_keeps_unknown_status_as_raw_text() {
        let order: OrderPayload = serde_json::from_value(serde_json::json!({
            "order_id": "o1",
            "order_status": "quarantined",
        }))
        .expect("deserialize");
        assert_eq!(order.status(), None);
        assert_eq!(order.order_status, "quarantined");
    }

    #[test]
    fn status_request_serializes_the_wire_name() {
        let body = serde_json::to_value(UpdateOrderStatusRequest {
            order_status: OrderStatus::Reviewed,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({ "order_status": "reviewed" }));
    }

    #[test]
    fn delivery_date_request_serializes_null_when_cleared() {
        let body = serde_json::to_value(UpdateDeliveryDateRequest {
            delivery_date: None,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({ "delivery_date": null }));
    }
}
