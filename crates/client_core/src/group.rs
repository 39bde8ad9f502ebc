use shared::domain::{MessageStatus, OrderStatus};

use crate::join::{MessageView, OrderRow};

/// The fixed set of orders-board buckets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderBucket {
    WaitingForReview,
    UploadingPending,
    UploadSuccessful,
    Archived,
}

impl OrderBucket {
    pub const ALL: [OrderBucket; 4] = [
        OrderBucket::WaitingForReview,
        OrderBucket::UploadingPending,
        OrderBucket::UploadSuccessful,
        OrderBucket::Archived,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OrderBucket::WaitingForReview => "waiting for review",
            OrderBucket::UploadingPending => "uploading pending",
            OrderBucket::UploadSuccessful => "upload successful",
            OrderBucket::Archived => "archived",
        }
    }

    /// Total mapping from the raw wire status to a bucket. Statuses the
    /// table does not know fall into the waiting-for-review bucket rather
    /// than being dropped.
    pub fn for_status(raw: &str) -> OrderBucket {
        match raw.parse::<OrderStatus>().ok() {
            Some(OrderStatus::New) | None => OrderBucket::WaitingForReview,
            Some(OrderStatus::Reviewing) => OrderBucket::UploadingPending,
            Some(OrderStatus::Reviewed) => OrderBucket::UploadSuccessful,
            Some(OrderStatus::Archived) => OrderBucket::Archived,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderGroups {
    waiting_for_review: Vec<OrderRow>,
    uploading_pending: Vec<OrderRow>,
    upload_successful: Vec<OrderRow>,
    archived: Vec<OrderRow>,
}

impl OrderGroups {
    pub fn rows(&self, bucket: OrderBucket) -> &[OrderRow] {
        match bucket {
            OrderBucket::WaitingForReview => &self.waiting_for_review,
            OrderBucket::UploadingPending => &self.uploading_pending,
            OrderBucket::UploadSuccessful => &self.upload_successful,
            OrderBucket::Archived => &self.archived,
        }
    }

    pub fn count(&self, bucket: OrderBucket) -> usize {
        self.rows(bucket).len()
    }

    pub fn total(&self) -> usize {
        OrderBucket::ALL.iter().map(|b| self.count(*b)).sum()
    }
}

/// Stable partition: rows keep their input order inside each bucket.
pub fn group_orders(rows: Vec<OrderRow>) -> OrderGroups {
    let mut groups = OrderGroups::default();
    for row in rows {
        match OrderBucket::for_status(&row.order.order_status) {
            OrderBucket::WaitingForReview => groups.waiting_for_review.push(row),
            OrderBucket::UploadingPending => groups.uploading_pending.push(row),
            OrderBucket::UploadSuccessful => groups.upload_successful.push(row),
            OrderBucket::Archived => groups.archived.push(row),
        }
    }
    groups
}

#[derive(Debug, Clone, Default)]
pub struct InboxGroups {
    pub orders: Vec<MessageView>,
    pub not_orders: Vec<MessageView>,
}

pub fn group_messages(views: Vec<MessageView>) -> InboxGroups {
    let mut groups = InboxGroups::default();
    for view in views {
        match view.message.status() {
            MessageStatus::Order => groups.orders.push(view),
            MessageStatus::NotOrder => groups.not_orders.push(view),
        }
    }
    groups
}
