use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(MessageId);
id_newtype!(OrderId);
id_newtype!(LineItemId);
id_newtype!(ProductId);
id_newtype!(CustomerId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Order,
    NotOrder,
}

impl MessageStatus {
    // The service serializes its inbox status enum as "InboxStatus.<VARIANT>"
    // strings; anything that is not the orders variant derives NotOrder so
    // every message lands in exactly one bucket.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "InboxStatus.ORDERS" => MessageStatus::Order,
            _ => MessageStatus::NotOrder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Reviewing,
    Reviewed,
    Archived,
}

impl OrderStatus {
    pub fn as_wire(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Reviewing => "reviewing",
            OrderStatus::Reviewed => "reviewed",
            OrderStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized order status: {0}")]
pub struct InvalidOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "new" => Ok(OrderStatus::New),
            "reviewing" => Ok(OrderStatus::Reviewing),
            "reviewed" => Ok(OrderStatus::Reviewed),
            "archived" => Ok(OrderStatus::Archived),
            other => Err(InvalidOrderStatus(other.to_string())),
        }
    }
}
