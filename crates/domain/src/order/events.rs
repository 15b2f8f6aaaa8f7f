//! Order domain events.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Money, OrderStatus};

/// The kinds of event an order produces.
///
/// Each kind is published under its own named schema on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    OrderIssued,
    OrderUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::OrderIssued, EventKind::OrderUpdated];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::OrderIssued => "OrderIssued",
            EventKind::OrderUpdated => "OrderUpdated",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that can occur on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// A new order was issued.
    OrderIssued(OrderIssued),

    /// An order's status changed.
    OrderUpdated(OrderUpdated),
}

impl OrderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            OrderEvent::OrderIssued(_) => EventKind::OrderIssued,
            OrderEvent::OrderUpdated(_) => EventKind::OrderUpdated,
        }
    }
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderIssued(data) => data.order_id,
            OrderEvent::OrderUpdated(data) => data.order_id,
        }
    }
}

/// Snapshot of an order taken at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIssued {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_items: u32,
    pub transaction_fee: Money,
    pub net_total: Money,
    #[serde(rename = "order_status")]
    pub status: OrderStatus,
    pub issued_at: DateTime<Utc>,
}

/// Snapshot of an order taken at a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdated {
    pub order_id: OrderId,
    pub user_id: UserId,
    #[serde(rename = "order_status")]
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}
