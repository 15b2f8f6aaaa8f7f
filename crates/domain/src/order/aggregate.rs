//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{
    IssueOrder, Money, OrderError, OrderEvent, OrderIssued, OrderStatus, OrderUpdated, Pricing,
    TransitionPolicy,
};

/// Order aggregate root.
///
/// Fee and net total are fixed at issuance; afterwards only the status
/// and the last-update timestamp change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "order_id")]
    id: OrderId,

    user_id: UserId,

    total_items: u32,

    transaction_fee: Money,

    net_total: Money,

    status: OrderStatus,

    /// UTC time of the most recent accepted mutation.
    last_update: DateTime<Utc>,

    /// Store revision used for compare-and-set writes.
    #[serde(skip)]
    version: u64,
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    pub fn transaction_fee(&self) -> Money {
        self.transaction_fee
    }

    pub fn net_total(&self) -> Money {
        self.net_total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    /// Returns the store revision this copy was read at (0 = never stored).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the store revision. Called by store adapters after a write.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

// Command methods
impl Order {
    /// Issues a new order with a fresh id, computed pricing and the initial status.
    pub fn issue(cmd: IssueOrder) -> Result<Order, OrderError> {
        let pricing = Pricing::for_subtotal(cmd.subtotal)?;
        Ok(Order {
            id: OrderId::new(),
            user_id: cmd.user_id,
            total_items: cmd.total_items,
            transaction_fee: pricing.transaction_fee,
            net_total: pricing.net_total,
            status: OrderStatus::PreparingPackage,
            last_update: Utc::now(),
            version: 0,
        })
    }

    /// Returns the event describing this order's issuance.
    pub fn issued_event(&self) -> OrderEvent {
        OrderEvent::OrderIssued(OrderIssued {
            order_id: self.id,
            user_id: self.user_id.clone(),
            total_items: self.total_items,
            transaction_fee: self.transaction_fee,
            net_total: self.net_total,
            status: self.status,
            issued_at: self.last_update,
        })
    }

    /// Validates a status change and returns the event that records it.
    ///
    /// The order itself is not modified; pass the event to [`Order::apply`].
    pub fn change_status(
        &self,
        status: OrderStatus,
        policy: TransitionPolicy,
    ) -> Result<OrderEvent, OrderError> {
        policy.check(self.status, status)?;

        Ok(OrderEvent::OrderUpdated(OrderUpdated {
            order_id: self.id,
            user_id: self.user_id.clone(),
            status,
            updated_at: next_timestamp(self.last_update, Utc::now()),
        }))
    }

    /// Applies an event to the order.
    pub fn apply(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::OrderIssued(data) => {
                self.id = data.order_id;
                self.user_id = data.user_id.clone();
                self.total_items = data.total_items;
                self.transaction_fee = data.transaction_fee;
                self.net_total = data.net_total;
                self.status = data.status;
                self.last_update = data.issued_at;
            }
            OrderEvent::OrderUpdated(data) => {
                self.status = data.status;
                self.last_update = data.updated_at;
            }
        }
    }
}

/// Returns `now`, or one microsecond past `previous` if the clock has not advanced.
fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}
