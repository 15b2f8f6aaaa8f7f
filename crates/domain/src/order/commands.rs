//! Order commands.

use common::{OrderId, UserId};

use super::{InputPolicy, Money, OrderError, OrderStatus};

/// Command to issue a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOrder {
    /// The user placing the order.
    pub user_id: UserId,

    /// Number of items in the order.
    pub total_items: u32,

    /// Pre-fee amount.
    pub subtotal: Money,
}

impl IssueOrder {
    pub fn new(user_id: UserId, total_items: u32, subtotal: Money) -> Self {
        Self {
            user_id,
            total_items,
            subtotal,
        }
    }

    /// Builds the command from raw form input.
    ///
    /// Numeric fields are parsed according to `policy`; the user id must not be blank.
    pub fn parse(
        user_id: impl Into<UserId>,
        total_items: &str,
        subtotal: &str,
        policy: InputPolicy,
    ) -> Result<Self, OrderError> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(OrderError::UserIdRequired);
        }

        Ok(Self {
            user_id,
            total_items: policy.parse_total_items(total_items)?,
            subtotal: policy.parse_subtotal(subtotal)?,
        })
    }
}

/// Command to change an order's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrderStatus {
    /// The order to update.
    pub order_id: OrderId,

    /// The requested status.
    pub status: OrderStatus,
}

impl UpdateOrderStatus {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self { order_id, status }
    }

    /// Builds the command from a free-form, case-insensitive status string.
    pub fn parse(order_id: OrderId, status: &str) -> Result<Self, OrderError> {
        Ok(Self {
            order_id,
            status: status.parse()?,
        })
    }
}
