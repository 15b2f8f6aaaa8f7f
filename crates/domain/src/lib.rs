//! Domain layer for the order notification system.
//!
//! This crate provides:
//! - the Order aggregate with its fixed-at-issuance pricing
//! - the status state machine and transition policy
//! - the tagged `OrderEvent` variant published for every accepted mutation
//! - commands and input-parsing policy

pub mod aggregate;
pub mod order;

pub use aggregate::DomainEvent;
pub use order::{
    EventKind, InputPolicy, IssueOrder, Money, Order, OrderError, OrderEvent, OrderIssued,
    OrderStatus, OrderUpdated, Pricing, TransitionPolicy, UpdateOrderStatus,
    transaction_fee_rate,
};
