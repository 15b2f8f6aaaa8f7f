//! Message bus contract for order events.
//!
//! The bus is an at-least-once publish/subscribe transport. Each
//! [`EventKind`](domain::EventKind) is bound to a named topic through the
//! [`SchemaRegistry`]; publishers attach a routing key (the order id) that a
//! broker may use for partition affinity.

pub mod bus;
pub mod error;
pub mod memory;
pub mod message;
pub mod schema;

pub use bus::{MessageBus, MessageStream};
pub use error::{BusError, Result};
pub use memory::InMemoryMessageBus;
pub use message::BusMessage;
pub use schema::SchemaRegistry;
