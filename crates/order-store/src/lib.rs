//! Persistence for order aggregates, keyed by order id.
//!
//! [`OrderStore`] is the contract the command side depends on;
//! [`InMemoryOrderStore`] is a mutex-guarded map adapter with
//! read-your-latest-write consistency.

pub mod error;
pub mod memory;
pub mod store;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use store::{OrderStore, SaveOptions};
