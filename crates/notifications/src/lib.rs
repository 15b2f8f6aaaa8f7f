//! Push notifications for order status changes.
//!
//! ```text
//! MessageBus ──OrderUpdated──► SubscriptionDispatcher ──┬──► Subscription(order A) ──► StreamSession ──► Transport
//!                                  (registry by id)     ├──► Subscription(order A) ──► StreamSession ──► Transport
//!                                                       └──► Subscription(order B) ──► StreamSession ──► Transport
//! ```
//!
//! Every attached session owns its own bounded queue. The dispatcher pushes
//! each update into every queue registered for that order, so sessions never
//! compete for events. Dropping a [`Subscription`] deregisters it.

pub mod dispatcher;
pub mod error;
pub mod event_log;
pub mod session;
pub mod transport;

pub use dispatcher::{DispatcherConfig, Subscription, SubscriptionDispatcher, SubscriptionId};
pub use error::{DispatchError, TransportError};
pub use event_log::{log_events, spawn_event_log};
pub use session::{SessionEnd, StreamSession};
pub use transport::{ChannelTransport, Transport, TransportProbe};
