//! In-process fan-out of domain events to WebSocket subscribers.
//!
//! # Flow
//!
//! 1. A socket task opens a [`ConnectionHandle`] and registers it, globally
//!    or scoped to one organization.
//! 2. A mutation handler encodes a [`DomainEvent`](crate::events::DomainEvent)
//!    and asks the [`BroadcastEngine`] for both broadcasts.
//! 3. The engine snapshots the target set, pushes the JSON text into each
//!    outbox and reaps connections whose delivery failed.
//! 4. The socket task drains its outbox into text frames and unregisters
//!    when the peer goes away.

pub mod broadcast;
pub mod connection;
pub mod registry;

pub use broadcast::{BroadcastEngine, BroadcastReport};
pub use connection::{ConnectionHandle, ConnectionId, DeliveryError, Outbox};
pub use registry::{ConnectionRegistry, RegistryStats};
