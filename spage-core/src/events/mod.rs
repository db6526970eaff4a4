//! Domain events produced by committed mutations.
//!
//! A mutation handler persists its change, describes the result as a
//! [`Mutation`], and hands the encoded [`DomainEvent`] to the broadcast
//! engine. Events are immutable once encoded and carry full snapshots, so
//! subscribers never need to re-fetch.

pub mod encoder;

pub use encoder::{DomainEvent, EventError, Mutation};
