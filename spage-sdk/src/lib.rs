//! Shared wire types for the spage status page backend.
//!
//! `objects` holds every request, response and event payload that crosses
//! the HTTP or WebSocket boundary. The `client` feature adds typed clients
//! for the REST API and the live event stream.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;
