//! Runtime configuration re-exports.
//!
//! The validated config types live in `spage_core::config` so the broadcast
//! engine and the directory client can read them directly.

pub use spage_core::config::{
    ConfigStore, DirectoryConfig, RealtimeConfig, ServerConfig, SharedConfig,
};
