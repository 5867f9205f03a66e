//! HTTP and WebSocket handlers for the relay.

pub mod presence;
pub mod socket;
pub mod status;

// Re-export AppState from config
pub use crate::config::AppState;

pub use presence::{get_group, list_users};
pub use socket::ws_handler;
pub use status::{health_check, index, stats};
