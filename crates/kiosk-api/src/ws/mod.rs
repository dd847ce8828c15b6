//! WebSocket push channel to the display and controller clients.
//!
//! Provides connection management, heartbeat monitoring, the HTTP upgrade
//! handler, and the forwarder that relays bus events to every client.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::start_forwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{ClientRole, WsManager};
