//! Kiosk API server library.
//!
//! Exposes config, state, error handling, routes and the WebSocket
//! infrastructure so integration tests and the binary entrypoint share the
//! same building blocks.

pub mod background;
pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod handlers;
pub mod kiosk;
pub mod library;
pub mod playlist;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod store;
pub mod ws;
