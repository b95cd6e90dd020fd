//! Real-time Truco server.
//!
//! Serves the [`truco`] engine over a WebSocket with a small HTTP lobby.
//! The binary in `main.rs` wires [`config`], [`logging`] and [`metrics`]
//! around [`api::create_router`].

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
