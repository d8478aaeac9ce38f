//! HTTP and `WebSocket` API for the MetaCity simulation.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **Action intake** (`POST /api/actions`): every write is an action
//!   submitted to the simulation loop, answered with its outcome
//! - **Snapshot reads** for the game state, resource summary, tutorial
//!   advisor and flavor board
//! - **`WebSocket` endpoint** (`/ws/summaries`) streaming a resource
//!   summary after every applied action
//!
//! # Architecture
//!
//! Reads are served from the snapshot the loop publishes on a `watch`
//! channel, so the API never blocks the simulation.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
