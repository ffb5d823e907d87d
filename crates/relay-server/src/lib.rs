//! # relay-server
//!
//! Axum HTTP + `WebSocket` relay.
//!
//! - `GET /ws`: every text frame a client sends is broadcast to all connected
//!   clients, the sender included
//! - `POST /send`: appends a `{sender, receiver, content}` message to an
//!   in-memory log
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `registry` | Set of live connections behind one async mutex |
//! | `broadcast` | Fan-out to every registry member, pruning failed sends |
//! | `connection` | Per-connection receive loop and the `MessageSink` seam |
//! | `submission` | Append-only submission log |
//! | `server` | Router, shared state, listener |

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod registry;
pub mod server;
pub mod submission;

#[cfg(test)]
mod testutil;

pub use config::ServerConfig;
pub use registry::ClientRegistry;
pub use server::{build_router, start, AppState, ServerHandle};
pub use submission::SubmissionLog;
