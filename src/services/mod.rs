//! The connection gateway (feature `web`).
//!
//! Owns the client-facing surface: the WebSocket channel that carries
//! state-change requests in and broadcast events out, plus a small REST
//! endpoint for one-shot state reads. All state flows through the
//! [`SharedHub`](crate::hub::SharedHub); the gateway never touches the
//! store or the pins directly.

pub mod gateway;

pub use gateway::*;
