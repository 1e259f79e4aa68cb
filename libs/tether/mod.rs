//! # Tether
//!
//! A persistent WebSocket client that keeps itself connected.
//!
//! ## Features
//!
//! - **Subscription replay**: configured payloads are resent after every
//!   successful (re)connect, in order
//! - **Bounded reconnection**: capped linear backoff driven by read failures
//! - **Read deadlines**: rolling idle timeout renewed on every received frame
//! - **Pluggable behaviours**: message, decompress, error and post-connect
//!   handlers, replaceable at build time and at runtime
//! - **Coordinated shutdown**: an external `Shutdown` signal plus an
//!   idempotent `close()`

pub mod core;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use crate::core::{
    builder,
    builder::{states, ClientBuilder},
    client::{ClientEvent, Metrics, WsClient, WsWriter, EVENT_QUEUE_CAPACITY},
    config::{ClientConfig, DialerConfig},
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState},
    handlers::HandlerSet,
    shutdown::Shutdown,
    tungstenite::TungsteniteDialer,
};
