//! # Tether Traits
//!
//! Core traits and types shared by the client:
//!
//! - **Frame**: what the transport delivers and accepts
//! - **Dialer / FrameReader / FrameWriter**: the transport seam
//! - **MessageHandler / Decompressor / ErrorReporter / ConnectHook**: the
//!   pluggable behaviours invoked by the receive loop
//! - **ReconnectPolicy**: capped linear backoff
//! - **TetherError**: the error taxonomy

pub mod error;
pub mod frame;
pub mod handler;
pub mod reconnect;
pub mod transport;

// Re-export commonly used types
pub use error::{DispatchStage, Result, TetherError};
pub use frame::{CloseKind, ControlKind, Frame};
pub use handler::{
    ConnectHook, Decompressor, ErrorReporter, GzipDecompressor, LogConnect, LogErrors,
    LogMessages, MessageHandler,
};
pub use reconnect::ReconnectPolicy;
pub use transport::{Dialed, Dialer, FrameReader, FrameWriter, Handshake, Headers};
