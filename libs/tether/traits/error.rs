use crate::frame::CloseKind;
use crate::transport::Handshake;
use std::fmt;
use thiserror::Error;

/// Stage of frame dispatch that produced a reported failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    /// `on_message` failed for a text frame
    Message,
    /// The decompressor rejected a binary frame
    Decompress,
    /// `on_message` failed for a decompressed binary frame
    DecompressedMessage,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchStage::Message => f.write_str("message"),
            DispatchStage::Decompress => f.write_str("decompress"),
            DispatchStage::DecompressedMessage => f.write_str("decompressed message"),
        }
    }
}

/// Main error type for tether
///
/// Transient errors (per frame, per attempt) are absorbed by the client and
/// surfaced through the `ErrorReporter`. Only exhaustion of the reconnect cap
/// ends the receive loop.
#[derive(Error, Debug, Clone)]
pub enum TetherError {
    /// Handshake or TCP connect failure
    ///
    /// `response` carries the server's handshake response when the server
    /// answered with something other than an upgrade.
    #[error("Dial failed: {reason}")]
    Dial {
        reason: String,
        response: Option<Handshake>,
    },

    /// Frame read failure (includes an expired read deadline)
    #[error("Read error: {0}")]
    Read(String),

    /// Failure returned by a user callback
    #[error("Handler error: {0}")]
    Handler(String),

    /// Binary payload could not be decompressed
    #[error("Decompress error: {0}")]
    Decompress(String),

    /// A dispatch stage failed for one frame
    #[error("{stage} handler failed: {source}")]
    Dispatch {
        stage: DispatchStage,
        #[source]
        source: Box<TetherError>,
    },

    /// Outbound write failure
    #[error("Write error: {0}")]
    Write(String),

    /// Failure while closing a connection handle
    #[error("Close error: {0}")]
    Close(String),

    /// The peer sent a close-family frame
    #[error("Connection closed by peer ({kind}): {reason}")]
    ConnectionClosed { kind: CloseKind, reason: String },

    /// One reconnect attempt failed
    #[error("Reconnect attempt {attempt} failed: {source}")]
    ReconnectAttempt {
        attempt: usize,
        #[source]
        source: Box<TetherError>,
    },

    /// Reconnect gave up after the configured number of attempts
    #[error("Reconnection failed after {attempts} attempts: {source}")]
    ReconnectionFailed {
        attempts: usize,
        #[source]
        source: Box<TetherError>,
    },

    /// No live connection handle
    #[error("Not connected")]
    NotConnected,

    /// The client has been closed
    #[error("Client closed")]
    Closed,

    /// Operation did not finish before its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

impl TetherError {
    /// Build a handler error from anything printable
    ///
    /// Convenience for callbacks that work with their own error types:
    /// `serde_json::from_slice(p).map_err(TetherError::handler)?`
    pub fn handler(err: impl fmt::Display) -> Self {
        TetherError::Handler(err.to_string())
    }

    /// True for errors caused by the client being closed deliberately
    pub fn is_closed(&self) -> bool {
        matches!(self, TetherError::Closed)
    }
}

/// Result type for tether operations
pub type Result<T> = std::result::Result<T, TetherError>;
