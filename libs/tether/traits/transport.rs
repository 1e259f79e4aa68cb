//! Transport seam
//!
//! The client never touches sockets directly. It talks to a [`Dialer`] that
//! produces one read half and one write half per connection. The production
//! implementation lives in `core::tungstenite`; tests plug in scripted
//! transports.
//!
//! ```text
//!  Dialer::dial(url, headers)
//!        │
//!        ├──> FrameReader  (owned by the receive loop)
//!        ├──> FrameWriter  (shared behind the write lock)
//!        └──> Handshake    (dumped in dump mode)
//! ```

use crate::error::Result;
use crate::frame::Frame;
use async_trait::async_trait;
use std::fmt::Write as _;
use tokio::time::Instant;

/// HTTP headers sent with the upgrade request
///
/// Ordered; a name may appear more than once and every value is sent.
pub type Headers = Vec<(String, String)>;

/// Handshake response returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    pub status: u16,
    pub headers: Headers,
    pub body: Option<String>,
}

impl Handshake {
    /// Render the response the way it came over the wire
    pub fn dump(&self) -> String {
        let mut out = format!("HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            let _ = write!(out, "{}: {}\r\n", name, value);
        }
        out.push_str("\r\n");
        if let Some(body) = &self.body {
            out.push_str(body);
        }
        out
    }
}

/// A freshly established connection
pub struct Dialed {
    pub reader: Box<dyn FrameReader>,
    pub writer: Box<dyn FrameWriter>,
    pub handshake: Handshake,
}

/// Establishes connections
///
/// Called on every connect and on every reconnect attempt. Failures should
/// be reported as `TetherError::Dial`, with the handshake response attached
/// when the server produced one.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self, url: &str, headers: &Headers) -> Result<Dialed>;
}

/// Read half of a connection
#[async_trait]
pub trait FrameReader: Send + 'static {
    /// Wait for the next frame
    ///
    /// Must fail once the read deadline (if any) has passed.
    async fn read_frame(&mut self) -> Result<Frame>;

    /// Set the instant after which pending and future reads fail
    fn set_read_deadline(&mut self, deadline: Instant) -> Result<()>;
}

/// Write half of a connection
#[async_trait]
pub trait FrameWriter: Send + 'static {
    async fn write_frame(&mut self, frame: Frame) -> Result<()>;

    /// Close the connection
    async fn close(&mut self) -> Result<()>;
}
