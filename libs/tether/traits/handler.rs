//! Pluggable behaviours of the client
//!
//! The client invokes four capabilities, each replaceable on its own:
//!
//! - **MessageHandler**: receives every text payload and every decompressed
//!   binary payload
//! - **Decompressor**: turns a binary frame into a payload (gzip by default)
//! - **ErrorReporter**: sink for every absorbed error; must not fail
//! - **ConnectHook**: runs after each successful dial, before subscriptions
//!   are replayed
//!
//! Plain closures implement each trait, so simple overrides need no new type:
//!
//! ```ignore
//! let client = tether::builder()
//!     .url("wss://api.example.com/ws")
//!     .on_message(|payload: &[u8]| {
//!         println!("{}", String::from_utf8_lossy(payload));
//!         Ok(())
//!     })
//!     .on_system_error(|err: &TetherError| eprintln!("{err}"))
//!     .build()?;
//! ```

use crate::error::{Result, TetherError};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::{error, info};

/// Receives message payloads in the order frames arrived
///
/// Runs on the receive loop: the next frame is not read until this returns.
/// Errors are reported through the `ErrorReporter` and the loop continues.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn on_message(&self, payload: &[u8]) -> Result<()>;
}

/// Decodes binary frames before they reach the `MessageHandler`
pub trait Decompressor: Send + Sync + 'static {
    fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>>;
}

/// Sink for errors the client absorbs
pub trait ErrorReporter: Send + Sync + 'static {
    fn on_system_error(&self, error: &TetherError);
}

/// Runs after every successful dial
///
/// A failure is returned from `connect()`; the new connection stays
/// installed.
#[async_trait]
pub trait ConnectHook: Send + Sync + 'static {
    async fn after_connect(&self) -> Result<()>;
}

#[async_trait]
impl<F> MessageHandler for F
where
    F: Fn(&[u8]) -> Result<()> + Send + Sync + 'static,
{
    async fn on_message(&self, payload: &[u8]) -> Result<()> {
        self(payload)
    }
}

impl<F> Decompressor for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync + 'static,
{
    fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        self(raw)
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&TetherError) + Send + Sync + 'static,
{
    fn on_system_error(&self, error: &TetherError) {
        self(error)
    }
}

#[async_trait]
impl<F> ConnectHook for F
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    async fn after_connect(&self) -> Result<()> {
        self()
    }
}

/// Default message handler: logs the payload
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessages;

#[async_trait]
impl MessageHandler for LogMessages {
    async fn on_message(&self, payload: &[u8]) -> Result<()> {
        info!("[ws] receive message {}", String::from_utf8_lossy(payload));
        Ok(())
    }
}

/// Default decompressor: gzip
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let mut decoded = Vec::new();
        GzDecoder::new(raw)
            .read_to_end(&mut decoded)
            .map_err(|e| TetherError::Decompress(e.to_string()))?;
        Ok(decoded)
    }
}

/// Default error reporter: logs at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrors;

impl ErrorReporter for LogErrors {
    fn on_system_error(&self, error: &TetherError) {
        error!("[ws] system error: {}", error);
    }
}

/// Default connect hook: logs the connect time
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConnect;

#[async_trait]
impl ConnectHook for LogConnect {
    async fn after_connect(&self) -> Result<()> {
        info!(
            "[ws] connect success. {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        Ok(())
    }
}
