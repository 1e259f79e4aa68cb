//! Client implementation
//!
//! ## Example
//!
//! ```rust,ignore
//! use tether::{Shutdown, TetherError};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> tether::Result<()> {
//!     let shutdown = Shutdown::new();
//!     shutdown.spawn_signal_handler();
//!
//!     let client = tether::builder()
//!         .url("wss://api.example.com/ws")
//!         .subscription(r#"{"sub":"trades"}"#)
//!         .reconnect_interval(Duration::from_secs(2))
//!         .read_deadline(Duration::from_secs(30))
//!         .on_system_error(|err: &TetherError| eprintln!("{err}"))
//!         .shutdown(shutdown.clone())
//!         .build()?;
//!
//!     client.connect().await?;
//!     let receiver = client.spawn_receiver();
//!
//!     shutdown.cancelled().await;
//!     client.close().await;
//!     let _ = receiver.await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
mod connection;
pub mod connection_state;
pub mod handlers;
mod message_loop;
pub mod shutdown;
pub mod tungstenite;

pub use builder::{states, ClientBuilder};
pub use client::{ClientEvent, Metrics, WsClient, WsWriter, EVENT_QUEUE_CAPACITY};
pub use config::{ClientConfig, DialerConfig};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use handlers::HandlerSet;
pub use shutdown::Shutdown;

/// Create a new client builder
///
/// # Example
/// ```ignore
/// let client = tether::builder()
///     .url("wss://api.huobi.pro/ws")
///     .subscription(r#"{"sub":"market.btcusdt.kline.1min"}"#)
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder<states::NoUrl> {
    ClientBuilder::new()
}
