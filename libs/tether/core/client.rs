use crate::core::config::ClientConfig;
use crate::core::connection::ConnectionManager;
use crate::core::connection_state::ConnectionState;
use crate::core::handlers::HandlerSet;
use crate::core::message_loop::MessageLoop;
use crate::core::shutdown::Shutdown;
use crate::traits::*;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

/// Lifecycle events published by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A handle was installed
    Connected,
    /// The handle was torn down ahead of a reconnect
    Disconnected,
    /// Reconnecting (attempt number)
    Reconnecting(usize),
    /// `close()` completed its first pass
    Closed,
    /// An error was absorbed and reported
    Error(String),
}

/// Lifecycle events kept for the host; the oldest is dropped when full
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

/// Persistent WebSocket client
///
/// Cheap to clone; every clone drives the same connection. Typical use:
///
/// ```ignore
/// let client = tether::builder()
///     .url("wss://api.example.com/ws")
///     .subscription(r#"{"sub":"market.btcusdt.trade.detail"}"#)
///     .on_message(|payload: &[u8]| {
///         println!("{}", String::from_utf8_lossy(payload));
///         Ok(())
///     })
///     .build()?;
///
/// client.connect().await?;
/// let receiver = client.spawn_receiver();
/// client.shutdown().cancelled().await;
/// receiver.await??;
/// ```
#[derive(Clone)]
pub struct WsClient {
    inner: Arc<ConnectionManager>,
}

impl WsClient {
    pub(crate) fn new(
        config: ClientConfig,
        handlers: HandlerSet,
        dialer: Arc<dyn Dialer>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectionManager::new(
                Arc::new(config),
                Arc::new(handlers),
                dialer,
                shutdown,
            )),
        }
    }

    /// Dial the endpoint and replay subscriptions
    ///
    /// Dial failures are returned as-is; nothing is retried here.
    pub async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    /// Tear down the current handle and dial again with backoff
    ///
    /// While a receive loop is running the request is handed to the loop,
    /// which wakes from its read and reconnects on the caller's behalf; the
    /// caller gets the loop's outcome, or `Closed` if the loop stops first.
    pub async fn reconnect(&self) -> Result<()> {
        self.inner.request_reconnect().await
    }

    /// Close the connection and fire the shutdown signal
    ///
    /// Safe to call more than once; repeat calls only report `Closed`.
    pub async fn close(&self) {
        info!("Closing WebSocket client for {}", self.inner.config.url());
        self.inner.close_inner(true).await;
    }

    /// Run the receive loop on the current task
    ///
    /// Returns `Ok(())` after a deliberate close and the terminating error
    /// otherwise. Run at most one loop per client.
    pub async fn receive_messages(&self) -> Result<()> {
        MessageLoop::new(Arc::clone(&self.inner)).run().await
    }

    /// Run the receive loop as its own tokio task
    pub fn spawn_receiver(&self) -> JoinHandle<Result<()>> {
        // Marked before the task first runs so an immediate reconnect() is
        // routed through the loop
        self.inner.start_loop();
        let client = self.clone();
        tokio::spawn(async move { client.receive_messages().await })
    }

    pub async fn write_message(&self, frame: Frame) -> Result<()> {
        self.inner.write_frame(frame).await
    }

    pub async fn write_text(&self, text: impl Into<String>) -> Result<()> {
        self.inner.write_frame(Frame::Text(text.into())).await
    }

    pub async fn write_binary(&self, data: impl Into<Vec<u8>>) -> Result<()> {
        self.inner.write_frame(Frame::Binary(data.into())).await
    }

    /// Write a ping, pong or close frame, failing with `Timeout` at `deadline`
    pub async fn write_control(
        &self,
        kind: ControlKind,
        payload: impl Into<Vec<u8>>,
        deadline: Instant,
    ) -> Result<()> {
        self.inner
            .write_control(kind, payload.into(), deadline)
            .await
    }

    /// Weak write handle for use inside handlers
    ///
    /// Handlers are owned by the client, so a handler holding a full clone
    /// would keep the client alive forever.
    pub fn writer(&self) -> WsWriter {
        WsWriter {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Runtime access to the handler slots
    pub fn handlers(&self) -> &HandlerSet {
        &self.inner.handlers
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.inner.shutdown
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get current connection state
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    /// Check if connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.inner.state.is_connected()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        let metrics = &self.inner.metrics;
        Metrics {
            messages_sent: metrics.messages_sent(),
            messages_received: metrics.messages_received(),
            reconnect_count: metrics.reconnect_count(),
            connection_state: self.inner.state.get(),
        }
    }

    /// Try to receive an event (non-blocking)
    ///
    /// At most `EVENT_QUEUE_CAPACITY` undrained events are retained.
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.inner.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> std::result::Result<ClientEvent, crossbeam_channel::RecvError> {
        self.inner.event_rx.recv()
    }
}

/// Write-only handle that does not keep the client alive
#[derive(Clone)]
pub struct WsWriter {
    inner: Weak<ConnectionManager>,
}

impl WsWriter {
    fn upgrade(&self) -> Result<Arc<ConnectionManager>> {
        self.inner.upgrade().ok_or(TetherError::Closed)
    }

    pub async fn write_message(&self, frame: Frame) -> Result<()> {
        self.upgrade()?.write_frame(frame).await
    }

    pub async fn write_text(&self, text: impl Into<String>) -> Result<()> {
        self.write_message(Frame::Text(text.into())).await
    }

    pub async fn write_binary(&self, data: impl Into<Vec<u8>>) -> Result<()> {
        self.write_message(Frame::Binary(data.into())).await
    }

    pub async fn write_control(
        &self,
        kind: ControlKind,
        payload: impl Into<Vec<u8>>,
        deadline: Instant,
    ) -> Result<()> {
        self.upgrade()?
            .write_control(kind, payload.into(), deadline)
            .await
    }
}
