//! Connection lifecycle
//!
//! `ConnectionManager` owns the live handle (one read half, one write half)
//! and implements connect, reconnect, close and the write paths. The receive
//! loop in `message_loop` is its only reader.
//!
//! While the loop runs it also owns reconnection: a host `reconnect()` is
//! queued as a request and the loop's read is woken to serve it, so only one
//! reconnect is ever in flight.

use crate::core::client::{ClientEvent, EVENT_QUEUE_CAPACITY};
use crate::core::config::ClientConfig;
use crate::core::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::core::handlers::HandlerSet;
use crate::core::shutdown::Shutdown;
use crate::traits::*;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Outcome of one read by the receive loop
pub(crate) enum Inbound {
    Frame(Frame),
    /// A host asked for a reconnect
    ReconnectRequested,
}

#[derive(Default)]
struct ReconnectRequests {
    loop_running: bool,
    waiters: Vec<oneshot::Sender<Result<()>>>,
}

pub(crate) struct ConnectionManager {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) handlers: Arc<HandlerSet>,
    dialer: Arc<dyn Dialer>,
    /// Read half; locked by the receive loop for the duration of a read
    reader: Mutex<Option<Box<dyn FrameReader>>>,
    /// Write half; the lock serializes every outbound frame
    writer: Mutex<Option<Box<dyn FrameWriter>>>,
    closed: AtomicBool,
    /// Wakes a blocked read or backoff sleep when `close()` runs
    close_notify: Notify,
    /// Wakes the loop's read when a host requests a reconnect
    reconnect_notify: Notify,
    requests: parking_lot::Mutex<ReconnectRequests>,
    pub(crate) state: AtomicConnectionState,
    pub(crate) metrics: AtomicMetrics,
    event_tx: Sender<ClientEvent>,
    pub(crate) event_rx: Receiver<ClientEvent>,
    pub(crate) shutdown: Shutdown,
}

impl ConnectionManager {
    pub(crate) fn new(
        config: Arc<ClientConfig>,
        handlers: Arc<HandlerSet>,
        dialer: Arc<dyn Dialer>,
        shutdown: Shutdown,
    ) -> Self {
        let (event_tx, event_rx) = bounded(EVENT_QUEUE_CAPACITY);
        Self {
            config,
            handlers,
            dialer,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
            reconnect_notify: Notify::new(),
            requests: parking_lot::Mutex::new(ReconnectRequests::default()),
            state: AtomicConnectionState::new(ConnectionState::Disconnected),
            metrics: AtomicMetrics::new(),
            event_tx,
            event_rx,
            shutdown,
        }
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn emit(&self, event: ClientEvent) {
        let event = match self.event_tx.try_send(event) {
            Ok(()) => return,
            Err(TrySendError::Full(event)) => event,
            // The receiver lives as long as self
            Err(TrySendError::Disconnected(_)) => return,
        };
        if let Ok(dropped) = self.event_rx.try_recv() {
            debug!("Event queue full, dropping oldest event {:?}", dropped);
        }
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("Event queue full, dropping event {:?}", e.into_inner());
        }
    }

    /// Hand an error to the reporter and publish it as an event
    pub(crate) fn report(&self, error: &TetherError) {
        self.handlers.report(error);
        self.emit(ClientEvent::Error(error.to_string()));
    }

    /// Dial, install the new handle, run the connect hook and replay subscriptions
    pub(crate) async fn connect(&self) -> Result<()> {
        if self.is_closed() {
            return Err(TetherError::Closed);
        }
        self.state.set_unless_closed(ConnectionState::Connecting);

        let dialed = match self
            .dialer
            .dial(self.config.url(), self.config.headers())
            .await
        {
            Ok(dialed) => dialed,
            Err(e) => {
                if self.config.is_dump() {
                    if let TetherError::Dial {
                        response: Some(response),
                        ..
                    } = &e
                    {
                        info!("[ws] handshake response:\n{}", response.dump());
                    }
                }
                self.state.set_unless_closed(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        if self.config.is_dump() {
            info!("[ws] handshake response:\n{}", dialed.handshake.dump());
        }

        let Dialed {
            reader,
            mut writer,
            ..
        } = dialed;

        {
            let mut slot = self.writer.lock().await;
            if self.is_closed() {
                // close() ran while dialing; the new handle must not outlive it
                drop(slot);
                let _ = writer.close().await;
                return Err(TetherError::Closed);
            }
            if let Some(mut previous) = slot.take() {
                if let Err(e) = previous.close().await {
                    self.report(&e);
                }
            }
            *slot = Some(writer);
        }
        *self.reader.lock().await = Some(reader);

        self.state.set_unless_closed(ConnectionState::Connected);
        info!("Connected to {}", self.config.url());
        self.emit(ClientEvent::Connected);

        self.handlers.after_connect().await?;

        for payload in self.config.subscriptions() {
            if let Err(e) = self.write_frame(Frame::Text(payload.clone())).await {
                self.report(&e);
            }
        }
        debug!(
            "Replayed {} subscriptions",
            self.config.subscription_count()
        );

        Ok(())
    }

    /// Replace the handle, retrying `connect()` up to the configured cap
    ///
    /// Returns the last connect error when every attempt fails, or `Closed`
    /// when the client is closed or the shutdown signal fires while waiting.
    pub(crate) async fn reconnect(&self) -> Result<()> {
        if self.is_closed() {
            return Err(TetherError::Closed);
        }
        self.state.set_unless_closed(ConnectionState::Disconnected);
        self.emit(ClientEvent::Disconnected);

        let previous = self.writer.lock().await.take();
        if let Some(mut writer) = previous {
            if let Err(e) = writer.close().await {
                self.report(&e);
            }
        }
        self.reader.lock().await.take();

        let policy = self.config.reconnect_policy();
        let mut last_error = TetherError::NotConnected;
        let mut attempt = 1;

        while let Some(delay) = policy.next_delay(attempt) {
            let woken = self.close_notify.notified();
            if self.is_closed() || self.shutdown.is_cancelled() {
                return Err(TetherError::Closed);
            }
            self.state.set_unless_closed(ConnectionState::Reconnecting);
            self.emit(ClientEvent::Reconnecting(attempt));
            debug!("Reconnecting in {:?} (attempt {})", delay, attempt);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = woken => return Err(TetherError::Closed),
                _ = self.shutdown.cancelled() => {
                    debug!("Shutdown signalled during reconnection delay");
                    return Err(TetherError::Closed);
                }
            }

            match self.connect().await {
                Ok(()) => {
                    info!("Reconnected on attempt {}", attempt);
                    self.metrics.increment_reconnects();
                    return Ok(());
                }
                Err(TetherError::Closed) => return Err(TetherError::Closed),
                Err(e) => {
                    self.report(&TetherError::ReconnectAttempt {
                        attempt,
                        source: Box::new(e.clone()),
                    });
                    last_error = e;
                }
            }
            attempt += 1;
        }

        warn!(
            "Reconnection gave up after {} attempts",
            policy.max_attempts()
        );
        Err(last_error)
    }

    /// Reconnect, routed through the receive loop when one is running
    pub(crate) async fn request_reconnect(&self) -> Result<()> {
        let outcome = {
            let mut requests = self.requests.lock();
            if !requests.loop_running {
                None
            } else {
                let (tx, rx) = oneshot::channel();
                requests.waiters.push(tx);
                Some(rx)
            }
        };

        match outcome {
            None => self.reconnect().await,
            Some(rx) => {
                // Stored as a permit if the loop is not reading right now
                self.reconnect_notify.notify_one();
                rx.await.unwrap_or(Err(TetherError::Closed))
            }
        }
    }

    pub(crate) fn start_loop(&self) {
        self.requests.lock().loop_running = true;
    }

    /// Mark the loop gone; pending requesters see `Closed`
    pub(crate) fn stop_loop(&self) {
        let mut requests = self.requests.lock();
        requests.loop_running = false;
        requests.waiters.clear();
    }

    /// Whether any host reconnect is waiting on the loop
    pub(crate) fn has_reconnect_waiters(&self) -> bool {
        !self.requests.lock().waiters.is_empty()
    }

    /// Answer every queued host reconnect with the loop's outcome
    pub(crate) fn settle_reconnect_waiters(&self, outcome: &Result<()>) {
        let waiters = std::mem::take(&mut self.requests.lock().waiters);
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Close the handle and fire the shutdown signal
    ///
    /// Only the first call does any work. Later calls report `Closed` when
    /// `report_repeat` is set; the receive loop passes false on its way out.
    pub(crate) async fn close_inner(&self, report_repeat: bool) {
        let first = !self.closed.swap(true, Ordering::AcqRel);
        self.close_notify.notify_waiters();

        if !first {
            if let Ok(mut reader) = self.reader.try_lock() {
                reader.take();
            }
            if report_repeat {
                self.report(&TetherError::Closed);
            }
            return;
        }

        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            match writer.close().await {
                Ok(()) => info!("Closed connection to {}", self.config.url()),
                Err(e) => self.report(&e),
            }
        }
        // Held by the loop mid-read; the loop drops it on exit
        if let Ok(mut reader) = self.reader.try_lock() {
            reader.take();
        }

        self.state.set(ConnectionState::Closed);
        self.emit(ClientEvent::Closed);

        let grace = self.config.close_grace();
        if !grace.is_zero() {
            tokio::time::sleep(grace).await;
        }
        self.shutdown.cancel();
    }

    /// Read the next frame; wakes with `Closed` when the client is closed and
    /// with `ReconnectRequested` when a host asks for a reconnect
    pub(crate) async fn read_frame(&self) -> Result<Inbound> {
        let woken = self.close_notify.notified();
        if self.is_closed() {
            return Err(TetherError::Closed);
        }

        let mut slot = self.reader.lock().await;
        let reader = slot.as_mut().ok_or(TetherError::NotConnected)?;

        let frame = tokio::select! {
            frame = reader.read_frame() => frame?,
            _ = woken => return Err(TetherError::Closed),
            _ = self.reconnect_notify.notified() => return Ok(Inbound::ReconnectRequested),
        };
        self.metrics.increment_received();

        let deadline = self.config.read_deadline();
        if !deadline.is_zero() {
            if let Err(e) = reader.set_read_deadline(Instant::now() + deadline) {
                warn!("Failed to renew read deadline: {}", e);
            }
        }

        Ok(Inbound::Frame(frame))
    }

    pub(crate) async fn write_frame(&self, frame: Frame) -> Result<()> {
        let mut slot = self.writer.lock().await;
        let writer = slot.as_mut().ok_or(TetherError::NotConnected)?;
        writer.write_frame(frame).await?;
        self.metrics.increment_sent();
        Ok(())
    }

    /// Write a control frame, giving up at `deadline`
    ///
    /// The deadline covers waiting for the write lock as well as the write.
    pub(crate) async fn write_control(
        &self,
        kind: ControlKind,
        payload: Vec<u8>,
        deadline: Instant,
    ) -> Result<()> {
        timeout_at(deadline, self.write_frame(kind.into_frame(payload)))
            .await
            .map_err(|_| TetherError::Timeout(format!("{:?} control frame write", kind)))?
    }
}
