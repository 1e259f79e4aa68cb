//! Receive loop
//!
//! ```text
//!            ┌─────────────── Ok ────────────────┐
//!            v                                   │
//!   ──> Reading ──frame──> Dispatch ─────────────┤
//!            │                                   │
//!            ├──error─────────> Reconnecting ────┤
//!            │                        │          │
//!            ├──host request──> Replacing ───────┘
//!            │                        │
//!            └──closed──┐             └── Closed / exhausted / auto-reconnect off
//!                       v                     │
//!                    Stopped <────────────────┘
//! ```
//!
//! Frames are dispatched in receipt order; dispatch finishes before the next
//! read starts. A host `reconnect()` made while the loop runs is served by
//! the loop itself (`Replacing`), and any host waiting when the loop
//! reconnects on its own receives that reconnect's outcome.

use crate::core::connection::{ConnectionManager, Inbound};
use crate::traits::*;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};

enum LoopState {
    Reading,
    Dispatch(Frame),
    Reconnecting(TetherError),
    /// Reconnect requested by the host
    Replacing,
    /// `None` for a deliberate close
    Stopped(Option<TetherError>),
}

pub(crate) struct MessageLoop {
    conn: Arc<ConnectionManager>,
}

impl MessageLoop {
    pub(crate) fn new(conn: Arc<ConnectionManager>) -> Self {
        Self { conn }
    }

    /// Run until closed or until reconnection gives up
    ///
    /// The close routine runs on every exit path, including a panicking
    /// handler; the panic is resumed afterwards.
    pub(crate) async fn run(self) -> Result<()> {
        self.conn.start_loop();
        let outcome = AssertUnwindSafe(self.drive()).catch_unwind().await;
        self.conn.stop_loop();
        self.conn.close_inner(false).await;

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn drive(&self) -> Result<()> {
        let mut state = LoopState::Reading;
        loop {
            state = match state {
                LoopState::Reading => self.read().await,
                LoopState::Dispatch(frame) => {
                    self.dispatch(frame).await;
                    LoopState::Reading
                }
                LoopState::Reconnecting(error) => self.recover(error).await,
                LoopState::Replacing => self.replace().await,
                LoopState::Stopped(None) => {
                    debug!("Receive loop stopped");
                    return Ok(());
                }
                LoopState::Stopped(Some(error)) => {
                    error!("Receive loop terminated: {}", error);
                    return Err(error);
                }
            };
        }
    }

    async fn read(&self) -> LoopState {
        match self.conn.read_frame().await {
            Ok(Inbound::Frame(frame)) => LoopState::Dispatch(frame),
            Ok(Inbound::ReconnectRequested) => LoopState::Replacing,
            Err(_) if self.conn.is_closed() => LoopState::Stopped(None),
            Err(e) => LoopState::Reconnecting(e),
        }
    }

    async fn recover(&self, error: TetherError) -> LoopState {
        self.conn.report(&error);

        if !self.conn.config.is_auto_reconnect() {
            return LoopState::Stopped(Some(error));
        }

        self.reconnect().await
    }

    async fn replace(&self) -> LoopState {
        // A permit can outlive the request it was stored for
        if !self.conn.has_reconnect_waiters() {
            return LoopState::Reading;
        }
        info!("Reconnect requested while receiving");
        self.reconnect().await
    }

    async fn reconnect(&self) -> LoopState {
        let outcome = self.conn.reconnect().await;
        self.conn.settle_reconnect_waiters(&outcome);

        match outcome {
            Ok(()) => LoopState::Reading,
            Err(TetherError::Closed) => LoopState::Stopped(None),
            Err(e) => {
                let failed = TetherError::ReconnectionFailed {
                    attempts: self.conn.config.reconnect_count(),
                    source: Box::new(e),
                };
                self.conn.report(&failed);
                LoopState::Stopped(Some(failed))
            }
        }
    }

    async fn dispatch(&self, frame: Frame) {
        let handlers = &self.conn.handlers;
        match frame {
            Frame::Text(text) => {
                if let Err(e) = handlers.on_message(text.as_bytes()).await {
                    self.report_stage(DispatchStage::Message, e);
                }
            }
            Frame::Binary(raw) => match handlers.decompress(&raw) {
                Ok(payload) => {
                    if let Err(e) = handlers.on_message(&payload).await {
                        self.report_stage(DispatchStage::DecompressedMessage, e);
                    }
                }
                Err(e) => self.report_stage(DispatchStage::Decompress, e),
            },
            Frame::Ping(payload) => {
                info!("[ws] receive ping {}", String::from_utf8_lossy(&payload));
            }
            Frame::Pong(payload) => {
                info!("[ws] receive pong {}", String::from_utf8_lossy(&payload));
            }
            Frame::Close { kind, reason } => {
                self.conn
                    .report(&TetherError::ConnectionClosed { kind, reason });
            }
            Frame::Other(raw) => {
                error!(
                    "[ws] unrecognized frame {}",
                    String::from_utf8_lossy(&raw)
                );
            }
        }
    }

    fn report_stage(&self, stage: DispatchStage, source: TetherError) {
        self.conn.report(&TetherError::Dispatch {
            stage,
            source: Box::new(source),
        });
    }
}
