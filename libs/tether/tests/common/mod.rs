//! Common test utilities for tether integration tests
//!
//! Two transports are provided: `FakeDialer`, an in-memory scripted
//! transport driven by the test through `FakePeer`, and `MockWsServer`, a
//! real `tokio-tungstenite` echo server on a loopback port.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tether::{
    Dialed, Dialer, Frame, FrameReader, FrameWriter, Handshake, Headers, Shutdown, TetherError,
};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tokio::time::{timeout_at, Instant};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

type Inbound = tether::Result<Frame>;

struct FakeState {
    dials: Mutex<Vec<Instant>>,
    /// Dials left to fail; `usize::MAX` fails forever
    fail_budget: AtomicUsize,
    fail_writes: AtomicBool,
    stall_writes: AtomicBool,
    deadline_calls: Arc<AtomicUsize>,
    /// Every frame written on any connection, plus handler entries a test adds
    timeline: Arc<Mutex<Vec<String>>>,
    written: Arc<Mutex<Vec<Frame>>>,
    closes: Arc<AtomicUsize>,
    /// Frames queued on every new connection before the test sees its peer
    script: Mutex<Vec<Frame>>,
    peers_tx: mpsc::UnboundedSender<FakePeer>,
    peers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<FakePeer>>,
}

/// Scripted in-memory transport
#[derive(Clone)]
pub struct FakeDialer {
    state: Arc<FakeState>,
}

impl FakeDialer {
    pub fn new() -> Self {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(FakeState {
                dials: Mutex::new(Vec::new()),
                fail_budget: AtomicUsize::new(0),
                fail_writes: AtomicBool::new(false),
                stall_writes: AtomicBool::new(false),
                deadline_calls: Arc::new(AtomicUsize::new(0)),
                timeline: Arc::new(Mutex::new(Vec::new())),
                written: Arc::new(Mutex::new(Vec::new())),
                closes: Arc::new(AtomicUsize::new(0)),
                script: Mutex::new(Vec::new()),
                peers_tx,
                peers_rx: tokio::sync::Mutex::new(peers_rx),
            }),
        }
    }

    /// Queue a frame on every future connection
    pub fn with_script(self, frame: Frame) -> Self {
        self.state.script.lock().push(frame);
        self
    }

    pub fn fail_next(&self, dials: usize) {
        self.state.fail_budget.store(dials, Ordering::SeqCst);
    }

    pub fn fail_always(&self) {
        self.fail_next(usize::MAX);
    }

    pub fn fail_writes(&self) {
        self.state.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Writes never complete
    pub fn stall_writes(&self) {
        self.state.stall_writes.store(true, Ordering::SeqCst);
    }

    pub fn dial_count(&self) -> usize {
        self.state.dials.lock().len()
    }

    pub fn dial_times(&self) -> Vec<Instant> {
        self.state.dials.lock().clone()
    }

    pub fn deadline_calls(&self) -> usize {
        self.state.deadline_calls.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<Frame> {
        self.state.written.lock().clone()
    }

    pub fn timeline(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.state.timeline)
    }

    /// Wait for the next successful dial
    pub async fn next_peer(&self) -> FakePeer {
        self.state
            .peers_rx
            .lock()
            .await
            .recv()
            .await
            .expect("dialer dropped")
    }
}

#[async_trait]
impl Dialer for FakeDialer {
    async fn dial(&self, _url: &str, _headers: &Headers) -> tether::Result<Dialed> {
        self.state.dials.lock().push(Instant::now());

        let budget = self.state.fail_budget.load(Ordering::SeqCst);
        if budget > 0 {
            if budget != usize::MAX {
                self.state.fail_budget.store(budget - 1, Ordering::SeqCst);
            }
            return Err(TetherError::Dial {
                reason: "connection refused".into(),
                response: Some(Handshake {
                    status: 503,
                    headers: vec![("retry-after".into(), "1".into())],
                    body: Some("unavailable".into()),
                }),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        for frame in self.state.script.lock().iter() {
            let _ = tx.send(Ok(frame.clone()));
        }
        let _ = self.state.peers_tx.send(FakePeer { tx });

        Ok(Dialed {
            reader: Box::new(FakeReader {
                rx,
                deadline: None,
                deadline_calls: Arc::clone(&self.state.deadline_calls),
            }),
            writer: Box::new(FakeWriter {
                state: Arc::clone(&self.state),
            }),
            handshake: Handshake {
                status: 101,
                headers: vec![("upgrade".into(), "websocket".into())],
                body: None,
            },
        })
    }
}

/// Server side of one fake connection
pub struct FakePeer {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl FakePeer {
    pub fn send(&self, frame: Frame) {
        let _ = self.tx.send(Ok(frame));
    }

    pub fn send_text(&self, text: &str) {
        self.send(Frame::Text(text.to_string()));
    }

    /// Make the client's next read fail
    pub fn fail(&self, reason: &str) {
        let _ = self.tx.send(Err(TetherError::Read(reason.to_string())));
    }
}

struct FakeReader {
    rx: mpsc::UnboundedReceiver<Inbound>,
    deadline: Option<Instant>,
    deadline_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameReader for FakeReader {
    async fn read_frame(&mut self) -> tether::Result<Frame> {
        let next = match self.deadline {
            Some(deadline) => timeout_at(deadline, self.rx.recv())
                .await
                .map_err(|_| TetherError::Read("read deadline exceeded".into()))?,
            None => self.rx.recv().await,
        };
        next.unwrap_or_else(|| Err(TetherError::Read("peer dropped".into())))
    }

    fn set_read_deadline(&mut self, deadline: Instant) -> tether::Result<()> {
        self.deadline_calls.fetch_add(1, Ordering::SeqCst);
        self.deadline = Some(deadline);
        Ok(())
    }
}

struct FakeWriter {
    state: Arc<FakeState>,
}

#[async_trait]
impl FrameWriter for FakeWriter {
    async fn write_frame(&mut self, frame: Frame) -> tether::Result<()> {
        if self.state.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(TetherError::Write("broken pipe".into()));
        }
        if let Frame::Text(text) = &frame {
            self.state.timeline.lock().push(format!("out:{}", text));
        }
        self.state.written.lock().push(frame);
        Ok(())
    }

    async fn close(&mut self) -> tether::Result<()> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Collects every error handed to the reporter
#[derive(Clone, Default)]
pub struct ErrorLog {
    errors: Arc<Mutex<Vec<TetherError>>>,
    notify: Arc<Notify>,
}

impl ErrorLog {
    pub fn reporter(&self) -> impl Fn(&TetherError) + Send + Sync + 'static {
        let log = self.clone();
        move |err: &TetherError| {
            verbose_println!("  reported: {}", err);
            log.errors.lock().push(err.clone());
            log.notify.notify_waiters();
        }
    }

    pub fn errors(&self) -> Vec<TetherError> {
        self.errors.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&TetherError) -> bool) -> usize {
        self.errors.lock().iter().filter(|e| pred(e)).count()
    }

    /// Wait until an error matching `pred` has been reported
    pub async fn wait_for(&self, pred: impl Fn(&TetherError) -> bool) {
        loop {
            let notified = self.notify.notified();
            if self.count(&pred) > 0 {
                return;
            }
            notified.await;
        }
    }
}

/// A simple mock WebSocket server for testing
///
/// Stopping is sticky: a `shutdown()` issued before the accept task first
/// runs still stops it.
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl MockWsServer {
    /// Create and start a new echo server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.cancelled() => {
                        break;
                    }
                }
            }
        });

        Self { addr, shutdown }
    }

    async fn handle_connection(stream: tokio::net::TcpStream, shutdown: Shutdown) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_async;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(msg)) => {
                            if msg.is_text() || msg.is_binary() {
                                if write.send(msg).await.is_err() {
                                    break;
                                }
                            } else if msg.is_close() {
                                break;
                            }
                        }
                        Some(Err(_)) | None => break,
                    }
                }
                _ = shutdown.cancelled() => {
                    break;
                }
            }
        }
    }

    /// URL of a loopback port nothing listens on
    pub async fn refused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("ws://{}", addr)
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
