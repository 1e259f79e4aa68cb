use crate::traits::{Headers, ReconnectPolicy};
use std::time::Duration;

/// Transport-level dial settings
///
/// `None` keeps the transport library's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialerConfig {
    /// Upper bound on TCP connect + WebSocket upgrade
    pub handshake_timeout: Option<Duration>,
    /// Largest accepted message
    pub max_message_size: Option<usize>,
    /// Largest accepted single frame
    pub max_frame_size: Option<usize>,
    /// Set TCP_NODELAY on the socket
    pub disable_nagle: bool,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Some(Duration::from_secs(45)),
            max_message_size: None,
            max_frame_size: None,
            disable_nagle: false,
        }
    }
}

/// Frozen client configuration
///
/// Produced by `ClientBuilder::build()` and shared read-only by the client
/// for its whole life. There are no mutators.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL (wss:// or ws://)
    pub(crate) url: String,

    /// Headers sent with every upgrade request
    pub(crate) headers: Headers,

    /// Payloads replayed as text frames after every successful connect
    pub(crate) subscriptions: Vec<String>,

    /// Log handshake responses
    pub(crate) dump: bool,

    /// Reconnect when a read fails; when false the receive loop stops instead
    pub(crate) auto_reconnect: bool,

    /// Rolling idle timeout; zero disables it
    pub(crate) read_deadline: Duration,

    /// Attempts and interval for one reconnect
    pub(crate) reconnect: ReconnectPolicy,

    /// Delay between closing the handle and firing the shutdown signal
    pub(crate) close_grace: Duration,

    pub(crate) dialer: DialerConfig,
}

impl ClientConfig {
    /// Get a reference to the URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn is_dump(&self) -> bool {
        self.dump
    }

    pub fn is_auto_reconnect(&self) -> bool {
        self.auto_reconnect
    }

    /// Zero when read deadlines are disabled
    pub fn read_deadline(&self) -> Duration {
        self.read_deadline
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.reconnect
    }

    pub fn reconnect_count(&self) -> usize {
        self.reconnect.max_attempts()
    }

    pub fn reconnect_interval(&self) -> Duration {
        self.reconnect.interval()
    }

    pub fn close_grace(&self) -> Duration {
        self.close_grace
    }

    pub fn dialer(&self) -> &DialerConfig {
        &self.dialer
    }

    /// Get the number of configured subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}
