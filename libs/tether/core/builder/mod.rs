pub mod states;

use crate::core::client::WsClient;
use crate::core::config::{ClientConfig, DialerConfig};
use crate::core::handlers::HandlerSet;
use crate::core::shutdown::Shutdown;
use crate::core::tungstenite::TungsteniteDialer;
use crate::traits::*;
use states::*;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for `WsClient`
///
/// The URL must be set before `build()` is available. Everything else has a
/// default:
///
/// | setting | default |
/// |---|---|
/// | reconnect count | 100 |
/// | reconnect interval | 1 s |
/// | auto reconnect | on |
/// | read deadline | off |
/// | close grace | 1 s |
/// | handshake timeout | 45 s |
pub struct ClientBuilder<U: UrlState> {
    _state: PhantomData<U>,
    url: Option<String>,
    headers: Headers,
    subscriptions: Vec<String>,
    dump: bool,
    auto_reconnect: bool,
    read_deadline: Duration,
    reconnect_count: usize,
    reconnect_interval: Duration,
    close_grace: Duration,
    dialer_config: DialerConfig,
    dialer: Option<Arc<dyn Dialer>>,
    message_handler: Option<Arc<dyn MessageHandler>>,
    decompressor: Option<Arc<dyn Decompressor>>,
    error_reporter: Option<Arc<dyn ErrorReporter>>,
    connect_hook: Option<Arc<dyn ConnectHook>>,
    shutdown: Option<Shutdown>,
}

impl ClientBuilder<NoUrl> {
    /// Create a new builder instance
    pub fn new() -> Self {
        let policy = ReconnectPolicy::default();
        Self {
            _state: PhantomData,
            url: None,
            headers: Vec::new(),
            subscriptions: Vec::new(),
            dump: false,
            auto_reconnect: true,
            read_deadline: Duration::ZERO,
            reconnect_count: policy.max_attempts(),
            reconnect_interval: policy.interval(),
            close_grace: Duration::from_secs(1),
            dialer_config: DialerConfig::default(),
            dialer: None,
            message_handler: None,
            decompressor: None,
            error_reporter: None,
            connect_hook: None,
            shutdown: None,
        }
    }

    pub fn url(self, url: impl Into<String>) -> ClientBuilder<HasUrl> {
        ClientBuilder {
            _state: PhantomData,
            url: Some(url.into()),
            headers: self.headers,
            subscriptions: self.subscriptions,
            dump: self.dump,
            auto_reconnect: self.auto_reconnect,
            read_deadline: self.read_deadline,
            reconnect_count: self.reconnect_count,
            reconnect_interval: self.reconnect_interval,
            close_grace: self.close_grace,
            dialer_config: self.dialer_config,
            dialer: self.dialer,
            message_handler: self.message_handler,
            decompressor: self.decompressor,
            error_reporter: self.error_reporter,
            connect_hook: self.connect_hook,
            shutdown: self.shutdown,
        }
    }
}

impl Default for ClientBuilder<NoUrl> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: UrlState> ClientBuilder<U> {
    /// Append one upgrade-request header; repeated names are all sent
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a payload to replay after every successful connect
    pub fn subscription(mut self, payload: impl Into<String>) -> Self {
        self.subscriptions.push(payload.into());
        self
    }

    pub fn subscriptions<I, S>(mut self, payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscriptions
            .extend(payloads.into_iter().map(Into::into));
        self
    }

    /// Log handshake responses
    pub fn dump(mut self) -> Self {
        self.dump = true;
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Rolling idle timeout, renewed on every received frame; zero disables it
    pub fn read_deadline(mut self, deadline: Duration) -> Self {
        self.read_deadline = deadline;
        self
    }

    /// Dial attempts per reconnect; must be positive
    pub fn reconnect_count(mut self, count: usize) -> Self {
        self.reconnect_count = count;
        self
    }

    /// Sleep before every reconnect attempt, including the first
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Delay between closing the handle and firing the shutdown signal
    pub fn close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    /// Settings for the default `tokio-tungstenite` dialer
    pub fn dialer_config(mut self, config: DialerConfig) -> Self {
        self.dialer_config = config;
        self
    }

    /// Replace the transport entirely; `dialer_config` is then ignored
    pub fn dialer(mut self, dialer: impl Dialer) -> Self {
        self.dialer = Some(Arc::new(dialer));
        self
    }

    pub fn on_message(mut self, handler: impl MessageHandler) -> Self {
        self.message_handler = Some(Arc::new(handler));
        self
    }

    pub fn decompressor(mut self, decompressor: impl Decompressor) -> Self {
        self.decompressor = Some(Arc::new(decompressor));
        self
    }

    pub fn on_system_error(mut self, reporter: impl ErrorReporter) -> Self {
        self.error_reporter = Some(Arc::new(reporter));
        self
    }

    pub fn after_connect(mut self, hook: impl ConnectHook) -> Self {
        self.connect_hook = Some(Arc::new(hook));
        self
    }

    /// Bind the client to an existing shutdown signal
    ///
    /// Without one the client creates its own, reachable via
    /// `WsClient::shutdown()`.
    pub fn shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }
}

impl ClientBuilder<HasUrl> {
    /// Validate the settings and create the client
    ///
    /// Nothing is dialed until `connect()`.
    pub fn build(self) -> Result<WsClient> {
        let url = self.url.unwrap_or_default();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TetherError::Configuration(format!(
                "URL must start with ws:// or wss://, got '{}'",
                url
            )));
        }
        if self.reconnect_count == 0 {
            return Err(TetherError::Configuration(
                "reconnect count must be positive".into(),
            ));
        }

        let dialer = self.dialer.unwrap_or_else(|| {
            Arc::new(TungsteniteDialer::new(self.dialer_config.clone())) as Arc<dyn Dialer>
        });

        let handlers = HandlerSet::new();
        if let Some(handler) = self.message_handler {
            handlers.replace_message_handler(handler);
        }
        if let Some(decompressor) = self.decompressor {
            handlers.replace_decompressor(decompressor);
        }
        if let Some(reporter) = self.error_reporter {
            handlers.replace_error_reporter(reporter);
        }
        if let Some(hook) = self.connect_hook {
            handlers.replace_connect_hook(hook);
        }

        let config = ClientConfig {
            url,
            headers: self.headers,
            subscriptions: self.subscriptions,
            dump: self.dump,
            auto_reconnect: self.auto_reconnect,
            read_deadline: self.read_deadline,
            reconnect: ReconnectPolicy::new(self.reconnect_interval, self.reconnect_count),
            close_grace: self.close_grace,
            dialer: self.dialer_config,
        };

        Ok(WsClient::new(
            config,
            handlers,
            dialer,
            self.shutdown.unwrap_or_default(),
        ))
    }
}
