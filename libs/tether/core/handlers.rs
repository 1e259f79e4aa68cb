use crate::traits::*;
use parking_lot::RwLock;
use std::sync::Arc;

/// The four behaviours invoked by the client
///
/// Each slot holds an `Arc` that is swapped atomically. Callers clone the
/// `Arc` out of the slot and release the lock before invoking it, so a
/// replacement never waits on a running handler and a running handler always
/// finishes with the implementation it started with.
pub struct HandlerSet {
    message: RwLock<Arc<dyn MessageHandler>>,
    decompressor: RwLock<Arc<dyn Decompressor>>,
    reporter: RwLock<Arc<dyn ErrorReporter>>,
    connect_hook: RwLock<Arc<dyn ConnectHook>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self {
            message: RwLock::new(Arc::new(LogMessages)),
            decompressor: RwLock::new(Arc::new(GzipDecompressor)),
            reporter: RwLock::new(Arc::new(LogErrors)),
            connect_hook: RwLock::new(Arc::new(LogConnect)),
        }
    }

    pub fn set_message_handler(&self, handler: impl MessageHandler) {
        *self.message.write() = Arc::new(handler);
    }

    pub fn set_decompressor(&self, decompressor: impl Decompressor) {
        *self.decompressor.write() = Arc::new(decompressor);
    }

    pub fn set_error_reporter(&self, reporter: impl ErrorReporter) {
        *self.reporter.write() = Arc::new(reporter);
    }

    pub fn set_connect_hook(&self, hook: impl ConnectHook) {
        *self.connect_hook.write() = Arc::new(hook);
    }

    pub(crate) fn replace_message_handler(&self, handler: Arc<dyn MessageHandler>) {
        *self.message.write() = handler;
    }

    pub(crate) fn replace_decompressor(&self, decompressor: Arc<dyn Decompressor>) {
        *self.decompressor.write() = decompressor;
    }

    pub(crate) fn replace_error_reporter(&self, reporter: Arc<dyn ErrorReporter>) {
        *self.reporter.write() = reporter;
    }

    pub(crate) fn replace_connect_hook(&self, hook: Arc<dyn ConnectHook>) {
        *self.connect_hook.write() = hook;
    }

    pub async fn on_message(&self, payload: &[u8]) -> Result<()> {
        let handler = Arc::clone(&*self.message.read());
        handler.on_message(payload).await
    }

    pub fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let decompressor = Arc::clone(&*self.decompressor.read());
        decompressor.decompress(raw)
    }

    pub fn report(&self, error: &TetherError) {
        let reporter = Arc::clone(&*self.reporter.read());
        reporter.on_system_error(error);
    }

    pub async fn after_connect(&self) -> Result<()> {
        let hook = Arc::clone(&*self.connect_hook.read());
        hook.after_connect().await
    }
}

impl Default for HandlerSet {
    fn default() -> Self {
        Self::new()
    }
}
