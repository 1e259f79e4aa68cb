//! Lifecycle for the tether binaries
//!
//! A binary owns one `RunConfig`, which carries the `Shutdown` its clients
//! are built with. `execute` installs the Ctrl+C handler, runs the app and
//! logs how long it ran along with its stats.

use std::time::Duration;
use tether::Shutdown;
use tokio::time::Instant;
use tracing::info;

/// Why a binary stopped waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured run time elapsed
    Elapsed,
    /// The shutdown signal fired (Ctrl+C or a closed client)
    Signalled,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub name: String,
    /// Stop after this long instead of waiting for Ctrl+C
    pub run_for: Option<Duration>,
    shutdown: Shutdown,
}

impl RunConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_for: None,
            shutdown: Shutdown::new(),
        }
    }

    pub fn with_run_for(mut self, run_for: Option<Duration>) -> Self {
        self.run_for = run_for;
        self
    }

    /// Signal shared with every client the binary builds
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Block until the run time elapses or the signal fires
    pub async fn wait_for_stop(&self) -> StopReason {
        if let Some(run_for) = self.run_for {
            if self.shutdown.interruptible_sleep(run_for).await {
                info!("Run time of {:?} elapsed", run_for);
                return StopReason::Elapsed;
            }
        }
        self.shutdown.cancelled().await;
        StopReason::Signalled
    }
}

pub trait BinaryRunner {
    async fn run(&mut self) -> anyhow::Result<()>;

    fn config(&self) -> &RunConfig;

    /// One-line summary logged on exit
    fn stats(&self) -> Option<String> {
        None
    }

    /// Install the Ctrl+C handler, run, and log the outcome
    async fn execute(&mut self) -> anyhow::Result<()> {
        let started = Instant::now();
        {
            let config = self.config();
            config.shutdown.spawn_signal_handler();
            match config.run_for {
                Some(run_for) => info!("Starting {} for {:?}", config.name, run_for),
                None => info!("Starting {} (Ctrl+C to stop)", config.name),
            }
        }

        let result = self.run().await;

        let name = &self.config().name;
        match self.stats() {
            Some(stats) => info!("{} stopped after {:?}: {}", name, started.elapsed(), stats),
            None => info!("{} stopped after {:?}", name, started.elapsed()),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_builder() {
        let config = RunConfig::new("tether-tail").with_run_for(Some(Duration::from_secs(5)));
        assert_eq!(config.name, "tether-tail");
        assert_eq!(config.run_for, Some(Duration::from_secs(5)));
        assert!(config.shutdown().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_stop_after_run_time() {
        let config = RunConfig::new("tail").with_run_for(Some(Duration::from_secs(30)));
        let started = Instant::now();

        assert_eq!(config.wait_for_stop().await, StopReason::Elapsed);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_stop_on_signal() {
        let config = RunConfig::new("tail").with_run_for(Some(Duration::from_secs(30)));
        let shutdown = config.shutdown();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            shutdown.cancel();
        });

        assert_eq!(config.wait_for_stop().await, StopReason::Signalled);

        // Without a run time only the signal ends the wait
        let config = RunConfig::new("tail");
        config.shutdown().cancel();
        assert_eq!(config.wait_for_stop().await, StopReason::Signalled);
    }
}
