//! Tail a WebSocket feed
//!
//! Loads `TailSettings` (path from the first argument, `TETHER_CONFIG`, or
//! `config/tail.yaml`), connects, replays the configured subscriptions and
//! logs every message until Ctrl+C or `run_for_secs` elapses.

use anyhow::Result;
use std::path::PathBuf;
use tether::{TetherError, WsClient};
use tether_tools::bin_common::{
    init_tracing, load_config_from_env, parse_args, BinaryRunner, ConfigType, PingReplier,
    RunConfig, TailSettings,
};
use tracing::{error, info, warn};

struct TailApp {
    run_config: RunConfig,
    settings: Option<TailSettings>,
    client: Option<WsClient>,
}

impl TailApp {
    fn new(settings: TailSettings) -> Self {
        Self {
            run_config: RunConfig::new("tether-tail").with_run_for(settings.run_for()),
            settings: Some(settings),
            client: None,
        }
    }
}

impl BinaryRunner for TailApp {
    async fn run(&mut self) -> Result<()> {
        let settings = self
            .settings
            .take()
            .ok_or_else(|| anyhow::anyhow!("tail already ran"))?;
        let reply_ping = settings.reply_ping;

        let client = settings
            .into_builder()
            .on_system_error(|err: &TetherError| warn!("[tail] {}", err))
            .shutdown(self.run_config.shutdown())
            .build()?;
        if reply_ping {
            client
                .handlers()
                .set_message_handler(PingReplier::new(client.writer()));
        }
        self.client = Some(client.clone());

        client.connect().await?;
        let receiver = client.spawn_receiver();

        let reason = self.run_config.wait_for_stop().await;
        info!("Stopping: {:?}", reason);

        client.close().await;
        match receiver.await? {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Receive loop failed: {}", e);
                Err(e.into())
            }
        }
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn stats(&self) -> Option<String> {
        self.client.as_ref().map(|client| {
            let metrics = client.metrics();
            format!(
                "received {} / sent {} / reconnects {}",
                metrics.messages_received, metrics.messages_sent, metrics.reconnect_count
            )
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = parse_args()
        .into_iter()
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| load_config_from_env(ConfigType::Tail));
    let settings = TailSettings::load(&config_path)?;

    init_tracing(&settings.log_level);
    info!("Settings: {}", config_path.display());
    settings.log();

    TailApp::new(settings).execute().await
}
