//! Wires configuration, store, gateway and server into a running relay.

use crate::error::{BotError, BotResult};
use crate::lifecycle::AgentLifecycle;
use crate::server::{router, AppState};
use crate::shutdown::{drain_relay, install_signal_handler};
use relay_commands::{
    CommandParser, CommandRelay, CooldownStore, MemoryCooldownStore, RelaySettings,
    SledCooldownStore,
};
use relay_config::{Config, StoreBackend};
use relay_gateway::HttpActionGateway;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Main relay application.
pub struct RelayBot {
    config: Arc<Config>,
    secret: String,
}

impl std::fmt::Debug for RelayBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayBot")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RelayBot {
    /// Creates the application. The webhook secret is fixed here, so the value
    /// registered with the platform is the one checked on every call.
    pub fn new(config: Config) -> Self {
        let secret = config.webhook.resolve_secret();
        Self {
            config: Arc::new(config),
            secret,
        }
    }

    /// Runs until SIGINT or SIGTERM.
    pub async fn run(self) -> BotResult<()> {
        self.run_until(install_signal_handler()).await
    }

    /// Runs until `shutdown` is cancelled, then stops the agent and drains.
    pub async fn run_until(self, shutdown: CancellationToken) -> BotResult<()> {
        let config = &self.config;

        let store = build_store(config)?;
        let gateway = Arc::new(HttpActionGateway::new(
            config.gateway.base_url.clone(),
            config.gateway.timeout(),
        )?);
        info!(
            base_url = gateway.base_url(),
            timeout_secs = config.gateway.timeout_secs,
            "Action gateway client ready"
        );
        let relay = CommandRelay::new(RelaySettings::from_config(config), store.clone(), gateway.clone());
        let parser = CommandParser::new(config.commands.reading_prefix.clone());
        info!(prefix = parser.prefix(), "Relaying reading commands");
        let lifecycle = Arc::new(AgentLifecycle::new(
            config,
            self.secret.clone(),
            gateway.clone(),
            gateway,
        ));

        let address = config.server.bind_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| BotError::Server(format!("failed to bind {address}: {e}")))?;
        info!("Server is listening on {}", address);

        lifecycle.startup().await;

        let sweeper = spawn_sweeper(store, config.cooldown.sweep_interval(), shutdown.clone());
        let app = router(
            &config.server.webhook_path,
            AppState::new(relay.clone(), parser, self.secret.as_str()),
        );

        let stopping = lifecycle.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("Server is shutting down");
                stopping.shutdown().await;
            })
            .await
            .map_err(|e| BotError::Server(format!("server error: {e}")))?;

        drain_relay(&relay, config.server.shutdown_grace()).await;
        sweeper.abort();
        info!("Server closed");
        Ok(())
    }
}

/// Opens the configured cooldown store.
pub fn build_store(config: &Config) -> BotResult<Arc<dyn CooldownStore>> {
    let ttl = config.cooldown.ttl();
    let store: Arc<dyn CooldownStore> = match config.cooldown.backend {
        StoreBackend::Memory => {
            info!("Using in-memory cooldown store");
            Arc::new(MemoryCooldownStore::new(ttl))
        }
        StoreBackend::Sled => Arc::new(SledCooldownStore::open(&config.cooldown.sled_path, ttl)?),
    };
    Ok(store)
}

/// Periodically purges expired cooldown records until `shutdown` fires.
pub fn spawn_sweeper(
    store: Arc<dyn CooldownStore>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => match store.purge_expired().await {
                    Ok(removed) => debug!(removed, "Cooldown sweep finished"),
                    Err(e) => error!("Cooldown sweep failed: {}", e),
                },
            }
        }
    })
}
