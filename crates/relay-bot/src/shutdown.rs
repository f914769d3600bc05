//! Signal handling and in-flight work draining.

use relay_commands::CommandRelay;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Spawns a task that cancels the returned token on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        () = wait_for_ctrl_c() => {}
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT, shutting down"),
        Err(e) => {
            // Without a handler, never resolve instead of shutting down at once.
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Waits up to `grace` for in-flight readings. Returns whether all finished.
pub async fn drain_relay(relay: &CommandRelay, grace: Duration) -> bool {
    let in_flight = relay.in_flight();
    if in_flight == 0 {
        info!("No readings in flight");
        return true;
    }

    info!(in_flight, "Waiting for in-flight readings to complete");
    if tokio::time::timeout(grace, relay.drain()).await.is_ok() {
        info!("All readings completed");
        true
    } else {
        warn!(
            remaining = relay.in_flight(),
            "Shutdown grace period elapsed, abandoning readings"
        );
        false
    }
}
