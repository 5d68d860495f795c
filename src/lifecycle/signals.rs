//! OS signal handling.
//!
//! # Signals
//! - SIGTERM / SIGINT (Ctrl-C): trigger graceful shutdown
//! - SIGHUP: reload every platform document, then signal a change
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A failed SIGHUP reload keeps the current tree

use std::sync::Arc;

use crate::environment::reader::SettingsReader;
use crate::environment::store::EnvironmentStore;
use crate::lifecycle::shutdown::Shutdown;

/// Wait for SIGINT or SIGTERM, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: &Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
    shutdown.trigger();
}

/// Reload `store` from `reader` on every SIGHUP until shutdown.
#[cfg(unix)]
pub async fn reload_on_hangup(
    store: Arc<EnvironmentStore>,
    reader: Arc<dyn SettingsReader>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::error!("Failed to listen for SIGHUP: {}", e);
            return;
        }
    };

    loop {
        tokio::select! {
            received = hangup.recv() => {
                if received.is_none() {
                    return;
                }
                tracing::info!("Received SIGHUP, reloading platform documents");
                if let Err(e) = store.reload(reader.as_ref()) {
                    tracing::error!("Failed to reload platform documents: {}. Keeping current configuration.", e);
                }
            }
            _ = shutdown.recv() => return,
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_hangup(
    _store: Arc<EnvironmentStore>,
    _reader: Arc<dyn SettingsReader>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let _ = shutdown.recv().await;
}
