//! vcap-bindings
//!
//! Ingests the platform environment, prints the flattened configuration
//! tree and the resolved PostgreSQL bindings, and optionally keeps running
//! to report every rebuild after a document changes.
//!
//! # Architecture Overview
//!
//! ```text
//!   VCAP_APPLICATION ─┐
//!   VCAP_SERVICES ────┼─▶ reader ─▶ snapshot ─▶ merge/flatten ─▶ store ──▶ ChangeBus
//!   settings file ────┘                                           │            │
//!          ▲                                                      ▼            ▼
//!     file watcher / SIGHUP                              ConnectorFactory ◀── generation
//!                                                                 │
//!                                                                 ▼
//!                                                        Arc<PostgresOptions>
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;

use vcap_bindings::config::{load_config, HostConfig};
use vcap_bindings::connectors::{ConnectorFactory, PostgresBinder};
use vcap_bindings::lifecycle::signals::{reload_on_hangup, shutdown_on_signal};
use vcap_bindings::lifecycle::{BindingsHost, Shutdown};
use vcap_bindings::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "vcap-bindings")]
#[command(about = "Flatten platform service bindings and keep connector options live", long_about = None)]
struct Cli {
    /// Host configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application document file (instead of VCAP_APPLICATION).
    #[arg(long)]
    application: Option<PathBuf>,

    /// Service bindings document file (instead of VCAP_SERVICES).
    #[arg(long)]
    services: Option<PathBuf>,

    /// Local settings document file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Keep running and reload when document files change.
    #[arg(short, long)]
    watch: bool,

    /// Print every flattened key.
    #[arg(long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!("vcap-bindings v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let host = match BindingsHost::start(&config) {
        Ok(host) => host,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.dump {
        for (key, value) in host.store.current().values() {
            println!("{key}={value}");
        }
    }
    report(&host.postgres);

    if !config.watch.enabled {
        return ExitCode::SUCCESS;
    }

    let shutdown = Shutdown::new();
    tokio::spawn(reload_on_hangup(
        host.store.clone(),
        host.reader.clone(),
        shutdown.subscribe(),
    ));

    let mut changes = host.bus.subscribe();
    let signals = shutdown_on_signal(&shutdown);
    tokio::pin!(signals);

    loop {
        tokio::select! {
            changed = changes.changed() => match changed {
                Some(generation) => {
                    tracing::info!(generation, "Platform documents changed");
                    report(&host.postgres);
                }
                None => break,
            },
            _ = &mut signals => break,
        }
    }

    host.bus.unsubscribe(changes);
    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

fn resolve_config(cli: &Cli) -> Result<HostConfig, vcap_bindings::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };
    if let Some(path) = &cli.application {
        config.sources.application_path = Some(path.clone());
    }
    if let Some(path) = &cli.services {
        config.sources.services_path = Some(path.clone());
    }
    if let Some(path) = &cli.settings {
        config.sources.settings_path = Some(path.clone());
    }
    if cli.watch {
        config.watch.enabled = true;
    }
    vcap_bindings::config::validation::validate_config(&config)
        .map_err(vcap_bindings::config::ConfigError::Validation)?;
    Ok(config)
}

fn report(factory: &ConnectorFactory<PostgresBinder>) {
    let ambiguous = factory.ambiguous_binding_names();
    if !ambiguous.is_empty() {
        tracing::warn!(bindings = ?ambiguous, "Binding names bound under several PostgreSQL service types; skipping");
    }
    for name in factory.service_binding_names() {
        if ambiguous.contains(&name) {
            continue;
        }
        match factory.get(&name) {
            Ok(options) => tracing::info!(
                binding = %name,
                host = %options.host,
                port = ?options.port,
                database = ?options.database,
                "PostgreSQL binding resolved"
            ),
            Err(e) => tracing::warn!(binding = %name, "PostgreSQL binding unavailable: {}", e),
        }
    }
}
