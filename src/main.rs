//! REST-to-RPC bridge server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum, request id, trace, timeout)
//!                         │
//!                         ▼
//!                     routing::RouteTable ── 404 / 405
//!                         │
//!                         ▼
//!                     http::route::RouteHandler
//!                         │  registry lookup
//!                         │  binding::ArgumentBinder
//!                         ▼
//!                     invocation::Invoker ──▶ RPC service
//!                         │
//!     Client Response     ▼
//!     ◀────────────── rest::RestResponse (entity | 500)
//! ```
//!
//! Services come from the config file and are served by the echo invoker,
//! which answers every call with the arguments it was bound with.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rest_rpc_bridge::config::watcher::ConfigWatcher;
use rest_rpc_bridge::config::{load_config, BridgeConfig, ServiceConfig};
use rest_rpc_bridge::invocation::echo::EchoInvoker;
use rest_rpc_bridge::invocation::Invoker;
use rest_rpc_bridge::lifecycle::wait_for_signal;
use rest_rpc_bridge::observability::{logging, metrics};
use rest_rpc_bridge::{RestExporter, RestServer, ServiceRegistry};

#[derive(Parser)]
#[command(name = "rest-rpc-bridge", version)]
#[command(about = "Expose RPC service methods as REST routes", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload services when the config file changes
    #[arg(short, long, requires = "config")]
    watch: bool,
}

fn echo_invoker(service: &ServiceConfig) -> Arc<dyn Invoker> {
    Arc::new(EchoInvoker::new(
        service.protocol.clone(),
        service.interface_name.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("rest-rpc-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.listener.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let registry = Arc::new(ServiceRegistry::new());
    let server = RestServer::new(config.clone());
    let exporter = Arc::new(RestExporter::new(server.clone(), registry));
    for service in &config.services {
        exporter.export(echo_invoker(service), service)?;
    }

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            let exporter = exporter.clone();
            let bind_address = config.listener.bind_address.clone();
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    if new_config.listener.bind_address != bind_address {
                        tracing::warn!(
                            bind_address = %new_config.listener.bind_address,
                            "Listener changes need a restart; applying services only"
                        );
                    }
                    let errors = exporter.reload(&new_config, echo_invoker);
                    if !errors.is_empty() {
                        tracing::warn!(failed = errors.len(), "Some services were not exported");
                    }
                }
            });
            Some(watcher)
        }
        _ => None,
    };

    {
        let exporter = exporter.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            exporter.destroy();
        });
    }

    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
