//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rest_rpc_bridge::config::{BridgeConfig, ServiceConfig};
use rest_rpc_bridge::invocation::echo::EchoInvoker;
use rest_rpc_bridge::invocation::Invoker;
use rest_rpc_bridge::{RestExporter, RestServer, ServiceRegistry};

/// Start a bridge on `addr` exporting `services`, each through the invoker
/// `make_invoker` returns for it.
pub async fn start_bridge<F>(
    addr: SocketAddr,
    mut config: BridgeConfig,
    services: Vec<ServiceConfig>,
    make_invoker: F,
) -> Arc<RestExporter>
where
    F: Fn(&ServiceConfig) -> Arc<dyn Invoker>,
{
    config.listener.bind_address = addr.to_string();
    let server = RestServer::new(config);
    let exporter = Arc::new(RestExporter::new(
        server.clone(),
        Arc::new(ServiceRegistry::new()),
    ));
    for service in &services {
        exporter
            .export(make_invoker(service), service)
            .expect("export failed");
    }

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    exporter
}

/// Echo invoker for a service.
#[allow(dead_code)]
pub fn echo(service: &ServiceConfig) -> Arc<dyn Invoker> {
    Arc::new(EchoInvoker::new(service.protocol.clone(), service.interface_name.clone()))
}

/// Client without connection pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
