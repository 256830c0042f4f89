//! Service export over REST.
//!
//! # Responsibilities
//! - Register the descriptor of services that declare signatures
//! - Deploy one route per method config
//! - Undeploy everything a service deployed
//! - Swap the whole export set on config reload

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::binding::ParseArgTypeError;
use crate::config::{BridgeConfig, MethodConfig, ServiceConfig};
use crate::http::{RestServer, RouteHandler};
use crate::invocation::{Invoker, ServiceUrl};
use crate::registry::{ServiceDescriptor, ServiceRegistry};
use crate::routing::DeployError;

/// Errors exporting a service.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("service `{service}` declares an invalid signature: {source}")]
    Signature {
        service: String,
        #[source]
        source: ParseArgTypeError,
    },

    #[error("failed to deploy {method}: {source}")]
    Deploy {
        method: String,
        #[source]
        source: DeployError,
    },
}

struct ExportedService {
    url: ServiceUrl,
    methods: Vec<Arc<MethodConfig>>,
    registered: bool,
}

/// Exports services onto a [`RestServer`].
pub struct RestExporter {
    server: RestServer,
    registry: Arc<ServiceRegistry>,
    exported: DashMap<String, ExportedService>,
}

impl RestExporter {
    pub fn new(server: RestServer, registry: Arc<ServiceRegistry>) -> Self {
        Self {
            server,
            registry,
            exported: DashMap::new(),
        }
    }

    pub fn server(&self) -> &RestServer {
        &self.server
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Names of the exported services.
    pub fn exported(&self) -> Vec<String> {
        let mut names: Vec<String> = self.exported.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Export every method of `service` through `invoker`.
    ///
    /// Re-exporting a service first removes its previous routes. On failure
    /// nothing from this call stays deployed.
    pub fn export(&self, invoker: Arc<dyn Invoker>, service: &ServiceConfig) -> Result<usize, ExportError> {
        self.unexport(service);

        let url = invoker.url().clone();
        let registered = service.methods.iter().any(|m| m.signature.is_some());
        if registered {
            let descriptor =
                ServiceDescriptor::from_config(service).map_err(|source| ExportError::Signature {
                    service: service.interface_name.clone(),
                    source,
                })?;
            self.registry.register(&url.protocol, &url.path, descriptor);
        }

        let mut deployed: Vec<Arc<MethodConfig>> = Vec::new();
        for method in service.method_configs() {
            let config = Arc::new(method);
            let handler = Arc::new(RouteHandler::new(
                invoker.clone(),
                self.registry.clone(),
                config.clone(),
            ));
            if let Err(source) = self.server.deploy(config.clone(), handler) {
                for done in &deployed {
                    self.server.undeploy(done);
                }
                if registered {
                    self.registry.unregister(&url.protocol, &url.path);
                }
                return Err(ExportError::Deploy {
                    method: format!("{}.{}", service.interface_name, config.method_name),
                    source,
                });
            }
            deployed.push(config);
        }

        let count = deployed.len();
        tracing::info!(service = %url, methods = count, "Service exported");
        self.exported.insert(
            service.interface_name.clone(),
            ExportedService {
                url,
                methods: deployed,
                registered,
            },
        );
        Ok(count)
    }

    /// Remove the routes of a previously exported service.
    pub fn unexport(&self, service: &ServiceConfig) -> bool {
        let Some((_, exported)) = self.exported.remove(&service.interface_name) else {
            return false;
        };
        for method in &exported.methods {
            self.server.undeploy(method);
        }
        if exported.registered {
            self.registry.unregister(&exported.url.protocol, &exported.url.path);
        }
        tracing::info!(service = %exported.url, "Service unexported");
        true
    }

    /// Replace the exported set with the services of `config`.
    ///
    /// Every service is unexported first, then each new one is exported with
    /// the invoker `make_invoker` builds for it. Services that fail to export
    /// are logged and skipped so one bad entry does not take down the rest.
    pub fn reload<F>(&self, config: &BridgeConfig, make_invoker: F) -> Vec<ExportError>
    where
        F: Fn(&ServiceConfig) -> Arc<dyn Invoker>,
    {
        let names: Vec<String> = self.exported.iter().map(|e| e.key().clone()).collect();
        for name in names {
            self.unexport(&ServiceConfig::new(name));
        }

        let mut errors = Vec::new();
        for service in &config.services {
            if let Err(e) = self.export(make_invoker(service), service) {
                tracing::error!(service = %service.interface_name, error = %e, "Service export failed");
                errors.push(e);
            }
        }
        tracing::info!(
            services = self.exported.len(),
            routes = self.server.routes().len(),
            "Services reloaded"
        );
        errors
    }

    /// Unexport everything and stop the server.
    pub fn destroy(&self) {
        let names: Vec<String> = self.exported.iter().map(|e| e.key().clone()).collect();
        for name in names {
            self.unexport(&ServiceConfig::new(name));
        }
        self.server.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::echo::EchoInvoker;
    use axum::http::Method;

    fn user_service() -> ServiceConfig {
        ServiceConfig::new("UserProvider")
            .with_path("/users")
            .with_method(
                MethodConfig::new("GetUser")
                    .with_path("/{id}")
                    .with_path_param(0, "id")
                    .with_signature(["string"]),
            )
            .with_method(
                MethodConfig::new("CreateUser")
                    .with_method_type("POST")
                    .with_body(0)
                    .with_signature(["object"]),
            )
    }

    fn exporter() -> RestExporter {
        RestExporter::new(
            RestServer::new(BridgeConfig::default()),
            Arc::new(ServiceRegistry::new()),
        )
    }

    fn echo(service: &ServiceConfig) -> Arc<dyn Invoker> {
        Arc::new(EchoInvoker::new(service.protocol.clone(), service.interface_name.clone()))
    }

    #[test]
    fn test_export_deploys_and_registers() {
        let exporter = exporter();
        let service = user_service();
        assert_eq!(exporter.export(echo(&service), &service).unwrap(), 2);

        let routes = exporter.server().routes();
        assert_eq!(routes.len(), 2);
        assert!(matches!(
            routes.match_request(&Method::GET, "/users/7"),
            crate::routing::RouteMatch::Found { .. }
        ));
        assert!(matches!(
            routes.match_request(&Method::POST, "/users"),
            crate::routing::RouteMatch::Found { .. }
        ));

        let descriptor = exporter.registry().resolve("rest", "UserProvider").unwrap();
        assert_eq!(descriptor.methods().len(), 2);

        assert!(exporter.unexport(&service));
        assert!(routes.is_empty());
        assert!(exporter.registry().is_empty());
        assert!(!exporter.unexport(&service));
    }

    #[test]
    fn test_failed_export_rolls_back() {
        let exporter = exporter();
        let service = ServiceConfig::new("Broken")
            .with_method(MethodConfig::new("Ok").with_path("/ok"))
            .with_method(MethodConfig::new("Bad").with_path("no-slash"));

        let err = exporter.export(echo(&service), &service).unwrap_err();
        assert!(matches!(err, ExportError::Deploy { .. }));
        assert!(exporter.server().routes().is_empty());
        assert!(exporter.exported().is_empty());
    }

    #[test]
    fn test_reload_swaps_services() {
        let exporter = exporter();
        let service = user_service();
        exporter.export(echo(&service), &service).unwrap();

        let mut next = BridgeConfig::default();
        next.services.push(
            ServiceConfig::new("OrderProvider")
                .with_path("/orders")
                .with_method(MethodConfig::new("List").with_signature(["[]any"])),
        );
        let errors = exporter.reload(&next, echo);
        assert!(errors.is_empty());
        assert_eq!(exporter.exported(), vec!["OrderProvider".to_string()]);
        assert_eq!(exporter.server().routes().len(), 1);
        assert!(exporter.registry().resolve("rest", "UserProvider").is_none());
        assert!(exporter.registry().resolve("rest", "OrderProvider").is_some());
    }
}
