//! The per-method route function.
//!
//! # Data Flow
//! ```text
//! RestRequest
//!     → resolve service + method in the registry
//!     → ArgumentBinder::bind (diagnostics logged, never fatal)
//!     → Invoker::invoke
//!     → RestResponse::write_entity | write_error(500)
//! ```

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::binding::ArgumentBinder;
use crate::config::MethodConfig;
use crate::invocation::{Invoker, RpcInvocation};
use crate::observability::metrics;
use crate::registry::ServiceRegistry;
use crate::rest::{RestRequest, RestResponse};

/// The route's target could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("service {protocol}://{path} is not registered")]
    UnknownService { protocol: String, path: String },

    #[error("service {service} has no method {method}")]
    UnknownMethod { service: String, method: String },
}

/// Serves one exported method.
///
/// Built once per route from the invoker, the registry and the method's
/// config, then shared by every request routed to it.
pub struct RouteHandler {
    invoker: Arc<dyn Invoker>,
    registry: Arc<ServiceRegistry>,
    config: Arc<MethodConfig>,
}

impl RouteHandler {
    pub fn new(
        invoker: Arc<dyn Invoker>,
        registry: Arc<ServiceRegistry>,
        config: Arc<MethodConfig>,
    ) -> Self {
        Self {
            invoker,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &MethodConfig {
        &self.config
    }

    /// Bind, invoke and write the outcome.
    pub async fn handle(&self, request: &dyn RestRequest, response: &mut dyn RestResponse) {
        let method_name = self.config.method_name.as_str();

        let invocation = match self.bind(request) {
            Ok(invocation) => invocation,
            Err(e) => {
                tracing::error!(method = method_name, error = %e, "Route target unresolved");
                write_error(response, StatusCode::INTERNAL_SERVER_ERROR, &e);
                return;
            }
        };

        match self.invoker.invoke(invocation).await {
            Ok(result) => {
                metrics::record_invocation(method_name, "ok");
                if let Err(e) = response.write_entity(&result) {
                    tracing::error!(method = method_name, error = %e, "Failed to write response entity");
                }
            }
            Err(e) => {
                metrics::record_invocation(method_name, "error");
                tracing::warn!(method = method_name, error = %e, "Invocation failed");
                write_error(response, StatusCode::INTERNAL_SERVER_ERROR, &e);
            }
        }
    }

    fn bind(&self, request: &dyn RestRequest) -> Result<RpcInvocation, RouteError> {
        let url = self.invoker.url();
        let service = self
            .registry
            .resolve(&url.protocol, &url.path)
            .ok_or_else(|| RouteError::UnknownService {
                protocol: url.protocol.clone(),
                path: url.path.trim_start_matches('/').to_string(),
            })?;
        let method = service
            .method(&self.config.method_name)
            .ok_or_else(|| RouteError::UnknownMethod {
                service: service.name.clone(),
                method: self.config.method_name.clone(),
            })?;

        let binding = ArgumentBinder::new(&self.config, method).bind(request);
        for diagnostic in &binding.diagnostics {
            tracing::warn!(
                method = %self.config.method_name,
                origin = %diagnostic.origin(),
                error = %diagnostic,
                "Argument binding failed"
            );
            metrics::record_binding_diagnostic(diagnostic.origin());
        }
        tracing::debug!(
            method = %self.config.method_name,
            convention = ?binding.convention,
            args = binding.args.len(),
            "Arguments bound"
        );

        Ok(RpcInvocation::new(self.config.method_name.clone(), binding.args))
    }
}

fn write_error(response: &mut dyn RestResponse, status: StatusCode, err: &dyn std::error::Error) {
    if let Err(e) = response.write_error(status, err) {
        tracing::error!(status = %status, error = %e, "Failed to write error response");
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("service", &self.invoker.url().to_string())
            .field("method", &self.config.method_name)
            .finish()
    }
}
