//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router with a single catch-all dispatcher
//! - Wire up middleware (request ID, tracing, timeout)
//! - Deploy / undeploy routes while serving
//! - Bind to a listener and shut down gracefully

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{BridgeConfig, MethodConfig};
use crate::http::request::{request_id, HttpRestRequest, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::HttpRestResponse;
use crate::http::route::RouteHandler;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{DeployError, RouteMatch, RouteTable};

/// Application state injected into the dispatcher.
#[derive(Clone)]
struct AppState {
    routes: Arc<RouteTable>,
    max_body_size: usize,
}

/// REST server exporting RPC methods.
///
/// Cheap to clone; clones share the route table and the shutdown trigger, so
/// routes can be deployed from another task while [`RestServer::run`] is
/// serving.
#[derive(Clone)]
pub struct RestServer {
    routes: Arc<RouteTable>,
    shutdown: Arc<Shutdown>,
    config: Arc<BridgeConfig>,
}

impl RestServer {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            routes: Arc::new(RouteTable::new()),
            shutdown: Arc::new(Shutdown::new()),
            config: Arc::new(config),
        }
    }

    /// Serve `handler` at the config's method and path.
    pub fn deploy(
        &self,
        config: Arc<MethodConfig>,
        handler: Arc<RouteHandler>,
    ) -> Result<(), DeployError> {
        self.routes.deploy(config, handler)
    }

    /// Stop serving the route for `config`.
    pub fn undeploy(&self, config: &MethodConfig) -> bool {
        self.routes.undeploy(config)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn shutdown(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    /// Remove every route and stop the server.
    pub fn destroy(&self) {
        self.routes.clear();
        self.shutdown.trigger();
        tracing::info!("REST server destroyed");
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(&self) -> Router {
        let state = AppState {
            routes: self.routes.clone(),
            max_body_size: self.config.listener.max_body_size,
        };
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(x_request_id))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        self.config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server until [`RestServer::destroy`] is called.
    pub async fn run(&self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.routes.len(), "REST server starting");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("REST server stopped");
        Ok(())
    }
}

/// Catch-all handler: match the route table, buffer the request, delegate.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id(&request).to_string();

    let response = match state.routes.match_request(&method, &path) {
        RouteMatch::Found { route, params } => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                target = %route.config.method_name,
                "Dispatching request"
            );
            match HttpRestRequest::from_request(request, params, state.max_body_size).await {
                Ok(rest_request) => {
                    let mut rest_response = HttpRestResponse::new();
                    route.handler.handle(&rest_request, &mut rest_response).await;
                    rest_response.into_response()
                }
                Err(e) => {
                    tracing::warn!(request_id = %request_id, error = %e, "Request body rejected");
                    (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response()
                }
            }
        }
        RouteMatch::MethodNotAllowed => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "Method not allowed");
            (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
        }
        RouteMatch::NotFound => {
            tracing::debug!(request_id = %request_id, path = %path, "No route matched");
            (StatusCode::NOT_FOUND, "No matching route found").into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}
