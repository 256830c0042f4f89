//! REST-to-RPC bridge library.
//!
//! Exposes RPC service methods as REST routes: each route binds path, query,
//! header and body parameters of an HTTP request to the positional arguments
//! of the target method, invokes it and writes the result back.

// Binding core
pub mod binding;
pub mod invocation;
pub mod registry;
pub mod rest;

// Transport
pub mod config;
pub mod http;
pub mod protocol;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use binding::{ArgumentBinder, Binding, Convention};
pub use config::{BridgeConfig, MethodConfig, ServiceConfig};
pub use http::{RestServer, RouteHandler};
pub use lifecycle::Shutdown;
pub use protocol::RestExporter;
pub use registry::ServiceRegistry;
