//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware, catch-all dispatch)
//!     → routing::RouteTable (method + path template)
//!     → request.rs (buffer body, expose RestRequest)
//!     → route.rs (bind arguments, invoke)
//!     → response.rs (entity or error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod route;
pub mod server;

pub use request::{HttpRestRequest, MakeRequestUuid, X_REQUEST_ID};
pub use response::HttpRestResponse;
pub use route::{RouteError, RouteHandler};
pub use server::RestServer;
