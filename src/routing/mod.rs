//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup over the current snapshot)
//!     → matcher.rs (template match, path param extraction)
//!     → Return: Found(route, params) | MethodNotAllowed | NotFound
//!
//! Deployment (startup and config reload):
//!     MethodConfig + RouteHandler
//!     → compile PathTemplate
//!     → swap in a new route snapshot
//! ```
//!
//! # Design Decisions
//! - Routes can be deployed and undeployed while serving
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::PathTemplate;
pub use router::{DeployError, Route, RouteMatch, RouteTable};
