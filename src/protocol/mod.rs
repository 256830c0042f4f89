//! Protocol layer: exporting services as REST routes.
//!
//! # Data Flow
//! ```text
//! ServiceConfig + Invoker
//!     → exporter.rs (register descriptor, one RouteHandler per method)
//!     → RestServer::deploy
//!
//! Config reload:
//!     new BridgeConfig → unexport every service → export the new set
//! ```

pub mod exporter;

pub use exporter::{ExportError, RestExporter};
