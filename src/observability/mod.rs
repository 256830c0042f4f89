//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Route handlers and the server produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout via the fmt layer
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the trace span of every request
//! - Recording a metric without an installed recorder is a no-op

pub mod logging;
pub mod metrics;
