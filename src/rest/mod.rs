//! REST request/response capabilities.
//!
//! # Data Flow
//! ```text
//! HTTP transport (axum, or an in-memory stand-in)
//!     → request.rs (RestRequest: path/query/header/body access)
//!     → binder + invocation
//!     → response.rs (RestResponse: entity or error)
//! ```
//!
//! # Design Decisions
//! - Traits, so the binder never depends on a concrete HTTP stack
//! - In-memory implementations ship with the crate for tooling and tests

pub mod request;
pub mod response;

pub use request::{EntityError, MemoryRequest, RestRequest};
pub use response::{MemoryResponse, RestResponse, WriteError, Written};
