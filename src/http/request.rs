//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Buffer the body within the configured limit
//! - Expose the buffered request through [`RestRequest`]
//!
//! # Design Decisions
//! - The request ID is set before tracing so every span carries it
//! - Bodies are read once, up front; binding never awaits

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Request};
use serde_json::Value;
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::rest::request::{decode_entity, decode_form_field, parse_query};
use crate::rest::{EntityError, RestRequest};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// The request ID set by the request-id layer, if any.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// The body could not be buffered.
#[derive(Debug, Error)]
#[error("request body exceeds {limit} bytes or could not be read: {source}")]
pub struct BodyError {
    pub limit: usize,
    #[source]
    pub source: axum::Error,
}

/// A buffered HTTP request with its extracted path parameters.
#[derive(Debug, Clone)]
pub struct HttpRestRequest {
    path: HashMap<String, String>,
    query: HashMap<String, Vec<String>>,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpRestRequest {
    /// Buffer `request`, reading at most `max_body` bytes of body.
    pub async fn from_request(
        request: Request<Body>,
        path: HashMap<String, String>,
        max_body: usize,
    ) -> Result<Self, BodyError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, max_body)
            .await
            .map_err(|source| BodyError {
                limit: max_body,
                source,
            })?;
        Ok(Self {
            path,
            query: parse_query(parts.uri.query().unwrap_or_default()),
            headers: parts.headers,
            body,
        })
    }

    fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

impl RestRequest for HttpRestRequest {
    fn path_parameter(&self, name: &str) -> String {
        self.path.get(name).cloned().unwrap_or_default()
    }

    fn path_parameters(&self) -> HashMap<String, String> {
        self.path.clone()
    }

    fn query_parameter(&self, name: &str) -> String {
        self.query
            .get(name)
            .and_then(|values| values.first())
            .cloned()
            .unwrap_or_default()
    }

    fn query_parameters(&self, name: &str) -> Vec<String> {
        self.query.get(name).cloned().unwrap_or_default()
    }

    fn body_parameter(&self, name: &str) -> Result<String, EntityError> {
        decode_form_field(&self.body, self.content_type(), name)
    }

    fn header_parameter(&self, name: &str) -> String {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default()
    }

    fn read_entity(&self) -> Result<Value, EntityError> {
        decode_entity(&self.body, self.content_type())
    }
}
