//! Read access to an incoming REST request.
//!
//! # Responsibilities
//! - Expose path, query and header parameters by name
//! - Decode the request body (JSON entity or form fields)
//!
//! # Design Decisions
//! - Missing parameters read as empty strings, as HTTP routers report them
//! - The body is already buffered; reads never block
//! - Header names are case-insensitive

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Errors reading the request body.
#[derive(Debug, Error)]
pub enum EntityError {
    /// No body was sent.
    #[error("request body is empty")]
    EmptyBody,

    /// The body's content type cannot be decoded here.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The body is not valid for the expected encoding.
    #[error("malformed entity: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Request-side capability consumed by the binder.
pub trait RestRequest: Send + Sync {
    /// Value of a path parameter, empty if absent.
    fn path_parameter(&self, name: &str) -> String;

    /// All path parameters.
    fn path_parameters(&self) -> HashMap<String, String>;

    /// First value of a query parameter, empty if absent.
    fn query_parameter(&self, name: &str) -> String;

    /// Every value of a query parameter in request order.
    fn query_parameters(&self, name: &str) -> Vec<String>;

    /// A field of a form-encoded body.
    fn body_parameter(&self, name: &str) -> Result<String, EntityError>;

    /// First value of a header, empty if absent.
    fn header_parameter(&self, name: &str) -> String;

    /// Decode the body as a JSON entity.
    fn read_entity(&self) -> Result<Value, EntityError>;
}

/// Decode a buffered body as JSON, honouring the declared content type.
pub(crate) fn decode_entity(body: &[u8], content_type: Option<&str>) -> Result<Value, EntityError> {
    if let Some(ct) = content_type {
        let essence = media_essence(ct);
        if essence != JSON && !essence.ends_with("+json") && essence != "*/*" {
            return Err(EntityError::UnsupportedMediaType(essence));
        }
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(EntityError::EmptyBody);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Look up one field of a form-encoded body.
pub(crate) fn decode_form_field(
    body: &[u8],
    content_type: Option<&str>,
    name: &str,
) -> Result<String, EntityError> {
    match content_type.map(media_essence) {
        Some(essence) if essence == FORM => {}
        Some(essence) => return Err(EntityError::UnsupportedMediaType(essence)),
        None => return Err(EntityError::UnsupportedMediaType(String::new())),
    }
    Ok(url::form_urlencoded::parse(body)
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default())
}

/// Split a raw query string into a multi-map.
pub(crate) fn parse_query(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        params.entry(k.into_owned()).or_default().push(v.into_owned());
    }
    params
}

fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// A request held entirely in memory.
///
/// Used by the offline CLI and by tests as a stand-in for a live HTTP request.
#[derive(Debug, Clone, Default)]
pub struct MemoryRequest {
    path: HashMap<String, String>,
    query: HashMap<String, Vec<String>>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl MemoryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    /// Append a query value; repeat for multi-valued parameters.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set a raw body. The content type comes from the `content-type` header.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and its content type.
    pub fn with_json(self, value: &Value) -> Self {
        self.with_header("content-type", JSON).with_body(value.to_string())
    }

    fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

impl RestRequest for MemoryRequest {
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
            .get(&name.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    fn read_entity(&self) -> Result<Value, EntityError> {
        decode_entity(&self.body, self.content_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_params_are_empty() {
        let req = MemoryRequest::new();
        assert_eq!(req.path_parameter("id"), "");
        assert_eq!(req.query_parameter("tag"), "");
        assert!(req.query_parameters("tag").is_empty());
        assert_eq!(req.header_parameter("X-Trace"), "");
    }

    #[test]
    fn test_headers_case_insensitive() {
        let req = MemoryRequest::new().with_header("X-Trace", "abc");
        assert_eq!(req.header_parameter("x-trace"), "abc");
        assert_eq!(req.header_parameter("X-TRACE"), "abc");
    }

    #[test]
    fn test_query_multi_values() {
        let req = MemoryRequest::new().with_query("tag", "a").with_query("tag", "b");
        assert_eq!(req.query_parameter("tag"), "a");
        assert_eq!(req.query_parameters("tag"), vec!["a", "b"]);
    }

    #[test]
    fn test_read_entity() {
        let req = MemoryRequest::new().with_json(&json!({"name": "bob"}));
        assert_eq!(req.read_entity().unwrap(), json!({"name": "bob"}));

        let empty = MemoryRequest::new();
        assert!(matches!(empty.read_entity(), Err(EntityError::EmptyBody)));

        let broken = MemoryRequest::new().with_body("{not json");
        assert!(matches!(broken.read_entity(), Err(EntityError::Malformed(_))));

        let xml = MemoryRequest::new()
            .with_header("Content-Type", "application/xml")
            .with_body("<a/>");
        assert!(matches!(xml.read_entity(), Err(EntityError::UnsupportedMediaType(_))));
    }

    #[test]
    fn test_body_parameter_form() {
        let req = MemoryRequest::new()
            .with_header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
            .with_body("name=bob+smith&age=30");
        assert_eq!(req.body_parameter("name").unwrap(), "bob smith");
        assert_eq!(req.body_parameter("missing").unwrap(), "");

        let json_req = MemoryRequest::new().with_json(&json!({}));
        assert!(json_req.body_parameter("name").is_err());
    }

    #[test]
    fn test_parse_query() {
        let params = parse_query("a=1&b=x%20y&a=2");
        assert_eq!(params["a"], vec!["1", "2"]);
        assert_eq!(params["b"], vec!["x y"]);
    }
}
