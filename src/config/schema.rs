//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::config::params::{self, ParamMap};

/// Media type used when none is configured.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Protocol name services are registered under by default.
pub const DEFAULT_PROTOCOL: &str = "rest";

/// Body index meaning "no body argument".
pub const NO_BODY: i32 = -1;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Services exposed over REST.
    pub services: Vec<ServiceConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info" or "rest_rpc_bridge=debug").
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "rest_rpc_bridge=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One RPC service exposed over REST.
///
/// Method-level `path`, `method_type`, `produces` and `consumes` inherit from
/// here when left empty; see [`ServiceConfig::method_configs`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Interface (service) name.
    pub interface_name: String,

    /// Protocol the service is registered under.
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Base path prepended to every method path.
    #[serde(default)]
    pub path: String,

    /// Default HTTP method for the service's methods.
    #[serde(default)]
    pub method_type: String,

    #[serde(default = "default_media_type")]
    pub produces: String,

    #[serde(default = "default_media_type")]
    pub consumes: String,

    #[serde(default)]
    pub methods: Vec<MethodConfig>,
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

fn default_media_type() -> String {
    DEFAULT_MEDIA_TYPE.to_string()
}

fn default_body() -> i32 {
    NO_BODY
}

impl ServiceConfig {
    pub fn new(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            protocol: default_protocol(),
            path: String::new(),
            method_type: String::new(),
            produces: default_media_type(),
            consumes: default_media_type(),
            methods: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_method(mut self, method: MethodConfig) -> Self {
        self.methods.push(method);
        self
    }

    /// The method configs with service defaults applied and full route paths.
    pub fn method_configs(&self) -> Vec<MethodConfig> {
        self.methods.iter().map(|m| self.resolve(m)).collect()
    }

    fn resolve(&self, method: &MethodConfig) -> MethodConfig {
        let mut resolved = method.clone();
        if resolved.interface_name.is_empty() {
            resolved.interface_name = self.interface_name.clone();
        }
        resolved.path = join_paths(&self.path, &method.path);
        if resolved.method_type.is_empty() {
            resolved.method_type = self.method_type.clone();
        }
        if resolved.produces.is_empty() {
            resolved.produces = self.produces.clone();
        }
        if resolved.consumes.is_empty() {
            resolved.consumes = self.consumes.clone();
        }
        resolved
    }
}

fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => base.to_string(),
        (false, false) if path.starts_with('/') => format!("{}{}", base, path),
        (false, false) => format!("{}/{}", base, path),
    }
}

/// Parameter-source mapping for one method.
///
/// Indices in the param maps and `body` are 0-based argument positions.
/// Shared read-only (via `Arc`) by every request routed to the method.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MethodConfig {
    #[serde(default)]
    pub interface_name: String,

    pub method_name: String,

    /// Route path template, e.g. `/users/{id}`.
    #[serde(default)]
    pub path: String,

    /// HTTP method; empty means GET.
    #[serde(default)]
    pub method_type: String,

    #[serde(default)]
    pub produces: String,

    #[serde(default)]
    pub consumes: String,

    /// Index of the argument sourced from the body; negative for none.
    #[serde(default = "default_body")]
    pub body: i32,

    #[serde(default, with = "params")]
    pub path_params: ParamMap,

    #[serde(default, with = "params")]
    pub query_params: ParamMap,

    #[serde(default, with = "params")]
    pub headers: ParamMap,

    /// Optional declared argument types, e.g. `["string", "*User"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<String>>,

    /// Optional declared reply type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

impl MethodConfig {
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            interface_name: String::new(),
            method_name: method_name.into(),
            path: String::new(),
            method_type: String::new(),
            produces: String::new(),
            consumes: String::new(),
            body: NO_BODY,
            path_params: ParamMap::new(),
            query_params: ParamMap::new(),
            headers: ParamMap::new(),
            signature: None,
            reply: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_method_type(mut self, method_type: impl Into<String>) -> Self {
        self.method_type = method_type.into();
        self
    }

    pub fn with_path_param(mut self, index: i32, name: impl Into<String>) -> Self {
        self.path_params.insert(index, name.into());
        self
    }

    pub fn with_query_param(mut self, index: i32, name: impl Into<String>) -> Self {
        self.query_params.insert(index, name.into());
        self
    }

    pub fn with_header(mut self, index: i32, name: impl Into<String>) -> Self {
        self.headers.insert(index, name.into());
        self
    }

    pub fn with_body(mut self, index: i32) -> Self {
        self.body = index;
        self
    }

    pub fn with_signature<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signature = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    /// The body argument index, if one is configured.
    pub fn body_index(&self) -> Option<i32> {
        (self.body >= 0).then_some(self.body)
    }

    /// The HTTP method this route answers; empty means GET.
    pub fn http_method(&self) -> Result<Method, String> {
        if self.method_type.trim().is_empty() {
            return Ok(Method::GET);
        }
        match self.method_type.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "PATCH" => Ok(Method::PATCH),
            "HEAD" => Ok(Method::HEAD),
            "OPTIONS" => Ok(Method::OPTIONS),
            other => Err(format!("unsupported HTTP method `{}`", other)),
        }
    }

    /// Largest index referenced by any source, if any.
    pub fn max_index(&self) -> Option<i32> {
        self.path_params
            .keys()
            .chain(self.query_params.keys())
            .chain(self.headers.keys())
            .copied()
            .chain(self.body_index())
            .max()
    }
}
