//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that routes are well-formed and unique
//! - Check that param indices can name an argument
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Indices beyond a method's arity are only caught when a signature is
//!   declared; the binder still reports them at request time
//! - Generic signatures have no arity, but their indices are capped at
//!   `MAX_GENERIC_ARGS`

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::binding::{ArgType, MAX_GENERIC_ARGS};
use crate::config::schema::{BridgeConfig, MethodConfig};
use crate::routing::matcher::PathTemplate;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),

    #[error("max_body_size must be greater than zero")]
    BodyLimit,

    #[error("request timeout must be greater than zero")]
    RequestTimeout,

    #[error("service #{0} has an empty interface name")]
    EmptyInterfaceName(usize),

    #[error("service `{0}` has a method with an empty name")]
    EmptyMethodName(String),

    #[error("{method}: path `{path}` is invalid: {reason}")]
    InvalidPath {
        method: String,
        path: String,
        reason: String,
    },

    #[error("{method}: {reason}")]
    InvalidMethodType { method: String, reason: String },

    #[error("{method}: route {http_method} {path} is already defined")]
    DuplicateRoute {
        method: String,
        http_method: String,
        path: String,
    },

    #[error("{method}: {origin} param index {index} is negative")]
    NegativeIndex {
        method: String,
        origin: &'static str,
        index: i32,
    },

    #[error("{method}: path param `{name}` does not appear in `{path}`")]
    UnknownPathParam {
        method: String,
        name: String,
        path: String,
    },

    #[error("{method}: {reason}")]
    InvalidSignature { method: String, reason: String },

    #[error("{method}: index {index} exceeds the {arity} declared arguments")]
    IndexBeyondSignature {
        method: String,
        index: i32,
        arity: usize,
    },

    #[error("{method}: index {index} exceeds the generic argument limit of {limit}")]
    GenericIndexLimit {
        method: String,
        index: i32,
        limit: usize,
    },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::BodyLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    let mut routes = HashSet::new();
    for (i, service) in config.services.iter().enumerate() {
        if service.interface_name.trim().is_empty() {
            errors.push(ValidationError::EmptyInterfaceName(i));
        }
        for method in service.method_configs() {
            if method.method_name.trim().is_empty() {
                errors.push(ValidationError::EmptyMethodName(service.interface_name.clone()));
                continue;
            }
            validate_method(&method, &mut routes, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one resolved method config.
pub fn validate_method(
    method: &MethodConfig,
    routes: &mut HashSet<(String, String)>,
    errors: &mut Vec<ValidationError>,
) {
    let name = format!("{}.{}", method.interface_name, method.method_name);

    let template = match PathTemplate::parse(&method.path) {
        Ok(t) => Some(t),
        Err(e) => {
            errors.push(ValidationError::InvalidPath {
                method: name.clone(),
                path: method.path.clone(),
                reason: e.to_string(),
            });
            None
        }
    };

    match method.http_method() {
        Ok(http_method) => {
            let key = (http_method.to_string(), method.path.clone());
            if !routes.insert(key) {
                errors.push(ValidationError::DuplicateRoute {
                    method: name.clone(),
                    http_method: http_method.to_string(),
                    path: method.path.clone(),
                });
            }
        }
        Err(reason) => errors.push(ValidationError::InvalidMethodType {
            method: name.clone(),
            reason,
        }),
    }

    let sources = [
        ("path", &method.path_params),
        ("query", &method.query_params),
        ("header", &method.headers),
    ];
    for (origin, map) in sources {
        for &index in map.keys().filter(|i| **i < 0) {
            errors.push(ValidationError::NegativeIndex {
                method: name.clone(),
                origin,
                index,
            });
        }
    }

    if let Some(template) = &template {
        for param in method.path_params.values() {
            if !template.has_param(param) {
                errors.push(ValidationError::UnknownPathParam {
                    method: name.clone(),
                    name: param.clone(),
                    path: method.path.clone(),
                });
            }
        }
    }

    if let Some(signature) = &method.signature {
        let mut arity = Some(signature.len());
        for raw in signature.iter().chain(method.reply.iter()) {
            if let Err(e) = raw.parse::<ArgType>() {
                errors.push(ValidationError::InvalidSignature {
                    method: name.clone(),
                    reason: e.to_string(),
                });
                arity = None;
            }
        }
        let arity_fits = signature.len() == 1 || (signature.len() == 2 && method.reply.is_none());
        let generic = arity_fits
            && signature
                .first()
                .and_then(|s| s.parse::<ArgType>().ok())
                .is_some_and(|t| !t.pointer && t.kind.is_any_sequence());
        match (arity, method.max_index()) {
            (_, Some(max)) if generic => {
                if max >= MAX_GENERIC_ARGS as i32 {
                    errors.push(ValidationError::GenericIndexLimit {
                        method: name,
                        index: max,
                        limit: MAX_GENERIC_ARGS,
                    });
                }
            }
            (Some(arity), Some(max)) => {
                if max >= arity as i32 {
                    errors.push(ValidationError::IndexBeyondSignature {
                        method: name,
                        index: max,
                        arity,
                    });
                }
            }
            _ => {}
        }
    }
}
