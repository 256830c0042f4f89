//! Service registry.
//!
//! Maps `(protocol, service path)` to a [`ServiceDescriptor`] listing each
//! method's argument types. Passed explicitly to route handlers, so tests can
//! build their own.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::binding::kind::{ArgType, ParseArgTypeError};
use crate::config::{MethodConfig, ServiceConfig};

/// Signature of one RPC method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub arg_types: Vec<ArgType>,
    /// `None` for methods that return only an error.
    pub reply_type: Option<ArgType>,
}

impl MethodDescriptor {
    pub fn new(arg_types: Vec<ArgType>) -> Self {
        Self {
            arg_types,
            reply_type: None,
        }
    }

    pub fn with_reply(mut self, reply_type: ArgType) -> Self {
        self.reply_type = Some(reply_type);
        self
    }

    /// Build from a method's declared signature, if it has one.
    pub fn from_config(config: &MethodConfig) -> Result<Option<Self>, ParseArgTypeError> {
        let Some(signature) = &config.signature else {
            return Ok(None);
        };
        let arg_types = signature
            .iter()
            .map(|s| s.parse::<ArgType>())
            .collect::<Result<Vec<_>, _>>()?;
        let reply_type = config.reply.as_deref().map(str::parse::<ArgType>).transpose()?;
        Ok(Some(Self { arg_types, reply_type }))
    }
}

/// The methods of one service.
#[derive(Debug, Clone, Default)]
pub struct ServiceDescriptor {
    pub name: String,
    methods: HashMap<String, MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    pub fn with_method(mut self, name: impl Into<String>, method: MethodDescriptor) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }

    pub fn methods(&self) -> &HashMap<String, MethodDescriptor> {
        &self.methods
    }

    /// Collect the methods that declare a signature in configuration.
    pub fn from_config(service: &ServiceConfig) -> Result<Self, ParseArgTypeError> {
        let mut descriptor = Self::new(service.interface_name.clone());
        for method in &service.methods {
            if let Some(md) = MethodDescriptor::from_config(method)? {
                descriptor.methods.insert(method.method_name.clone(), md);
            }
        }
        Ok(descriptor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ServiceKey {
    protocol: String,
    path: String,
}

impl ServiceKey {
    fn new(protocol: &str, path: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            path: path.trim_start_matches('/').to_string(),
        }
    }
}

/// Concurrent registry of service descriptors.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: DashMap<ServiceKey, Arc<ServiceDescriptor>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, returning the descriptor it replaced.
    pub fn register(
        &self,
        protocol: &str,
        path: &str,
        descriptor: ServiceDescriptor,
    ) -> Option<Arc<ServiceDescriptor>> {
        tracing::debug!(protocol, path, methods = descriptor.methods.len(), "Service registered");
        self.services.insert(ServiceKey::new(protocol, path), Arc::new(descriptor))
    }

    pub fn unregister(&self, protocol: &str, path: &str) -> Option<Arc<ServiceDescriptor>> {
        self.services
            .remove(&ServiceKey::new(protocol, path))
            .map(|(_, v)| v)
    }

    /// Look up a service. A leading `/` on the path is ignored.
    pub fn resolve(&self, protocol: &str, path: &str) -> Option<Arc<ServiceDescriptor>> {
        self.services
            .get(&ServiceKey::new(protocol, path))
            .map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::kind::ArgKind;

    #[test]
    fn test_resolve_strips_leading_slash() {
        let registry = ServiceRegistry::new();
        registry.register(
            "rest",
            "UserProvider",
            ServiceDescriptor::new("UserProvider")
                .with_method("GetUser", MethodDescriptor::new(vec![ArgType::string()])),
        );

        let svc = registry.resolve("rest", "/UserProvider").expect("service not found");
        assert!(svc.method("GetUser").is_some());
        assert!(registry.resolve("grpc", "UserProvider").is_none());
        assert!(registry.unregister("rest", "/UserProvider").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_descriptor_from_config() {
        let method = MethodConfig::new("GetUser").with_signature(["string", "*int64"]);
        let md = MethodDescriptor::from_config(&method).unwrap().unwrap();
        assert_eq!(md.arg_types[1], ArgType::pointer_to(ArgKind::Int64));
        assert!(md.reply_type.is_none());

        assert!(MethodDescriptor::from_config(&MethodConfig::new("x")).unwrap().is_none());

        let bad = MethodConfig::new("x").with_signature(["map[a]b"]);
        assert!(MethodDescriptor::from_config(&bad).is_err());
    }

    #[test]
    fn test_service_from_config() {
        let service = ServiceConfig::new("UserProvider")
            .with_method(MethodConfig::new("GetUser").with_signature(["string"]))
            .with_method(MethodConfig::new("Untyped"));
        let descriptor = ServiceDescriptor::from_config(&service).unwrap();
        assert_eq!(descriptor.methods().len(), 1);
    }
}
