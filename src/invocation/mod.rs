//! RPC invocation collaborator.
//!
//! # Responsibilities
//! - Describe a single call (method name, arguments, attachments)
//! - Abstract the dispatcher that executes it behind [`Invoker`]
//!
//! # Design Decisions
//! - Invokers are object-safe and return boxed futures
//! - A failed call is an `Err`; the REST layer maps it to HTTP 500

pub mod echo;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use thiserror::Error;

use crate::binding::ArgValue;

/// Identity of an exported service: protocol plus service path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceUrl {
    pub protocol: String,
    pub path: String,
}

impl ServiceUrl {
    pub fn new(protocol: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.path.trim_start_matches('/'))
    }
}

/// One RPC call.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcInvocation {
    pub method_name: String,
    pub arguments: Vec<ArgValue>,
    pub attachments: HashMap<String, String>,
}

impl RpcInvocation {
    pub fn new(method_name: impl Into<String>, arguments: Vec<ArgValue>) -> Self {
        Self {
            method_name: method_name.into(),
            arguments,
            attachments: HashMap::new(),
        }
    }
}

/// The downstream method failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvocationError(pub String);

impl InvocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result of an RPC call.
pub type RpcResult = Result<Value, InvocationError>;

/// Executes invocations against a service implementation.
pub trait Invoker: Send + Sync {
    /// The service this invoker dispatches to.
    fn url(&self) -> &ServiceUrl;

    fn invoke(&self, invocation: RpcInvocation) -> BoxFuture<'_, RpcResult>;
}

/// An invoker backed by an async closure.
pub struct FnInvoker<F> {
    url: ServiceUrl,
    f: F,
}

impl<F, Fut> FnInvoker<F>
where
    F: Fn(RpcInvocation) -> Fut + Send + Sync,
    Fut: Future<Output = RpcResult> + Send + 'static,
{
    pub fn new(url: ServiceUrl, f: F) -> Self {
        Self { url, f }
    }
}

impl<F, Fut> Invoker for FnInvoker<F>
where
    F: Fn(RpcInvocation) -> Fut + Send + Sync,
    Fut: Future<Output = RpcResult> + Send + 'static,
{
    fn url(&self) -> &ServiceUrl {
        &self.url
    }

    fn invoke(&self, invocation: RpcInvocation) -> BoxFuture<'_, RpcResult> {
        (self.f)(invocation).boxed()
    }
}

impl<F> fmt::Debug for FnInvoker<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInvoker").field("url", &self.url).finish()
    }
}
