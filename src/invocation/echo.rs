//! An invoker that reflects the call back to the caller.
//!
//! Lets the bridge run without a real RPC backend: every route answers with
//! the method name and the arguments the binder produced.

use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use serde_json::json;

use crate::invocation::{Invoker, RpcInvocation, RpcResult, ServiceUrl};

#[derive(Debug, Clone)]
pub struct EchoInvoker {
    url: ServiceUrl,
}

impl EchoInvoker {
    pub fn new(protocol: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            url: ServiceUrl::new(protocol, path),
        }
    }
}

impl Invoker for EchoInvoker {
    fn url(&self) -> &ServiceUrl {
        &self.url
    }

    fn invoke(&self, invocation: RpcInvocation) -> BoxFuture<'_, RpcResult> {
        let reply = json!({
            "service": self.url.path.trim_start_matches('/'),
            "method": invocation.method_name,
            "args": invocation.arguments,
        });
        future::ready(Ok(reply)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ArgValue;

    #[tokio::test]
    async fn test_echo() {
        let invoker = EchoInvoker::new("rest", "/UserProvider");
        let reply = invoker
            .invoke(RpcInvocation::new("GetUser", vec![ArgValue::from("42"), ArgValue::Int32(7)]))
            .await
            .unwrap();
        assert_eq!(
            reply,
            json!({"service": "UserProvider", "method": "GetUser", "args": ["42", 7]})
        );
    }
}
