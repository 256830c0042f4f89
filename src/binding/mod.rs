//! Argument binding.
//!
//! # Responsibilities
//! - Turn one REST request into the positional argument list of an RPC method
//! - Pick the calling convention from the method signature
//! - Report per-slot failures without aborting the call
//!
//! # Data Flow
//! ```text
//! RestRequest + MethodConfig + MethodDescriptor
//!     → ArgumentBinder::bind
//!         → typed passes (path, query, body, header) | generic collector
//!     → Binding { args, diagnostics }
//! ```
//!
//! # Design Decisions
//! - Binding is synchronous; the body is buffered before it runs
//! - Failures become diagnostics, the slot keeps its zero value
//! - Pointer types bind like their pointee

pub mod diagnostics;
mod generic;
pub mod kind;
mod typed;
pub mod value;

use serde::Serialize;

use crate::config::MethodConfig;
use crate::registry::MethodDescriptor;
use crate::rest::RestRequest;

pub use diagnostics::{BindingError, ParamSource};
pub use generic::MAX_GENERIC_ARGS;
pub use kind::{ArgKind, ArgType, ParseArgTypeError, StructType};
pub use value::{ArgValue, JsonMap};

/// How the arguments of a method are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// One coerced value per declared parameter.
    Typed,
    /// A single untyped variadic parameter filled by index.
    Generic,
}

/// Outcome of binding one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub convention: Convention,
    pub args: Vec<ArgValue>,
    pub diagnostics: Vec<BindingError>,
}

/// Binds requests for one method.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentBinder<'a> {
    config: &'a MethodConfig,
    method: &'a MethodDescriptor,
}

impl<'a> ArgumentBinder<'a> {
    pub fn new(config: &'a MethodConfig, method: &'a MethodDescriptor) -> Self {
        Self { config, method }
    }

    pub fn convention(&self) -> Convention {
        let arg_types = &self.method.arg_types;
        let arity_fits = arg_types.len() == 1
            || (arg_types.len() == 2 && self.method.reply_type.is_none());
        match arg_types.first() {
            Some(first) if arity_fits && !first.pointer && first.kind.is_any_sequence() => {
                Convention::Generic
            }
            _ => Convention::Typed,
        }
    }

    pub fn bind(&self, request: &dyn RestRequest) -> Binding {
        let convention = self.convention();
        let (args, diagnostics) = match convention {
            Convention::Generic => generic::bind_generic(request, self.config),
            Convention::Typed => {
                typed::TypedPass::new(request, &self.method.arg_types).run(self.config)
            }
        };
        Binding {
            convention,
            args,
            diagnostics,
        }
    }
}
