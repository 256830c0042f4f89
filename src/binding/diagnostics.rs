//! Non-fatal binding failures.
//!
//! Every per-slot failure becomes one [`BindingError`]. The binder collects
//! them and keeps going; the caller decides how to report them.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::binding::kind::ArgKind;

/// Where a parameter value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    Path,
    Query,
    Header,
    Body,
}

impl ParamSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamSource::Path => "path",
            ParamSource::Query => "query",
            ParamSource::Header => "header",
            ParamSource::Body => "body",
        }
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single slot that could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The configured index does not name a formal parameter.
    #[error("{origin} param index {index} is outside the {arity} declared arguments")]
    IndexOutOfRange {
        origin: ParamSource,
        index: i32,
        arity: usize,
    },

    /// The raw value could not be parsed into the slot's kind.
    #[error("{origin} param `{name}` for argument {index} is not a valid {kind}: {reason}")]
    Coercion {
        origin: ParamSource,
        index: usize,
        name: String,
        kind: String,
        reason: String,
    },

    /// The slot's kind cannot be sourced from this origin.
    #[error("argument {index} of type {kind} cannot be bound from a {origin} param")]
    UnsupportedKind {
        origin: ParamSource,
        index: usize,
        kind: String,
    },

    /// The request body does not fit the slot's type.
    #[error("body for argument {index} could not be decoded: {reason}")]
    BodyDecode { index: usize, reason: String },
}

impl BindingError {
    pub fn origin(&self) -> ParamSource {
        match self {
            BindingError::IndexOutOfRange { origin, .. }
            | BindingError::Coercion { origin, .. }
            | BindingError::UnsupportedKind { origin, .. } => *origin,
            BindingError::BodyDecode { .. } => ParamSource::Body,
        }
    }

    pub(crate) fn unsupported(origin: ParamSource, index: usize, kind: &ArgKind) -> Self {
        BindingError::UnsupportedKind {
            origin,
            index,
            kind: kind.to_string(),
        }
    }

    pub(crate) fn out_of_range(origin: ParamSource, index: i32, arity: usize) -> Self {
        BindingError::IndexOutOfRange { origin, index, arity }
    }
}

impl Serialize for BindingError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("BindingError", 2)?;
        s.serialize_field("origin", &self.origin())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}
