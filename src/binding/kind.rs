//! Argument type descriptors.
//!
//! A method signature is a list of [`ArgType`]s. Each one is a semantic
//! [`ArgKind`] plus an optional pointer layer. The binder matches on the kind
//! exhaustively instead of inspecting runtime types.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// The semantic kind of a formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgKind {
    String,
    Int32,
    Int64,
    /// Native-width signed integer.
    Int,
    /// Homogeneous list. `Sequence(Any)` is the untyped variadic form.
    Sequence(Box<ArgKind>),
    /// Untyped value.
    Any,
    /// Structured type decoded from a request body.
    Opaque(StructType),
}

impl ArgKind {
    /// Sequence of untyped values.
    pub fn any_sequence() -> Self {
        ArgKind::Sequence(Box::new(ArgKind::Any))
    }

    pub fn is_any_sequence(&self) -> bool {
        matches!(self, ArgKind::Sequence(elem) if **elem == ArgKind::Any)
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::String => write!(f, "string"),
            ArgKind::Int32 => write!(f, "int32"),
            ArgKind::Int64 => write!(f, "int64"),
            ArgKind::Int => write!(f, "int"),
            ArgKind::Sequence(elem) => write!(f, "[]{}", elem),
            ArgKind::Any => write!(f, "any"),
            ArgKind::Opaque(st) => write!(f, "{}", st.name()),
        }
    }
}

/// A declared parameter type: a kind with an optional pointer layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgType {
    pub kind: ArgKind,
    pub pointer: bool,
}

impl ArgType {
    pub fn new(kind: ArgKind) -> Self {
        Self { kind, pointer: false }
    }

    pub fn pointer_to(kind: ArgKind) -> Self {
        Self { kind, pointer: true }
    }

    pub fn string() -> Self {
        Self::new(ArgKind::String)
    }

    pub fn int32() -> Self {
        Self::new(ArgKind::Int32)
    }

    pub fn int64() -> Self {
        Self::new(ArgKind::Int64)
    }

    pub fn int() -> Self {
        Self::new(ArgKind::Int)
    }

    pub fn any() -> Self {
        Self::new(ArgKind::Any)
    }

    pub fn any_sequence() -> Self {
        Self::new(ArgKind::any_sequence())
    }

    pub fn sequence_of(elem: ArgKind) -> Self {
        Self::new(ArgKind::Sequence(Box::new(elem)))
    }

    /// The kind after stripping the pointer layer.
    ///
    /// Only one layer is modelled, so this is just the kind.
    pub fn unwrapped(&self) -> &ArgKind {
        &self.kind
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer {
            write!(f, "*")?;
        }
        write!(f, "{}", self.kind)
    }
}

/// Error returned when a signature string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument type `{0}`")]
pub struct ParseArgTypeError(pub String);

impl FromStr for ArgType {
    type Err = ParseArgTypeError;

    /// Parses `string`, `int32`, `int64`, `int`, `any`, `object`, `[]<elem>`,
    /// any other identifier as a free-form object type, each optionally
    /// prefixed with `*`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (pointer, rest) = match trimmed.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let kind = parse_kind(rest).ok_or_else(|| ParseArgTypeError(s.to_string()))?;
        Ok(Self { kind, pointer })
    }
}

fn parse_kind(s: &str) -> Option<ArgKind> {
    if let Some(elem) = s.strip_prefix("[]") {
        return parse_kind(elem).map(|k| ArgKind::Sequence(Box::new(k)));
    }
    let kind = match s {
        "string" => ArgKind::String,
        "int32" => ArgKind::Int32,
        "int64" => ArgKind::Int64,
        "int" => ArgKind::Int,
        "any" | "interface{}" | "interface {}" => ArgKind::Any,
        "object" => ArgKind::Opaque(StructType::object("object")),
        other => {
            let valid = !other.is_empty()
                && other
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            if !valid || other.starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }
            ArgKind::Opaque(StructType::object(other))
        }
    };
    Some(kind)
}

type ZeroFn = fn() -> Value;
type DecodeFn = fn(Value) -> Result<Value, serde_json::Error>;

/// A type-erased structured type.
///
/// Holds the constructor for a fresh zero instance and a decoder that shapes
/// a JSON payload into that type, both captured from a concrete Rust type.
#[derive(Clone)]
pub struct StructType {
    name: String,
    zero: ZeroFn,
    decode: DecodeFn,
}

impl StructType {
    /// Describe `T`. Decoding goes through `T`'s serde impls, so payloads that
    /// do not fit `T` are rejected.
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Default,
    {
        Self {
            name: short_type_name(std::any::type_name::<T>()),
            zero: zero_of::<T>,
            decode: decode_as::<T>,
        }
    }

    /// A free-form JSON object type. The zero instance is `{}`.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zero: empty_object,
            decode: decode_object,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocate a fresh zero instance.
    pub fn zero(&self) -> Value {
        (self.zero)()
    }

    pub fn decode(&self, payload: Value) -> Result<Value, serde_json::Error> {
        (self.decode)(payload)
    }
}

impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructType").field("name", &self.name).finish()
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

fn short_type_name(full: &str) -> String {
    full.rsplit("::").next().unwrap_or(full).to_string()
}

fn zero_of<T: Serialize + Default>() -> Value {
    serde_json::to_value(T::default()).unwrap_or(Value::Null)
}

fn decode_as<T: Serialize + DeserializeOwned>(payload: Value) -> Result<Value, serde_json::Error> {
    let typed: T = serde_json::from_value(payload)?;
    serde_json::to_value(typed)
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn decode_object(payload: Value) -> Result<Value, serde_json::Error> {
    let map: serde_json::Map<String, Value> = serde_json::from_value(payload)?;
    Ok(Value::Object(map))
}
