//! Resolved argument values.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{Map, Value};

use crate::binding::kind::{ArgKind, ArgType};

/// A JSON object, the shape bodies are decoded into for untyped slots.
pub type JsonMap = Map<String, Value>;

/// One resolved argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// The untyped absent value.
    Absent,
    String(String),
    Int32(i32),
    Int64(i64),
    Int(isize),
    /// Raw multi-value parameter list.
    List(Vec<String>),
    Map(JsonMap),
    Maps(Vec<JsonMap>),
    /// A decoded structured instance.
    Struct(Value),
    /// Untyped sequence, as produced by the generic convention.
    Values(Vec<ArgValue>),
}

impl ArgValue {
    /// The zero value for a declared type. The pointer layer is ignored.
    pub fn zero_for(ty: &ArgType) -> Self {
        match ty.unwrapped() {
            ArgKind::String => ArgValue::String(String::new()),
            ArgKind::Int32 => ArgValue::Int32(0),
            ArgKind::Int64 => ArgValue::Int64(0),
            ArgKind::Int => ArgValue::Int(0),
            ArgKind::Sequence(elem) if **elem == ArgKind::String => ArgValue::List(Vec::new()),
            ArgKind::Sequence(_) => ArgValue::Values(Vec::new()),
            ArgKind::Any => ArgValue::Absent,
            ArgKind::Opaque(st) => ArgValue::Struct(st.zero()),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ArgValue::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into a plain JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Absent => Value::Null,
            ArgValue::String(s) => Value::String(s.clone()),
            ArgValue::Int32(n) => Value::from(*n),
            ArgValue::Int64(n) => Value::from(*n),
            ArgValue::Int(n) => Value::from(*n as i64),
            ArgValue::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
            ArgValue::Map(map) => Value::Object(map.clone()),
            ArgValue::Maps(maps) => {
                Value::Array(maps.iter().cloned().map(Value::Object).collect())
            }
            ArgValue::Struct(v) => v.clone(),
            ArgValue::Values(items) => Value::Array(items.iter().map(ArgValue::to_json).collect()),
        }
    }
}

impl Serialize for ArgValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArgValue::Absent => serializer.serialize_none(),
            ArgValue::String(s) => serializer.serialize_str(s),
            ArgValue::Int32(n) => serializer.serialize_i32(*n),
            ArgValue::Int64(n) => serializer.serialize_i64(*n),
            ArgValue::Int(n) => serializer.serialize_i64(*n as i64),
            ArgValue::List(items) => items.serialize(serializer),
            ArgValue::Map(map) => map.serialize(serializer),
            ArgValue::Maps(maps) => maps.serialize(serializer),
            ArgValue::Struct(v) => v.serialize(serializer),
            ArgValue::Values(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::String(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::String(s)
    }
}
