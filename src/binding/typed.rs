//! Typed convention: one coerced value per declared parameter.
//!
//! Four passes run in a fixed order (path, query, body, header). Each reads
//! its own param map and writes only slots whose kind it can produce, so a
//! later pass overwrites an earlier one for the same slot.

use serde_json::Value;

use crate::binding::diagnostics::{BindingError, ParamSource};
use crate::binding::kind::{ArgKind, ArgType};
use crate::binding::value::ArgValue;
use crate::config::MethodConfig;
use crate::rest::RestRequest;

pub(crate) struct TypedPass<'a> {
    request: &'a dyn RestRequest,
    arg_types: &'a [ArgType],
    args: Vec<ArgValue>,
    diagnostics: Vec<BindingError>,
}

impl<'a> TypedPass<'a> {
    pub(crate) fn new(request: &'a dyn RestRequest, arg_types: &'a [ArgType]) -> Self {
        Self {
            request,
            arg_types,
            args: arg_types.iter().map(ArgValue::zero_for).collect(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, config: &MethodConfig) -> (Vec<ArgValue>, Vec<BindingError>) {
        self.path(config);
        self.query(config);
        self.body(config);
        self.header(config);
        (self.args, self.diagnostics)
    }

    /// Resolve a configured index to a slot, reporting it when out of range.
    fn slot(&mut self, origin: ParamSource, index: i32) -> Option<usize> {
        match usize::try_from(index) {
            Ok(slot) if slot < self.arg_types.len() => Some(slot),
            _ => {
                self.diagnostics
                    .push(BindingError::out_of_range(origin, index, self.arg_types.len()));
                None
            }
        }
    }

    fn store(&mut self, slot: usize, result: Result<ArgValue, BindingError>) {
        match result {
            Ok(value) => self.args[slot] = value,
            Err(e) => self.diagnostics.push(e),
        }
    }

    fn path(&mut self, config: &MethodConfig) {
        for (&index, name) in &config.path_params {
            let Some(slot) = self.slot(ParamSource::Path, index) else {
                continue;
            };
            let raw = self.request.path_parameter(name);
            let result = coerce_scalar(ParamSource::Path, slot, name, self.arg_types[slot].unwrapped(), raw);
            self.store(slot, result);
        }
    }

    fn query(&mut self, config: &MethodConfig) {
        for (&index, name) in &config.query_params {
            let Some(slot) = self.slot(ParamSource::Query, index) else {
                continue;
            };
            let result = match self.arg_types[slot].unwrapped() {
                ArgKind::Sequence(_) => Ok(ArgValue::List(self.request.query_parameters(name))),
                kind => coerce_scalar(
                    ParamSource::Query,
                    slot,
                    name,
                    kind,
                    self.request.query_parameter(name),
                ),
            };
            self.store(slot, result);
        }
    }

    fn body(&mut self, config: &MethodConfig) {
        let Some(index) = config.body_index() else {
            return;
        };
        let Some(slot) = self.slot(ParamSource::Body, index) else {
            return;
        };
        let result = self
            .request
            .read_entity()
            .map_err(|e| e.to_string())
            .and_then(|payload| {
                decode_body(self.arg_types[slot].unwrapped(), payload).map_err(|e| e.to_string())
            })
            .map_err(|reason| BindingError::BodyDecode { index: slot, reason });
        self.store(slot, result);
    }

    fn header(&mut self, config: &MethodConfig) {
        for (&index, name) in &config.headers {
            let Some(slot) = self.slot(ParamSource::Header, index) else {
                continue;
            };
            let result = match self.arg_types[slot].unwrapped() {
                ArgKind::String => Ok(ArgValue::String(self.request.header_parameter(name))),
                kind => Err(BindingError::unsupported(ParamSource::Header, slot, kind)),
            };
            self.store(slot, result);
        }
    }
}

/// Coerce a raw path or query value into a scalar kind.
fn coerce_scalar(
    origin: ParamSource,
    slot: usize,
    name: &str,
    kind: &ArgKind,
    raw: String,
) -> Result<ArgValue, BindingError> {
    let parse_error = |reason: std::num::ParseIntError| BindingError::Coercion {
        origin,
        index: slot,
        name: name.to_string(),
        kind: kind.to_string(),
        reason: reason.to_string(),
    };
    match kind {
        ArgKind::String => Ok(ArgValue::String(raw)),
        ArgKind::Int32 => raw.parse::<i32>().map(ArgValue::Int32).map_err(parse_error),
        ArgKind::Int64 => raw.parse::<i64>().map(ArgValue::Int64).map_err(parse_error),
        ArgKind::Int => raw.parse::<isize>().map(ArgValue::Int).map_err(parse_error),
        other => Err(BindingError::unsupported(origin, slot, other)),
    }
}

/// Decode a body payload into the shape of `kind`.
pub(crate) fn decode_body(kind: &ArgKind, payload: Value) -> Result<ArgValue, serde_json::Error> {
    let value = match kind {
        ArgKind::String => ArgValue::String(serde_json::from_value(payload)?),
        ArgKind::Int32 => ArgValue::Int32(serde_json::from_value(payload)?),
        ArgKind::Int64 => ArgValue::Int64(serde_json::from_value(payload)?),
        ArgKind::Int => ArgValue::Int(serde_json::from_value(payload)?),
        ArgKind::Any => ArgValue::Map(serde_json::from_value(payload)?),
        ArgKind::Sequence(elem) => match elem.as_ref() {
            ArgKind::Any => ArgValue::Maps(serde_json::from_value(payload)?),
            ArgKind::String => ArgValue::List(serde_json::from_value(payload)?),
            elem => {
                let items: Vec<Value> = serde_json::from_value(payload)?;
                ArgValue::Values(
                    items
                        .into_iter()
                        .map(|item| decode_body(elem, item))
                        .collect::<Result<_, _>>()?,
                )
            }
        },
        ArgKind::Opaque(st) => ArgValue::Struct(st.decode(payload)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_scalar_widths() {
        let ok = coerce_scalar(ParamSource::Path, 0, "n", &ArgKind::Int32, "2147483647".into());
        assert_eq!(ok, Ok(ArgValue::Int32(i32::MAX)));

        let overflow = coerce_scalar(ParamSource::Path, 0, "n", &ArgKind::Int32, "2147483648".into());
        assert!(matches!(overflow, Err(BindingError::Coercion { .. })));

        let wide = coerce_scalar(ParamSource::Query, 1, "n", &ArgKind::Int64, "-9000000000".into());
        assert_eq!(wide, Ok(ArgValue::Int64(-9_000_000_000)));

        let native = coerce_scalar(ParamSource::Query, 1, "n", &ArgKind::Int, "+12".into());
        assert_eq!(native, Ok(ArgValue::Int(12)));
    }

    #[test]
    fn test_coerce_rejects_non_scalars() {
        let err = coerce_scalar(ParamSource::Path, 2, "n", &ArgKind::Any, "x".into()).unwrap_err();
        assert_eq!(
            err,
            BindingError::UnsupportedKind {
                origin: ParamSource::Path,
                index: 2,
                kind: "any".into(),
            }
        );
    }

    #[test]
    fn test_decode_body_shapes() {
        assert_eq!(
            decode_body(&ArgKind::any_sequence(), json!([{"a": 1}, {"b": 2}])).unwrap(),
            ArgValue::Maps(vec![
                json!({"a": 1}).as_object().unwrap().clone(),
                json!({"b": 2}).as_object().unwrap().clone(),
            ])
        );
        assert_eq!(
            decode_body(&ArgKind::Sequence(Box::new(ArgKind::Int32)), json!([1, 2])).unwrap(),
            ArgValue::Values(vec![ArgValue::Int32(1), ArgValue::Int32(2)])
        );
        assert_eq!(decode_body(&ArgKind::String, json!("hi")).unwrap(), ArgValue::from("hi"));
        assert!(decode_body(&ArgKind::Any, json!([1])).is_err());
        assert!(decode_body(&ArgKind::Int32, json!(1u64 << 40)).is_err());
    }
}
