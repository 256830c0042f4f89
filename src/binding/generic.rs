//! Generic convention for methods taking one untyped variadic argument.
//!
//! Values are collected by index without coercion: path params, then query
//! params, then headers, then the body as a JSON object. The result is as
//! long as the largest referenced index plus one; gaps stay absent.
//! Indices outside `0..MAX_GENERIC_ARGS` are reported, never allocated.

use std::collections::BTreeMap;

use crate::binding::diagnostics::{BindingError, ParamSource};
use crate::binding::value::{ArgValue, JsonMap};
use crate::config::MethodConfig;
use crate::rest::RestRequest;

/// Upper bound on the length of a generic argument list.
pub const MAX_GENERIC_ARGS: usize = 256;

#[derive(Default)]
struct Collector {
    values: BTreeMap<usize, ArgValue>,
    rejected: Vec<(ParamSource, i32)>,
    diagnostics: Vec<BindingError>,
    max_slot: usize,
}

impl Collector {
    /// Claim the slot for `index`, or record it as out of range.
    fn reserve(&mut self, origin: ParamSource, index: i32) -> Option<usize> {
        match usize::try_from(index) {
            Ok(slot) if slot < MAX_GENERIC_ARGS => {
                self.max_slot = self.max_slot.max(slot);
                Some(slot)
            }
            _ => {
                self.rejected.push((origin, index));
                None
            }
        }
    }

    fn put(&mut self, origin: ParamSource, index: i32, value: ArgValue) {
        if let Some(slot) = self.reserve(origin, index) {
            self.values.insert(slot, value);
        }
    }

    fn finish(self) -> (Vec<ArgValue>, Vec<BindingError>) {
        let len = self.max_slot + 1;
        let mut args = vec![ArgValue::Absent; len];
        for (slot, value) in self.values {
            args[slot] = value;
        }
        let mut diagnostics = self.diagnostics;
        diagnostics.extend(
            self.rejected
                .into_iter()
                .map(|(origin, index)| BindingError::out_of_range(origin, index, len)),
        );
        (args, diagnostics)
    }
}

pub(crate) fn bind_generic(
    request: &dyn RestRequest,
    config: &MethodConfig,
) -> (Vec<ArgValue>, Vec<BindingError>) {
    let mut collector = Collector::default();

    for (&index, name) in &config.path_params {
        collector.put(ParamSource::Path, index, ArgValue::String(request.path_parameter(name)));
    }

    for (&index, name) in &config.query_params {
        let mut params = request.query_parameters(name);
        let value = if params.len() == 1 {
            ArgValue::String(params.remove(0))
        } else {
            ArgValue::List(params)
        };
        collector.put(ParamSource::Query, index, value);
    }

    for (&index, name) in &config.headers {
        collector.put(ParamSource::Header, index, ArgValue::String(request.header_parameter(name)));
    }

    if let Some(index) = config.body_index() {
        let decoded = request
            .read_entity()
            .map_err(|e| e.to_string())
            .and_then(|payload| serde_json::from_value::<JsonMap>(payload).map_err(|e| e.to_string()));
        match decoded {
            Ok(map) => collector.put(ParamSource::Body, index, ArgValue::Map(map)),
            Err(reason) => {
                // Counts towards the length even though nothing is stored.
                if let Some(slot) = collector.reserve(ParamSource::Body, index) {
                    collector.diagnostics.push(BindingError::BodyDecode { index: slot, reason });
                }
            }
        }
    }

    collector.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::MemoryRequest;
    use serde_json::json;

    #[test]
    fn test_sparse_indices() {
        let config = MethodConfig::new("M")
            .with_path_param(0, "id")
            .with_query_param(2, "tag");
        let request = MemoryRequest::new().with_path("id", "7").with_query("tag", "x");

        let (args, diagnostics) = bind_generic(&request, &config);
        assert_eq!(args, vec![ArgValue::from("7"), ArgValue::Absent, ArgValue::from("x")]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_query_multiplicity() {
        let config = MethodConfig::new("M")
            .with_query_param(0, "one")
            .with_query_param(1, "many")
            .with_query_param(2, "none");
        let request = MemoryRequest::new()
            .with_query("one", "a")
            .with_query("many", "b")
            .with_query("many", "c");

        let (args, _) = bind_generic(&request, &config);
        assert_eq!(args[0], ArgValue::from("a"));
        assert_eq!(args[1], ArgValue::List(vec!["b".into(), "c".into()]));
        assert_eq!(args[2], ArgValue::List(vec![]));
    }

    #[test]
    fn test_empty_config_yields_one_slot() {
        let (args, diagnostics) = bind_generic(&MemoryRequest::new(), &MethodConfig::new("M"));
        assert_eq!(args, vec![ArgValue::Absent]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_body_as_map_and_failure_counts_length() {
        let config = MethodConfig::new("M").with_path_param(0, "id").with_body(3);

        let ok = MemoryRequest::new().with_json(&json!({"name": "bob"}));
        let (args, diagnostics) = bind_generic(&ok, &config);
        assert_eq!(args.len(), 4);
        assert_eq!(args[3], ArgValue::Map(json!({"name": "bob"}).as_object().unwrap().clone()));
        assert!(diagnostics.is_empty());

        let bad = MemoryRequest::new().with_json(&json!([1, 2]));
        let (args, diagnostics) = bind_generic(&bad, &config);
        assert_eq!(args.len(), 4);
        assert_eq!(args[3], ArgValue::Absent);
        assert!(matches!(diagnostics[0], BindingError::BodyDecode { index: 3, .. }));
    }

    #[test]
    fn test_later_sources_overwrite() {
        let config = MethodConfig::new("M")
            .with_path_param(0, "id")
            .with_header(0, "X-Id");
        let request = MemoryRequest::new().with_path("id", "p").with_header("X-Id", "h");
        let (args, _) = bind_generic(&request, &config);
        assert_eq!(args, vec![ArgValue::from("h")]);
    }

    #[test]
    fn test_negative_index_reported() {
        let config = MethodConfig::new("M").with_header(-2, "X-Id").with_path_param(1, "id");
        let (args, diagnostics) = bind_generic(&MemoryRequest::new(), &config);
        assert_eq!(args.len(), 2);
        assert_eq!(
            diagnostics,
            vec![BindingError::IndexOutOfRange {
                origin: ParamSource::Header,
                index: -2,
                arity: 2,
            }]
        );
    }

    #[test]
    fn test_index_beyond_limit_is_reported() {
        let config = MethodConfig::new("M")
            .with_path_param(1, "id")
            .with_query_param(i32::MAX, "tag")
            .with_body(MAX_GENERIC_ARGS as i32);
        let request = MemoryRequest::new()
            .with_path("id", "7")
            .with_query("tag", "x")
            .with_json(&json!({"a": 1}));

        let (args, diagnostics) = bind_generic(&request, &config);
        assert_eq!(args, vec![ArgValue::Absent, ArgValue::from("7")]);
        assert_eq!(
            diagnostics,
            vec![
                BindingError::out_of_range(ParamSource::Query, i32::MAX, 2),
                BindingError::out_of_range(ParamSource::Body, MAX_GENERIC_ARGS as i32, 2),
            ]
        );
    }

    #[test]
    fn test_last_slot_under_limit_binds() {
        let last = MAX_GENERIC_ARGS as i32 - 1;
        let config = MethodConfig::new("M").with_header(last, "X-Id");
        let request = MemoryRequest::new().with_header("X-Id", "h");

        let (args, diagnostics) = bind_generic(&request, &config);
        assert_eq!(args.len(), MAX_GENERIC_ARGS);
        assert_eq!(args[MAX_GENERIC_ARGS - 1], ArgValue::from("h"));
        assert!(diagnostics.is_empty());
    }
}
