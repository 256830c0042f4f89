//! Binding through the public API, starting from a TOML config.

use serde::{Deserialize, Serialize};
use serde_json::json;

use rest_rpc_bridge::binding::{ArgKind, ArgType, ArgValue, BindingError, ParamSource, StructType};
use rest_rpc_bridge::binding::MAX_GENERIC_ARGS;
use rest_rpc_bridge::config::loader::parse_config;
use rest_rpc_bridge::config::{ConfigError, MethodConfig, ValidationError};
use rest_rpc_bridge::registry::{MethodDescriptor, ServiceDescriptor};
use rest_rpc_bridge::rest::MemoryRequest;
use rest_rpc_bridge::{ArgumentBinder, Convention};

const CONFIG: &str = r#"
[[services]]
interface_name = "UserProvider"
path = "/users"

[[services.methods]]
method_name = "UpdateUser"
path = "/{id}"
method_type = "PUT"
path_params = "0:id"
body = 1
headers = { 2 = "X-Tenant" }

[[services.methods]]
method_name = "Search"
path = "/search"
query_params = "0:q,1:page,3:tag"
"#;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Profile {
    name: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[test]
fn test_typed_binding_from_config() {
    let config = parse_config(CONFIG).expect("config should be valid");
    let methods = config.services[0].method_configs();
    let update = &methods[0];
    assert_eq!(update.path, "/users/{id}");

    let descriptor = MethodDescriptor::new(vec![
        ArgType::int32(),
        ArgType::pointer_to(ArgKind::Opaque(StructType::of::<Profile>())),
        ArgType::string(),
    ]);
    let request = MemoryRequest::new()
        .with_path("id", "17")
        .with_header("x-tenant", "acme")
        .with_json(&json!({"name": "ann", "tags": ["a"]}));

    let binding = ArgumentBinder::new(update, &descriptor).bind(&request);
    assert_eq!(binding.convention, Convention::Typed);
    assert_eq!(
        binding.args,
        vec![
            ArgValue::Int32(17),
            ArgValue::Struct(json!({"name": "ann", "tags": ["a"]})),
            ArgValue::from("acme"),
        ]
    );
    assert!(binding.diagnostics.is_empty());

    // A body that does not fit the struct keeps the zero instance.
    let wrong_shape = MemoryRequest::new()
        .with_path("id", "17")
        .with_json(&json!({"name": 5}));
    let binding = ArgumentBinder::new(update, &descriptor).bind(&wrong_shape);
    assert_eq!(binding.args[1], ArgValue::Struct(json!({"name": "", "tags": []})));
    assert_eq!(binding.diagnostics.len(), 1);
    assert_eq!(binding.diagnostics[0].origin(), ParamSource::Body);
}

#[test]
fn test_generic_binding_from_config() {
    let config = parse_config(CONFIG).unwrap();
    let methods = config.services[0].method_configs();
    let search = &methods[1];
    let service = ServiceDescriptor::new("UserProvider")
        .with_method("Search", MethodDescriptor::new(vec![ArgType::any_sequence()]));
    let descriptor = service.method("Search").unwrap();

    let request = MemoryRequest::new()
        .with_query("q", "bob")
        .with_query("tag", "x")
        .with_query("tag", "y");
    let binding = ArgumentBinder::new(search, descriptor).bind(&request);

    assert_eq!(binding.convention, Convention::Generic);
    assert_eq!(
        binding.args,
        vec![
            ArgValue::from("bob"),
            ArgValue::List(vec![]),
            ArgValue::Absent,
            ArgValue::List(vec!["x".into(), "y".into()]),
        ]
    );
}

#[test]
fn test_diagnostics_name_the_slot() {
    let config = parse_config(CONFIG).unwrap();
    let methods = config.services[0].method_configs();
    let search = &methods[1];
    let descriptor = MethodDescriptor::new(vec![ArgType::string(), ArgType::int64()]);

    let binding = ArgumentBinder::new(search, &descriptor)
        .bind(&MemoryRequest::new().with_query("q", "x").with_query("page", "two"));

    assert_eq!(binding.args, vec![ArgValue::from("x"), ArgValue::Int64(0)]);
    assert_eq!(binding.diagnostics.len(), 2);
    assert!(matches!(
        &binding.diagnostics[0],
        BindingError::Coercion { index: 1, name, .. } if name == "page"
    ));
    assert_eq!(
        binding.diagnostics[1],
        BindingError::IndexOutOfRange {
            origin: ParamSource::Query,
            index: 3,
            arity: 2,
        }
    );
    assert_eq!(
        binding.diagnostics[1].to_string(),
        "query param index 3 is outside the 2 declared arguments"
    );
}

#[test]
fn test_oversized_generic_index() {
    let oversized = r#"
[[services]]
interface_name = "UserProvider"

[[services.methods]]
method_name = "Tagged"
path = "/tagged"
query_params = "2147483647:tag"
signature = ["[]any"]
"#;
    match parse_config(oversized) {
        Err(ConfigError::Validation(errors)) => assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::GenericIndexLimit { index: i32::MAX, .. }))),
        _ => panic!("config with index {} should be rejected", i32::MAX),
    }

    // Built in code, the same route binds without allocating the slot.
    let method = MethodConfig::new("Tagged").with_query_param(i32::MAX, "tag");
    let descriptor = MethodDescriptor::new(vec![ArgType::any_sequence()]);
    let binding = ArgumentBinder::new(&method, &descriptor)
        .bind(&MemoryRequest::new().with_query("tag", "x"));

    assert_eq!(binding.convention, Convention::Generic);
    assert!(binding.args.len() <= MAX_GENERIC_ARGS);
    assert_eq!(binding.args, vec![ArgValue::Absent]);
    assert_eq!(
        binding.diagnostics,
        vec![BindingError::IndexOutOfRange {
            origin: ParamSource::Query,
            index: i32::MAX,
            arity: 1,
        }]
    );
}
