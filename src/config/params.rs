//! Index → parameter-name maps.
//!
//! Written either as a table (`path_params = { 0 = "id", 2 = "tag" }`) or in
//! compact form (`path_params = "0:id,2:tag"`). Keys are argument positions.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Argument index → external parameter name, iterated in index order.
pub type ParamMap = BTreeMap<i32, String>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Compact(String),
    Table(BTreeMap<String, String>),
}

/// Parse the compact `index:name` list form.
pub fn parse_compact(compact: &str) -> Result<ParamMap, String> {
    let mut map = ParamMap::new();
    for entry in compact.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (index, name) = entry
            .split_once(':')
            .ok_or_else(|| format!("param entry `{}` is not `index:name`", entry))?;
        let index = parse_index(index)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("param entry `{}` has an empty name", entry));
        }
        map.insert(index, name.to_string());
    }
    Ok(map)
}

fn parse_index(raw: &str) -> Result<i32, String> {
    raw.trim()
        .parse::<i32>()
        .map_err(|e| format!("param index `{}` is not an integer: {}", raw.trim(), e))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<ParamMap, D::Error>
where
    D: Deserializer<'de>,
{
    match Repr::deserialize(deserializer)? {
        Repr::Compact(compact) => parse_compact(&compact).map_err(D::Error::custom),
        Repr::Table(table) => table
            .into_iter()
            .map(|(k, v)| parse_index(&k).map(|i| (i, v)))
            .collect::<Result<ParamMap, _>>()
            .map_err(D::Error::custom),
    }
}

pub fn serialize<S>(map: &ParamMap, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let table: BTreeMap<String, &String> = map.iter().map(|(k, v)| (k.to_string(), v)).collect();
    table.serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Holder {
        #[serde(default, with = "super")]
        params: ParamMap,
    }

    #[test]
    fn test_compact_form() {
        let map = parse_compact("0:id, 2:tag").unwrap();
        assert_eq!(map.get(&0).map(String::as_str), Some("id"));
        assert_eq!(map.get(&2).map(String::as_str), Some("tag"));
        assert!(parse_compact("").unwrap().is_empty());
    }

    #[test]
    fn test_compact_errors() {
        assert!(parse_compact("id").is_err());
        assert!(parse_compact("x:id").is_err());
        assert!(parse_compact("0:").is_err());
    }

    #[test]
    fn test_deserialize_both_forms() {
        let h: Holder = toml::from_str(r#"params = "0:id,1:name""#).unwrap();
        assert_eq!(h.params.len(), 2);

        let h: Holder = toml::from_str("params = { 0 = \"id\", -1 = \"bad\" }").unwrap();
        assert_eq!(h.params.get(&-1).map(String::as_str), Some("bad"));

        let h: Holder = toml::from_str("").unwrap();
        assert!(h.params.is_empty());
    }

    #[test]
    fn test_serialize_as_table() {
        let mut params = ParamMap::new();
        params.insert(3, "tag".into());
        let json = serde_json::to_value(Holder { params }).unwrap();
        assert_eq!(json, serde_json::json!({"params": {"3": "tag"}}));
    }
}
