//! JSON-schema-like structure inference from a sample response value.

use serde_json::Value;

use super::yaml::{YamlValue, YamlEntry};

/// Infer a schema node from a sample value. Objects recurse per key, arrays
/// take their item shape from the first element (string items when empty),
/// primitives carry their sample as an `example`.
pub fn infer_schema(value: &Value) -> YamlValue {
    match value {
        Value::Object(map) => {
            let properties: Vec<YamlEntry> = map
                .iter()
                .map(|(key, child)| YamlValue::pair(key, infer_schema(child)))
                .collect();
            YamlValue::Mapping(vec![
                YamlValue::pair("type", YamlValue::raw("object")),
                YamlValue::pair("properties", YamlValue::Mapping(properties)),
            ])
        }
        Value::Array(items) => {
            let item_schema = match items.first() {
                Some(first) => infer_schema(first),
                None => YamlValue::Mapping(vec![YamlValue::pair(
                    "type",
                    YamlValue::raw("string"),
                )]),
            };
            YamlValue::Mapping(vec![
                YamlValue::pair("type", YamlValue::raw("array")),
                YamlValue::pair("items", item_schema),
            ])
        }
        Value::String(text) => YamlValue::Mapping(vec![
            YamlValue::pair("type", YamlValue::raw("string")),
            YamlValue::pair("example", YamlValue::string(text)),
        ]),
        Value::Number(number) => YamlValue::Mapping(vec![
            YamlValue::pair("type", YamlValue::raw("number")),
            YamlValue::pair("example", YamlValue::raw(number.to_string())),
        ]),
        Value::Bool(flag) => YamlValue::Mapping(vec![
            YamlValue::pair("type", YamlValue::raw("boolean")),
            YamlValue::pair("example", YamlValue::raw(flag.to_string())),
        ]),
        Value::Null => YamlValue::Mapping(vec![
            YamlValue::pair("type", YamlValue::raw("null")),
            YamlValue::pair("example", YamlValue::raw("null")),
        ]),
    }
}

/// Fallback used when a sample body does not parse as JSON.
pub fn string_schema() -> YamlValue {
    YamlValue::Mapping(vec![YamlValue::pair("type", YamlValue::raw("string"))])
}
