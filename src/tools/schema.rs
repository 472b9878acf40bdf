//! Minimal JSON-schema checks for tool arguments
//!
//! Covers what tool descriptors declare in practice: top-level `object`,
//! `required` keys, per-property `type` and `enum`, and
//! `additionalProperties: false`.

use serde_json::{Map, Value};

/// Check `arguments` against a tool's parameter schema
///
/// # Errors
///
/// Returns a description of the first violation found
pub fn validate_arguments(schema: &Value, arguments: &Map<String, Value>) -> Result<(), String> {
    if let Some(kind) = schema.get("type").and_then(Value::as_str)
        && kind != "object"
    {
        return Err(format!("schema type must be object, found {kind}"));
    }

    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !arguments.contains_key(key) {
                return Err(format!("missing required argument `{key}`"));
            }
        }
    }

    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (key, value) in arguments {
        let Some(spec) = properties.and_then(|p| p.get(key)) else {
            if closed {
                return Err(format!("unexpected argument `{key}`"));
            }
            continue;
        };

        if let Some(expected) = spec.get("type").and_then(Value::as_str)
            && !matches_type(expected, value)
        {
            return Err(format!("argument `{key}` must be {expected}"));
        }

        if let Some(allowed) = spec.get("enum").and_then(Value::as_array)
            && !allowed.contains(value)
        {
            return Err(format!("argument `{key}` is not an allowed value"));
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        // Unknown type keywords are not enforced
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn city_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": { "type": "string" },
                "days": { "type": "integer" },
                "unit": { "type": "string", "enum": ["c", "f"] }
            },
            "required": ["city"]
        })
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn accepts_valid_arguments() {
        let result = validate_arguments(&city_schema(), &args(json!({ "city": "Paris", "days": 3 })));
        assert!(result.is_ok());
    }

    #[test]
    fn missing_required_key() {
        let err = validate_arguments(&city_schema(), &args(json!({ "days": 3 }))).unwrap_err();
        assert!(err.contains("city"));
    }

    #[test]
    fn wrong_property_type() {
        let err = validate_arguments(&city_schema(), &args(json!({ "city": 7 }))).unwrap_err();
        assert_eq!(err, "argument `city` must be string");

        let err =
            validate_arguments(&city_schema(), &args(json!({ "city": "Oslo", "days": 1.5 })))
                .unwrap_err();
        assert!(err.contains("days"));
    }

    #[test]
    fn enum_is_enforced() {
        let err = validate_arguments(&city_schema(), &args(json!({ "city": "Oslo", "unit": "k" })))
            .unwrap_err();
        assert!(err.contains("unit"));
    }

    #[test]
    fn extra_keys_allowed_unless_closed() {
        let open = validate_arguments(&city_schema(), &args(json!({ "city": "Rome", "x": 1 })));
        assert!(open.is_ok());

        let mut closed = city_schema();
        closed["additionalProperties"] = json!(false);
        let err = validate_arguments(&closed, &args(json!({ "city": "Rome", "x": 1 }))).unwrap_err();
        assert!(err.contains("`x`"));
    }
}
