use serde_json::Value;

/// Fields a payload must carry, as JSON pointers paired with display names.
const REQUIRED_FIELDS: [(&str, &str); 4] = [
    ("/business_name", "business_name"),
    ("/location/city", "location.city"),
    ("/location/state", "location.state"),
    ("/keywords", "keywords"),
];

/// JavaScript-style truthiness. Objects and arrays are truthy even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Names of the required fields that are absent or falsy, in a stable order.
pub fn missing_fields(payload: &Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .filter(|(pointer, _)| !payload.pointer(pointer).map(is_truthy).unwrap_or(false))
        .map(|(_, name)| *name)
        .collect()
}

pub fn missing_fields_message(missing: &[&str]) -> String {
    format!("Missing required fields: {}", missing.join(", "))
}
