//! Shape checks for tool descriptors before they are advertised.

/// Validate a tool descriptor.
///
/// The name must be non-empty and the schema must be a JSON object whose
/// `properties` is a mapping. When `type` is present it must be `"object"`.
/// Returns `Err(message)` describing the first violation found.
pub fn validate_descriptor(name: &str, schema: &serde_json::Value) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("tool name must not be empty".to_string());
    }

    let obj = schema
        .as_object()
        .ok_or_else(|| format!("parameter schema must be an object, got {}", json_type_name(schema)))?;

    if let Some(schema_type) = obj.get("type") {
        if schema_type.as_str() != Some("object") {
            return Err(format!("parameter schema type must be 'object', got {schema_type}"));
        }
    }

    match obj.get("properties") {
        Some(props) if props.is_object() => Ok(()),
        Some(props) => Err(format!(
            "'properties' must be an object, got {}",
            json_type_name(props)
        )),
        None => Err("parameter schema is missing 'properties'".to_string()),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
