//! Tool descriptors: loading from disk and input validation

use std::path::Path;

use eyre::{Context, Result, eyre};
use serde_json::Value;
use tracing::{debug, warn};

use super::ToolError;
use crate::llm::ToolDefinition;

/// Check a tool input against the `required` list and primitive property types
///
/// Only the top level of the schema is inspected. Unknown or composite types
/// are accepted as-is.
pub fn validate_input(schema: &Value, input: &Value) -> Result<(), ToolError> {
    let Some(fields) = input.as_object() else {
        return Err(ToolError::InvalidArgument("tool input must be a JSON object".to_string()));
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            match fields.get(name) {
                None | Some(Value::Null) => return Err(ToolError::missing(name)),
                Some(_) => {}
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (name, value) in fields {
        if value.is_null() {
            continue;
        }
        let Some(expected) = properties.get(name).and_then(|p| p.get("type")) else {
            continue;
        };

        let allowed: Vec<&str> = match expected {
            Value::String(t) => vec![t.as_str()],
            Value::Array(ts) => ts.iter().filter_map(Value::as_str).collect(),
            _ => continue,
        };

        if !allowed.iter().any(|t| matches_type(t, value)) {
            debug!(%name, ?allowed, "validate_input: type mismatch");
            return Err(ToolError::InvalidType {
                name: name.clone(),
                expected: allowed.join(" or "),
            });
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

/// Load tool descriptors from every `*.json` file in a directory
///
/// A file holds either one descriptor object or an array of them. Each needs
/// a `name`; the schema is read from `input_schema` or `parameters`. The
/// original object is kept so it can be forwarded to the model unchanged.
pub fn load_tool_definitions(dir: &Path) -> Result<Vec<ToolDefinition>> {
    debug!(?dir, "load_tool_definitions: called");
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .context(format!("Failed to read tool schema directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut definitions = Vec::new();
    for path in paths {
        let content =
            std::fs::read_to_string(&path).context(format!("Failed to read tool descriptor {}", path.display()))?;
        let value: Value =
            serde_json::from_str(&content).context(format!("Invalid JSON in tool descriptor {}", path.display()))?;

        let entries = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        for entry in entries {
            let definition = parse_definition(entry).context(format!("In {}", path.display()))?;
            debug!(name = %definition.name, "load_tool_definitions: loaded");
            definitions.push(definition);
        }
    }

    if definitions.is_empty() {
        warn!(?dir, "load_tool_definitions: no descriptors found");
    }
    Ok(definitions)
}

fn parse_definition(raw: Value) -> Result<ToolDefinition> {
    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| eyre!("tool descriptor is missing a name"))?
        .to_string();
    let description = raw.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
    let input_schema = raw
        .get("input_schema")
        .or_else(|| raw.get("parameters"))
        .cloned()
        .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}}));

    if !input_schema.is_object() {
        return Err(eyre!("schema for tool '{}' must be an object", name));
    }

    let mut definition = ToolDefinition::new(name, description, input_schema);
    definition.raw = Some(raw);
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string"},
                "recursive": {"type": "boolean"},
                "timeout": {"type": "integer"},
                "packages": {"type": "array"},
                "label": {"type": ["string", "null"]}
            },
            "required": ["action"]
        })
    }

    #[test]
    fn test_valid_input() {
        let input = json!({"action": "list", "recursive": true, "timeout": 5, "extra": 1});
        assert!(validate_input(&schema(), &input).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let err = validate_input(&schema(), &json!({"recursive": true})).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: action");

        let err = validate_input(&schema(), &json!({"action": null})).unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { .. }));
    }

    #[test]
    fn test_wrong_primitive_type() {
        let err = validate_input(&schema(), &json!({"action": "x", "timeout": "soon"})).unwrap_err();
        assert!(err.to_string().contains("timeout"));

        let err = validate_input(&schema(), &json!({"action": "x", "timeout": 1.5})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidType { .. }));
    }

    #[test]
    fn test_type_union() {
        assert!(validate_input(&schema(), &json!({"action": "x", "label": "a"})).is_ok());
        assert!(validate_input(&schema(), &json!({"action": "x", "label": 3})).is_err());
    }

    #[test]
    fn test_non_object_input() {
        assert!(validate_input(&schema(), &json!("list")).is_err());
    }

    #[test]
    fn test_load_single_and_array_descriptors() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join("a.json"),
            r#"{"name": "web_search", "description": "Search", "parameters": {"type": "object", "required": ["query"]}}"#,
        )
        .unwrap();
        std::fs::write(
            temp.path().join("b.json"),
            r#"[{"name": "deploy"}, {"name": "notify", "input_schema": {"type": "object"}}]"#,
        )
        .unwrap();
        std::fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let defs = load_tool_definitions(temp.path()).unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["web_search", "deploy", "notify"]);
        assert_eq!(defs[0].input_schema["required"][0], "query");
        assert_eq!(defs[0].to_anthropic_schema()["input_schema"]["required"][0], "query");
        assert_eq!(defs[2].to_anthropic_schema(), defs[2].raw.clone().unwrap());
    }

    #[test]
    fn test_load_rejects_nameless_descriptor() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("bad.json"), r#"{"description": "no name"}"#).unwrap();
        assert!(load_tool_definitions(temp.path()).is_err());
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let temp = tempdir().unwrap();
        assert!(load_tool_definitions(&temp.path().join("missing")).is_err());
    }
}
