//! Tool trait definition

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use super::ToolError;
use super::context::ToolContext;

/// A tool that can be called by the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the name the model calls)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    ///
    /// Handlers report failures through the returned result and never panic.
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// Outcome tag carried by every tool result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
    /// The tool is declared but performs no real work
    Simulated,
    /// The command ran and reported failure (test runs)
    Failed,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Simulated => "simulated",
            Self::Failed => "failed",
        }
    }
}

/// Result of a tool execution
///
/// Serializes as one flat JSON object with `status` first, followed by the
/// tool-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub status: ToolStatus,
    pub fields: Map<String, Value>,
}

impl ToolResult {
    fn with_status(status: ToolStatus) -> Self {
        Self {
            status,
            fields: Map::new(),
        }
    }

    /// Create a successful result from a JSON object payload
    ///
    /// A non-object payload is stored under `result`.
    pub fn success(payload: Value) -> Self {
        debug!("ToolResult::success: called");
        Self::with_status(ToolStatus::Success).merge(payload)
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        debug!("ToolResult::error: called");
        Self::with_status(ToolStatus::Error).with("message", message.into())
    }

    /// Create a simulated result
    pub fn simulated(message: impl Into<String>) -> Self {
        debug!("ToolResult::simulated: called");
        Self::with_status(ToolStatus::Simulated).with("message", message.into())
    }

    /// Add or replace one field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    fn merge(mut self, payload: Value) -> Self {
        match payload {
            Value::Object(map) => self.fields.extend(map),
            Value::Null => {}
            other => {
                self.fields.insert("result".to_string(), other);
            }
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The `message` field, if there is one
    pub fn message(&self) -> Option<&str> {
        self.get("message").and_then(Value::as_str)
    }

    /// Compact JSON text used as the tool-result payload sent to the model
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!("{{\"status\":\"error\",\"message\":\"unserializable tool result: {}\"}}", e)
        })
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::error(err.to_string())
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = self.fields.keys().filter(|k| k.as_str() != "status").count();
        let mut map = serializer.serialize_map(Some(extra + 1))?;
        map.serialize_entry("status", &self.status)?;
        for (k, v) in &self.fields {
            if k != "status" {
                map.serialize_entry(k, v)?;
            }
        }
        map.end()
    }
}

/// Required string parameter
pub fn required_str<'a>(input: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    match input.get(name) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(Value::Null) | None => Err(ToolError::missing(name)),
        Some(_) => Err(ToolError::InvalidType {
            name: name.to_string(),
            expected: "string".to_string(),
        }),
    }
}

/// Optional string parameter with a default
pub fn optional_str<'a>(input: &'a Value, name: &str, default: &'a str) -> &'a str {
    input.get(name).and_then(Value::as_str).unwrap_or(default)
}

pub fn optional_bool(input: &Value, name: &str, default: bool) -> bool {
    input.get(name).and_then(Value::as_bool).unwrap_or(default)
}

pub fn optional_u64(input: &Value, name: &str) -> Option<u64> {
    input.get(name).and_then(Value::as_u64)
}
