//! Conversation and request/response types shared by every provider
//!
//! The shapes follow the Anthropic Messages API closely enough that the
//! structured-tool adapter can serialize them directly; the text-emulated
//! adapter flattens them into a single prompt instead.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

/// One provider call: the whole conversation plus what the model may use
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Persona and session rules
    pub system_prompt: String,
    /// Seed turn followed by every assistant/tool-result pair so far
    pub messages: Vec<Message>,
    /// Descriptors advertised to the model
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
}

/// A turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    fn new(role: Role, content: MessageContent) -> Self {
        Self { role, content }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text(text.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text(text.into()))
    }

    /// User turn made of content blocks (tool results)
    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        debug!(blocks = blocks.len(), "Message::user_blocks: called");
        Self::new(Role::User, MessageContent::Blocks(blocks))
    }

    /// Assistant turn that replays provider content byte for byte
    pub fn assistant_raw(content: Value) -> Self {
        Self::new(Role::Assistant, MessageContent::Raw(content))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Body of a turn
///
/// `Raw` holds a provider payload that must go back exactly as received so
/// the provider can correlate the following tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
    Raw(Value),
}

impl MessageContent {
    /// Plain text, when the turn is plain text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Text as-is, anything structured as compact JSON
    pub fn to_flat_string(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => serde_json::to_string(blocks).unwrap_or_default(),
            MessageContent::Raw(value) => value.to_string(),
        }
    }
}

/// Typed block inside a turn, tagged the way the Messages API tags them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    /// Result block answering the tool call with `tool_use_id`
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error,
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Correlation token, provider-assigned or synthesized
    pub id: String,
    pub name: String,
    pub input: Value,
    /// Ids of further calls in the same reply that are not executed
    pub skipped: Vec<String>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            skipped: Vec::new(),
        }
    }
}

/// Normalized reply from any provider
#[derive(Debug, Clone)]
pub enum ModelReply {
    /// The model answered; the run is done
    Final { text: String },

    /// The model wants a tool. `assistant` is the turn to append to the
    /// conversation before the tool result.
    ToolCall { call: ToolCall, assistant: Message },
}

/// What the model is told about one tool
///
/// Descriptors loaded from disk keep their original JSON in `raw`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    #[serde(skip)]
    pub raw: Option<Value>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            raw: None,
        }
    }

    /// Messages API tool entry
    ///
    /// A loaded descriptor already written with `input_schema` goes out
    /// untouched; anything else is rebuilt from the normalized fields.
    pub fn to_anthropic_schema(&self) -> Value {
        if let Some(raw) = self.raw.as_ref().filter(|r| r.get("input_schema").is_some()) {
            debug!(name = %self.name, "ToolDefinition::to_anthropic_schema: forwarding raw descriptor");
            return raw.clone();
        }
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_and_content() {
        let seed = Message::user("Build a CLI");
        assert_eq!(seed.role, Role::User);
        assert_eq!(seed.content.as_text(), Some("Build a CLI"));

        let raw = Message::assistant_raw(json!([{"type": "thinking", "thinking": "hmm"}]));
        assert_eq!(raw.role, Role::Assistant);
        assert!(raw.content.as_text().is_none());
    }

    #[test]
    fn test_content_block_tags() {
        let block = ContentBlock::tool_result("toolu_1", "{\"status\":\"success\"}", false);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_result");
        assert_eq!(value["tool_use_id"], "toolu_1");

        let parsed: ContentBlock =
            serde_json::from_value(json!({"type": "tool_use", "id": "a", "name": "n", "input": {}})).unwrap();
        assert!(matches!(parsed, ContentBlock::ToolUse { ref id, .. } if id == "a"));
    }

    #[test]
    fn test_raw_content_serializes_untouched() {
        let payload = json!([{"type": "text", "text": "hi"}, {"type": "tool_use", "id": "x", "name": "t", "input": {}}]);
        let msg = Message::assistant_raw(payload.clone());
        assert_eq!(serde_json::to_value(&msg.content).unwrap(), payload);
    }

    #[test]
    fn test_normalized_schema() {
        let tool = ToolDefinition::new(
            "file_management",
            "Manage files",
            json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]}),
        );

        let schema = tool.to_anthropic_schema();
        assert_eq!(schema["name"], "file_management");
        assert_eq!(schema["input_schema"]["required"][0], "path");
    }

    #[test]
    fn test_raw_descriptor_forwarded_only_with_input_schema() {
        let raw = json!({
            "name": "search",
            "description": "Search",
            "input_schema": {"type": "object"},
            "cache_control": {"type": "ephemeral"}
        });
        let mut tool = ToolDefinition::new("search", "Search", json!({"type": "object"}));
        tool.raw = Some(raw.clone());
        assert_eq!(tool.to_anthropic_schema(), raw);

        tool.raw = Some(json!({"name": "search", "parameters": {"type": "object"}}));
        let schema = tool.to_anthropic_schema();
        assert!(schema.get("parameters").is_none());
        assert_eq!(schema["input_schema"], json!({"type": "object"}));
    }

    #[test]
    fn test_flat_string_for_blocks() {
        let content = MessageContent::Blocks(vec![ContentBlock::tool_result("t1", "ok", false)]);
        let flat = content.to_flat_string();
        assert!(flat.contains("tool_result"));
        assert!(flat.contains("t1"));
    }
}
