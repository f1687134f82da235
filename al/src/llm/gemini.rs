//! Gemini generateContent adapter (text-emulated tool protocol)
//!
//! This endpoint is driven without native function calling. The conversation
//! and the tool listing are flattened into one prompt and the model is asked
//! to answer with a small JSON marker when it wants a tool. Anything that does
//! not parse as a marker is a final answer.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use super::client::post_json;
use super::{CompletionRequest, LlmError, Message, ModelReply, ProviderAdapter, ToolCall, ToolDefinition};
use crate::config::ResolvedLlmConfig;
use crate::tools::ToolResult;

/// Instruction appended after the tool listing
const TOOL_INSTRUCTION: &str = "If you need to use a tool, respond with JSON: \
     {\"tool\": \"tool_name\", \"input\": {...}}\nOtherwise, provide your final response.";

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").expect("fence pattern is valid")
});

/// Google Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl GeminiClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "GeminiClient::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let prompt = flatten_prompt(&request.system_prompt, &request.messages, &request.tools);
        debug!(prompt_len = prompt.len(), "GeminiClient::build_request_body: called");
        serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "maxOutputTokens": request.max_tokens.min(self.max_tokens) },
        })
    }
}

/// Flatten system prompt, conversation and tool listing into one prompt
pub(crate) fn flatten_prompt(system_prompt: &str, messages: &[Message], tools: &[ToolDefinition]) -> String {
    let mut prompt = format!("{}\n\n", system_prompt);

    for msg in messages {
        prompt.push_str(&format!(
            "{}: {}\n\n",
            msg.role.as_str().to_uppercase(),
            msg.content.to_flat_string()
        ));
    }

    let listing: Vec<serde_json::Value> = tools.iter().map(|t| t.to_anthropic_schema()).collect();
    let listing = serde_json::to_string_pretty(&listing).unwrap_or_else(|_| "[]".to_string());
    prompt.push_str(&format!("\nAvailable tools:\n{}\n\n{}", listing, TOOL_INSTRUCTION));
    prompt
}

/// Try to read a tool marker out of a model reply
///
/// A parse is only attempted when the whole reply (optionally inside a json
/// code fence) is an object that mentions a `"tool"` key. Any failure returns
/// `None` so the caller treats the reply as prose.
pub fn parse_tool_marker(text: &str) -> Option<(String, serde_json::Value)> {
    let trimmed = text.trim();
    let candidate = FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    if !candidate.starts_with('{') || !candidate.contains("\"tool\"") {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "parse_tool_marker: marker did not parse, treating as prose");
            return None;
        }
    };

    let name = value.get("tool")?.as_str()?.to_string();
    let input = match value.get("input") {
        None | Some(serde_json::Value::Null) => serde_json::json!({}),
        Some(v) if v.is_object() => v.clone(),
        Some(_) => {
            debug!("parse_tool_marker: input is not an object, treating as prose");
            return None;
        }
    };

    Some((name, input))
}

/// Extract the concatenated text of the first candidate
fn response_text(body: &serde_json::Value) -> Result<String, LlmError> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| LlmError::InvalidResponse("response has no candidate parts".to_string()))?;

    Ok(parts.iter().filter_map(|p| p["text"].as_str()).collect::<Vec<_>>().join(""))
}

/// Normalize a reply text into a `ModelReply`
pub(crate) fn reply_from_text(text: String) -> ModelReply {
    match parse_tool_marker(&text) {
        Some((name, input)) => {
            let call = ToolCall::new(format!("emulated_{}", Uuid::now_v7().simple()), name, input);
            debug!(id = %call.id, name = %call.name, "reply_from_text: tool marker found");
            let assistant = Message::assistant(format!("Tool call: {}", call.name));
            ModelReply::ToolCall { call, assistant }
        }
        None => ModelReply::Final { text },
    }
}

/// User turn carrying a tool result inline as text
pub(crate) fn tool_result_turn(result: &ToolResult) -> Message {
    Message::user(format!("Tool result: {}", result.to_json_string()))
}

#[async_trait]
impl ProviderAdapter for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn call(&self, request: &CompletionRequest) -> Result<ModelReply, LlmError> {
        debug!(%self.model, message_count = request.messages.len(), "GeminiClient::call: called");
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request_body(request);

        let headers = [
            ("x-goog-api-key", self.api_key.as_str()),
            ("content-type", "application/json"),
        ];
        let response = post_json(&self.http, &url, &headers, &body).await?;
        Ok(reply_from_text(response_text(&response)?))
    }

    fn tool_result_message(&self, call: &ToolCall, result: &ToolResult) -> Message {
        debug!(id = %call.id, "GeminiClient::tool_result_message: called");
        tool_result_turn(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageContent;

    #[test]
    fn test_parse_plain_marker() {
        let (name, input) =
            parse_tool_marker(r#"{"tool": "file_management", "input": {"action": "list", "path": "."}}"#).unwrap();
        assert_eq!(name, "file_management");
        assert_eq!(input["action"], "list");
    }

    #[test]
    fn test_parse_fenced_marker() {
        let text = "```json\n{\"tool\": \"code_execution\", \"input\": {\"action\": \"run_shell\"}}\n```";
        let (name, _) = parse_tool_marker(text).unwrap();
        assert_eq!(name, "code_execution");
    }

    #[test]
    fn test_marker_without_input_defaults_to_empty_object() {
        let (_, input) = parse_tool_marker(r#"{"tool": "dependency_management"}"#).unwrap();
        assert_eq!(input, serde_json::json!({}));
    }

    #[test]
    fn test_malformed_marker_is_prose() {
        assert!(parse_tool_marker(r#"{"tool": "file_management", "input": {"#).is_none());
    }

    #[test]
    fn test_prose_mentioning_marker_is_prose() {
        let text = r#"Here is the format you asked about: {"tool": "x"} - no tool needed."#;
        assert!(parse_tool_marker(text).is_none());
    }

    #[test]
    fn test_non_string_tool_name_is_prose() {
        assert!(parse_tool_marker(r#"{"tool": 42, "input": {}}"#).is_none());
        assert!(parse_tool_marker(r#"{"tool": "x", "input": "oops"}"#).is_none());
    }

    #[test]
    fn test_reply_from_text_synthesizes_unique_ids() {
        let a = reply_from_text(r#"{"tool": "t", "input": {}}"#.to_string());
        let b = reply_from_text(r#"{"tool": "t", "input": {}}"#.to_string());
        match (a, b) {
            (ModelReply::ToolCall { call: ca, assistant }, ModelReply::ToolCall { call: cb, .. }) => {
                assert!(ca.id.starts_with("emulated_"));
                assert_ne!(ca.id, cb.id);
                assert_eq!(assistant.content.as_text(), Some("Tool call: t"));
            }
            other => panic!("expected two tool calls, got {:?}", other),
        }
    }

    #[test]
    fn test_reply_from_text_final() {
        let reply = reply_from_text("The project is ready.".to_string());
        assert!(matches!(reply, ModelReply::Final { ref text } if text == "The project is ready."));
    }

    #[test]
    fn test_flatten_prompt_includes_turns_and_tools() {
        let messages = vec![
            Message::user("Build it"),
            Message::assistant("Tool call: file_management"),
            Message::user("Tool result: {\"status\":\"success\"}"),
        ];
        let tools = vec![ToolDefinition::new("file_management", "Files", serde_json::json!({}))];

        let prompt = flatten_prompt("SYSTEM", &messages, &tools);
        assert!(prompt.starts_with("SYSTEM\n\n"));
        assert!(prompt.contains("USER: Build it"));
        assert!(prompt.contains("ASSISTANT: Tool call: file_management"));
        assert!(prompt.contains("\"name\": \"file_management\""));
        assert!(prompt.ends_with("Otherwise, provide your final response."));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}]
        });
        assert_eq!(response_text(&body).unwrap(), "Hello world");
        assert!(response_text(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_tool_result_message_is_inlined_text() {
        let client = GeminiClient {
            model: "gemini-1.5-pro".to_string(),
            api_key: "k".to_string(),
            base_url: "https://example.invalid".to_string(),
            http: Client::new(),
            max_tokens: 100,
        };
        let call = ToolCall::new("emulated_1", "file_management", serde_json::json!({}));
        let msg = client.tool_result_message(&call, &ToolResult::simulated("nothing to do"));
        match msg.content {
            MessageContent::Text(text) => {
                assert!(text.starts_with("Tool result: "));
                assert!(text.contains("simulated"));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }
}
