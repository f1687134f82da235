//! Anthropic Messages API adapter (structured-tool protocol)
//!
//! The endpoint has native tool calling: tools are declared in the request and
//! the response carries `tool_use` blocks. The raw response content is kept so
//! it can be echoed back unchanged as the next assistant turn, which the API
//! requires for tool-result correlation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::client::post_json;
use super::{
    CompletionRequest, ContentBlock, LlmError, Message, MessageContent, ModelReply, ProviderAdapter, ToolCall,
};
use crate::config::ResolvedLlmConfig;
use crate::tools::ToolResult;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude API client
pub struct AnthropicClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "AnthropicClient::from_config: called");
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

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens.min(self.max_tokens),
            "system": request.system_prompt,
            "messages": convert_messages(&request.messages),
        });

        if !request.tools.is_empty() {
            debug!("build_request_body: adding tools");
            body["tools"] = serde_json::json!(
                request
                    .tools
                    .iter()
                    .map(|t| t.to_anthropic_schema())
                    .collect::<Vec<_>>()
            );
        }

        body
    }
}

/// Convert internal messages to Anthropic API format
fn convert_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    debug!(message_count = %messages.len(), "convert_messages: called");
    messages
        .iter()
        .map(|msg| {
            let content = match &msg.content {
                MessageContent::Text(text) => serde_json::json!(text),
                MessageContent::Blocks(blocks) => serde_json::json!(blocks),
                MessageContent::Raw(raw) => raw.clone(),
            };

            serde_json::json!({
                "role": msg.role,
                "content": content,
            })
        })
        .collect()
}

/// Result content sent for a `tool_use` block that was not executed
const SKIPPED_RESULT: &str = "Only one tool call is executed per turn. This call was skipped; request it again if needed.";

/// Normalize a Messages API response body
///
/// On a `tool_use` stop the first `tool_use` block wins and the whole content
/// array becomes the assistant turn. The ids of any later `tool_use` blocks
/// are kept so each still gets an error result. Otherwise the first text
/// block is the answer.
pub(crate) fn parse_response(body: serde_json::Value) -> Result<ModelReply, LlmError> {
    let stop_reason = body["stop_reason"].as_str().unwrap_or_default();
    debug!(%stop_reason, "parse_response: called");

    let content = body
        .get("content")
        .filter(|c| c.is_array())
        .cloned()
        .ok_or_else(|| LlmError::InvalidResponse("response has no content array".to_string()))?;
    let blocks = content.as_array().map(Vec::as_slice).unwrap_or_default();

    if stop_reason == "tool_use" {
        let mut tool_uses = blocks.iter().filter(|b| b["type"] == "tool_use");
        let tool_use = tool_uses
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("tool_use stop without a tool_use block".to_string()))?;

        let mut call = ToolCall::new(
            tool_use["id"].as_str().unwrap_or_default(),
            tool_use["name"].as_str().unwrap_or_default(),
            tool_use.get("input").cloned().unwrap_or_else(|| serde_json::json!({})),
        );
        call.skipped = tool_uses
            .filter_map(|b| b["id"].as_str())
            .map(str::to_string)
            .collect();
        debug!(id = %call.id, name = %call.name, skipped = call.skipped.len(), "parse_response: tool requested");

        return Ok(ModelReply::ToolCall {
            call,
            assistant: Message::assistant_raw(content),
        });
    }

    let text = match blocks.first() {
        Some(first) if first["type"] == "text" => first["text"].as_str().unwrap_or_default().to_string(),
        _ => blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    };
    debug!(text_len = text.len(), "parse_response: final text");
    Ok(ModelReply::Final { text })
}

#[async_trait]
impl ProviderAdapter for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn call(&self, request: &CompletionRequest) -> Result<ModelReply, LlmError> {
        debug!(%self.model, message_count = request.messages.len(), "AnthropicClient::call: called");
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request_body(request);

        let headers = [
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("content-type", "application/json"),
        ];
        let response = post_json(&self.http, &url, &headers, &body).await?;
        parse_response(response)
    }

    fn tool_result_message(&self, call: &ToolCall, result: &ToolResult) -> Message {
        debug!(id = %call.id, "AnthropicClient::tool_result_message: called");
        let mut blocks = vec![ContentBlock::tool_result(
            call.id.clone(),
            result.to_json_string(),
            result.is_error(),
        )];
        if !call.skipped.is_empty() {
            let skipped = ToolResult::error(SKIPPED_RESULT).to_json_string();
            blocks.extend(
                call.skipped
                    .iter()
                    .map(|id| ContentBlock::tool_result(id.clone(), skipped.clone(), true)),
            );
        }
        Message::user_blocks(blocks)
    }
}
