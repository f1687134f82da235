//! ProviderAdapter trait definition

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{CompletionRequest, LlmError, Message, ModelReply, ToolCall};
use crate::tools::ToolResult;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Longest single wait between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// One model endpoint, normalized to a single reply shape
///
/// Every provider answers a `CompletionRequest` with either final text or one
/// tool call. The adapter also owns how the conversation has to be threaded
/// for its protocol: the assistant turn that precedes a tool result comes back
/// inside `ModelReply::ToolCall`, and `tool_result_message` builds the turn
/// that answers it. The orchestration loop never needs to know which provider
/// it is talking to.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Send the conversation and normalize the reply
    async fn call(&self, request: &CompletionRequest) -> Result<ModelReply, LlmError>;

    /// Build the turn carrying a tool result back to the model
    fn tool_result_message(&self, call: &ToolCall, result: &ToolResult) -> Message;
}

/// POST a JSON body, retrying transient failures with exponential backoff
///
/// A rate-limited response waits at least as long as the provider asked,
/// capped at `MAX_BACKOFF`.
pub(crate) async fn post_json(
    http: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
) -> Result<serde_json::Value, LlmError> {
    debug!(%url, "post_json: called");
    let mut attempt = 0;

    loop {
        match send_once(http, url, headers, body).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                let wait = e.retry_after().map_or(backoff, |r| r.max(backoff)).min(MAX_BACKOFF);
                attempt += 1;
                warn!(attempt, wait_ms = wait.as_millis() as u64, error = %e, "post_json: retrying");
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                debug!(attempt, error = %e, "post_json: giving up");
                return Err(e);
            }
        }
    }
}

async fn send_once(
    http: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
) -> Result<serde_json::Value, LlmError> {
    let mut builder = http.post(url).json(body);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let response = builder.send().await.map_err(|e| LlmError::from_transport(e, url))?;
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("body is not JSON: {}", e)));
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let message = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "send_once: non-success status");
    Err(LlmError::from_status(status.as_u16(), message, retry_after))
}

#[cfg(test)]
pub mod mock {
    //! Scripted provider for unit tests

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::llm::ContentBlock;
    use crate::llm::gemini::{reply_from_text, tool_result_turn};

    /// What the scripted provider should answer on a given call
    #[derive(Debug, Clone)]
    pub enum Scripted {
        Final(String),
        Tool { name: String, input: serde_json::Value },
    }

    /// How the scripted provider threads tool turns
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Protocol {
        /// Raw `tool_use` assistant turns and `tool_result` blocks
        Structured,
        /// Marker text parsed the way the Gemini adapter parses it
        TextEmulated,
    }

    /// Provider that replays a fixed script; the last entry repeats forever
    pub struct MockProvider {
        script: Vec<Scripted>,
        protocol: Protocol,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockProvider {
        pub fn new(script: Vec<Scripted>) -> Self {
            Self::with_protocol(script, Protocol::Structured)
        }

        pub fn text_emulated(script: Vec<Scripted>) -> Self {
            Self::with_protocol(script, Protocol::TextEmulated)
        }

        fn with_protocol(script: Vec<Scripted>, protocol: Protocol) -> Self {
            debug!(steps = %script.len(), ?protocol, "MockProvider::with_protocol: called");
            Self {
                script,
                protocol,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<CompletionRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn call(&self, request: &CompletionRequest) -> Result<ModelReply, LlmError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            let step = self
                .script
                .get(idx)
                .or_else(|| self.script.last())
                .cloned()
                .ok_or_else(|| LlmError::InvalidResponse("empty script".to_string()))?;

            if self.protocol == Protocol::TextEmulated {
                let text = match step {
                    Scripted::Final(text) => text,
                    Scripted::Tool { name, input } => serde_json::json!({"tool": name, "input": input}).to_string(),
                };
                return Ok(reply_from_text(text));
            }

            Ok(match step {
                Scripted::Final(text) => ModelReply::Final { text },
                Scripted::Tool { name, input } => {
                    let call = ToolCall::new(format!("toolu_{}", idx), name.clone(), input.clone());
                    let assistant = Message::assistant_raw(serde_json::json!([
                        {"type": "tool_use", "id": call.id, "name": name, "input": input}
                    ]));
                    ModelReply::ToolCall { call, assistant }
                }
            })
        }

        fn tool_result_message(&self, call: &ToolCall, result: &ToolResult) -> Message {
            if self.protocol == Protocol::TextEmulated {
                return tool_result_turn(result);
            }
            Message::user_blocks(vec![ContentBlock::tool_result(
                call.id.clone(),
                result.to_json_string(),
                result.is_error(),
            )])
        }
    }

    #[tokio::test]
    async fn test_mock_provider_repeats_last_step() {
        let provider = MockProvider::new(vec![Scripted::Final("done".to_string())]);
        let request = CompletionRequest {
            system_prompt: "Test".to_string(),
            messages: vec![],
            tools: vec![],
            max_tokens: 100,
        };

        for _ in 0..2 {
            let reply = provider.call(&request).await.unwrap();
            assert!(matches!(reply, ModelReply::Final { ref text } if text == "done"));
        }
        assert_eq!(provider.call_count(), 2);
    }
}
