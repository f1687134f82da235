//! Model provider adapters
//!
//! Two protocols sit behind one [`ProviderAdapter`] trait: the structured-tool
//! Anthropic Messages API and the text-emulated Gemini endpoint.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod gemini;
mod types;

pub use anthropic::AnthropicClient;
pub use client::ProviderAdapter;
pub use error::LlmError;
pub use gemini::{GeminiClient, parse_tool_marker};
pub use types::{
    CompletionRequest, ContentBlock, Message, MessageContent, ModelReply, Role, ToolCall, ToolDefinition,
};

use crate::config::{LlmConfig, ResolvedLlmConfig};

/// Create a provider adapter for the configured provider
///
/// Supports "anthropic" and "gemini" providers.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn ProviderAdapter>, LlmError> {
    let resolved = config.resolve().map_err(|e| LlmError::Configuration(e.to_string()))?;
    create_provider_from_resolved(&resolved)
}

/// Create a provider adapter from an already resolved configuration
pub fn create_provider_from_resolved(config: &ResolvedLlmConfig) -> Result<Arc<dyn ProviderAdapter>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_provider_from_resolved: called");
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::from_config(config)?)),
        "gemini" => Ok(Arc::new(GeminiClient::from_config(config)?)),
        other => {
            debug!(provider = %other, "create_provider_from_resolved: unknown provider");
            Err(LlmError::Configuration(format!(
                "Unknown LLM provider: '{}'. Supported: anthropic, gemini",
                other
            )))
        }
    }
}
