//! Loop configuration types

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;

/// Limits for one orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Tool-executing turns allowed before the run is declared exhausted
    pub max_loops: u32,

    /// Max tokens requested per model call
    pub max_tokens: u32,

    /// Default subprocess timeout, surfaced in the system prompt
    pub timeout_seconds: u64,
}

impl LoopConfig {
    /// Take the limits from application configuration
    pub fn from_config(config: &Config, max_tokens: u32) -> Self {
        debug!(max_loops = config.orchestration.max_loops, %max_tokens, "LoopConfig::from_config: called");
        Self {
            max_loops: config.orchestration.max_loops,
            max_tokens,
            timeout_seconds: config.execution.timeout_seconds,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_loops: 15,
            max_tokens: 8192,
            timeout_seconds: 30,
        }
    }
}
