//! agentloop configuration types and loading
//!
//! Configuration is read once at start-up and passed by reference afterwards;
//! nothing mutates it while a run is in progress.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main agentloop configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Model provider configuration
    pub llm: LlmConfig,

    /// Loop bounds
    pub orchestration: OrchestrationConfig,

    /// Subprocess execution limits
    pub execution: ExecutionConfig,

    /// Workspace, output and asset directories
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key for the selected provider is available and
    /// that the loop bound is usable. Call this before starting a run.
    pub fn validate(&self) -> Result<()> {
        debug!("Config::validate: called");
        if self.orchestration.max_loops == 0 {
            return Err(eyre::eyre!("orchestration.max-loops must be at least 1"));
        }
        if self.execution.timeout_seconds == 0 {
            return Err(eyre::eyre!("execution.timeout-seconds must be at least 1"));
        }
        self.llm
            .resolve()
            .and_then(|r| r.get_api_key())
            .context("LLM API key not found. Check the provider's api-key-env in your config.")?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .agentloop.yml
        let local_config = PathBuf::from(".agentloop.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/agentloop/agentloop.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("agentloop").join("agentloop.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(p) => p.clone(),
            None => {
                let local = PathBuf::from(".agentloop.yml");
                if local.exists() {
                    local
                } else {
                    dirs::config_dir()?.join("agentloop").join("agentloop.yml")
                }
            }
        };
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Active provider: "anthropic" or "gemini"
    pub provider: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Settings for the Anthropic Messages API
    pub anthropic: ProviderSettings,

    /// Settings for the Gemini generateContent API
    pub gemini: ProviderSettings,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            timeout_ms: 300_000,
            anthropic: ProviderSettings::anthropic(),
            gemini: ProviderSettings::gemini(),
        }
    }
}

impl LlmConfig {
    /// Pick the settings of the active provider
    pub fn resolve(&self) -> Result<ResolvedLlmConfig> {
        debug!(provider = %self.provider, "LlmConfig::resolve: called");
        let (settings, fallback) = match self.provider.as_str() {
            "anthropic" => (&self.anthropic, ProviderSettings::anthropic()),
            "gemini" => (&self.gemini, ProviderSettings::gemini()),
            other => {
                return Err(eyre::eyre!(
                    "Unknown LLM provider: '{}'. Supported: anthropic, gemini",
                    other
                ));
            }
        };

        // Fields left out of a partial provider section keep the provider defaults
        let pick = |value: &str, default: String| {
            if value.trim().is_empty() { default } else { value.to_string() }
        };

        Ok(ResolvedLlmConfig {
            provider: self.provider.clone(),
            model: pick(&settings.model, fallback.model),
            api_key_env: pick(&settings.api_key_env, fallback.api_key_env),
            base_url: pick(&settings.base_url, fallback.base_url).trim_end_matches('/').to_string(),
            max_tokens: if settings.max_tokens == 0 {
                fallback.max_tokens
            } else {
                settings.max_tokens
            },
            timeout_ms: self.timeout_ms,
        })
    }
}

/// Per-provider endpoint settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl ProviderSettings {
    /// Defaults for the Anthropic Messages API
    pub fn anthropic() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 8192,
        }
    }

    /// Defaults for the Gemini generateContent API
    pub fn gemini() -> Self {
        Self {
            model: "gemini-1.5-pro".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 8192,
        }
    }
}

/// Fully resolved settings for the active provider
#[derive(Debug, Clone)]
pub struct ResolvedLlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl ResolvedLlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(eyre::eyre!(
                "API key not found. Set the {} environment variable.",
                self.api_key_env
            )),
        }
    }
}

/// Loop bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Maximum tool iterations before giving up
    #[serde(rename = "max-loops")]
    pub max_loops: u32,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self { max_loops: 15 }
    }
}

/// Subprocess execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Default subprocess timeout in seconds
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Upper bound on a per-call timeout requested by the model
    #[serde(rename = "max-timeout-seconds")]
    pub max_timeout_seconds: u64,

    /// Maximum characters kept from each output stream
    #[serde(rename = "max-output-chars")]
    pub max_output_chars: usize,

    /// Python interpreter used by code_execution
    pub python: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_timeout_seconds: 600,
            max_output_chars: 30_000,
            python: "python3".to_string(),
        }
    }
}

/// Workspace, output and asset directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory under which session workspaces are created
    #[serde(rename = "workspace-dir")]
    pub workspace_dir: PathBuf,

    /// Directory for session summaries
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Optional directory of JSON tool descriptors forwarded to the model
    #[serde(rename = "tool-schema-dir", skip_serializing_if = "Option::is_none")]
    pub tool_schema_dir: Option<PathBuf>,

    /// Optional file holding the orchestrator persona prepended to the system prompt
    #[serde(rename = "persona-file", skip_serializing_if = "Option::is_none")]
    pub persona_file: Option<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("workspace"),
            output_dir: PathBuf::from("output"),
            tool_schema_dir: None,
            persona_file: None,
        }
    }
}
