use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env;
use tracing::{info, warn};

use crate::llm_providers::LLMProviderType;

// Import logging macros
use crate::{log_system_event, log_validation};

/// Characters of study material forwarded to the model
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 30_000;

/// Seconds a session may sit untouched before it is evicted
pub const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 3600;

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LLMConfig,
    pub planner: PlannerConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Large Language Model service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub provider: LLMProviderType,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

/// Plan generation limits
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    pub max_content_chars: usize,
    pub session_idle_ttl_secs: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Logging system configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from `.env` and environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        log_system_event!(config, "Loading application configuration");

        let config = Config {
            llm: LLMConfig::from_source(&lookup)?,
            planner: PlannerConfig::from_source(&lookup)?,
            server: ServerConfig::from_source(&lookup)?,
            logging: LoggingConfig::from_source(&lookup),
        };

        log_system_event!(config, "Configuration loaded successfully");
        config.log_configuration_summary();

        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data)
    fn log_configuration_summary(&self) {
        info!(
            llm_provider = ?self.llm.provider,
            llm_model = ?self.llm.model,
            llm_api_key_masked = %mask_sensitive_data(&self.llm.api_key),
            llm_timeout_secs = self.llm.timeout_secs,
            max_content_chars = self.planner.max_content_chars,
            session_idle_ttl_secs = self.planner.session_idle_ttl_secs,
            server_address = %self.server.address(),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port must be greater than 0"));
        }

        if self.llm.timeout_secs == 0 {
            return Err(anyhow!("LLM_TIMEOUT_SECS must be greater than 0"));
        }

        if self.planner.max_content_chars == 0 {
            return Err(anyhow!("PLANNER_MAX_CONTENT_CHARS must be greater than 0"));
        }

        if self.planner.session_idle_ttl_secs == 0 {
            return Err(anyhow!("SESSION_IDLE_TTL_SECS must be greater than 0"));
        }

        // A missing key is only reported by the provider at call time
        if self.llm.api_key.is_empty() {
            warn!("LLM API key is empty - plan generation requests will be rejected");
        }

        if !["trace", "debug", "info", "warn", "error"]
            .iter()
            .any(|level| self.logging.level.to_lowercase().contains(level))
        {
            warn!("Unrecognized log level '{}', falling back to 'info'", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl LLMConfig {
    fn from_source<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("LLM_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .unwrap_or_default();

        let base_url = lookup("LLM_BASE_URL").filter(|url| !url.is_empty());

        let provider_str = lookup("LLM_PROVIDER").unwrap_or_else(|| "gemini".to_string());
        let provider = parse_provider(&provider_str);

        let model = lookup("LLM_MODEL").filter(|model| !model.is_empty());

        let timeout_str = lookup("LLM_TIMEOUT_SECS").unwrap_or_else(|| "120".to_string());
        let timeout_secs = timeout_str
            .parse::<u64>()
            .map_err(|_| anyhow!("Invalid LLM_TIMEOUT_SECS value: '{}'", timeout_str))?;

        Ok(LLMConfig {
            api_key,
            base_url,
            provider,
            model,
            timeout_secs,
        })
    }
}

impl PlannerConfig {
    fn from_source<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_content_chars = match lookup("PLANNER_MAX_CONTENT_CHARS") {
            Some(value) => value
                .parse::<usize>()
                .map_err(|_| anyhow!("Invalid PLANNER_MAX_CONTENT_CHARS value: '{}'", value))?,
            None => DEFAULT_MAX_CONTENT_CHARS,
        };

        let session_idle_ttl_secs = match lookup("SESSION_IDLE_TTL_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map_err(|_| anyhow!("Invalid SESSION_IDLE_TTL_SECS value: '{}'", value))?,
            None => DEFAULT_SESSION_IDLE_TTL_SECS,
        };

        Ok(PlannerConfig {
            max_content_chars,
            session_idle_ttl_secs,
        })
    }
}

impl ServerConfig {
    fn from_source<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_str = lookup("PORT").unwrap_or_else(|| "3000".to_string());

        let port = port_str.parse::<u16>().map_err(|_| {
            anyhow!("Invalid PORT value: '{}'. Must be a number between 1-65535", port_str)
        })?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        Ok(ServerConfig { port, host })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LoggingConfig {
    /// Read logging settings on their own so the subscriber can be installed
    /// before the rest of the configuration is loaded
    pub fn from_env() -> Self {
        Self::from_source(&|key: &str| env::var(key).ok())
    }

    pub fn from_source<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup("RUST_LOG").unwrap_or_else(|| "info,study_planner=debug".to_string());

        let file_enabled = lookup("LOG_FILE_ENABLED")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let console_enabled = lookup("LOG_CONSOLE_ENABLED")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let log_directory = lookup("LOG_DIRECTORY").unwrap_or_else(|| "logs".to_string());

        LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        }
    }
}

/// Map a provider name from the environment onto a provider type
pub fn parse_provider(value: &str) -> LLMProviderType {
    match value.to_lowercase().as_str() {
        "gemini" | "google" => LLMProviderType::Gemini,
        "openai" | "chatgpt" | "gpt" => LLMProviderType::OpenAI,
        _ => {
            info!("Unknown LLM provider '{}', defaulting to Gemini", value);
            LLMProviderType::Gemini
        }
    }
}

/// Mask sensitive data in configuration for safe logging
fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}
