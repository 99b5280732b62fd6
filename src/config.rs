//! Configuration management for the tool agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - Required. API key for the chat completions endpoint.
//! - `OPENAI_BASE_URL` - Optional. API base URL. Defaults to `https://api.openai.com/v1`.
//! - `DEFAULT_MODEL` - Optional. The model to use. Defaults to `gpt-3.5-turbo`.
//! - `TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.1`.
//! - `MAX_TOOL_ROUNDS` - Optional. Maximum tool call rounds per invocation. Defaults to `50`.
//! - `RATE_LIMIT_MAX_ATTEMPTS` - Optional. Model call attempts when rate limited. Defaults to `5`.
//! - `RATE_LIMIT_BASE_DELAY_SECS` - Optional. First backoff delay in seconds. Defaults to `30`.

use std::time::Duration;

use thiserror::Error;

use crate::agent::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the model provider
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Default LLM model identifier
    pub default_model: String,

    /// Sampling temperature sent with every model call
    pub temperature: f64,

    /// Maximum tool call rounds per invocation
    pub max_tool_rounds: usize,

    /// Backoff applied when the provider rate limits a model call
    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let base_url = lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let default_model = lookup("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = parse_or(&lookup, "TEMPERATURE", DEFAULT_TEMPERATURE)?;

        let max_tool_rounds = parse_or(&lookup, "MAX_TOOL_ROUNDS", DEFAULT_MAX_TOOL_ROUNDS)?;

        let defaults = RetryPolicy::default();
        let max_attempts = parse_or(&lookup, "RATE_LIMIT_MAX_ATTEMPTS", defaults.max_attempts)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let base_delay_secs = parse_or(
            &lookup,
            "RATE_LIMIT_BASE_DELAY_SECS",
            defaults.base_delay.as_secs(),
        )?;

        Ok(Self {
            api_key,
            base_url,
            default_model,
            temperature,
            max_tool_rounds,
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_secs(base_delay_secs),
            },
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            temperature: DEFAULT_TEMPERATURE,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            retry: RetryPolicy::default(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}
