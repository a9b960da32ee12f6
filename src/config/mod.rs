
use std::env;
use thiserror::Error;
use url::Url;

pub const ENV_BASE_URL: &str = "AI_CHAT_BASE_URL";
pub const ENV_API_KEY: &str = "AI_CHAT_KEY";
pub const ENV_MODEL: &str = "AI_CHAT_MODEL";
pub const ENV_NAME: &str = "AI_CHAT_NAME";

/// Immutable process configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of an OpenAI-compatible chat completion API.
    pub base_url: Url,
    /// Bearer credential for that API.
    pub api_key: String,
    /// Model identifier passed through verbatim.
    pub model: String,
    /// Human-readable name of the remote assistant.
    pub assistant_name: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingVar(&'static str),
    #[error("Invalid URL in {var}: {value}")]
    InvalidUrl { var: &'static str, value: String },
}

impl Config {
    /// Load configuration from the process environment, failing fast on the
    /// first missing or invalid value.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let base_url = required(&lookup, ENV_BASE_URL)?;
        let api_key = required(&lookup, ENV_API_KEY)?;
        let model = required(&lookup, ENV_MODEL)?;
        let assistant_name = required(&lookup, ENV_NAME)?;

        let base_url = Url::parse(&base_url).map_err(|_| ConfigError::InvalidUrl {
            var: ENV_BASE_URL,
            value: base_url,
        })?;

        Ok(Self {
            base_url,
            api_key,
            model,
            assistant_name,
        })
    }

    /// Tool name derived from the assistant display name.
    ///
    /// Only the first space is replaced with a dash; any later spaces
    /// survive. This matches the published behavior of the server.
    #[inline]
    pub fn tool_name(&self) -> String {
        format!(
            "ask-{}",
            self.assistant_name.to_lowercase().replacen(' ', "-", 1)
        )
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}
