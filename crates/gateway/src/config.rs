use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL of the agent, session-store and edit-queue services.
    pub api_url: String,
    /// Base URL of the export service.
    pub export_url: String,
    /// Upper bound on one agent call.
    pub agent_timeout: Duration,
    /// Timeout for every other call.
    pub request_timeout: Duration,
}

impl GatewayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                     |
    /// |--------------------------------|-----------------------------|
    /// | `VIDCHAT_API_URL`              | `http://127.0.0.1:8000/api` |
    /// | `VIDCHAT_EXPORT_URL`           | value of `VIDCHAT_API_URL`  |
    /// | `VIDCHAT_AGENT_TIMEOUT_SECS`   | `300`                       |
    /// | `VIDCHAT_REQUEST_TIMEOUT_SECS` | `30`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("VIDCHAT_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let export_url = lookup("VIDCHAT_EXPORT_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| api_url.clone());

        let agent_timeout = secs(
            &lookup,
            "VIDCHAT_AGENT_TIMEOUT_SECS",
            DEFAULT_AGENT_TIMEOUT_SECS,
        )?;
        let request_timeout = secs(
            &lookup,
            "VIDCHAT_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            api_url,
            export_url,
            agent_timeout,
            request_timeout,
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            export_url: DEFAULT_API_URL.to_string(),
            agent_timeout: Duration::from_secs(DEFAULT_AGENT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match lookup(var) {
        None => Ok(Duration::from_secs(default)),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
            _ => Err(ConfigError::Invalid { var, value }),
        },
    }
}
