use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Environment variable carrying the Runtime API endpoint as `host:port`.
pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub lifecycle: LifecycleConfig,
    pub general: GeneralConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    pub ip: String,
    pub port: u16,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Process signal that triggers graceful stop, by name.
    pub stop_signal: String,
    /// Stop after this many successful invocations. Unset in production.
    pub max_times: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig {
                ip: "127.0.0.1".to_string(),
                port: 7000,
                request_timeout_ms: 300_000,
            },
            lifecycle: LifecycleConfig {
                stop_signal: "SIGTERM".to_string(),
                max_times: None,
            },
            general: GeneralConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    /// Applies the `AWS_LAMBDA_RUNTIME_API` override, when present.
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(RUNTIME_API_ENV) {
            self.apply_runtime_api_endpoint(&endpoint);
        }
    }

    /// Parses a `host:port` endpoint into `runtime.ip` / `runtime.port`.
    /// A malformed value is logged and leaves the configuration untouched.
    pub fn apply_runtime_api_endpoint(&mut self, endpoint: &str) {
        match endpoint.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => match port.parse::<u16>() {
                Ok(port) => {
                    self.runtime.ip = host.to_string();
                    self.runtime.port = port;
                }
                Err(_) => warn!(%endpoint, "ignoring runtime API endpoint with invalid port"),
            },
            _ => warn!(%endpoint, "ignoring malformed runtime API endpoint"),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.runtime.request_timeout_ms)
    }
}
