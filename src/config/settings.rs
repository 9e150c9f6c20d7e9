//! Process settings from environment variables.

use crate::error::ConfigError;
use std::time::Duration;

const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct GatewaySettings {
    pub bind: String,
    /// Base URL of the REST backend; always ends with `/`.
    pub backend_url: String,
    /// Applied by the HTTP transport only; the core never times out on its own.
    pub backend_timeout: Option<Duration>,
    pub backend_health_path: String,
    pub models_path: String,
    pub body_limit: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        GatewaySettings {
            bind: "0.0.0.0:3000".into(),
            backend_url: "http://localhost:8000/api/".into(),
            backend_timeout: None,
            backend_health_path: "health/".into(),
            models_path: "sample/models.json".into(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl GatewaySettings {
    /// Read `GATEWAY_BIND`, `BACKEND_URL`, `BACKEND_TIMEOUT_SECS`, `BACKEND_HEALTH_PATH`, `MODELS_PATH` and `GATEWAY_BODY_LIMIT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = GatewaySettings::default();
        let backend_timeout = match get("BACKEND_TIMEOUT_SECS") {
            Some(s) => Some(Duration::from_secs(parse_number("BACKEND_TIMEOUT_SECS", &s)?)),
            None => None,
        };
        let body_limit = match get("GATEWAY_BODY_LIMIT") {
            Some(s) => {
                let limit = parse_number("GATEWAY_BODY_LIMIT", &s)?;
                usize::try_from(limit)
                    .map_err(|_| ConfigError::Load(format!("GATEWAY_BODY_LIMIT {} exceeds the address space", limit)))?
            }
            None => defaults.body_limit,
        };
        let mut backend_url = get("BACKEND_URL").unwrap_or(defaults.backend_url);
        if !backend_url.ends_with('/') {
            backend_url.push('/');
        }
        Ok(GatewaySettings {
            bind: get("GATEWAY_BIND").unwrap_or(defaults.bind),
            backend_url,
            backend_timeout,
            backend_health_path: get("BACKEND_HEALTH_PATH").unwrap_or(defaults.backend_health_path),
            models_path: get("MODELS_PATH").unwrap_or(defaults.models_path),
            body_limit,
        })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Load(format!("{} must be a non-negative integer, got '{}'", name, raw)))
}
