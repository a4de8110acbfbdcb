//! Host server configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Configuration for the host server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Variables copied into every request's environment.
    pub env: HashMap<String, String>,
    /// Whether `/_health` is answered by the host before dispatch.
    pub enable_health: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Seconds after which a request's execution context is cancelled.
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            env: HashMap::new(),
            enable_health: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
            request_timeout: 30,
        }
    }
}

impl ServerConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `FEZZ_HOST`, `FEZZ_PORT` and `FEZZ_REQUEST_TIMEOUT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup("FEZZ_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("FEZZ_PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!("Ignoring invalid FEZZ_PORT: {}", port),
            }
        }
        if let Some(timeout) = lookup("FEZZ_REQUEST_TIMEOUT") {
            match timeout.parse() {
                Ok(timeout) => config.request_timeout = timeout,
                Err(_) => warn!("Ignoring invalid FEZZ_REQUEST_TIMEOUT: {}", timeout),
            }
        }
        config
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout = seconds;
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ServerConfig::new()
            .host("127.0.0.1")
            .port(9000)
            .env("STAGE", "test")
            .request_timeout(5);

        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.env.get("STAGE"), Some(&"test".to_string()));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_lookup_overlay() {
        let config = ServerConfig::from_lookup(|key| match key {
            "FEZZ_PORT" => Some("7070".to_string()),
            "FEZZ_REQUEST_TIMEOUT" => Some("soon".to_string()),
            _ => None,
        });

        assert_eq!(config.port, 7070);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.request_timeout, 30);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"port": 3000}"#).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.enable_health);
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
    }
}
