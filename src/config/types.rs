// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub endpoint: EndpointConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub max_connections: Option<u64>,
    /// Time allowed to receive a request's headers (and keep-alive idle time), in seconds
    pub request_timeout: u64,
}

/// Where the endpoint is mounted and how resource segments are split
///
/// Immutable once loaded; every `RequestHandler` shares one copy.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub domain_root: String,
    pub base_uri: String,
    #[serde(default = "default_separator")]
    pub first_resource_separator: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_separator() -> String {
    "/".to_string()
}

impl EndpointConfig {
    pub fn new(domain_root: impl Into<String>, base_uri: impl Into<String>) -> Self {
        Self {
            domain_root: domain_root.into(),
            base_uri: base_uri.into(),
            first_resource_separator: default_separator(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level written: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}
