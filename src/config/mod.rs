// Configuration module entry point
// Loads layered configuration: file, then environment, then defaults

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, EndpointConfig, HttpConfig, LoggingConfig, ServerConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error; defaults and `RESTPOINT_*`
    /// environment variables (`__` between sections, e.g.
    /// `RESTPOINT_ENDPOINT__BASE_URI`) fill in the rest.
    pub fn load_from(config_path: &str) -> Result<Self, ServerError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("RESTPOINT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.request_timeout", 30)?
            .set_default("endpoint.domain_root", ".")?
            .set_default("endpoint.base_uri", "/api")?
            .set_default("endpoint.first_resource_separator", "/")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.server_name", "restpoint/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ServerError> {
        if self.endpoint.first_resource_separator.is_empty() {
            return Err(ServerError::InvalidConfig(
                "endpoint.first_resource_separator must not be empty".to_string(),
            ));
        }
        if crate::logger::Level::parse(&self.logging.level).is_none() {
            return Err(ServerError::InvalidConfig(format!(
                "unknown logging.level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| ServerError::Address(addr))
    }
}
