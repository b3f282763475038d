// Application state module
// Read-only configuration shared by every connection, plus live counters

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use super::types::{Config, EndpointConfig};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Shared with every `RequestHandler`
    pub endpoint: Arc<EndpointConfig>,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            endpoint: Arc::new(config.endpoint.clone()),
            active_connections: AtomicUsize::new(0),
        }
    }
}
