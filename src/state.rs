//! Shared application state for all routes. The registry is immutable after startup.

use crate::config::ModelRegistry;
use crate::transport::Transport;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub transport: Arc<dyn Transport>,
    /// Backend path probed by `/ready`.
    pub health_path: String,
}

impl AppState {
    pub fn new(registry: ModelRegistry, transport: Arc<dyn Transport>) -> Self {
        AppState {
            registry: Arc::new(registry),
            transport,
            health_path: "health/".into(),
        }
    }

    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }
}
