//! Model gateway: a registry-driven CRUD gateway in front of a REST backend.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod transport;

pub use config::{load_from_path, resolve, GatewaySettings, ModelRegistry, RegistryConfig, ResourceDescriptor};
pub use error::{AppError, ConfigError, TransportError};
pub use response::{error_body, success_many, success_one_ok};
pub use routes::{build_router, common_routes, entity_routes, gateway_routes, model_routes};
pub use service::{DetailLoader, Dispatcher};
pub use state::AppState;
pub use transport::{HttpTransport, Transport};
