//! Shared test helpers: a small registry, a mocked backend and a spawned gateway.

#![allow(dead_code)]

use model_gateway::{build_router, resolve, AppState, HttpTransport, ModelRegistry, RegistryConfig};
use serde_json::json;
use std::sync::Arc;
use wiremock::MockServer;

pub const ASSET_ID: &str = "3f2b8c1e-6d4a-4e2b-9f10-5a7c2d9e8b41";
pub const POLICY_ID: &str = "a1c0e7d2-1b3f-4c5d-8e9f-0a1b2c3d4e5f";
pub const INTEGRATION_ID: &str = "5e6f7a8b-9c0d-4e1f-a2b3-c4d5e6f7a8b9";
pub const ASSESSMENT_ID: &str = "0b1c2d3e-4f5a-4b6c-8d7e-9f0a1b2c3d4e";
pub const REQUIREMENT_ID: &str = "9a8b7c6d-5e4f-4a3b-9c2d-1e0f9a8b7c6d";

pub fn registry_config() -> RegistryConfig {
    serde_json::from_value(json!({
        "models": [
            {
                "key": "policies",
                "list_columns": ["name", "status"],
                "filter_keys": ["folder", "status"]
            },
            {
                "key": "assets",
                "list_columns": ["name", "type"],
                "filter_keys": ["folder", "type"],
                "related_fields": {
                    "risk-matrix": {"resource": "risk-matrices", "filter": "assets"},
                    "evidences": {"resource": "evidences"}
                }
            },
            {"key": "risk-matrices", "list_columns": ["name"]},
            {"key": "evidences", "list_columns": ["name", "size"]},
            {"key": "integrations", "endpoint": "settings/integrations/", "list_columns": ["name"]},
            {"key": "compliance-assessments", "list_columns": ["name"]},
            {"key": "requirement-assessments", "list_columns": ["status"]}
        ]
    }))
    .unwrap()
}

pub fn test_registry() -> ModelRegistry {
    resolve(&registry_config()).unwrap()
}

/// Mock backend plus a transport rooted at its `/api/` prefix.
pub async fn mock_backend() -> (MockServer, HttpTransport) {
    let server = MockServer::start().await;
    let transport = HttpTransport::new(&format!("{}/api/", server.uri()), None).unwrap();
    (server, transport)
}

/// Serve the gateway on an OS-assigned port in front of `server`, returning the base URL.
pub async fn spawn_gateway(server: &MockServer) -> String {
    let transport = HttpTransport::new(&format!("{}/api/", server.uri()), None).unwrap();
    let state = AppState::new(test_registry(), Arc::new(transport));
    let app = build_router(state, 64 * 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}/api/v1", port)
}
