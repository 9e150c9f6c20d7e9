//! Gateway server: loads the model registry and serves the CRUD gateway.
//!
//! Run from repo root: `cargo run -p gateway-server`

use model_gateway::{build_router, load_from_path, AppState, GatewaySettings, HttpTransport};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("model_gateway=info,tower_http=info")),
        )
        .init();

    let settings = GatewaySettings::from_env()?;
    let registry = load_from_path(&settings.models_path).await?;
    let transport = HttpTransport::new(&settings.backend_url, settings.backend_timeout)?;
    let state = AppState::new(registry, Arc::new(transport)).with_health_path(settings.backend_health_path.clone());

    let app = build_router(state, settings.body_limit);
    let listener = TcpListener::bind(&settings.bind).await?;
    tracing::info!(
        backend = %settings.backend_url,
        "Gateway listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
