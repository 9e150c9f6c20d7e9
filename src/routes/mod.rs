//! Route groups. `gateway_routes` assembles them in mount order.

mod common;
mod entity;
mod model;

pub use common::common_routes;
pub use entity::entity_routes;
pub use model::model_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Common, model and entity routes. `/models` is a static segment, so it wins over `/:resource`.
pub fn gateway_routes(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(model_routes(state.clone()))
        .merge(entity_routes(state))
}

/// Gateway routes under `/api/v1` with body limit and request tracing.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .nest("/api/v1", gateway_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
}
