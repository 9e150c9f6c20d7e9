//! Registry metadata routes.

use crate::handlers::model::{get_model, list_models};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn model_routes(state: AppState) -> Router {
    Router::new()
        .route("/models", get(list_models))
        .route("/models/:resource", get(get_model))
        .with_state(state)
}
