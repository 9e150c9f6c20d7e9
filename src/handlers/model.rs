//! Registry handlers: the UI reads list columns and filter schemas from here.

use crate::config::ResourceDescriptor;
use crate::error::AppError;
use crate::response::{success_many, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

pub async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    let descriptors: Vec<ResourceDescriptor> = state.registry.descriptors().into_iter().cloned().collect();
    success_many(descriptors)
}

pub async fn get_model(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let descriptor = state.registry.lookup(&resource)?.clone();
    Ok(success_one_ok(descriptor))
}
