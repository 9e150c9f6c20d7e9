//! Entity routes resolved against the registry at request time.
//! Edits take `{payload, current?}` or a bare object; a bare object holding only a `payload` object is read as wrapped.
//! Parameterized paths hand the resource key and ids to handlers; nested routes name the parent first and the target via `?target=`.

use crate::handlers::entity::{
    cascade_info, create, delete as delete_handler, export, list, nested_create, nested_delete, nested_update, read,
    update,
};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:resource", get(list).post(create))
        .route("/:resource/export", get(export))
        .route(
            "/:resource/:id",
            get(read).patch(update).delete(delete_handler),
        )
        .route("/:resource/:id/cascade-info", get(cascade_info))
        .route("/:resource/:id/:field", post(nested_create))
        .route(
            "/:resource/:id/:field/:child_id",
            axum::routing::patch(nested_update).delete(nested_delete),
        )
        .with_state(state)
}
