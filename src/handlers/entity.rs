//! Entity handlers: list, detail, create, edit, delete, cascade info, export, nested writes.

use crate::error::AppError;
use crate::extractors::auth::ForwardedAuth;
use crate::response::{error_body, success_one_ok};
use crate::service::{
    self, DeleteOutcome, DeleteRequest, DetailLoader, DispatchOutcome, Dispatcher, ExportFormat, ParentContext,
    WriteRequest,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

fn parse_id(id_str: &str) -> Result<String, AppError> {
    let u = uuid::Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest(format!("invalid uuid: {}", id_str)))?;
    Ok(u.to_string())
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Edit body: `{"payload": {...}, "current": {...}}` or the bare edited object.
///
/// A body whose only keys are an object-valued `payload` and optionally `current` is always read
/// as the wrapped form. Entities with a field named `payload` must be edited through the wrapped form.
fn split_edit_body(value: Value) -> Result<(Map<String, Value>, Option<Map<String, Value>>), AppError> {
    let mut map = body_to_map(value)?;
    let wrapped = matches!(map.get("payload"), Some(Value::Object(_)))
        && map.keys().all(|k| k == "payload" || k == "current");
    if !wrapped {
        return Ok((map, None));
    }
    let payload = map.remove("payload").map(body_to_map).transpose()?.unwrap_or_default();
    let current = match map.remove("current") {
        Some(Value::Null) | None => None,
        Some(v) => Some(body_to_map(v)?),
    };
    Ok((payload, current))
}

fn outcome_response(outcome: DispatchOutcome, success: StatusCode) -> Response {
    let status = if outcome.ok {
        success
    } else {
        outcome
            .status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::BAD_GATEWAY)
    };
    (status, Json(outcome)).into_response()
}

fn delete_response(outcome: DeleteOutcome) -> Response {
    match outcome {
        DeleteOutcome::NeedsConfirmation(info) => {
            let count = info.dependents.len();
            let details = serde_json::to_value(&info).unwrap_or(Value::Null);
            (
                StatusCode::CONFLICT,
                Json(error_body(
                    "confirmation_required",
                    format!("delete requires confirmation ({} dependent records)", count),
                    Some(details),
                )),
            )
                .into_response()
        }
        DeleteOutcome::Completed(outcome) => outcome_response(outcome, StatusCode::OK),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct NestedParams {
    pub target: String,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: String,
}

pub async fn list(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let descriptor = state.registry.lookup(&resource)?;
    let view = service::load_list(state.transport.as_ref(), descriptor, &params, auth.as_deref()).await?;
    Ok(success_one_ok(view))
}

pub async fn read(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let view = DetailLoader::load(&state.registry, state.transport.as_ref(), &resource, &id, auth.as_deref()).await?;
    Ok(success_one_ok(view))
}

pub async fn create(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let request = WriteRequest::create(resource, body_to_map(body)?);
    let outcome = Dispatcher::new(&state.registry, state.transport.as_ref())
        .with_authorization(auth.as_deref())
        .dispatch_write(&request)
        .await?;
    Ok(outcome_response(outcome, StatusCode::CREATED))
}

/// `PATCH /:resource/:id`. See `split_edit_body` for the accepted body shapes.
pub async fn update(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let id = parse_id(&id_str)?;
    let (payload, current) = split_edit_body(body)?;
    let mut request = WriteRequest::edit(resource, id, payload);
    request.current = current;
    let outcome = Dispatcher::new(&state.registry, state.transport.as_ref())
        .with_authorization(auth.as_deref())
        .dispatch_write(&request)
        .await?;
    Ok(outcome_response(outcome, StatusCode::OK))
}

pub async fn delete(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, AppError> {
    let request = DeleteRequest {
        resource,
        id: parse_id(&id_str)?,
        parent: None,
        confirmed: params.confirm,
    };
    let outcome = Dispatcher::new(&state.registry, state.transport.as_ref())
        .with_authorization(auth.as_deref())
        .dispatch_delete(&request)
        .await?;
    Ok(delete_response(outcome))
}

pub async fn cascade_info(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let info = Dispatcher::new(&state.registry, state.transport.as_ref())
        .with_authorization(auth.as_deref())
        .cascade_info(&resource, &id)
        .await?;
    Ok(success_one_ok(info))
}

pub async fn export(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let descriptor = state.registry.lookup(&resource)?;
    let format: ExportFormat = params.format.parse()?;
    let file = service::export(state.transport.as_ref(), descriptor, format, auth.as_deref()).await?;

    let mut headers = HeaderMap::new();
    let content_type = file.content_type.as_deref().unwrap_or("application/octet-stream");
    if let Ok(v) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, v);
    }
    if let Some(v) = file.content_disposition.as_deref().and_then(|d| HeaderValue::from_str(d).ok()) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    Ok((StatusCode::OK, headers, file.bytes).into_response())
}

pub async fn nested_create(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path((resource, parent_id, field)): Path<(String, String, String)>,
    Query(params): Query<NestedParams>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let parent = ParentContext {
        resource,
        id: parse_id(&parent_id)?,
        field,
    };
    let request = WriteRequest::create(params.target, body_to_map(body)?).with_parent(parent);
    let outcome = Dispatcher::new(&state.registry, state.transport.as_ref())
        .with_authorization(auth.as_deref())
        .dispatch_write(&request)
        .await?;
    Ok(outcome_response(outcome, StatusCode::CREATED))
}

pub async fn nested_update(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path((resource, parent_id, field, child_id)): Path<(String, String, String, String)>,
    Query(params): Query<NestedParams>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let parent = ParentContext {
        resource,
        id: parse_id(&parent_id)?,
        field,
    };
    let (payload, current) = split_edit_body(body)?;
    let mut request = WriteRequest::edit(params.target, parse_id(&child_id)?, payload).with_parent(parent);
    request.current = current;
    let outcome = Dispatcher::new(&state.registry, state.transport.as_ref())
        .with_authorization(auth.as_deref())
        .dispatch_write(&request)
        .await?;
    Ok(outcome_response(outcome, StatusCode::OK))
}

pub async fn nested_delete(
    auth: ForwardedAuth,
    State(state): State<AppState>,
    Path((resource, parent_id, field, child_id)): Path<(String, String, String, String)>,
    Query(params): Query<NestedParams>,
) -> Result<Response, AppError> {
    let request = DeleteRequest {
        resource: params.target,
        id: parse_id(&child_id)?,
        parent: Some(ParentContext {
            resource,
            id: parse_id(&parent_id)?,
            field,
        }),
        confirmed: params.confirm,
    };
    let outcome = Dispatcher::new(&state.registry, state.transport.as_ref())
        .with_authorization(auth.as_deref())
        .dispatch_delete(&request)
        .await?;
    Ok(delete_response(outcome))
}
