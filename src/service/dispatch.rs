//! Generic write/delete dispatch.
//!
//! Each submission walks `Received -> Resolved -> Reconciled -> Sent` and ends
//! `Succeeded` or `Failed`. Backend rejections are not errors here: they come
//! back as a failed [`DispatchOutcome`] carrying the backend status and body
//! verbatim. Only registry misses and transport failures are `Err`. Writes are
//! never retried.

use crate::config::{ModelRegistry, ResourceDescriptor};
use crate::error::{AppError, TransportError};
use crate::service::reconcile::{count_masked, reconcile};
use crate::transport::{BackendRequest, BackendResponse, Method, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStage {
    Received,
    Resolved,
    Reconciled,
    Sent,
    Succeeded,
    Failed,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchStage::Received => "received",
            DispatchStage::Resolved => "resolved",
            DispatchStage::Reconciled => "reconciled",
            DispatchStage::Sent => "sent",
            DispatchStage::Succeeded => "succeeded",
            DispatchStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Parent a nested submission is scoped to: `{parent endpoint}/{id}/{field}/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentContext {
    pub resource: String,
    pub id: String,
    pub field: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Edit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WriteRequest {
    pub resource: String,
    /// Present for edit, absent for create.
    pub id: Option<String>,
    pub parent: Option<ParentContext>,
    pub payload: Map<String, Value>,
    /// Server record the form was built from; fetched on edit when absent, through the same path the `PATCH` uses.
    pub current: Option<Map<String, Value>>,
}

impl WriteRequest {
    pub fn create(resource: impl Into<String>, payload: Map<String, Value>) -> Self {
        WriteRequest {
            resource: resource.into(),
            id: None,
            parent: None,
            payload,
            current: None,
        }
    }

    pub fn edit(resource: impl Into<String>, id: impl Into<String>, payload: Map<String, Value>) -> Self {
        WriteRequest {
            id: Some(id.into()),
            ..Self::create(resource, payload)
        }
    }

    pub fn with_parent(mut self, parent: ParentContext) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_current(mut self, current: Map<String, Value>) -> Self {
        self.current = Some(current);
        self
    }

    pub fn action(&self) -> WriteAction {
        if self.id.is_some() {
            WriteAction::Edit
        } else {
            WriteAction::Create
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeleteRequest {
    pub resource: String,
    pub id: String,
    pub parent: Option<ParentContext>,
    /// Without confirmation only the cascade info is fetched.
    pub confirmed: bool,
}

/// Advisory list of records that reference the one being deleted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CascadeInfo {
    pub dependents: Vec<Value>,
}

impl CascadeInfo {
    /// Accepts a bare array or an object holding `related_objects` / `dependents`.
    pub fn from_backend(body: Value) -> Self {
        let dependents = match body {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("related_objects").or_else(|| map.remove("dependents")) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        CascadeInfo { dependents }
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}

/// `{ok: true, data}` or `{ok: false, status, error}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade: Option<CascadeInfo>,
}

impl DispatchOutcome {
    pub fn succeeded(data: Value) -> Self {
        DispatchOutcome {
            ok: true,
            data: Some(data),
            status: None,
            error: None,
            cascade: None,
        }
    }

    pub fn failed(status: u16, error: Value) -> Self {
        DispatchOutcome {
            ok: false,
            data: None,
            status: Some(status),
            error: Some(error),
            cascade: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeleteOutcome {
    NeedsConfirmation(CascadeInfo),
    Completed(DispatchOutcome),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Relative backend path for a submission.
pub(crate) fn target_path(
    target: &ResourceDescriptor,
    parent: Option<(&ResourceDescriptor, &ParentContext)>,
    id: Option<&str>,
) -> String {
    let base = match parent {
        Some((parent_desc, ctx)) => format!("{}/{}/{}", parent_desc.endpoint(), ctx.id, ctx.field),
        None => target.endpoint().to_string(),
    };
    match id {
        Some(id) => format!("{}/{}/", base, id),
        None => format!("{}/", base),
    }
}

pub struct Dispatcher<'a> {
    registry: &'a ModelRegistry,
    transport: &'a dyn Transport,
    authorization: Option<&'a str>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a ModelRegistry, transport: &'a dyn Transport) -> Self {
        Dispatcher {
            registry,
            transport,
            authorization: None,
        }
    }

    pub fn with_authorization(mut self, authorization: Option<&'a str>) -> Self {
        self.authorization = authorization;
        self
    }

    fn resolve(
        &self,
        resource: &str,
        parent: Option<&ParentContext>,
    ) -> Result<(&'a ResourceDescriptor, Option<&'a ResourceDescriptor>), AppError> {
        let target = self.registry.lookup(resource)?;
        let parent_desc = match parent {
            Some(ctx) => Some(self.registry.lookup(&ctx.resource)?),
            None => None,
        };
        Ok((target, parent_desc))
    }

    async fn send(&self, method: Method, path: String, body: Option<Value>) -> Result<BackendResponse, AppError> {
        let mut request = BackendRequest::new(method, path).with_authorization(self.authorization);
        request.body = body;
        Ok(self.transport.send(request).await?)
    }

    /// Create (`POST`) or edit (`PATCH`) one record.
    pub async fn dispatch_write(&self, request: &WriteRequest) -> Result<DispatchOutcome, AppError> {
        let action = request.action();
        tracing::debug!(stage = %DispatchStage::Received, resource = %request.resource, ?action, "dispatch");

        let (target, parent_desc) = self.resolve(&request.resource, request.parent.as_ref())?;
        tracing::debug!(stage = %DispatchStage::Resolved, endpoint = target.endpoint(), "dispatch");

        let payload = match action {
            WriteAction::Create => request.payload.clone(),
            WriteAction::Edit => {
                let id = request.id.as_deref().unwrap_or_default();
                if id.is_empty() {
                    return Err(AppError::BadRequest("edit requires an id".into()));
                }
                let fetched;
                let current = match &request.current {
                    Some(current) => current,
                    None => {
                        let record_path = target_path(target, parent_desc.zip(request.parent.as_ref()), Some(id));
                        let response = self.send(Method::Get, record_path.clone(), None).await?;
                        if !response.is_success() {
                            tracing::debug!(stage = %DispatchStage::Failed, status = response.status, "current record fetch failed");
                            return Ok(DispatchOutcome::failed(response.status, response.body.into_json()));
                        }
                        // Without the server record masked fields cannot be told apart from edits.
                        fetched = match response.body.into_json() {
                            Value::Object(map) => map,
                            other => {
                                tracing::warn!(path = %record_path, "current record is not a JSON object");
                                return Err(TransportError::Decode(format!(
                                    "{}: expected a JSON object, got {}",
                                    record_path,
                                    json_kind(&other)
                                ))
                                .into());
                            }
                        };
                        &fetched
                    }
                };
                let reconciled = reconcile(current, request.payload.clone());
                if !reconciled.dropped.is_empty() {
                    let masked: usize = reconciled
                        .dropped
                        .iter()
                        .filter_map(|f| current.get(f))
                        .map(count_masked)
                        .sum();
                    tracing::debug!(dropped = ?reconciled.dropped, masked, "masked fields left unchanged");
                }
                tracing::debug!(stage = %DispatchStage::Reconciled, "dispatch");
                reconciled.payload
            }
        };

        let (method, id) = match action {
            WriteAction::Create => (Method::Post, None),
            WriteAction::Edit => (Method::Patch, request.id.as_deref()),
        };
        let parent = parent_desc.zip(request.parent.as_ref());
        let path = target_path(target, parent, id);
        tracing::debug!(stage = %DispatchStage::Sent, %method, path = %path, "dispatch");

        let response = self.send(method, path, Some(Value::Object(payload))).await?;
        if response.is_success() {
            tracing::debug!(stage = %DispatchStage::Succeeded, status = response.status, "dispatch");
            Ok(DispatchOutcome::succeeded(response.body.into_json()))
        } else {
            tracing::debug!(stage = %DispatchStage::Failed, status = response.status, "dispatch");
            Ok(DispatchOutcome::failed(response.status, response.body.into_json()))
        }
    }

    /// Query `{endpoint}/{id}/cascade-info/`.
    pub async fn cascade_info(&self, resource: &str, id: &str) -> Result<CascadeInfo, AppError> {
        let target = self.registry.lookup(resource)?;
        let path = format!("{}/{}/cascade-info/", target.endpoint(), id);
        let response = self.send(Method::Get, path.clone(), None).await?;
        if !response.is_success() {
            return Err(AppError::from_backend(response.status, response.body.into_json(), &path));
        }
        Ok(CascadeInfo::from_backend(response.body.into_json()))
    }

    /// Unconfirmed: return cascade info only. Confirmed: send the `DELETE`.
    pub async fn dispatch_delete(&self, request: &DeleteRequest) -> Result<DeleteOutcome, AppError> {
        tracing::debug!(stage = %DispatchStage::Received, resource = %request.resource, confirmed = request.confirmed, "delete");
        let (target, parent_desc) = self.resolve(&request.resource, request.parent.as_ref())?;
        tracing::debug!(stage = %DispatchStage::Resolved, endpoint = target.endpoint(), "delete");

        if !request.confirmed {
            let info = self.cascade_info(&request.resource, &request.id).await?;
            return Ok(DeleteOutcome::NeedsConfirmation(info));
        }

        let parent = parent_desc.zip(request.parent.as_ref());
        let path = target_path(target, parent, Some(&request.id));
        tracing::debug!(stage = %DispatchStage::Sent, method = %Method::Delete, path = %path, "delete");
        let response = self.send(Method::Delete, path, None).await?;
        if response.is_success() {
            tracing::debug!(stage = %DispatchStage::Succeeded, status = response.status, "delete");
            return Ok(DeleteOutcome::Completed(DispatchOutcome::succeeded(response.body.into_json())));
        }

        tracing::debug!(stage = %DispatchStage::Failed, status = response.status, "delete");
        let mut outcome = DispatchOutcome::failed(response.status, response.body.into_json());
        match self.cascade_info(&request.resource, &request.id).await {
            Ok(info) => outcome.cascade = Some(info),
            Err(e) => tracing::warn!(resource = %request.resource, error = %e, "cascade info unavailable after failed delete"),
        }
        Ok(DeleteOutcome::Completed(outcome))
    }
}
