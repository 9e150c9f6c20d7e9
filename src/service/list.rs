//! List views: backend rows projected onto a model's list columns.

use crate::config::ResourceDescriptor;
use crate::error::AppError;
use crate::transport::{BackendRequest, Transport};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Query keys forwarded regardless of a model's filter schema.
const PAGING_KEYS: &[&str] = &["limit", "offset", "ordering", "search", "page"];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListView {
    pub columns: Vec<String>,
    pub filter_keys: BTreeSet<String>,
    pub rows: Vec<Value>,
    /// Backend total when paginated, otherwise the number of rows.
    pub count: u64,
}

impl ListView {
    /// Shape a backend list answer: either a bare array or `{count, results}`.
    pub fn from_backend(descriptor: &ResourceDescriptor, body: Value) -> Self {
        let (items, total) = match body {
            Value::Array(items) => (items, None),
            Value::Object(mut map) => {
                let total = map.get("count").and_then(Value::as_u64);
                let items = match map.remove("results") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                (items, total)
            }
            _ => (Vec::new(), None),
        };
        let rows: Vec<Value> = items
            .into_iter()
            .map(|row| project_row(&descriptor.list_columns, row))
            .collect();
        ListView {
            columns: descriptor.list_columns.clone(),
            filter_keys: descriptor.filter_keys.clone(),
            count: total.unwrap_or(rows.len() as u64),
            rows,
        }
    }
}

/// Keep `id` plus the listed columns; missing columns become null. No columns means the row is kept whole.
fn project_row(columns: &[String], row: Value) -> Value {
    if columns.is_empty() {
        return row;
    }
    let Value::Object(mut source) = row else {
        return row;
    };
    let mut out = Map::with_capacity(columns.len() + 1);
    if let Some(id) = source.remove("id") {
        out.insert("id".to_string(), id);
    }
    for col in columns {
        let v = source.remove(col.as_str()).unwrap_or(Value::Null);
        out.insert(col.clone(), v);
    }
    Value::Object(out)
}

/// Query pairs the backend may see: declared filter keys plus paging keys.
pub fn allowed_query(descriptor: &ResourceDescriptor, params: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = params
        .iter()
        .filter(|(k, _)| descriptor.accepts_filter(k) || PAGING_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    out.sort();
    out
}

/// Fetch `{endpoint}/` with the permitted query and shape it as a list view.
pub async fn load_list(
    transport: &dyn Transport,
    descriptor: &ResourceDescriptor,
    params: &HashMap<String, String>,
    authorization: Option<&str>,
) -> Result<ListView, AppError> {
    let mut request = BackendRequest::get(format!("{}/", descriptor.endpoint())).with_authorization(authorization);
    request.query = allowed_query(descriptor, params);
    let response = transport.send(request).await?;
    if !response.is_success() {
        return Err(AppError::from_backend(
            response.status,
            response.body.into_json(),
            descriptor.key.as_str(),
        ));
    }
    Ok(ListView::from_backend(descriptor, response.body.into_json()))
}
