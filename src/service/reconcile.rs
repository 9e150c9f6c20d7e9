//! Masked-field reconciliation for edit payloads.
//!
//! The backend redacts sensitive fields by returning an empty-shaped value in
//! their place (`""`, `{}`, `{"password": ""}`, ...). Sending that shape back
//! on update would overwrite the stored secret with nothing, so untouched
//! masked fields are omitted from the outgoing payload and the backend reads
//! "absent" as "leave unchanged". Detection is purely structural.

use serde_json::{Map, Value};

/// True for `""`, `[]`, `{}` and containers whose every leaf is `""`, `null` or itself masked.
///
/// A top-level `null` is not a placeholder: it is an explicit value.
pub fn is_masked_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().all(is_masked_leaf),
        Value::Object(map) => map.values().all(is_masked_leaf),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

fn is_masked_leaf(value: &Value) -> bool {
    value.is_null() || is_masked_placeholder(value)
}

/// For arrays, how many elements are placeholders; otherwise 1 or 0.
pub fn count_masked(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.iter().filter(|v| is_masked_placeholder(v)).count(),
        other => usize::from(is_masked_placeholder(other)),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reconciled {
    pub payload: Map<String, Value>,
    /// Fields omitted because both server and form still hold a placeholder.
    pub dropped: Vec<String>,
}

/// Drop every top-level field that was masked on the server and is still masked in the form.
pub fn reconcile(current: &Map<String, Value>, edited: Map<String, Value>) -> Reconciled {
    let mut payload = Map::with_capacity(edited.len());
    let mut dropped = Vec::new();
    for (field, value) in edited {
        let was_masked = current.get(&field).is_some_and(is_masked_placeholder);
        if was_masked && is_masked_placeholder(&value) {
            dropped.push(field);
        } else {
            payload.insert(field, value);
        }
    }
    Reconciled { payload, dropped }
}
