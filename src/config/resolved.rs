//! Resolved model registry: config validated and flattened for runtime use.

use crate::error::AppError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A related model fetched alongside a detail record, scoped by `filter={parent id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelatedField {
    pub resource: String,
    pub filter: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    pub key: String,
    /// Explicit REST path; `None` means the key doubles as the path segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_path: Option<String>,
    pub list_columns: Vec<String>,
    pub filter_keys: BTreeSet<String>,
    pub related_fields: BTreeMap<String, RelatedField>,
}

impl ResourceDescriptor {
    pub fn endpoint(&self) -> &str {
        self.endpoint_path.as_deref().unwrap_or(&self.key)
    }

    pub fn accepts_filter(&self, name: &str) -> bool {
        self.filter_keys.contains(name)
    }
}

/// Immutable after construction; shared across requests behind an `Arc`.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    by_key: HashMap<String, ResourceDescriptor>,
}

impl ModelRegistry {
    pub(crate) fn from_descriptors(descriptors: Vec<ResourceDescriptor>) -> Self {
        ModelRegistry {
            by_key: descriptors.into_iter().map(|d| (d.key.clone(), d)).collect(),
        }
    }

    pub fn lookup(&self, key: &str) -> Result<&ResourceDescriptor, AppError> {
        self.by_key
            .get(key)
            .ok_or_else(|| AppError::UnknownResource(key.to_string()))
    }

    pub fn resolve_endpoint(&self, key: &str) -> Result<String, AppError> {
        self.lookup(key).map(|d| d.endpoint().to_string())
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.by_key.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn descriptors(&self) -> Vec<&ResourceDescriptor> {
        let mut all: Vec<&ResourceDescriptor> = self.by_key.values().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
