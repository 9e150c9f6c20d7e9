//! Raw registry config types matching the models JSON document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelatedFieldConfig {
    /// Key of the related model.
    pub resource: String,
    /// Query parameter scoping the related list to the parent id. Defaults to the parent key in singular form.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub key: String,
    /// REST path of the model when it differs from the key.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub list_columns: Vec<String>,
    #[serde(default)]
    pub filter_keys: Vec<String>,
    #[serde(default)]
    pub related_fields: BTreeMap<String, RelatedFieldConfig>,
}

/// All models in one struct for in-memory loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}
