//! Build the registry from in-memory config or from a models JSON file.

use crate::config::resolved::{ModelRegistry, RelatedField, ResourceDescriptor};
use crate::config::{normalize_endpoint, validate, RegistryConfig};
use crate::error::ConfigError;
use std::path::Path;

/// Build the registry from config (validates first).
pub fn resolve(config: &RegistryConfig) -> Result<ModelRegistry, ConfigError> {
    validate(config)?;

    let descriptors = config
        .models
        .iter()
        .map(|model| {
            let related_fields = model
                .related_fields
                .iter()
                .map(|(field, related)| {
                    let filter = related
                        .filter
                        .clone()
                        .unwrap_or_else(|| default_filter_param(&model.key));
                    (
                        field.clone(),
                        RelatedField {
                            resource: related.resource.clone(),
                            filter,
                        },
                    )
                })
                .collect();
            ResourceDescriptor {
                key: model.key.clone(),
                endpoint_path: model
                    .endpoint
                    .as_deref()
                    .map(normalize_endpoint)
                    .filter(|e| *e != model.key)
                    .map(str::to_string),
                list_columns: model.list_columns.clone(),
                filter_keys: model.filter_keys.iter().cloned().collect(),
                related_fields,
            }
        })
        .collect();

    Ok(ModelRegistry::from_descriptors(descriptors))
}

/// Singular snake_case of a plural kebab key: "risk-scenarios" -> "risk_scenario".
fn default_filter_param(key: &str) -> String {
    let singular = key.strip_suffix('s').unwrap_or(key);
    singular.replace('-', "_")
}

/// Read and resolve a `{"models": [...]}` document.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ModelRegistry, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config: RegistryConfig =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let registry = resolve(&config)?;
    tracing::info!(path = %path.display(), models = registry.len(), "model registry loaded");
    Ok(registry)
}
