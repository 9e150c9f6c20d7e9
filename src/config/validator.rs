//! Config validation: unique URL-safe keys and resolvable related fields.

use crate::config::RegistryConfig;
use crate::error::ConfigError;
use std::collections::HashSet;

fn is_url_safe(s: &str, allow_slash: bool) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || (allow_slash && c == '/'))
}

/// Strip surrounding slashes so endpoints join as `{endpoint}/{id}/`.
pub fn normalize_endpoint(endpoint: &str) -> &str {
    endpoint.trim_matches('/')
}

pub fn validate(config: &RegistryConfig) -> Result<(), ConfigError> {
    let mut keys = HashSet::new();
    for model in &config.models {
        if !is_url_safe(&model.key, false) {
            return Err(ConfigError::InvalidKey(model.key.clone()));
        }
        if let Some(endpoint) = &model.endpoint {
            if !is_url_safe(normalize_endpoint(endpoint), true) {
                return Err(ConfigError::InvalidKey(endpoint.clone()));
            }
        }
        if !keys.insert(model.key.as_str()) {
            return Err(ConfigError::DuplicateKey(model.key.clone()));
        }
    }

    for model in &config.models {
        for (field, related) in &model.related_fields {
            if !keys.contains(related.resource.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "related resource",
                    id: format!("{}.{} -> {}", model.key, field, related.resource),
                });
            }
            if let Some(filter) = &related.filter {
                if !is_url_safe(filter, false) {
                    return Err(ConfigError::InvalidKey(filter.clone()));
                }
            }
        }
    }

    Ok(())
}
