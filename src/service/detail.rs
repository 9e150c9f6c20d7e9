//! Detail loading: one record plus its declared relations, fetched concurrently.

use crate::config::{ModelRegistry, RelatedField, ResourceDescriptor};
use crate::error::AppError;
use crate::service::list::ListView;
use crate::transport::{BackendRequest, Transport};
use futures::future::{join_all, try_join};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of one related-field fetch. Failures downgrade to `Unavailable`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RelatedData {
    Available { resource: String, view: ListView },
    Unavailable {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        reason: String,
    },
}

impl RelatedData {
    pub fn is_available(&self) -> bool {
        matches!(self, RelatedData::Available { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailView {
    pub data: Value,
    pub related_resources: BTreeMap<String, RelatedData>,
}

pub struct DetailLoader;

impl DetailLoader {
    /// Fetch `{endpoint}/{id}/` and every related field scoped to `id`.
    ///
    /// The primary fetch decides the outcome: its failure aborts the load and
    /// drops the related fetches still in flight.
    pub async fn load(
        registry: &ModelRegistry,
        transport: &dyn Transport,
        resource: &str,
        id: &str,
        authorization: Option<&str>,
    ) -> Result<DetailView, AppError> {
        let descriptor = registry.lookup(resource)?;

        let primary = fetch_primary(transport, descriptor, id, authorization);
        let related = join_all(descriptor.related_fields.iter().map(|(field, rel)| async move {
            let data = fetch_related(registry, transport, rel, id, authorization).await;
            (field.clone(), data)
        }));
        let (data, related) = try_join(primary, async { Ok::<_, AppError>(related.await) }).await?;

        Ok(DetailView {
            data,
            related_resources: related.into_iter().collect(),
        })
    }
}

async fn fetch_primary(
    transport: &dyn Transport,
    descriptor: &ResourceDescriptor,
    id: &str,
    authorization: Option<&str>,
) -> Result<Value, AppError> {
    let path = format!("{}/{}/", descriptor.endpoint(), id);
    let response = transport
        .send(BackendRequest::get(path.clone()).with_authorization(authorization))
        .await?;
    if !response.is_success() {
        if response.status >= 500 {
            tracing::error!(resource = %descriptor.key, id, status = response.status, "primary fetch failed");
        }
        return Err(AppError::from_backend(response.status, response.body.into_json(), &path));
    }
    Ok(response.body.into_json())
}

async fn fetch_related(
    registry: &ModelRegistry,
    transport: &dyn Transport,
    related: &RelatedField,
    parent_id: &str,
    authorization: Option<&str>,
) -> RelatedData {
    let unavailable = |status: Option<u16>, reason: String| RelatedData::Unavailable {
        resource: related.resource.clone(),
        status,
        reason,
    };
    let descriptor = match registry.lookup(&related.resource) {
        Ok(d) => d,
        Err(e) => return unavailable(None, e.to_string()),
    };
    let request = BackendRequest::get(format!("{}/", descriptor.endpoint()))
        .with_query(related.filter.as_str(), parent_id)
        .with_authorization(authorization);
    match transport.send(request).await {
        Ok(response) if response.is_success() => RelatedData::Available {
            resource: related.resource.clone(),
            view: ListView::from_backend(descriptor, response.body.into_json()),
        },
        Ok(response) => {
            tracing::warn!(related = %related.resource, status = response.status, "related fetch failed");
            unavailable(Some(response.status), format!("backend responded with {}", response.status))
        }
        Err(e) => {
            tracing::warn!(related = %related.resource, error = %e, "related fetch failed");
            unavailable(None, e.to_string())
        }
    }
}
