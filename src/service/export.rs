//! Export passthrough: backend-generated files proxied as opaque bytes.

use crate::config::ResourceDescriptor;
use crate::error::AppError;
use crate::transport::{BackendRequest, Transport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl std::str::FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(AppError::BadRequest(format!(
                "invalid export format: {} (expected csv, xlsx or pdf)",
                s
            ))),
        }
    }
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

/// Fetch `{endpoint}/export_{format}/` without looking inside the body.
pub async fn export(
    transport: &dyn Transport,
    descriptor: &ResourceDescriptor,
    format: ExportFormat,
    authorization: Option<&str>,
) -> Result<ExportFile, AppError> {
    let path = format!("{}/export_{}/", descriptor.endpoint(), format.as_str());
    let response = transport
        .send(BackendRequest::get(path.clone()).with_authorization(authorization))
        .await?;
    if !response.is_success() {
        return Err(AppError::from_backend(response.status, response.body.into_json(), &path));
    }
    Ok(ExportFile {
        content_type: response.content_type,
        content_disposition: response.content_disposition,
        bytes: response.body.into_bytes(),
    })
}
