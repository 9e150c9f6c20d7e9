//! reqwest-backed transport for the REST backend.

use super::{BackendRequest, BackendResponse, Method, ResponseBody, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Longest backend body fragment written to logs.
const MAX_LOG_BODY_LENGTH: usize = 200;

fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };
    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)?;
        let mut builder = Client::builder().user_agent(concat!("model-gateway/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Unreachable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn decode_body(content_type: Option<&str>, bytes: Vec<u8>) -> Result<ResponseBody, TransportError> {
    if bytes.is_empty() {
        return Ok(ResponseBody::Json(serde_json::Value::Null));
    }
    let mime = content_type.unwrap_or("").to_ascii_lowercase();
    if mime.contains("json") {
        return serde_json::from_slice(&bytes)
            .map(ResponseBody::Json)
            .map_err(|e| TransportError::Decode(e.to_string()));
    }
    if mime.starts_with("text/") {
        return Ok(match String::from_utf8(bytes) {
            Ok(text) => ResponseBody::Text(text),
            Err(e) => ResponseBody::Bytes(e.into_bytes()),
        });
    }
    Ok(ResponseBody::Bytes(bytes))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        tracing::debug!(method = %request.method, url = %url, "backend request");

        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(auth) = &request.authorization {
            builder = builder.header(AUTHORIZATION, auth);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = header_string(response.headers(), CONTENT_TYPE);
        let content_disposition = header_string(response.headers(), CONTENT_DISPOSITION);
        let bytes = response.bytes().await?.to_vec();

        if !(200..300).contains(&status) {
            tracing::debug!(
                status,
                body = %sanitize_for_log(&String::from_utf8_lossy(&bytes)),
                "backend error response"
            );
        }

        let body = decode_body(content_type.as_deref(), bytes)?;
        Ok(BackendResponse {
            status,
            body,
            content_type,
            content_disposition,
        })
    }
}
