//! Backend transport: the one seam where requests leave the gateway.
//!
//! The core only builds a [`BackendRequest`] (method, relative path, query,
//! JSON body) and interprets the [`BackendResponse`]. Connection pooling,
//! TLS and timeouts belong to the [`Transport`] implementation.

mod http;

pub use http::HttpTransport;

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackendRequest {
    pub method: Method,
    /// Relative to the backend base URL, e.g. `assets/{id}/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Caller's `Authorization` header, forwarded verbatim.
    pub authorization: Option<String>,
}

impl BackendRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        BackendRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authorization: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_authorization(mut self, authorization: Option<&str>) -> Self {
        self.authorization = authorization.map(str::to_string);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl ResponseBody {
    /// JSON view of the body; text becomes a JSON string, bytes become null.
    pub fn into_json(self) -> Value {
        match self {
            ResponseBody::Json(v) => v,
            ResponseBody::Text(s) => Value::String(s),
            ResponseBody::Bytes(_) => Value::Null,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ResponseBody::Json(v) => serde_json::to_vec(&v).unwrap_or_default(),
            ResponseBody::Text(s) => s.into_bytes(),
            ResponseBody::Bytes(b) => b,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: ResponseBody,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

impl BackendResponse {
    pub fn json(status: u16, body: Value) -> Self {
        BackendResponse {
            status,
            body: ResponseBody::Json(body),
            content_type: Some("application/json".into()),
            content_disposition: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, TransportError>;
}
