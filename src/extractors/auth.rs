//! Extract the caller's credentials to forward to the backend.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// `Authorization` header of the incoming request, forwarded verbatim. The gateway never inspects it.
#[derive(Clone, Debug, Default)]
pub struct ForwardedAuth(pub Option<String>);

impl ForwardedAuth {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ForwardedAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v: &axum::http::HeaderValue| v.to_str().ok())
            .map(|s: &str| s.trim().to_string())
            .filter(|s: &String| !s.is_empty());
        Ok(ForwardedAuth(value))
    }
}
