use async_trait::async_trait;
use axum::http::{HeaderMap, header};

/// Credential check consulted before any part of an upload is read
#[async_trait]
pub trait UploadAuthorizer: Send + Sync {
    async fn authorize(&self, headers: &HeaderMap) -> bool;
}

/// Accepts every request
pub struct AllowAnonymous;

#[async_trait]
impl UploadAuthorizer for AllowAnonymous {
    async fn authorize(&self, _headers: &HeaderMap) -> bool {
        true
    }
}

/// Requires `Authorization: Bearer <token>` matching a shared secret
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl UploadAuthorizer for BearerToken {
    async fn authorize(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|presented| constant_time_eq(presented.as_bytes(), self.token.as_bytes()))
    }
}

/// Comparison time depends only on the input lengths
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Picks the authorizer for the configured token
pub fn create_authorizer(upload_token: Option<&str>) -> Box<dyn UploadAuthorizer> {
    match upload_token {
        Some(token) => Box::new(BearerToken::new(token)),
        None => Box::new(AllowAnonymous),
    }
}
