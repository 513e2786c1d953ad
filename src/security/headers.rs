//! Security response headers.
//!
//! # Responsibilities
//! - Add a fixed set of hardening headers to every response
//!
//! # Design Decisions
//! - Headers are static; there is no configuration surface
//! - Staged before the rest of the chain runs, so error responses get them too

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
};

use crate::http::middleware::{Next, Stage};
use crate::http::response::{Outcome, ResponseHead};

/// Header names and values added to every response.
pub const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("content-security-policy", "default-src 'self'"),
];

/// Stage that stamps [`SECURITY_HEADERS`] on the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeaders;

impl SecurityHeaders {
    fn headers() -> impl Iterator<Item = (HeaderName, HeaderValue)> {
        SECURITY_HEADERS.into_iter().map(|(name, value)| {
            (
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            )
        })
    }
}

#[async_trait]
impl Stage for SecurityHeaders {
    fn name(&self) -> &'static str {
        "security-headers"
    }

    async fn process(&self, request: Request<Body>, next: Next<'_>) -> Outcome {
        match request.extensions().get::<ResponseHead>().cloned() {
            Some(head) => {
                for (name, value) in Self::headers() {
                    head.insert(name, value);
                }
                next.run(request).await
            }
            // Outside a Pipeline there is no shared head; stamp the result.
            None => {
                let mut response = next.run(request).await?;
                let headers = response.headers_mut();
                for (name, value) in Self::headers() {
                    headers.entry(name).or_insert(value);
                }
                Ok(response)
            }
        }
    }
}
