//! Request correlation and body capture.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) and attach it as `x-request-id`
//! - Buffer the request body once, parse it as JSON, and replay the raw bytes
//!   so a later reader sees the stream untouched
//!
//! # Design Decisions
//! - The request ID overwrites any client-supplied value and is assigned once
//!   per request, so every stage sees the same one
//! - Bodies are buffered without a size limit; this is a development tool and
//!   the whole body must be echoed
//! - A body that is empty or not JSON yields no parsed value, never an error

use std::fmt;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, Request};
use serde_json::Value;
use uuid::Uuid;

/// Header carrying the per-request correlation identifier.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Per-request correlation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Accessors for the correlation header on a request.
pub trait RequestIdExt {
    /// Set `x-request-id`, replacing any existing value.
    fn set_request_id(&mut self, id: RequestId);

    /// The `x-request-id` header value, if present and valid UTF-8.
    fn request_id(&self) -> Option<&str>;

    /// The ID assigned to this request, generating and setting one on first
    /// use. Later calls return the same ID.
    fn assign_request_id(&mut self) -> RequestId;
}

impl<B> RequestIdExt for Request<B> {
    fn set_request_id(&mut self, id: RequestId) {
        // A hyphenated UUID is always a valid header value.
        if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
            self.headers_mut().insert(X_REQUEST_ID, value);
        }
    }

    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
    }

    fn assign_request_id(&mut self) -> RequestId {
        if let Some(id) = self.extensions().get::<RequestId>() {
            return *id;
        }
        let id = RequestId::new();
        self.set_request_id(id);
        self.extensions_mut().insert(id);
        id
    }
}

/// A request body read into memory, with its JSON interpretation.
#[derive(Debug, Clone, Default)]
pub struct CapturedBody {
    raw: Bytes,
    parsed: Option<Value>,
}

impl CapturedBody {
    /// Interpret already-buffered bytes.
    pub fn from_bytes(raw: Bytes) -> Self {
        let parsed = if raw.is_empty() {
            None
        } else {
            serde_json::from_slice(&raw).ok()
        };
        Self { raw, parsed }
    }

    /// Drain `body` completely. A read failure is treated as an empty body.
    pub async fn read(body: Body) -> Self {
        match axum::body::to_bytes(body, usize::MAX).await {
            Ok(raw) => Self::from_bytes(raw),
            Err(error) => {
                tracing::debug!(error = %error, "Failed to read request body");
                Self::default()
            }
        }
    }

    /// Buffer the body of `request`, put the same bytes back as its body, and
    /// attach the capture to its extensions for downstream stages.
    pub async fn capture(request: Request<Body>) -> (Request<Body>, Arc<CapturedBody>) {
        let (mut parts, body) = request.into_parts();
        let captured = Arc::new(Self::read(body).await);
        parts.extensions.insert(Arc::clone(&captured));
        let request = Request::from_parts(parts, Body::from(captured.raw.clone()));
        (request, captured)
    }

    /// The capture attached by an upstream stage, if any.
    pub fn from_request(request: &Request<Body>) -> Option<Arc<CapturedBody>> {
        request.extensions().get::<Arc<CapturedBody>>().cloned()
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// The parsed JSON value; `None` for empty or non-JSON bodies.
    pub fn json(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/hook")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn set_request_id_overwrites_client_value() {
        let mut request = Request::builder()
            .header(X_REQUEST_ID, "client-chosen")
            .body(Body::empty())
            .unwrap();
        let id = RequestId::new();
        request.set_request_id(id);

        assert_eq!(request.request_id(), Some(id.to_string().as_str()));
        assert_eq!(request.headers().get_all(X_REQUEST_ID).iter().count(), 1);
    }

    #[test]
    fn assigned_id_replaces_client_value_and_is_stable() {
        let mut request = Request::builder()
            .header(X_REQUEST_ID, "client-chosen")
            .body(Body::empty())
            .unwrap();

        let first = request.assign_request_id();
        let second = request.assign_request_id();

        assert_eq!(first, second);
        assert_eq!(request.request_id(), Some(first.to_string().as_str()));
        assert_eq!(request.extensions().get::<RequestId>(), Some(&first));
    }

    #[test]
    fn parses_any_json_value() {
        let captured = CapturedBody::from_bytes(Bytes::from_static(b"[1, \"two\", null]"));
        assert_eq!(captured.json(), Some(&json!([1, "two", null])));

        let captured = CapturedBody::from_bytes(Bytes::from_static(b"42"));
        assert_eq!(captured.json(), Some(&json!(42)));
    }

    #[test]
    fn empty_and_malformed_bodies_have_no_value() {
        assert!(CapturedBody::from_bytes(Bytes::new()).json().is_none());
        assert!(CapturedBody::from_bytes(Bytes::from_static(b"   ")).json().is_none());
        assert!(CapturedBody::from_bytes(Bytes::from_static(b"{\"a\":")).json().is_none());
        assert!(CapturedBody::from_bytes(Bytes::from_static(b"{} trailing")).json().is_none());
    }

    #[tokio::test]
    async fn capture_replays_the_raw_body() {
        let (request, captured) = CapturedBody::capture(post(r#"{"event":"ping"}"#)).await;
        assert_eq!(captured.json(), Some(&json!({"event": "ping"})));

        let attached = CapturedBody::from_request(&request).unwrap();
        assert!(Arc::ptr_eq(&attached, &captured));

        let replayed = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&replayed[..], br#"{"event":"ping"}"#);
    }

    #[tokio::test]
    async fn capture_replays_non_json_bytes_verbatim() {
        let (request, captured) = CapturedBody::capture(post("not json")).await;
        assert!(captured.json().is_none());
        assert_eq!(&captured.raw()[..], b"not json");

        let replayed = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&replayed[..], b"not json");
    }
}
