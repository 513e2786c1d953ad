//! The echo endpoint.
//!
//! ```text
//! GET  /        → 200 {"message":"Welcome"}
//! *    /        → 405 Method not allowed
//! *    /<any>   → 200 {"response":{"data":<body or null>,"message":"Redirect Data"}}
//! ```
//!
//! The catch-all answers 200 with the envelope; no redirect status or
//! `Location` header is ever sent despite the message text.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::http::middleware::Endpoint;
use crate::http::request::CapturedBody;

pub const WELCOME_MESSAGE: &str = "Welcome";
pub const ECHO_MESSAGE: &str = "Redirect Data";

#[derive(Debug, Serialize)]
struct Welcome {
    message: &'static str,
}

/// `{"response": {...}}` wrapper around the echoed body.
#[derive(Debug, Serialize)]
pub struct EchoEnvelope {
    pub response: EchoPayload,
}

#[derive(Debug, Serialize)]
pub struct EchoPayload {
    pub data: Option<Value>,
    pub message: &'static str,
}

impl EchoEnvelope {
    pub fn new(data: Option<Value>) -> Self {
        Self {
            response: EchoPayload {
                data,
                message: ECHO_MESSAGE,
            },
        }
    }
}

/// Welcome on `/`, echo everywhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

#[async_trait]
impl Endpoint for EchoHandler {
    async fn call(&self, request: Request<Body>) -> Response {
        if request.uri().path() == "/" {
            if request.method() != Method::GET {
                return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
            }
            return Json(Welcome {
                message: WELCOME_MESSAGE,
            })
            .into_response();
        }

        let data = match CapturedBody::from_request(&request) {
            Some(captured) => captured.json().cloned(),
            None => CapturedBody::read(request.into_body()).await.json().cloned(),
        };

        Json(EchoEnvelope::new(data)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::json;

    async fn call(method: Method, path: &str, body: &'static str) -> (StatusCode, String, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::from(body))
            .unwrap();
        let response = EchoHandler.call(request).await;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned())
            .unwrap_or_default();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn get_root_welcomes() {
        let (status, content_type, body) = call(Method::GET, "/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        assert_eq!(body, br#"{"message":"Welcome"}"#);
    }

    #[tokio::test]
    async fn root_query_string_still_welcomes() {
        let (status, _, body) = call(Method::GET, "/?from=test", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"message":"Welcome"}"#);
    }

    #[tokio::test]
    async fn other_methods_on_root_are_rejected() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            let (status, content_type, body) = call(method.clone(), "/", "{}").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert!(content_type.starts_with("text/plain"));
            assert_eq!(body, b"Method not allowed");
        }
    }

    #[tokio::test]
    async fn echoes_json_body_on_any_other_path() {
        let (status, content_type, body) =
            call(Method::POST, "/webhook", r#"{"event":"test","data":"hello"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            json!({"response": {"data": {"event": "test", "data": "hello"}, "message": "Redirect Data"}})
        );
    }

    #[tokio::test]
    async fn non_json_and_empty_bodies_echo_null() {
        for body in ["", "plain text", "{broken"] {
            let (status, _, bytes) = call(Method::PATCH, "/a/b/c", body).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(bytes, br#"{"response":{"data":null,"message":"Redirect Data"}}"#);
        }
    }

    #[tokio::test]
    async fn prefers_capture_from_upstream_stage() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/hook")
            .body(Body::from("[1,2,3]"))
            .unwrap();
        let (request, _) = CapturedBody::capture(request).await;

        let response = EchoHandler.call(request).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["response"]["data"], json!([1, 2, 3]));
    }
}
