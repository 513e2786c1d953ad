//! Request-processing chain.
//!
//! # Data Flow
//! ```text
//! Pipeline::handle(request)
//!     → request ID assigned
//!     → stages[0].process(request, next)      outermost
//!     → stages[1].process(request, next)
//!     → ...
//!     → endpoint.call(request)                innermost
//!     ← Outcome = Result<Response, Fault>
//!     → faults rendered as JSON error envelope
//!     → staged response headers applied
//! ```
//!
//! # Design Decisions
//! - Stages are an ordered list built once at startup, not nested closures
//! - `Next` walks the remaining slice; a stage may run it at most once
//! - Faults travel as values; unwinding is converted to `Fault` by the
//!   recovery stage

use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::IntoResponse, response::Response};

use crate::http::request::RequestIdExt;
use crate::http::response::{Outcome, ResponseHead};

/// One link of the chain with a single cross-cutting responsibility.
#[async_trait]
pub trait Stage: Send + Sync + 'static {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Handle `request`, usually by delegating to `next`.
    async fn process(&self, request: Request<Body>, next: Next<'_>) -> Outcome;
}

/// The business handler at the end of the chain.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    async fn call(&self, request: Request<Body>) -> Response;
}

/// The remainder of the chain after the current stage.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    fn new(stages: &'a [Arc<dyn Stage>], endpoint: &'a dyn Endpoint) -> Self {
        Self { stages, endpoint }
    }

    /// Run the rest of the chain.
    pub async fn run(self, request: Request<Body>) -> Outcome {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                tracing::trace!(stage = stage.name(), "Entering stage");
                stage.process(request, Next::new(rest, self.endpoint)).await
            }
            None => Ok(self.endpoint.call(request).await),
        }
    }
}

/// An endpoint wrapped by an ordered list of stages.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Stage>]>,
    endpoint: Arc<dyn Endpoint>,
}

impl Pipeline {
    pub fn builder(endpoint: impl Endpoint) -> PipelineBuilder {
        PipelineBuilder {
            stages: Vec::new(),
            endpoint: Arc::new(endpoint),
        }
    }

    /// Stage names, outermost first.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run one request through the chain and produce the final response.
    pub async fn handle(&self, mut request: Request<Body>) -> Response {
        request.assign_request_id();
        let head = ResponseHead::new();
        request.extensions_mut().insert(head.clone());

        let outcome = Next::new(&self.stages, self.endpoint.as_ref())
            .run(request)
            .await;

        let mut response = match outcome {
            Ok(response) => response,
            Err(fault) => fault.into_response(),
        };
        head.apply(response.headers_mut());
        response
    }
}

/// Collects stages in outermost-to-innermost order.
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Stage>>,
    endpoint: Arc<dyn Endpoint>,
}

impl PipelineBuilder {
    /// Append a stage inside the ones added before it.
    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages.into(),
            endpoint: self.endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::X_REQUEST_ID;
    use crate::http::response::{Fault, HttpError};
    use axum::http::{HeaderValue, StatusCode};
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Stage for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn process(&self, request: Request<Body>, next: Next<'_>) -> Outcome {
            self.log.lock().unwrap().push(format!("enter {}", self.label));
            let outcome = next.run(request).await;
            self.log.lock().unwrap().push(format!("leave {}", self.label));
            outcome
        }
    }

    struct Reject;

    #[async_trait]
    impl Stage for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        async fn process(&self, _request: Request<Body>, _next: Next<'_>) -> Outcome {
            Err(Fault::from(HttpError::not_found()))
        }
    }

    struct Stamp;

    #[async_trait]
    impl Stage for Stamp {
        fn name(&self) -> &'static str {
            "stamp"
        }

        async fn process(&self, request: Request<Body>, next: Next<'_>) -> Outcome {
            if let Some(head) = request.extensions().get::<ResponseHead>() {
                head.insert("x-stamp".parse().unwrap(), HeaderValue::from_static("1"));
            }
            next.run(request).await
        }
    }

    struct Hello;

    #[async_trait]
    impl Endpoint for Hello {
        async fn call(&self, _request: Request<Body>) -> Response {
            "hello".into_response()
        }
    }

    fn get() -> Request<Body> {
        Request::builder().uri("/x").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn stages_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder(Hello)
            .stage(Recorder { label: "outer", log: log.clone() })
            .stage(Recorder { label: "inner", log: log.clone() })
            .build();

        assert_eq!(pipeline.stage_names(), vec!["outer", "inner"]);

        let response = pipeline.handle(get()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["enter outer", "enter inner", "leave inner", "leave outer"]
        );
    }

    #[tokio::test]
    async fn short_circuit_fault_is_rendered_with_staged_headers() {
        let pipeline = Pipeline::builder(Hello).stage(Stamp).stage(Reject).build();

        let response = pipeline.handle(get()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-stamp"], "1");
    }

    /// Answers with the request ID it saw as the body.
    struct EchoId;

    #[async_trait]
    impl Endpoint for EchoId {
        async fn call(&self, request: Request<Body>) -> Response {
            request.request_id().unwrap_or_default().to_owned().into_response()
        }
    }

    #[tokio::test]
    async fn every_request_gets_a_fresh_server_assigned_id() {
        let pipeline = Pipeline::builder(EchoId).build();

        let mut seen = Vec::new();
        for _ in 0..2 {
            let request = Request::builder()
                .uri("/x")
                .header(X_REQUEST_ID, "client-chosen")
                .body(Body::empty())
                .unwrap();
            let response = pipeline.handle(request).await;
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            seen.push(String::from_utf8(body.to_vec()).unwrap());
        }

        assert!(seen.iter().all(|id| id.parse::<uuid::Uuid>().is_ok()));
        assert_ne!(seen[0], seen[1]);
    }

    #[tokio::test]
    async fn empty_pipeline_calls_endpoint() {
        let pipeline = Pipeline::builder(Hello).build();
        let response = pipeline.handle(get()).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }
}
