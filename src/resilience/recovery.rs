//! Panic containment.
//!
//! # Responsibilities
//! - Catch a panic anywhere further down the chain
//! - Log the panic message and turn it into a `Fault`
//!
//! # Design Decisions
//! - Contain and respond; never retry
//! - The panic message and request ID are logged; the client sees a generic 500

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use axum::{body::Body, http::Request};
use futures_util::FutureExt;

use crate::http::middleware::{Next, Stage};
use crate::http::request::RequestIdExt;
use crate::http::response::{Fault, Outcome};

/// Outermost stage: converts unwinding into [`Fault::Panic`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Recover;

#[async_trait]
impl Stage for Recover {
    fn name(&self) -> &'static str {
        "recover"
    }

    async fn process(&self, mut request: Request<Body>, next: Next<'_>) -> Outcome {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let request_id = request.assign_request_id();

        // The request is moved into the chain; nothing observed after a panic
        // is reused, so unwind safety holds.
        match AssertUnwindSafe(next.run(request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    panic = %message,
                    "Panic recovered"
                );
                Err(Fault::Panic(message))
            }
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
