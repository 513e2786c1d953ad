//! Response-side types shared by the stages.
//!
//! # Responsibilities
//! - The JSON error envelope (`HttpError`) and the per-request fault value
//! - Passive status observation for the access log (`StatusTracker`)
//! - Headers staged for the response before downstream runs (`ResponseHead`)
//!
//! # Design Decisions
//! - Only errors marked `expose` reveal their message; others are rendered
//!   with the status' canonical reason
//! - Staged headers never override a header set by a downstream stage

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result of running (part of) the stage chain for one request.
pub type Outcome = Result<Response, Fault>;

/// Structured HTTP error, serialized as `{"status":..,"message":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
    /// Whether `message` may be shown to the client.
    #[serde(skip)]
    pub expose: bool,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>, expose: bool) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            expose,
        }
    }

    /// 404 Not Found.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", true)
    }

    /// 500 Internal Server Error.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", false)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The envelope as the client sees it.
    fn public(&self) -> HttpError {
        if self.expose {
            return self.clone();
        }
        let status = self.status_code();
        HttpError {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Error").to_string(),
            expose: false,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let public = self.public();
        (public.status_code(), Json(public)).into_response()
    }
}

/// A request that could not be completed normally.
#[derive(Debug, Error)]
pub enum Fault {
    /// A downstream stage panicked; carries the panic message.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// A stage rejected the request with an explicit error.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl Fault {
    /// The envelope this fault is rendered as.
    pub fn to_http_error(&self) -> HttpError {
        match self {
            Fault::Panic(_) => HttpError::internal(),
            Fault::Http(error) => error.clone(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.to_http_error().status_code()
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        self.to_http_error().into_response()
    }
}

/// Records the first status observed for a response. Defaults to 200.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    status: Arc<OnceLock<StatusCode>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status` unless one was already recorded.
    pub fn record(&self, status: StatusCode) {
        let _ = self.status.set(status);
    }

    /// Record the status of `outcome` and hand it back untouched.
    pub fn observe(&self, outcome: Outcome) -> Outcome {
        match &outcome {
            Ok(response) => self.record(response.status()),
            Err(fault) => self.record(fault.status_code()),
        }
        outcome
    }

    pub fn status(&self) -> StatusCode {
        self.status.get().copied().unwrap_or(StatusCode::OK)
    }
}

/// Response headers staged by a stage before the rest of the chain runs.
///
/// Shared through request extensions so the headers survive a panic further
/// down the chain and still reach the error response.
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    headers: Arc<Mutex<HeaderMap>>,
}

impl ResponseHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: HeaderName, value: HeaderValue) {
        self.lock().insert(name, value);
    }

    /// Copy staged headers onto `target`, keeping any header it already has.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in self.lock().iter() {
            if !target.contains_key(name) {
                target.insert(name.clone(), value.clone());
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HeaderMap> {
        self.headers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
