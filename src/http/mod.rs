//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, Axum router)
//!     → middleware/ (ordered stage chain)
//!         → resilience::Recover       (panic → 500)
//!         → security::SecurityHeaders (hardening headers)
//!         → observability::AccessLogger
//!               request.rs (request ID, body capture + replay)
//!               response.rs (status tracking)
//!     → echo.rs (welcome / echo)
//!     → Send to client
//! ```

pub mod echo;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use echo::EchoHandler;
pub use middleware::{Endpoint, Next, Pipeline, Stage};
pub use request::{CapturedBody, RequestId, RequestIdExt, X_REQUEST_ID};
pub use response::{Fault, HttpError, Outcome, StatusTracker};
pub use server::{default_pipeline, EchoServer};
