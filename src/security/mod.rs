//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (stage hardening headers on the response head)
//!     → Pass to the rest of the chain
//! ```
//!
//! # Design Decisions
//! - Headers apply to every response, including error responses
//! - No authentication or request validation; this is a mirror for testing

pub mod headers;

pub use headers::{SecurityHeaders, SECURITY_HEADERS};
