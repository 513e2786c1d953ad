//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured diagnostic events via tracing)
//!
//! Each request produces:
//!     → access_log.rs (one JSON line in the daily access log,
//!                      plus a console line in development mode)
//! ```
//!
//! # Design Decisions
//! - Diagnostics and the access log are separate streams
//! - The request ID is assigned at the chain boundary and read by every stage
//! - Logging failures never fail a request

pub mod access_log;
pub mod logging;

pub use access_log::{AccessLogEntry, AccessLogSink, AccessLogger};
