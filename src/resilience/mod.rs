//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connection level:
//!     → timeouts.rs (idle and write deadlines on the socket)
//!
//! Request level:
//!     → recovery.rs (outermost stage, panic → Fault)
//! ```
//!
//! # Design Decisions
//! - Contain failures to the request or connection that caused them
//! - No retries anywhere; every failure is terminal for its request

pub mod recovery;
pub mod timeouts;

pub use recovery::Recover;
pub use timeouts::TimedIo;
