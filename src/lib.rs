//! Development HTTP echo server library.
//!
//! Accepts any HTTP request and mirrors its JSON body back inside a fixed
//! envelope, for testing webhook senders and API clients.

pub mod config;
pub mod http;
pub mod net;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::EchoConfig;
pub use http::EchoServer;
pub use lifecycle::Shutdown;
