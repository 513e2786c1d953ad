//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the access log for today
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal
//! - A missing access log is not; the server runs without file logging
//! - Listener starts last (traffic only when ready)

use std::sync::Arc;

use crate::config::EchoConfig;
use crate::http::EchoServer;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::AccessLogSink;

/// Bring the server up and serve until `shutdown` fires.
pub async fn start(config: EchoConfig, shutdown: &Shutdown) -> Result<(), ListenerError> {
    // An unopenable log is reported by the sink itself.
    let sink = Arc::new(AccessLogSink::open_daily(&config.logging.dir));

    let listener = Listener::bind(&config.listener).await?;
    let server = EchoServer::with_sink(config, sink);
    server.run(listener, shutdown.subscribe()).await
}
