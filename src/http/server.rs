//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble the default stage chain around the echo handler
//! - Create the Axum router that feeds every request into the chain
//! - Serve connections (HTTP/1.1 and HTTP/2) with transport timeouts
//! - Drain in-flight connections on shutdown

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto::Builder as ConnBuilder,
    service::TowerToHyperService,
};
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{EchoConfig, RunMode};
use crate::http::echo::EchoHandler;
use crate::http::middleware::Pipeline;
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::observability::{AccessLogSink, AccessLogger};
use crate::resilience::{Recover, TimedIo};
use crate::security::SecurityHeaders;

/// The production chain: recover → security headers → access log → echo.
pub fn default_pipeline(sink: Arc<AccessLogSink>, mode: RunMode) -> Pipeline {
    Pipeline::builder(EchoHandler)
        .stage(Recover)
        .stage(SecurityHeaders)
        .stage(AccessLogger::new(sink, mode))
        .build()
}

/// HTTP server for the echo service.
pub struct EchoServer {
    router: Router,
    config: EchoConfig,
}

impl EchoServer {
    /// Create a server with the default chain, logging to today's file
    /// under `config.logging.dir`.
    pub fn new(config: EchoConfig) -> Self {
        let sink = Arc::new(AccessLogSink::open_daily(&config.logging.dir));
        Self::with_sink(config, sink)
    }

    /// Create a server with the default chain and the given access log sink.
    pub fn with_sink(config: EchoConfig, sink: Arc<AccessLogSink>) -> Self {
        let pipeline = default_pipeline(sink, config.logging.mode);
        Self::with_pipeline(config, pipeline)
    }

    /// Create a server around a custom chain.
    pub fn with_pipeline(config: EchoConfig, pipeline: Pipeline) -> Self {
        let router = Self::build_router(pipeline);
        Self { router, config }
    }

    /// Build the Axum router. Every method and path reaches the chain.
    fn build_router(pipeline: Pipeline) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(pipeline)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process use without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires, then wait for open connections to finish.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(
            address = %addr,
            mode = %self.config.logging.mode,
            "HTTP server starting"
        );

        let timeouts = self.config.timeouts.clone();
        let mut builder = ConnBuilder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(timeouts.read());

        let service = TowerToHyperService::new(self.router);
        let tracker = ConnectionTracker::new();
        let drain = Shutdown::new();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    tracing::info!(
                        in_flight = tracker.active_count(),
                        "Shutdown requested, draining connections"
                    );
                    break;
                }

                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(ListenerError::Closed) => break,
                        Err(error) => {
                            tracing::warn!(error = %error, "Accept failed");
                            continue;
                        }
                    };

                    let guard = tracker.track();
                    let io = TokioIo::new(TimedIo::new(stream, timeouts.idle(), timeouts.write()));
                    let builder = builder.clone();
                    let service = service.clone();
                    let mut drain_rx = drain.subscribe();

                    tokio::spawn(async move {
                        let _permit = permit;
                        let connection_id = guard.id();

                        let conn = builder.serve_connection(io, service);
                        tokio::pin!(conn);

                        let result = tokio::select! {
                            result = conn.as_mut() => result,
                            _ = drain_rx.recv() => {
                                conn.as_mut().graceful_shutdown();
                                conn.as_mut().await
                            }
                        };

                        if let Err(error) = result {
                            tracing::debug!(
                                connection_id = %connection_id,
                                peer = %peer,
                                error = %error,
                                "Connection ended with error"
                            );
                        }
                        drop(guard);
                    });
                }
            }
        }

        drain.trigger();
        if tokio::time::timeout(timeouts.idle(), tracker.wait_for_drain())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Connections still open after drain timeout"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Hand one request to the chain.
async fn dispatch(State(pipeline): State<Pipeline>, request: Request<Body>) -> Response {
    pipeline.handle(request).await
}
