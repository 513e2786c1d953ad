//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use dev_echo_server::net::{Listener, ListenerError};
use dev_echo_server::observability::AccessLogSink;
use dev_echo_server::{EchoConfig, EchoServer, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), ListenerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle
            .await
            .expect("server task panicked")
            .expect("server returned an error");
    }
}

/// Start `server` on 127.0.0.1 with an OS-assigned port.
pub async fn spawn(server: EchoServer) -> TestServer {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tcp(tcp, 1024).unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Start the default chain with the given access log sink.
#[allow(dead_code)]
pub async fn spawn_default(sink: AccessLogSink) -> TestServer {
    spawn(EchoServer::with_sink(EchoConfig::default(), Arc::new(sink))).await
}

/// HTTP client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}

/// The five hardening headers every response must carry.
#[allow(dead_code)]
pub fn assert_security_headers(response: &reqwest::Response) {
    let expected = [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("x-xss-protection", "1; mode=block"),
        ("strict-transport-security", "max-age=31536000; includeSubDomains"),
        ("content-security-policy", "default-src 'self'"),
    ];
    for (name, value) in expected {
        assert_eq!(
            response.headers().get(name).and_then(|v| v.to_str().ok()),
            Some(value),
            "missing or wrong {name} on {} response",
            response.status()
        );
    }
}
