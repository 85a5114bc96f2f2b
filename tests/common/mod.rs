//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{http::HeaderMap, routing::get, Router};
use tokio::net::TcpListener;

use cloudtrace_http::config::RelayConfig;
use cloudtrace_http::lifecycle::Shutdown;
use cloudtrace_http::propagation::CLOUD_TRACE_CONTEXT;
use cloudtrace_http::trace::Tracer;
use cloudtrace_http::RelayServer;

/// Start a relay on an ephemeral port. It stops when `shutdown` triggers.
pub async fn start_relay(
    mut config: RelayConfig,
    tracer: Arc<dyn Tracer>,
    shutdown: &Shutdown,
) -> SocketAddr {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = RelayServer::new(config, tracer);
    let stop = shutdown.signal();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });
    addr
}

/// Trace headers seen by a [`start_recording_backend`].
pub type SeenHeaders = Arc<Mutex<Vec<Option<String>>>>;

/// Start a backend that answers 200 and records each request's trace header.
#[allow(dead_code)]
pub async fn start_recording_backend() -> (SocketAddr, SeenHeaders) {
    let seen: SeenHeaders = Arc::default();
    let recorder = seen.clone();

    let app = Router::new().route(
        "/",
        get(move |headers: HeaderMap| {
            let recorder = recorder.clone();
            async move {
                let header = headers
                    .get(&CLOUD_TRACE_CONTEXT)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                recorder.lock().unwrap().push(header);
                "backend ok"
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, seen)
}

/// Client without pooling or proxy lookup.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
