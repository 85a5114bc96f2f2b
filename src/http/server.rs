//! Trace relay HTTP server.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handlers
//! - Wire up middleware (request trace logging, timeout, span propagation, stats)
//! - Report the inbound span on `/`
//! - Forward `/relay` to the configured upstream with the span propagated

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::http::context::RequestSpanExt;
use crate::http::handler::TraceHandlerLayer;
use crate::http::transport::{DefaultTransport, TraceTransport};
use crate::propagation::encode;
use crate::stats::{StatsLayer, StatsService};
use crate::trace::{Span, Tracer};

type UpstreamSender = TraceTransport<StatsService<DefaultTransport>>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Option<Uri>,
    pub transport: UpstreamSender,
}

/// HTTP server that reports and relays trace context.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
}

impl RelayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: RelayConfig, tracer: Arc<dyn Tracer>) -> Self {
        let upstream = config.upstream.url.as_deref().and_then(|url| {
            url.parse::<Uri>()
                .map_err(|e| {
                    tracing::warn!(url = %url, error = %e, "Ignoring invalid upstream URL")
                })
                .ok()
        });

        let state = AppState {
            upstream,
            transport: TraceTransport::with_base(
                StatsService::client(DefaultTransport::new()),
                tracer.clone(),
            ),
        };

        let router = Self::build_router(&config, state, tracer);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState, tracer: Arc<dyn Tracer>) -> Router {
        Router::new()
            .route("/", get(span_info))
            .route("/relay", get(relay_handler))
            .with_state(state)
            .layer(StatsLayer::server())
            .layer(TraceHandlerLayer::new(tracer))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for embedding or driving without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = ?self.config.upstream.url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Report the span this request is handled under.
async fn span_info(Extension(span): Extension<Span>) -> Json<serde_json::Value> {
    let context = span.context();
    Json(json!({
        "span": span.name(),
        "trace_id": context.trace_id.to_string(),
        "span_id": context.span_id.to_u64(),
        "parent_span_id": span.parent_span_id().map(|id| id.to_u64()),
        "remote_parent": span.has_remote_parent(),
        "sampled": context.is_sampled(),
        "header": encode(&context),
    }))
}

/// Forward a GET to the upstream as a child of the inbound span.
async fn relay_handler(
    State(state): State<AppState>,
    Extension(span): Extension<Span>,
) -> Response {
    let Some(upstream) = state.upstream.clone() else {
        return (StatusCode::NOT_FOUND, "No upstream configured").into_response();
    };

    let request = match Request::builder()
        .method(Method::GET)
        .uri(upstream)
        .body(Body::empty())
    {
        Ok(req) => req.with_span(span.clone()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream request");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Invalid upstream request").into_response();
        }
    };

    match state.transport.clone().oneshot(request).await {
        Ok(response) => {
            tracing::debug!(
                trace_id = %span.context().trace_id,
                status = %response.status(),
                "Upstream responded"
            );
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(trace_id = %span.context().trace_id, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::CLOUD_TRACE_CONTEXT;
    use crate::trace::RecordingTracer;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_span_info_reports_remote_parent() {
        let tracer = Arc::new(RecordingTracer::new());
        let router = RelayServer::new(RelayConfig::default(), tracer.clone()).into_router();

        let request = Request::builder()
            .uri("/")
            .header(CLOUD_TRACE_CONTEXT, "105445aa7843bc8bf206b12000100000/123;o=1")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let info = body_json(response).await;
        assert_eq!(info["trace_id"], "105445aa7843bc8bf206b12000100000");
        assert_eq!(info["parent_span_id"], 123);
        assert_eq!(info["remote_parent"], true);
        assert_eq!(info["sampled"], true);
        assert_eq!(tracer.end_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_relay_without_upstream() {
        let tracer = Arc::new(RecordingTracer::new());
        let router = RelayServer::new(RelayConfig::default(), tracer).into_router();

        let request = Request::builder().uri("/relay").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_relay_to_unreachable_upstream() {
        let tracer = Arc::new(RecordingTracer::new());
        let mut config = RelayConfig::default();
        // reserved port, nothing listens there
        config.upstream.url = Some("http://127.0.0.1:1/".into());
        let router = RelayServer::new(config, tracer.clone()).into_router();

        let request = Request::builder().uri("/relay").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        // inbound span plus the outbound child, each ended once
        let started = tracer.started();
        assert_eq!(started.len(), 2);
        assert_eq!(started[1].parent_span_id(), Some(started[0].context().span_id));
        assert_eq!(tracer.end_calls().len(), 2);
    }
}
