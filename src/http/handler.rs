//! Inbound request tracing.
//!
//! # Responsibilities
//! - Decode `X-Cloud-Trace-Context` from incoming requests
//! - Start a span with the remote parent, or a root span when the header
//!   is absent or malformed
//! - Expose the span to the wrapped handler through request extensions
//! - End the span on every exit path
//!
//! # Design Decisions
//! - A bad header is normal traffic: no error, no log line, just a root span
//! - The remote sampling decision is taken as sent

use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use http::Request;
use tower::{Layer, Service};

use crate::http::context::RequestSpanExt;
use crate::propagation::{decode, server_span_name, CLOUD_TRACE_CONTEXT, RECV_PREFIX};
use crate::trace::{Span, SpanGuard, Tracer};

/// Handler wrapper that traces each incoming request.
#[derive(Clone)]
pub struct TraceHandler<S> {
    inner: S,
    tracer: Arc<dyn Tracer>,
}

impl<S> TraceHandler<S> {
    pub fn new(inner: S, tracer: Arc<dyn Tracer>) -> Self {
        Self { inner, tracer }
    }

    fn start_span<B>(&self, req: &Request<B>) -> Span {
        let name = server_span_name(RECV_PREFIX, req.uri(), req.headers());
        let remote = req
            .headers()
            .get(&CLOUD_TRACE_CONTEXT)
            .and_then(|value| value.to_str().ok())
            .and_then(decode);

        match remote {
            Some(parent) => self
                .tracer
                .start_span_with_remote_parent(&name, parent.span_context()),
            None => self.tracer.start_span(&name, None),
        }
    }
}

impl<S, B> Service<Request<B>> for TraceHandler<S>
where
    S: Service<Request<B>>,
    S::Future: Send + 'static,
    S::Response: 'static,
    S::Error: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let span = self.start_span(&req);
        req.set_span(span.clone());

        let guard = SpanGuard::new(self.tracer.clone(), span);
        let fut = self.inner.call(req);
        Box::pin(async move {
            let result = fut.await;
            drop(guard);
            result
        })
    }
}

/// Layer producing [`TraceHandler`].
#[derive(Clone)]
pub struct TraceHandlerLayer {
    tracer: Arc<dyn Tracer>,
}

impl TraceHandlerLayer {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self { tracer }
    }
}

impl<S> Layer<S> for TraceHandlerLayer {
    type Service = TraceHandler<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceHandler::new(inner, self.tracer.clone())
    }
}
