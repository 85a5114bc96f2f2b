//! Outbound request tracing.
//!
//! # Responsibilities
//! - Start a span per outgoing request, child of the request's span if any
//! - Write the span's context into `X-Cloud-Trace-Context`
//! - End the span once the base sender finishes, whatever the outcome
//! - Forward cancellation to the base sender when it supports it

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use futures_util::future::BoxFuture;
use http::{HeaderValue, Request, Response};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client, ResponseFuture};
use hyper_util::rt::TokioExecutor;
use tower::{Layer, Service};

use crate::http::context::RequestSpanExt;
use crate::propagation::{encode, span_name, CLOUD_TRACE_CONTEXT, SENT_PREFIX};
use crate::trace::{SpanGuard, Tracer};

/// Senders that can abort an in-flight request.
pub trait CancelRequest<B> {
    fn cancel_request(&self, req: &Request<B>);
}

/// Pooled HTTP/1 client used when no base sender is configured.
#[derive(Clone, Debug)]
pub struct DefaultTransport {
    client: Client<HttpConnector, Body>,
}

impl DefaultTransport {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        }
    }
}

impl Default for DefaultTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for DefaultTransport {
    type Response = Response<Incoming>;
    type Error = hyper_util::client::legacy::Error;
    type Future = ResponseFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.client.request(req)
    }
}

impl<B> CancelRequest<B> for DefaultTransport {
    // hyper aborts a request when its response future is dropped; there is
    // no handle to cancel by request.
    fn cancel_request(&self, _req: &Request<B>) {}
}

/// Sender that traces each request it forwards to `base`.
///
/// `base` defaults to [`DefaultTransport`].
#[derive(Clone)]
pub struct TraceTransport<S = DefaultTransport> {
    base: S,
    tracer: Arc<dyn Tracer>,
}

impl TraceTransport {
    /// Trace requests sent through a [`DefaultTransport`].
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self::with_base(DefaultTransport::new(), tracer)
    }
}

impl<S> TraceTransport<S> {
    pub fn with_base(base: S, tracer: Arc<dyn Tracer>) -> Self {
        Self { base, tracer }
    }

    pub fn base(&self) -> &S {
        &self.base
    }
}

impl<S, B> Service<Request<B>> for TraceTransport<S>
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
        self.base.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let name = span_name(SENT_PREFIX, req.uri());
        let span = self.tracer.start_span(&name, req.span());

        match HeaderValue::try_from(encode(&span.context())) {
            Ok(value) => {
                req.headers_mut().insert(CLOUD_TRACE_CONTEXT, value);
            }
            Err(e) => tracing::warn!(span = %name, error = %e, "Trace header not representable"),
        }
        req.set_span(span.clone());

        let guard = SpanGuard::new(self.tracer.clone(), span);
        let fut = self.base.call(req);
        Box::pin(async move {
            let result = fut.await;
            drop(guard);
            result
        })
    }
}

impl<S, B> CancelRequest<B> for TraceTransport<S>
where
    S: CancelRequest<B>,
{
    fn cancel_request(&self, req: &Request<B>) {
        self.base.cancel_request(req);
    }
}

/// Layer producing [`TraceTransport`].
#[derive(Clone)]
pub struct TraceTransportLayer {
    tracer: Arc<dyn Tracer>,
}

impl TraceTransportLayer {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self { tracer }
    }
}

impl<S> Layer<S> for TraceTransportLayer {
    type Service = TraceTransport<S>;

    fn layer(&self, base: S) -> Self::Service {
        TraceTransport::with_base(base, self.tracer.clone())
    }
}
