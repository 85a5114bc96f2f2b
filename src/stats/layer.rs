//! Request stats middleware for clients and servers.

use std::task::{Context, Poll};
use std::time::Instant;

use futures_util::future::BoxFuture;
use http::{header, HeaderMap, Request, Response};
use tower::{Layer, Service};

use crate::http::CancelRequest;
use crate::stats::measures::{measures, RoleMeasures};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Client,
    Server,
}

/// Records the client or server measures around each request.
///
/// Client errors are failed calls; server errors are failed calls and
/// 5xx responses.
#[derive(Debug, Clone)]
pub struct StatsService<S> {
    inner: S,
    role: Role,
}

impl<S> StatsService<S> {
    /// Wrap an outgoing sender.
    pub fn client(inner: S) -> Self {
        Self {
            inner,
            role: Role::Client,
        }
    }

    /// Wrap an incoming handler.
    pub fn server(inner: S) -> Self {
        Self {
            inner,
            role: Role::Server,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    fn measures(&self) -> &'static RoleMeasures {
        match self.role {
            Role::Client => &measures().client,
            Role::Server => &measures().server,
        }
    }
}

impl<S, B, R> Service<Request<B>> for StatsService<S>
where
    S: Service<Request<B>, Response = Response<R>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    R: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let m = self.measures();
        let role = self.role;

        m.started_count.increment(1);
        m.request_count.increment(1);
        if let Some(len) = content_length(req.headers()) {
            m.request_bytes.record(len as f64);
        }

        let start = Instant::now();
        let fut = self.inner.call(req);
        Box::pin(async move {
            let result = fut.await;

            m.latency.record(start.elapsed().as_secs_f64() * 1000.0);
            m.finished_count.increment(1);
            match &result {
                Ok(response) => {
                    m.response_count.increment(1);
                    if let Some(len) = content_length(response.headers()) {
                        m.response_bytes.record(len as f64);
                    }
                    if role == Role::Server && response.status().is_server_error() {
                        m.error_count.increment(1);
                    }
                }
                Err(_) => m.error_count.increment(1),
            }

            result
        })
    }
}

impl<S, B> CancelRequest<B> for StatsService<S>
where
    S: CancelRequest<B>,
{
    fn cancel_request(&self, req: &Request<B>) {
        self.inner.cancel_request(req);
    }
}

/// Layer producing [`StatsService`].
#[derive(Debug, Clone, Copy)]
pub struct StatsLayer {
    role: Role,
}

impl StatsLayer {
    pub fn client() -> Self {
        Self { role: Role::Client }
    }

    pub fn server() -> Self {
        Self { role: Role::Server }
    }
}

impl<S> Layer<S> for StatsLayer {
    type Service = StatsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StatsService { inner, role: self.role }
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::{service_fn, ServiceExt};

    /// Value of the first sample line for `name` in Prometheus text output.
    fn sample(rendered: &str, name: &str) -> Option<f64> {
        rendered
            .lines()
            .filter(|line| !line.starts_with('#'))
            .find(|line| line.starts_with(name))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
    }

    fn run<F: std::future::Future>(fut: F) -> (F::Output, String) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let output = metrics::with_local_recorder(&recorder, || runtime.block_on(fut));
        (output, handle.render())
    }

    #[test]
    fn test_client_success_records_counts_and_sizes() {
        let sender = service_fn(|_req: Request<()>| async {
            Ok::<_, &'static str>(
                Response::builder()
                    .header(header::CONTENT_LENGTH, "42")
                    .body(())
                    .unwrap(),
            )
        });
        let req = Request::builder()
            .header(header::CONTENT_LENGTH, "7")
            .body(())
            .unwrap();

        let (result, rendered) = run(StatsService::client(sender).oneshot(req));

        assert!(result.is_ok());
        assert_eq!(sample(&rendered, "net_http_client_started_count"), Some(1.0));
        assert_eq!(sample(&rendered, "net_http_client_finished_count"), Some(1.0));
        assert_eq!(sample(&rendered, "net_http_client_response_count"), Some(1.0));
        assert!(rendered.contains("net_http_client_request_bytes"));
        assert!(rendered.contains("net_http_client_response_bytes"));
        assert!(rendered.contains("net_http_client_roundtrip_latency"));
        assert_eq!(sample(&rendered, "net_http_client_error_count"), None);
    }

    #[test]
    fn test_client_error_passes_through_and_counts() {
        let sender = service_fn(|_req: Request<()>| async { Err::<Response<()>, _>("refused") });

        let (result, rendered) = run(StatsLayer::client().layer(sender).oneshot(Request::new(())));

        assert_eq!(result.unwrap_err(), "refused");
        assert_eq!(sample(&rendered, "net_http_client_error_count"), Some(1.0));
        assert_eq!(sample(&rendered, "net_http_client_response_count"), None);
    }

    #[test]
    fn test_server_counts_5xx_as_error() {
        let handler = service_fn(|_req: Request<()>| async {
            Ok::<_, std::convert::Infallible>(
                Response::builder()
                    .status(StatusCode::SERVICE_UNAVAILABLE)
                    .body(())
                    .unwrap(),
            )
        });

        let (result, rendered) = run(StatsService::server(handler).oneshot(Request::new(())));

        assert_eq!(result.unwrap().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(sample(&rendered, "net_http_server_response_count"), Some(1.0));
        assert_eq!(sample(&rendered, "net_http_server_error_count"), Some(1.0));
        assert!(rendered.contains("net_http_server_elapsed_time"));
    }
}
