//! Trace context propagation for HTTP clients and servers.
//!
//! Spans travel between processes in the `X-Cloud-Trace-Context` header.
//! [`TraceTransport`] stamps outgoing requests with the current span and
//! [`TraceHandler`] picks the span back up on the receiving side.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod propagation;
pub mod stats;
pub mod trace;

pub use config::schema::RelayConfig;
pub use http::{RelayServer, RequestSpanExt, TraceHandler, TraceTransport};
pub use lifecycle::Shutdown;
pub use propagation::{decode, encode, ParsedHeader, CLOUD_TRACE_CONTEXT};
pub use trace::{LocalTracer, Span, SpanContext, Tracer};
