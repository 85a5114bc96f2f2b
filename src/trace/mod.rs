//! Span identity and lifecycle.
//!
//! # Data Flow
//! ```text
//! middleware asks a Tracer for a span
//!     → tracer.rs (LocalTracer: ids, sampling, debug events)
//!     → span.rs (Span handle, SpanGuard ends it on drop)
//!     → types.rs (SpanContext copied into the propagation header)
//! ```
//!
//! # Design Decisions
//! - `Tracer` is the seam to whatever span engine the process uses
//! - Span ids are varint packed so the header's decimal form maps back to the same bytes
//! - Ending a span twice is a no-op

#[cfg(any(test, feature = "test-util"))]
pub mod recording;
pub mod span;
pub mod tracer;
pub mod types;
pub mod varint;

#[cfg(any(test, feature = "test-util"))]
pub use recording::RecordingTracer;
pub use span::{Span, SpanGuard, Tracer};
pub use tracer::{LocalTracer, Sampler};
pub use types::{SpanContext, SpanId, TraceId, TraceOptions};
