//! Span handles and the span lifecycle seam.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::trace::types::{SpanContext, SpanId};

/// Span lifecycle API.
///
/// Implementations own identifier generation and sampling. The HTTP
/// middleware only asks for spans to be started and ended.
pub trait Tracer: Send + Sync {
    /// Start a span. With a parent the new span joins the parent's trace,
    /// otherwise it starts a new trace.
    fn start_span(&self, name: &str, parent: Option<&Span>) -> Span;

    /// Start a span whose parent lives in another process.
    fn start_span_with_remote_parent(&self, name: &str, parent: SpanContext) -> Span;

    /// End a span. Ending an already ended span has no effect.
    fn end_span(&self, span: &Span);
}

/// Handle to one unit of traced work.
///
/// Clones refer to the same span; ending any clone ends the span.
#[derive(Debug, Clone)]
pub struct Span {
    inner: Arc<SpanInner>,
}

#[derive(Debug)]
struct SpanInner {
    name: String,
    context: SpanContext,
    parent_span_id: Option<SpanId>,
    remote_parent: bool,
    started_at: Instant,
    ended: AtomicBool,
}

impl Span {
    /// Create a started span. Called by [`Tracer`] implementations.
    pub fn new(
        name: impl Into<String>,
        context: SpanContext,
        parent_span_id: Option<SpanId>,
        remote_parent: bool,
    ) -> Self {
        Self {
            inner: Arc::new(SpanInner {
                name: name.into(),
                context,
                parent_span_id,
                remote_parent,
                started_at: Instant::now(),
                ended: AtomicBool::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn context(&self) -> SpanContext {
        self.inner.context
    }

    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.inner.parent_span_id
    }

    pub fn has_remote_parent(&self) -> bool {
        self.inner.remote_parent
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    pub fn is_ended(&self) -> bool {
        self.inner.ended.load(Ordering::Acquire)
    }

    /// Flag the span as ended. Returns `true` only for the call that
    /// actually ended it.
    pub fn mark_ended(&self) -> bool {
        !self.inner.ended.swap(true, Ordering::AcqRel)
    }
}

/// Ends its span when dropped.
///
/// Held across a delegated call so the span ends whether the call resolves,
/// fails, or its future is dropped.
pub struct SpanGuard {
    tracer: Arc<dyn Tracer>,
    span: Span,
}

impl SpanGuard {
    pub fn new(tracer: Arc<dyn Tracer>, span: Span) -> Self {
        Self { tracer, span }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.tracer.end_span(&self.span);
    }
}
