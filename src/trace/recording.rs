//! Tracer that remembers every span it starts and ends.
//!
//! Test support only: it keeps every span for the tracer's lifetime.
//! Compiled for this crate's tests and behind the `test-util` feature.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::trace::span::{Span, Tracer};
use crate::trace::tracer::LocalTracer;
use crate::trace::types::SpanContext;

/// Wraps an always-sampling [`LocalTracer`] and records lifecycle calls.
#[derive(Debug)]
pub struct RecordingTracer {
    inner: LocalTracer,
    started: Mutex<Vec<Span>>,
    end_calls: Mutex<Vec<Span>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self {
            inner: LocalTracer::always_sample(),
            started: Mutex::new(Vec::new()),
            end_calls: Mutex::new(Vec::new()),
        }
    }

    /// Spans started so far, in start order.
    pub fn started(&self) -> Vec<Span> {
        lock(&self.started).clone()
    }

    /// One entry per `end_span` call, including repeated calls.
    pub fn end_calls(&self) -> Vec<Span> {
        lock(&self.end_calls).clone()
    }

    fn record(&self, span: Span) -> Span {
        lock(&self.started).push(span.clone());
        span
    }
}

fn lock(spans: &Mutex<Vec<Span>>) -> MutexGuard<'_, Vec<Span>> {
    spans.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for RecordingTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, name: &str, parent: Option<&Span>) -> Span {
        self.record(self.inner.start_span(name, parent))
    }

    fn start_span_with_remote_parent(&self, name: &str, parent: SpanContext) -> Span {
        self.record(self.inner.start_span_with_remote_parent(name, parent))
    }

    fn end_span(&self, span: &Span) {
        lock(&self.end_calls).push(span.clone());
        self.inner.end_span(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_records_every_end_call() {
        let tracer = RecordingTracer::new();
        let span = tracer.start_span("s", None);
        tracer.end_span(&span);
        tracer.end_span(&span);
        assert_eq!(tracer.started().len(), 1);
        assert_eq!(tracer.end_calls().len(), 2);
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let tracer = Arc::new(RecordingTracer::new());
        let poisoner = tracer.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.started.lock().unwrap();
            panic!("poison the started list");
        })
        .join();

        tracer.start_span("after", None);
        assert_eq!(tracer.started().len(), 1);
    }
}
