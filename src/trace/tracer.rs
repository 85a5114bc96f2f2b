//! In-process tracer used when no other span engine is supplied.

use rand::Rng;

use crate::trace::span::{Span, Tracer};
use crate::trace::types::{SpanContext, SpanId, TraceId, TraceOptions};
use crate::trace::varint;

/// Sampling decision for new root spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampler {
    Always,
    Never,
    /// Sample roots with the given probability in `[0, 1]`.
    Probability(f64),
}

impl Sampler {
    /// Build a sampler from a ratio; values are clamped to `[0, 1]`.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 1.0 {
            Sampler::Always
        } else if ratio <= 0.0 || ratio.is_nan() {
            Sampler::Never
        } else {
            Sampler::Probability(ratio)
        }
    }

    fn sample(&self) -> bool {
        match *self {
            Sampler::Always => true,
            Sampler::Never => false,
            Sampler::Probability(p) if (0.0..=1.0).contains(&p) => rand::thread_rng().gen_bool(p),
            Sampler::Probability(p) => p > 1.0,
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Sampler::Probability(1e-4)
    }
}

/// Tracer that assigns random identifiers and reports spans through
/// `tracing` events.
///
/// Child spans inherit the parent's trace options; a remote parent's
/// sampling decision is taken as given.
#[derive(Debug, Clone, Default)]
pub struct LocalTracer {
    sampler: Sampler,
}

impl LocalTracer {
    pub fn new(sampler: Sampler) -> Self {
        Self { sampler }
    }

    pub fn always_sample() -> Self {
        Self::new(Sampler::Always)
    }

    fn start(
        &self,
        name: &str,
        context: SpanContext,
        parent: Option<SpanId>,
        remote: bool,
    ) -> Span {
        tracing::debug!(
            span = %name,
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            parent_span_id = ?parent.map(|id| id.to_u64()),
            remote_parent = remote,
            sampled = context.is_sampled(),
            "Span started"
        );
        Span::new(name, context, parent, remote)
    }
}

impl Tracer for LocalTracer {
    fn start_span(&self, name: &str, parent: Option<&Span>) -> Span {
        match parent {
            Some(parent) => {
                let parent_ctx = parent.context();
                let context =
                    SpanContext::new(parent_ctx.trace_id, new_span_id(), parent_ctx.trace_options);
                self.start(name, context, Some(parent_ctx.span_id), false)
            }
            None => {
                let options = TraceOptions::default().with_sampled(self.sampler.sample());
                let context = SpanContext::new(new_trace_id(), new_span_id(), options);
                self.start(name, context, None, false)
            }
        }
    }

    fn start_span_with_remote_parent(&self, name: &str, parent: SpanContext) -> Span {
        // an all-zero trace id is no parent at all
        if !parent.trace_id.is_valid() {
            return self.start_span(name, None);
        }
        let context = SpanContext::new(parent.trace_id, new_span_id(), parent.trace_options);
        self.start(name, context, Some(parent.span_id), true)
    }

    fn end_span(&self, span: &Span) {
        if !span.mark_ended() {
            return;
        }
        let context = span.context();
        tracing::debug!(
            span = %span.name(),
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            elapsed_ms = span.elapsed().as_secs_f64() * 1000.0,
            "Span ended"
        );
    }
}

fn new_trace_id() -> TraceId {
    let mut rng = rand::thread_rng();
    loop {
        let bytes: [u8; 16] = rng.gen();
        let id = TraceId::from_bytes(bytes);
        if id.is_valid() {
            return id;
        }
    }
}

fn new_span_id() -> SpanId {
    let value = rand::thread_rng().gen_range(1..=varint::MAX_VALUE);
    SpanId::from_u64(value).unwrap_or_default()
}
