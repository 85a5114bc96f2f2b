//! Request-scoped span storage.
//!
//! The span travels in the request's extensions, so handlers and inner
//! services find it the same way axum extractors do.

use http::Request;

use crate::trace::Span;

/// Access to the span attached to a request.
pub trait RequestSpanExt {
    /// The span stored on this request, if any.
    fn span(&self) -> Option<&Span>;

    /// Attach a span, replacing any previous one.
    fn set_span(&mut self, span: Span);

    /// Builder form of [`RequestSpanExt::set_span`].
    fn with_span(mut self, span: Span) -> Self
    where
        Self: Sized,
    {
        self.set_span(span);
        self
    }
}

impl<B> RequestSpanExt for Request<B> {
    fn span(&self) -> Option<&Span> {
        self.extensions().get::<Span>()
    }

    fn set_span(&mut self, span: Span) {
        self.extensions_mut().insert(span);
    }
}
