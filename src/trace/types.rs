//! Span identity types.

use std::fmt;

use crate::trace::varint;

/// Identifier shared by every span of one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TraceId([u8; 16]);

impl TraceId {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// True unless every byte is zero.
    pub fn is_valid(&self) -> bool {
        self.0 != [0; 16]
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Identifier of one span within a trace.
///
/// The bytes carry the varint of the span's integer value, which is what
/// the propagation header transmits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpanId([u8; 8]);

impl SpanId {
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Pack an integer into a span id.
    ///
    /// Returns `None` for values above [`varint::MAX_VALUE`].
    pub fn from_u64(value: u64) -> Option<Self> {
        varint::put_uvarint(value).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Integer view of the span id. Bytes that do not hold a terminated
    /// varint read as zero.
    pub fn to_u64(&self) -> u64 {
        varint::uvarint(&self.0).unwrap_or(0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u64())
    }
}

/// Trace option bit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TraceOptions(u32);

impl TraceOptions {
    pub const SAMPLED: u32 = 0x1;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn is_sampled(&self) -> bool {
        self.0 & Self::SAMPLED != 0
    }

    /// Copy of these options with the sampled bit set or cleared.
    #[must_use]
    pub const fn with_sampled(self, sampled: bool) -> Self {
        if sampled {
            Self(self.0 | Self::SAMPLED)
        } else {
            Self(self.0 & !Self::SAMPLED)
        }
    }
}

impl fmt::Display for TraceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The propagated identity of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub trace_options: TraceOptions,
}

impl SpanContext {
    pub fn new(trace_id: TraceId, span_id: SpanId, trace_options: TraceOptions) -> Self {
        Self {
            trace_id,
            span_id,
            trace_options,
        }
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_options.is_sampled()
    }
}
