//! Trace context propagation over HTTP headers.
//!
//! # Data Flow
//! ```text
//! outgoing: SpanContext → codec::encode → X-Cloud-Trace-Context
//! incoming: X-Cloud-Trace-Context → codec::decode → Option<ParsedHeader>
//! ```
//!
//! # Design Decisions
//! - Decoding is total: malformed input is `None`, never an error or panic
//! - Values over 200 bytes are dropped before any parsing work
//! - Only canonical text decodes, so a decoded header re-encodes to itself

pub mod codec;
pub mod naming;

pub use codec::{decode, encode, ParsedHeader, CLOUD_TRACE_CONTEXT, MAX_HEADER_LEN};
pub use naming::{server_span_name, span_name, RECV_PREFIX, SENT_PREFIX};
