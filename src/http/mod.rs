//! HTTP tracing middleware.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → handler.rs (decode X-Cloud-Trace-Context, start span, store in extensions)
//!     → wrapped handler
//!         → transport.rs (child span, encode header, base sender)
//!         → backend
//!     → span ended when the wrapped call finishes
//! ```
//!
//! # Design Decisions
//! - Both decorators are tower services, so they stack with other layers
//! - The span lives in request extensions (see context.rs)
//! - Delegated errors pass through untouched

pub mod context;
pub mod handler;
pub mod server;
pub mod transport;

pub use context::RequestSpanExt;
pub use handler::{TraceHandler, TraceHandlerLayer};
pub use server::RelayServer;
pub use transport::{CancelRequest, DefaultTransport, TraceTransport, TraceTransportLayer};
