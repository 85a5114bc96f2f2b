//! Span names derived from request targets.
//!
//! Names are for humans reading traces; nothing parses them back.

use http::{header, HeaderMap, Uri};

/// Prefix of spans started for outgoing requests.
pub const SENT_PREFIX: &str = "Sent";

/// Prefix of spans started for incoming requests.
pub const RECV_PREFIX: &str = "Recv";

/// Name a span after a request target: the `scheme://` part of the URI is
/// replaced by a `.` after the prefix, and a bare `/` path is dropped.
///
/// `http://foo.com` becomes `Sent.foo.com`.
pub fn span_name(prefix: &str, uri: &Uri) -> String {
    match uri.authority() {
        Some(authority) => format!("{prefix}.{authority}{}", target_path(uri)),
        None => format!("{prefix}.{uri}"),
    }
}

/// Name a span for a server-side request.
///
/// Origin-form URIs carry no authority, so the `Host` header stands in
/// for it when present.
pub fn server_span_name(prefix: &str, uri: &Uri, headers: &HeaderMap) -> String {
    if uri.authority().is_some() {
        return span_name(prefix, uri);
    }
    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("{prefix}.{host}{}", target_path(uri)),
        None => span_name(prefix, uri),
    }
}

fn target_path(uri: &Uri) -> &str {
    match uri.path_and_query().map(|pq| pq.as_str()) {
        Some("/") | None => "",
        Some(pq) => pq,
    }
}
