//! `X-Cloud-Trace-Context` header codec.
//!
//! Format: `TRACE_ID/SPAN_ID;o=OPTIONS`, where `TRACE_ID` is 32 lowercase hex
//! digits, `SPAN_ID` is the decimal integer view of the span id and `OPTIONS`
//! is the decimal trace options value. The `;o=OPTIONS` suffix is optional on
//! input and always written on output.

use std::fmt;

use http::HeaderName;

use crate::trace::{SpanContext, SpanId, TraceId, TraceOptions};

/// Name of the propagation header.
pub const CLOUD_TRACE_CONTEXT: HeaderName = HeaderName::from_static("x-cloud-trace-context");

/// Header values longer than this are ignored without being parsed.
pub const MAX_HEADER_LEN: usize = 200;

const OPTIONS_PREFIX: &str = "o=";

/// A successfully decoded header.
///
/// `options` is `None` when the header carried no options field, which is
/// distinct from an explicit `o=0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeader {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub options: Option<TraceOptions>,
}

impl ParsedHeader {
    /// Span context carried by the header; absent options read as zero.
    pub fn span_context(&self) -> SpanContext {
        SpanContext::new(self.trace_id, self.span_id, self.options.unwrap_or_default())
    }
}

impl fmt::Display for ParsedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.trace_id, self.span_id)?;
        if let Some(options) = self.options {
            write!(f, ";{}{}", OPTIONS_PREFIX, options)?;
        }
        Ok(())
    }
}

impl From<SpanContext> for ParsedHeader {
    fn from(sc: SpanContext) -> Self {
        Self {
            trace_id: sc.trace_id,
            span_id: sc.span_id,
            options: Some(sc.trace_options),
        }
    }
}

/// Render a span context as a header value.
pub fn encode(sc: &SpanContext) -> String {
    ParsedHeader::from(*sc).to_string()
}

/// Parse a header value.
///
/// Returns `None` for empty, oversized or malformed input. Never panics.
pub fn decode(header: &str) -> Option<ParsedHeader> {
    if header.is_empty() || header.len() > MAX_HEADER_LEN {
        return None;
    }

    let (trace_field, rest) = header.split_once('/')?;
    let trace_id = parse_trace_id(trace_field)?;

    let (span_field, options_field) = match rest.split_once(';') {
        Some((span, options)) => (span, Some(options)),
        None => (rest, None),
    };
    let span_id = SpanId::from_u64(parse_decimal(span_field)?)?;

    let options = match options_field {
        Some(field) => {
            let digits = field.strip_prefix(OPTIONS_PREFIX)?;
            let bits = u32::try_from(parse_decimal(digits)?).ok()?;
            Some(TraceOptions::new(bits))
        }
        None => None,
    };

    Some(ParsedHeader {
        trace_id,
        span_id,
        options,
    })
}

fn parse_trace_id(field: &str) -> Option<TraceId> {
    // uppercase would decode but re-encode differently
    if field.bytes().any(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let bytes: [u8; 16] = hex::decode(field).ok()?.try_into().ok()?;
    Some(TraceId::from_bytes(bytes))
}

/// Canonical base-10 `u64`: digits only, no sign, no leading zeros.
fn parse_decimal(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if field.len() > 1 && field.starts_with('0') {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE_BYTES: [u8; 16] = [
        0x10, 0x54, 0x45, 0xaa, 0x78, 0x43, 0xbc, 0x8b, 0xf2, 0x06, 0xb1, 0x20, 0x00, 0x10, 0x00,
        0x00,
    ];

    fn context(span: u64, options: u32) -> SpanContext {
        SpanContext::new(
            TraceId::from_bytes(TRACE_BYTES),
            SpanId::from_u64(span).unwrap(),
            TraceOptions::new(options),
        )
    }

    #[test]
    fn test_known_vectors() {
        for (header, options) in [
            ("105445aa7843bc8bf206b12000100000/123;o=1", 1),
            ("105445aa7843bc8bf206b12000100000/123;o=0", 0),
        ] {
            let parsed = decode(header).expect("valid header");
            assert_eq!(parsed.trace_id.as_bytes(), &TRACE_BYTES);
            assert_eq!(parsed.span_id.to_u64(), 123);
            assert_eq!(parsed.span_id.as_bytes(), &[123, 0, 0, 0, 0, 0, 0, 0]);
            assert_eq!(parsed.options, Some(TraceOptions::new(options)));
            assert_eq!(parsed.span_context(), context(123, options));
            assert_eq!(encode(&parsed.span_context()), header);
        }
    }

    #[test]
    fn test_encode_layout() {
        assert_eq!(
            encode(&context(123, 1)),
            "105445aa7843bc8bf206b12000100000/123;o=1"
        );
        assert_eq!(
            encode(&context(300, 3)),
            "105445aa7843bc8bf206b12000100000/300;o=3"
        );
    }

    #[test]
    fn test_round_trip_boundaries() {
        for span in [0, 1, 127, 128, 16_383, 16_384, crate::trace::varint::MAX_VALUE] {
            for options in [0, 1, u32::MAX] {
                let sc = context(span, options);
                assert_eq!(decode(&encode(&sc)).map(|p| p.span_context()), Some(sc));
            }
        }
    }

    #[test]
    fn test_absent_options_distinct_from_zero() {
        let absent = decode("105445aa7843bc8bf206b12000100000/123").unwrap();
        let zero = decode("105445aa7843bc8bf206b12000100000/123;o=0").unwrap();
        assert_eq!(absent.options, None);
        assert_eq!(zero.options, Some(TraceOptions::new(0)));
        assert_eq!(absent.span_context(), zero.span_context());
        assert_eq!(absent.to_string(), "105445aa7843bc8bf206b12000100000/123");
    }

    #[test]
    fn test_rejects_malformed_input() {
        let long = format!("105445aa7843bc8bf206b12000100000/{}", "1".repeat(200));
        let cases = [
            "",
            long.as_str(),
            "105445aa7843bc8bf206b12000100000",
            "105445aa7843bc8bf206b1200010000z/123;o=1",
            "105445aa7843bc8bf206b1200010000/123;o=1",
            "105445aa7843bc8bf206b120001000/123;o=1",
            "105445aa7843bc8bf206b1200010000000/123;o=1",
            "105445AA7843BC8BF206B12000100000/123;o=1",
            "105445aa7843bc8bf206b12000100000/abc;o=1",
            "105445aa7843bc8bf206b12000100000/;o=1",
            "105445aa7843bc8bf206b12000100000/-1;o=1",
            "105445aa7843bc8bf206b12000100000/+123;o=1",
            "105445aa7843bc8bf206b12000100000/0123;o=1",
            "105445aa7843bc8bf206b12000100000/18446744073709551616;o=1",
            "105445aa7843bc8bf206b12000100000/123;x=1",
            "105445aa7843bc8bf206b12000100000/123;1",
            "105445aa7843bc8bf206b12000100000/123;",
            "105445aa7843bc8bf206b12000100000/123;o=",
            "105445aa7843bc8bf206b12000100000/123;o=x",
            "105445aa7843bc8bf206b12000100000/123;o=4294967296",
            "105445aa7843bc8bf206b12000100000/123;o=1;o=1",
            "/123;o=1",
        ];
        for case in cases {
            assert_eq!(decode(case), None, "{case:?} should be rejected");
        }
    }

    #[test]
    fn test_rejects_span_ids_wider_than_varint() {
        let max = crate::trace::varint::MAX_VALUE;
        let ok = format!("105445aa7843bc8bf206b12000100000/{max};o=1");
        let too_big = format!("105445aa7843bc8bf206b12000100000/{};o=1", max + 1);
        assert!(decode(&ok).is_some());
        assert_eq!(decode(&too_big), None);
        assert_eq!(
            decode(&format!("105445aa7843bc8bf206b12000100000/{};o=1", u64::MAX)),
            None
        );
    }

    #[test]
    fn test_oversized_header_rejected_before_parsing() {
        let valid = "105445aa7843bc8bf206b12000100000/123;o=1";
        // trailing garbage would also fail parsing, so pad with spaces that
        // only the length check can reject
        let padded = format!("{valid}{}", " ".repeat(MAX_HEADER_LEN));
        assert_eq!(decode(&padded), None);
        assert!(decode(valid).is_some());
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        for case in ["é/1;o=1", "105445aa7843bc8bf206b12000100000/１２３", "🙂/🙂;🙂"] {
            assert_eq!(decode(case), None);
        }
    }

    #[test]
    fn test_decoded_headers_re_encode_identically() {
        for header in [
            "00000000000000000000000000000000/0;o=0",
            "ffffffffffffffffffffffffffffffff/72057594037927935;o=4294967295",
            "105445aa7843bc8bf206b12000100000/9;o=2",
        ] {
            let parsed = decode(header).unwrap();
            assert_eq!(parsed.to_string(), header);
            assert_eq!(encode(&parsed.span_context()), header);
        }
    }
}
