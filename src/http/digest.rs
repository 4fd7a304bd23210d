//! Response digestion: header canonicalization and content negotiation.

use crate::base::neterror::NetError;
use crate::http::codec::{CodecError, Codecs};
use crate::http::headers::{canonical_name, Headers};
use crate::http::response::ParsedResponse;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static JSON_CONTENT_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:text|application)/json(?:;[^\r\n\x{2028}\x{2029}]+)?$")
        .expect("JSON content type pattern")
});
static XML_CONTENT_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:text|application)/xml(?:;[^\r\n\x{2028}\x{2029}]+)?$")
        .expect("XML content type pattern")
});

/// How a response body should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Negotiate from the response `Content-Type`.
    #[default]
    Auto,
    Text,
    Json,
    Xml,
}

/// A resolved decoding policy. `Auto` never survives resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Text,
    Json,
    Xml,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponseKind::Text => "text",
            ResponseKind::Json => "json",
            ResponseKind::Xml => "xml",
        })
    }
}

/// Parse a raw `\r\n`-separated header blob into canonical headers.
///
/// Lines without a `:` are skipped. Names are split at the first `:`, trimmed
/// and canonicalized; values are trimmed. A repeated name keeps its first
/// position but takes the last value.
pub fn digest_headers(raw: &str) -> Headers {
    let mut headers = Headers::new();

    for line in raw.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        headers.insert(canonical_name(trim(name)), trim(value));
    }

    headers
}

/// Resolve the decoding policy for a response.
pub fn resolve_kind(headers: &Headers, response_type: ResponseType) -> ResponseKind {
    match response_type {
        ResponseType::Text => ResponseKind::Text,
        ResponseType::Json => ResponseKind::Json,
        ResponseType::Xml => ResponseKind::Xml,
        ResponseType::Auto => match content_type(headers) {
            Some(ct) if JSON_CONTENT_TYPE.is_match(ct) => ResponseKind::Json,
            Some(ct) if XML_CONTENT_TYPE.is_match(ct) => ResponseKind::Xml,
            _ => ResponseKind::Text,
        },
    }
}

/// Decode a response body according to the resolved policy.
///
/// JSON codec failures are returned as-is. XML parse failures are not errors:
/// the returned document carries them.
pub fn digest_response(
    raw_body: &str,
    headers: &Headers,
    response_type: ResponseType,
    codecs: &Codecs,
) -> Result<ParsedResponse, CodecError> {
    let kind = resolve_kind(headers, response_type);
    tracing::trace!(%kind, ?response_type, "decoding response body");

    match kind {
        ResponseKind::Text => Ok(ParsedResponse::Text(raw_body.to_owned())),
        ResponseKind::Json => {
            let codec = codecs
                .json()
                .ok_or(NetError::CodecUnavailable(ResponseKind::Json))?;
            codec.parse(raw_body).map(ParsedResponse::Json)
        }
        ResponseKind::Xml => {
            let codec = codecs
                .xml()
                .ok_or(NetError::CodecUnavailable(ResponseKind::Xml))?;
            Ok(ParsedResponse::Xml(codec.parse(raw_body)))
        }
    }
}

/// The canonical `Content-Type` entry, falling back to a case-insensitive match
/// for names such as `CONTENT-TYPE` that canonicalization leaves untouched.
fn content_type(headers: &Headers) -> Option<&str> {
    headers
        .get("Content-Type")
        .or_else(|| headers.get_ignore_case("Content-Type"))
}

fn trim(s: &str) -> &str {
    s.trim_matches(is_trimmed)
}

/// Whitespace and line terminators stripped around header names and values.
/// `U+0085` is not among them.
fn is_trimmed(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000b}'
            | '\u{000c}'
            | '\r'
            | ' '
            | '\u{00a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
            | '\u{feff}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_headers() {
        let raw = "content-type: application/json\r\nx-request-id:  abc \r\n\r\n";
        let headers = digest_headers(raw);
        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(
            entries,
            vec![("Content-Type", "application/json"), ("X-Request-Id", "abc")]
        );
    }

    #[test]
    fn test_digest_headers_splits_at_first_colon() {
        let headers = digest_headers("location: http://example.com:8080/a");
        assert_eq!(headers.get("Location"), Some("http://example.com:8080/a"));
    }

    #[test]
    fn test_digest_headers_skips_lines_without_colon() {
        let headers = digest_headers("garbage\r\n\r\nvary: accept");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Vary"), Some("accept"));
    }

    #[test]
    fn test_digest_headers_last_value_wins() {
        let headers = digest_headers("set-cookie: a=1\r\nx: y\r\nSet-Cookie: b=2");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Set-Cookie"), Some("b=2"));
        assert_eq!(headers.names().next(), Some("Set-Cookie"));
    }

    #[test]
    fn test_digest_headers_trims_bom_and_nbsp() {
        let headers = digest_headers("\u{feff}etag:\u{a0}\"v1\"\u{a0}");
        assert_eq!(headers.get("Etag"), Some("\"v1\""));
    }

    #[test]
    fn test_digest_headers_empty_blob() {
        assert!(digest_headers("").is_empty());
    }

    #[test]
    fn test_resolve_kind_auto() {
        let h = |ct: &str| digest_headers(&format!("content-type: {}", ct));

        assert_eq!(resolve_kind(&h("text/json"), ResponseType::Auto), ResponseKind::Json);
        assert_eq!(
            resolve_kind(&h("application/json; charset=utf-8"), ResponseType::Auto),
            ResponseKind::Json
        );
        assert_eq!(resolve_kind(&h("application/xml"), ResponseType::Auto), ResponseKind::Xml);
        assert_eq!(resolve_kind(&h("text/xml;charset=UTF-8"), ResponseType::Auto), ResponseKind::Xml);
        assert_eq!(resolve_kind(&h("text/html"), ResponseType::Auto), ResponseKind::Text);
        // The patterns are anchored and case-sensitive.
        assert_eq!(
            resolve_kind(&h("application/vnd.api+json"), ResponseType::Auto),
            ResponseKind::Text
        );
        assert_eq!(resolve_kind(&h("Application/JSON"), ResponseType::Auto), ResponseKind::Text);
        // A bare ';' with nothing after it does not match.
        assert_eq!(resolve_kind(&h("application/json;"), ResponseType::Auto), ResponseKind::Text);
        assert_eq!(resolve_kind(&Headers::new(), ResponseType::Auto), ResponseKind::Text);
    }

    #[test]
    fn test_resolve_kind_header_name_any_case() {
        for raw in [
            "content-type: text/json",
            "Content-type: text/json",
            "CONTENT-TYPE: text/json",
        ] {
            let headers = digest_headers(raw);
            assert_eq!(resolve_kind(&headers, ResponseType::Auto), ResponseKind::Json, "{}", raw);
        }
    }

    #[test]
    fn test_resolve_kind_parameters_stop_at_line_terminators() {
        for ct in [
            "application/json;a\rb",
            "text/json;a\u{2028}b",
            "application/xml;a\u{2029}b",
        ] {
            let mut headers = Headers::new();
            headers.insert("Content-Type", ct);
            assert_eq!(resolve_kind(&headers, ResponseType::Auto), ResponseKind::Text, "{:?}", ct);
        }

        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json;a\tb");
        assert_eq!(resolve_kind(&headers, ResponseType::Auto), ResponseKind::Json);
    }

    #[test]
    fn test_trim_keeps_next_line() {
        assert_eq!(trim("\u{0085}value\u{0085}"), "\u{0085}value\u{0085}");
        assert_eq!(trim("\u{3000}\u{2009} value \u{feff}\u{000b}"), "value");

        let headers = digest_headers("x-a: \u{0085}1\r\n");
        assert_eq!(headers.get("X-A"), Some("\u{0085}1"));
    }

    #[test]
    fn test_resolve_kind_explicit() {
        let headers = digest_headers("content-type: application/json");
        assert_eq!(resolve_kind(&headers, ResponseType::Text), ResponseKind::Text);
        assert_eq!(resolve_kind(&headers, ResponseType::Xml), ResponseKind::Xml);
    }

    #[test]
    fn test_digest_response_dispatch() {
        let codecs = Codecs::standard();
        let json = digest_headers("content-type: application/json");

        let parsed = digest_response(r#"{"ok":true}"#, &json, ResponseType::Auto, &codecs).unwrap();
        assert_eq!(parsed, ParsedResponse::Json(serde_json::json!({"ok": true})));

        let parsed = digest_response(r#"{"ok":true}"#, &json, ResponseType::Text, &codecs).unwrap();
        assert_eq!(parsed, ParsedResponse::Text(r#"{"ok":true}"#.into()));
    }

    #[test]
    fn test_digest_response_json_error_propagates() {
        let codecs = Codecs::standard();
        let json = digest_headers("content-type: application/json");
        let err = digest_response("{oops", &json, ResponseType::Auto, &codecs).unwrap_err();
        assert!(err.downcast_ref::<serde_json::Error>().is_some());
    }

    #[cfg(feature = "xml")]
    #[test]
    fn test_digest_response_xml_error_is_a_document() {
        let codecs = Codecs::standard();
        let parsed = digest_response("<a>", &Headers::new(), ResponseType::Xml, &codecs).unwrap();
        match parsed {
            ParsedResponse::Xml(doc) => assert!(doc.parse_error().is_some()),
            other => panic!("Expected Xml, got {:?}", other),
        }
    }

    #[test]
    fn test_digest_response_missing_codec() {
        let err = digest_response("{}", &Headers::new(), ResponseType::Json, &Codecs::none())
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<NetError>(),
            Some(&NetError::CodecUnavailable(ResponseKind::Json))
        );
    }
}
