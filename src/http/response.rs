//! Response envelope handed to a request's future on settlement.

use crate::http::codec::XmlDocument;
use crate::http::digest::ResponseKind;
use crate::http::headers::Headers;
use http::StatusCode;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Text(String),
    Json(serde_json::Value),
    Xml(XmlDocument),
}

impl ParsedResponse {
    /// The policy that produced this value.
    pub fn kind(&self) -> ResponseKind {
        match self {
            ParsedResponse::Text(_) => ResponseKind::Text,
            ParsedResponse::Json(_) => ResponseKind::Json,
            ParsedResponse::Xml(_) => ResponseKind::Xml,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParsedResponse::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ParsedResponse::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlDocument> {
        match self {
            ParsedResponse::Xml(doc) => Some(doc),
            _ => None,
        }
    }
}

/// The bundled result of a completed request.
///
/// The same shape is delivered whether the request resolved or was rejected;
/// callers tell outcomes apart by [`status`](Self::status).
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    status: u16,
    raw_body: String,
    parsed: ParsedResponse,
    headers: Headers,
}

impl ResponseEnvelope {
    pub fn new(status: u16, raw_body: String, parsed: ParsedResponse, headers: Headers) -> Self {
        Self {
            status,
            raw_body,
            parsed,
            headers,
        }
    }

    /// Get the status code as reported by the transport (0 for network failures).
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the status as an `http::StatusCode`, if it is a valid one.
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status).ok()
    }

    /// Get the undecoded response text.
    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// Get the decoded response.
    pub fn parsed(&self) -> &ParsedResponse {
        &self.parsed
    }

    /// Get the canonicalized response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Convenience lookup by canonical header name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Deserialize the decoded JSON (or, failing that, the raw body) into `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.parsed {
            ParsedResponse::Json(value) => T::deserialize(value),
            _ => serde_json::from_str(&self.raw_body),
        }
    }

    pub fn into_parsed(self) -> ParsedResponse {
        self.parsed
    }
}
