use crate::http::digest::ResponseKind;
use thiserror::Error;

/// Synchronous failures raised while starting a request.
///
/// Anything that goes wrong with the *outcome* of a request (a non-success
/// status, a body the JSON codec rejects) is delivered through the request's
/// future as a [`Rejection`](crate::urlrequest::completion::Rejection) instead.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Environment capability errors
    #[error("No transport primitive is available")]
    TransportUnavailable,
    #[error("No {0} codec is available")]
    CodecUnavailable(ResponseKind),

    // Transport errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Invalid request method")]
    InvalidMethod,
    #[error("Invalid request header")]
    InvalidHeader,
    #[error("Transport is not in a state that allows this call")]
    InvalidState,
    #[error("Connection failed")]
    ConnectionFailed,

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        NetError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Numeric code, following the Chromium `net_error_list.h` numbering where a
    /// counterpart exists and the `-10000` range for crate-specific errors.
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionFailed => -104,
            NetError::InvalidUrl => -300,
            NetError::InvalidMethod => -322,
            NetError::InvalidHeader => -4,
            NetError::InvalidState => -9,
            NetError::TransportUnavailable => -10000,
            NetError::CodecUnavailable(ResponseKind::Text) => -10001,
            NetError::CodecUnavailable(ResponseKind::Json) => -10002,
            NetError::CodecUnavailable(ResponseKind::Xml) => -10003,
            NetError::InvalidConfig { .. } => -10004,
            NetError::Unknown(code) => *code,
        }
    }

    /// Whether this error describes a missing host capability rather than a
    /// problem with the request itself.
    pub fn is_capability_error(&self) -> bool {
        matches!(
            self,
            NetError::TransportUnavailable | NetError::CodecUnavailable(_)
        )
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -104 => NetError::ConnectionFailed,
            -300 => NetError::InvalidUrl,
            -322 => NetError::InvalidMethod,
            -4 => NetError::InvalidHeader,
            -9 => NetError::InvalidState,
            -10000 => NetError::TransportUnavailable,
            -10001 => NetError::CodecUnavailable(ResponseKind::Text),
            -10002 => NetError::CodecUnavailable(ResponseKind::Json),
            -10003 => NetError::CodecUnavailable(ResponseKind::Xml),
            -10004 => NetError::InvalidConfig {
                message: String::new(),
            },
            _ => NetError::Unknown(code),
        }
    }
}
