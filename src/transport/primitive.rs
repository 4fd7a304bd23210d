//! The host transport capability.
//!
//! These traits describe the XMLHttpRequest-shaped primitive the host
//! provides. The crate never opens connections itself; it drives whatever
//! [`Transport`] the injected [`TransportFactory`] hands out.

use crate::base::neterror::NetError;
use crate::base::readystate::ReadyState;
use http::Method;

/// Read access to the state of an exchange.
///
/// Status and body are only meaningful once the exchange reaches
/// [`ReadyState::Done`].
pub trait ResponseSource {
    fn ready_state(&self) -> ReadyState;

    /// Status code, or 0 when no HTTP response was received.
    fn status(&self) -> u16;

    /// The raw response text.
    fn response_text(&self) -> String;

    /// All response headers as one `\r\n`-separated blob.
    fn all_response_headers(&self) -> String;
}

/// Callback invoked on every readiness transition.
pub type ReadyStateListener = Box<dyn FnMut(ReadyState, &dyn ResponseSource)>;

/// A single-use, stateful request primitive.
///
/// Call order is `open`, any number of `set_request_header`, then `send`.
/// In async mode, `send` returns immediately and the registered listener is
/// invoked as the exchange progresses. In sync mode, `send` returns only once
/// the exchange is [`ReadyState::Done`].
pub trait Transport: ResponseSource {
    /// Register the readiness listener. Must be called before `open`.
    fn set_ready_state_listener(&mut self, listener: ReadyStateListener);

    fn open(
        &mut self,
        method: &Method,
        url: &str,
        is_async: bool,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), NetError>;

    /// Set a request header. A later call for the same name wins.
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), NetError>;

    fn send(&mut self, body: Option<&str>) -> Result<(), NetError>;
}

/// Produces a fresh [`Transport`] per request.
pub trait TransportFactory {
    /// Returns [`NetError::TransportUnavailable`] when the host has no
    /// capable primitive.
    fn create(&self) -> Result<Box<dyn Transport>, NetError>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Result<Box<dyn Transport>, NetError>,
{
    fn create(&self) -> Result<Box<dyn Transport>, NetError> {
        self()
    }
}
