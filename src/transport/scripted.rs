//! An in-memory host transport with XMLHttpRequest-like readiness behaviour.
//!
//! [`ScriptedHost`] is a [`TransportFactory`]. Every transport it creates is
//! paired with a [`ScriptedExchange`] handle that records the calls made on
//! the transport and lets the caller drive the exchange forward.
//!
//! - `open` moves to [`ReadyState::Opened`] and notifies the listener.
//! - A sync `send` completes at once with the queued [`Reply`].
//! - An async `send` waits until [`ScriptedExchange::deliver`] fires
//!   `HeadersReceived`, `Loading` and `Done`.
//!
//! # Example
//!
//! ```rust,ignore
//! let host = ScriptedHost::new();
//! host.enqueue(Reply::new(200).header("content-type", "application/json").body("{}"));
//!
//! let client = XhrClient::builder().transport(host.clone()).build();
//! let pending = client.get("https://example.com/api").send()?;
//! host.last_exchange().unwrap().deliver();
//! ```

use crate::base::neterror::NetError;
use crate::base::readystate::ReadyState;
use crate::transport::primitive::{ReadyStateListener, ResponseSource, Transport, TransportFactory};
use http::header::{HeaderName, HeaderValue};
use http::Method;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A canned response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status: u16,
    raw_headers: String,
    body: String,
}

impl Reply {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            raw_headers: String::new(),
            body: String::new(),
        }
    }

    /// A failure with no HTTP response at all (status 0).
    pub fn network_error() -> Self {
        Self::new(0)
    }

    /// Append a `name: value` header line.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.raw_headers.push_str(name);
        self.raw_headers.push_str(": ");
        self.raw_headers.push_str(value);
        self.raw_headers.push_str("\r\n");
        self
    }

    /// Replace the header blob verbatim.
    pub fn raw_headers(mut self, blob: impl Into<String>) -> Self {
        self.raw_headers = blob.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// A call observed by a scripted transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    ListenerRegistered,
    Open {
        method: Method,
        url: String,
        is_async: bool,
        user: Option<String>,
        password: Option<String>,
    },
    SetHeader {
        name: String,
        value: String,
    },
    Send {
        body: Option<String>,
    },
}

#[derive(Default)]
struct ExchangeState {
    ready_state: ReadyState,
    reply: Option<Reply>,
    listener: Option<ReadyStateListener>,
    calls: Vec<TransportCall>,
    is_async: bool,
    sent: bool,
}

impl ExchangeState {
    fn snapshot(&self) -> Snapshot {
        let reply = self.reply.as_ref();
        let headers_visible = self.ready_state >= ReadyState::HeadersReceived;
        let body_visible = self.ready_state >= ReadyState::Loading;

        Snapshot {
            ready_state: self.ready_state,
            status: reply.filter(|_| headers_visible).map_or(0, |r| r.status),
            response_text: reply
                .filter(|_| body_visible)
                .map(|r| r.body.clone())
                .unwrap_or_default(),
            raw_headers: reply
                .filter(|_| headers_visible)
                .map(|r| r.raw_headers.clone())
                .unwrap_or_default(),
        }
    }
}

/// Point-in-time view of an exchange, handed to the listener.
struct Snapshot {
    ready_state: ReadyState,
    status: u16,
    response_text: String,
    raw_headers: String,
}

impl ResponseSource for Snapshot {
    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn response_text(&self) -> String {
        self.response_text.clone()
    }

    fn all_response_headers(&self) -> String {
        self.raw_headers.clone()
    }
}

/// Move the exchange to `level` and notify the listener, if any.
///
/// The listener is taken out of the shared state for the duration of the call
/// so it may freely inspect the exchange.
fn fire(state: &Rc<RefCell<ExchangeState>>, level: ReadyState) {
    let (listener, snapshot) = {
        let mut st = state.borrow_mut();
        st.ready_state = level;
        (st.listener.take(), st.snapshot())
    };

    tracing::trace!(level = level.as_u8(), "scripted transport transition");

    if let Some(mut listener) = listener {
        listener(level, &snapshot);
        let mut st = state.borrow_mut();
        if st.listener.is_none() {
            st.listener = Some(listener);
        }
    }
}

/// Test-side handle to one scripted exchange.
#[derive(Clone)]
pub struct ScriptedExchange {
    state: Rc<RefCell<ExchangeState>>,
}

impl ScriptedExchange {
    /// All calls made on the transport so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.borrow().calls.clone()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready_state
    }

    /// The URL passed to `open`.
    pub fn opened_url(&self) -> Option<String> {
        self.state.borrow().calls.iter().find_map(|call| match call {
            TransportCall::Open { url, .. } => Some(url.clone()),
            _ => None,
        })
    }

    /// Headers set on the transport, in call order.
    pub fn sent_headers(&self) -> Vec<(String, String)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::SetHeader { name, value } => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    /// The effective value of a request header (later calls win).
    pub fn sent_header(&self, name: &str) -> Option<String> {
        self.sent_headers()
            .into_iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The body passed to `send`.
    pub fn sent_body(&self) -> Option<String> {
        self.state.borrow().calls.iter().find_map(|call| match call {
            TransportCall::Send { body } => body.clone(),
            _ => None,
        })
    }

    /// Fire a single readiness transition.
    pub fn advance(&self, level: ReadyState) {
        fire(&self.state, level);
    }

    /// Complete an async exchange with the queued reply (a network error if
    /// none was queued), firing `HeadersReceived`, `Loading` and `Done`.
    pub fn deliver(&self) {
        {
            let mut st = self.state.borrow_mut();
            if st.reply.is_none() {
                st.reply = Some(Reply::network_error());
            }
        }
        for level in [ReadyState::HeadersReceived, ReadyState::Loading, ReadyState::Done] {
            fire(&self.state, level);
        }
    }

    /// Replace the queued reply and deliver it.
    pub fn respond(&self, reply: Reply) {
        self.state.borrow_mut().reply = Some(reply);
        self.deliver();
    }

    /// Drop the registered listener, as a host discarding the request would.
    pub fn release_listener(&self) {
        let listener = self.state.borrow_mut().listener.take();
        drop(listener);
    }
}

/// The transport half of a scripted exchange.
pub struct ScriptedTransport {
    state: Rc<RefCell<ExchangeState>>,
}

impl ResponseSource for ScriptedTransport {
    fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready_state
    }

    fn status(&self) -> u16 {
        self.state.borrow().snapshot().status
    }

    fn response_text(&self) -> String {
        self.state.borrow().snapshot().response_text
    }

    fn all_response_headers(&self) -> String {
        self.state.borrow().snapshot().raw_headers
    }
}

impl Transport for ScriptedTransport {
    fn set_ready_state_listener(&mut self, listener: ReadyStateListener) {
        let mut st = self.state.borrow_mut();
        st.calls.push(TransportCall::ListenerRegistered);
        st.listener = Some(listener);
    }

    fn open(
        &mut self,
        method: &Method,
        url: &str,
        is_async: bool,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), NetError> {
        {
            let mut st = self.state.borrow_mut();
            if st.sent {
                return Err(NetError::InvalidState);
            }
            st.is_async = is_async;
            st.calls.push(TransportCall::Open {
                method: method.clone(),
                url: url.to_owned(),
                is_async,
                user: user.map(str::to_owned),
                password: password.map(str::to_owned),
            });
        }
        fire(&self.state, ReadyState::Opened);
        Ok(())
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let mut st = self.state.borrow_mut();
        if st.ready_state != ReadyState::Opened || st.sent {
            return Err(NetError::InvalidState);
        }
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| NetError::InvalidHeader)?;
        HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)?;

        st.calls.push(TransportCall::SetHeader {
            name: name.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    fn send(&mut self, body: Option<&str>) -> Result<(), NetError> {
        let is_async = {
            let mut st = self.state.borrow_mut();
            if st.ready_state != ReadyState::Opened || st.sent {
                return Err(NetError::InvalidState);
            }
            st.sent = true;
            st.calls.push(TransportCall::Send {
                body: body.map(str::to_owned),
            });
            st.is_async
        };

        if !is_async {
            let mut st = self.state.borrow_mut();
            if st.reply.is_none() {
                st.reply = Some(Reply::network_error());
            }
            st.ready_state = ReadyState::Done;
        }
        Ok(())
    }
}

#[derive(Default)]
struct HostState {
    queued: VecDeque<Reply>,
    exchanges: Vec<ScriptedExchange>,
    unavailable: bool,
}

/// A scripted host: hands out [`ScriptedTransport`]s and keeps their handles.
#[derive(Clone, Default)]
pub struct ScriptedHost {
    inner: Rc<RefCell<HostState>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host without any transport primitive.
    pub fn unavailable() -> Self {
        let host = Self::default();
        host.inner.borrow_mut().unavailable = true;
        host
    }

    /// Queue the reply for the next transport created.
    pub fn enqueue(&self, reply: Reply) {
        self.inner.borrow_mut().queued.push_back(reply);
    }

    /// Handles for every transport created so far.
    pub fn exchanges(&self) -> Vec<ScriptedExchange> {
        self.inner.borrow().exchanges.clone()
    }

    pub fn last_exchange(&self) -> Option<ScriptedExchange> {
        self.inner.borrow().exchanges.last().cloned()
    }
}

impl TransportFactory for ScriptedHost {
    fn create(&self) -> Result<Box<dyn Transport>, NetError> {
        let mut host = self.inner.borrow_mut();
        if host.unavailable {
            return Err(NetError::TransportUnavailable);
        }

        let state = Rc::new(RefCell::new(ExchangeState {
            reply: host.queued.pop_front(),
            ..Default::default()
        }));
        host.exchanges.push(ScriptedExchange {
            state: Rc::clone(&state),
        });

        Ok(Box::new(ScriptedTransport { state }))
    }
}
