//! Settlement of a request's future.
//!
//! A [`Deferred`] is the producer side of one request: it emits progress
//! notifications and is consumed by exactly one `resolve` or `reject`. The
//! consumer side is [`PendingRequest`], a `Future` plus a progress `Stream`.

use crate::base::readystate::ReadyState;
use crate::http::codec::{CodecError, Codecs};
use crate::http::digest::{digest_headers, digest_response, resolve_kind, ResponseKind, ResponseType};
use crate::http::headers::Headers;
use crate::http::response::ResponseEnvelope;
use crate::transport::{ResponseSource, Transport};
use futures::channel::{mpsc, oneshot};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

/// The terminal outcome of a request.
pub type Settlement = Result<ResponseEnvelope, Rejection>;

/// Why a request's future was rejected.
#[derive(Debug, Error)]
pub enum Rejection {
    /// The exchange completed with a status outside the success set.
    /// Carries the same envelope a resolution would.
    #[error("request failed with status {}", .0.status())]
    Status(ResponseEnvelope),

    /// The JSON codec rejected the response body.
    #[error("response body is not valid {kind}: {source}")]
    MalformedBody {
        kind: ResponseKind,
        status: u16,
        raw_body: String,
        headers: Headers,
        #[source]
        source: CodecError,
    },

    /// The transport was released before reaching `Done`.
    #[error("transport released the request before completion")]
    Abandoned,
}

impl Rejection {
    /// The envelope of a status rejection.
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Rejection::Status(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// The transport status, when the exchange completed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Rejection::Status(envelope) => Some(envelope.status()),
            Rejection::MalformedBody { status, .. } => Some(*status),
            Rejection::Abandoned => None,
        }
    }

    pub fn into_envelope(self) -> Option<ResponseEnvelope> {
        match self {
            Rejection::Status(envelope) => Some(envelope),
            _ => None,
        }
    }
}

/// Statuses that resolve the future: `200..=206` and `304`.
pub fn is_success_status(status: u16) -> bool {
    (200..=206).contains(&status) || status == 304
}

/// Producer side of a request's future.
pub struct Deferred {
    settle: oneshot::Sender<Settlement>,
    progress: mpsc::UnboundedSender<ReadyState>,
}

impl Deferred {
    /// Create a linked producer/consumer pair.
    pub fn channel() -> (Deferred, PendingRequest) {
        let (settle, settlement) = oneshot::channel();
        let (progress, progress_rx) = mpsc::unbounded();

        (
            Deferred { settle, progress },
            PendingRequest {
                settlement,
                progress: Some(progress_rx),
                transport: None,
                settled: false,
            },
        )
    }

    pub fn notify(&self, state: ReadyState) {
        // A dropped progress receiver only means nobody is listening.
        let _ = self.progress.unbounded_send(state);
    }

    pub fn resolve(self, envelope: ResponseEnvelope) {
        let _ = self.settle.send(Ok(envelope));
    }

    pub fn reject(self, rejection: Rejection) {
        let _ = self.settle.send(Err(rejection));
    }
}

/// Consumer side of a request: resolves to the response envelope.
///
/// Progress notifications are available once through
/// [`take_progress`](Self::take_progress). The stream ends after settlement.
///
/// The settlement is handed out once, either by
/// [`try_settlement`](Self::try_settlement) or by awaiting.
///
/// # Panics
///
/// Polling the future after the settlement was handed out panics, as with any
/// completed `Future`.
pub struct PendingRequest {
    settlement: oneshot::Receiver<Settlement>,
    progress: Option<mpsc::UnboundedReceiver<ReadyState>>,
    transport: Option<Box<dyn Transport>>,
    settled: bool,
}

impl PendingRequest {
    /// Take the progress stream. Returns `None` on later calls.
    pub fn take_progress(&mut self) -> Option<mpsc::UnboundedReceiver<ReadyState>> {
        self.progress.take()
    }

    /// Keep the transport alive until this request is dropped.
    pub(crate) fn hold_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
    }

    /// Whether the settlement has already been handed out.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// The settlement, if it has happened and was not handed out before.
    pub fn try_settlement(&mut self) -> Option<Settlement> {
        if self.settled {
            return None;
        }
        let settlement = match self.settlement.try_recv() {
            Ok(Some(settlement)) => settlement,
            Ok(None) => return None,
            Err(oneshot::Canceled) => Err(Rejection::Abandoned),
        };
        self.settled = true;
        Some(settlement)
    }
}

impl Future for PendingRequest {
    type Output = Settlement;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        assert!(!self.settled, "PendingRequest polled after its settlement was taken");

        let settlement = match Pin::new(&mut self.settlement).poll(cx) {
            Poll::Ready(Ok(settlement)) => settlement,
            Poll::Ready(Err(oneshot::Canceled)) => Err(Rejection::Abandoned),
            Poll::Pending => return Poll::Pending,
        };
        self.settled = true;
        Poll::Ready(settlement)
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("settled", &self.settled)
            .field("progress", &self.progress.is_some())
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

/// Runs once the transport reports completion: digests the response and
/// settles the deferred.
pub struct Completion {
    codecs: Codecs,
    response_type: ResponseType,
}

impl Completion {
    pub fn new(codecs: Codecs, response_type: ResponseType) -> Self {
        Self {
            codecs,
            response_type,
        }
    }

    /// Build the envelope from `exchange` and settle `deferred` with it.
    pub fn complete<S>(self, exchange: &S, deferred: Deferred)
    where
        S: ResponseSource + ?Sized,
    {
        let status = exchange.status();
        let raw_body = exchange.response_text();
        let headers = digest_headers(&exchange.all_response_headers());

        let parsed = match digest_response(&raw_body, &headers, self.response_type, &self.codecs) {
            Ok(parsed) => parsed,
            Err(source) => {
                let kind = resolve_kind(&headers, self.response_type);
                tracing::debug!(status, %kind, error = %source, "response body rejected by codec");
                deferred.reject(Rejection::MalformedBody {
                    kind,
                    status,
                    raw_body,
                    headers,
                    source,
                });
                return;
            }
        };

        let envelope = ResponseEnvelope::new(status, raw_body, parsed, headers);
        if is_success_status(status) {
            tracing::debug!(status, "request resolved");
            deferred.resolve(envelope);
        } else {
            tracing::debug!(status, "request rejected");
            deferred.reject(Rejection::Status(envelope));
        }
    }
}
