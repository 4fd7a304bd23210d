use crate::base::neterror::NetError;
use crate::base::readystate::ReadyState;
use crate::http::codec::Codecs;
use crate::transport::{ResponseSource, Transport};
use crate::urlrequest::completion::{Completion, Deferred, PendingRequest};
use crate::urlrequest::prepare::PreparedRequest;

/// Drives one transport through a single exchange.
///
/// In async mode the readiness listener is registered before `open`, every
/// transition is forwarded as progress, and the first `Done` runs the
/// completion. In sync mode no listener is registered and the completion runs
/// as soon as `send` returns.
pub struct URLRequestJob {
    transport: Box<dyn Transport>,
    request: PreparedRequest,
    codecs: Codecs,
}

impl URLRequestJob {
    pub fn new(transport: Box<dyn Transport>, request: PreparedRequest, codecs: Codecs) -> Self {
        Self {
            transport,
            request,
            codecs,
        }
    }

    /// Start the exchange. Errors from the transport calls are returned
    /// directly; the request outcome arrives through the returned future.
    pub fn start(self) -> Result<PendingRequest, NetError> {
        let URLRequestJob {
            mut transport,
            request,
            codecs,
        } = self;

        let url = request.url.as_deref().ok_or(NetError::InvalidUrl)?;
        let (deferred, mut pending) = Deferred::channel();
        let completion = Completion::new(codecs, request.response_type);

        let sync_completion = if request.is_async {
            let mut slot = Some((deferred, completion));
            let listener = move |level: ReadyState, exchange: &dyn ResponseSource| {
                tracing::trace!(level = level.as_u8(), "ready state change");

                let Some((deferred, _)) = slot.as_ref() else {
                    if level.is_terminal() {
                        tracing::warn!("transport reported completion more than once");
                    }
                    return;
                };
                deferred.notify(level);

                if level.is_terminal() {
                    if let Some((deferred, completion)) = slot.take() {
                        completion.complete(exchange, deferred);
                    }
                }
            };
            transport.set_ready_state_listener(Box::new(listener));
            None
        } else {
            Some((deferred, completion))
        };

        tracing::debug!(
            method = %request.method,
            url,
            is_async = request.is_async,
            "opening transport"
        );
        transport.open(
            &request.method,
            url,
            request.is_async,
            request.user.as_deref(),
            request.password.as_deref(),
        )?;

        for (name, value) in request.headers.iter() {
            tracing::trace!(name, value, "setting request header");
            transport.set_request_header(name, value)?;
        }

        transport.send(request.body.as_deref())?;

        match sync_completion {
            Some((deferred, completion)) => completion.complete(&*transport, deferred),
            None => pending.hold_transport(transport),
        }

        Ok(pending)
    }
}
