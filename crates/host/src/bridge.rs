//! Origin-guarded message loop between the host page and the widget frame.
//!
//! The origin check is the only authentication between the two frames: a
//! frame is acted on only when its origin equals the configured embed
//! origin byte for byte. Anything else is dropped without an answer.

use modamatch_core::protocol::ProtocolError;
use modamatch_core::{Envelope, Frame, Request, Response};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::dispatcher::Dispatcher;
use crate::error::HostError;

/// Receives widget frames and answers them through the dispatcher.
#[derive(Debug, Clone)]
pub struct Bridge {
    embed_origin: String,
    dispatcher: Dispatcher,
}

impl Bridge {
    #[must_use]
    pub fn new(embed_origin: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            embed_origin: embed_origin.into(),
            dispatcher,
        }
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Check that `envelope` came from the widget frame.
    ///
    /// # Errors
    ///
    /// Returns `HostError::OriginRejected` for any other origin.
    pub fn authorize(&self, envelope: &Envelope) -> Result<(), HostError> {
        if envelope.origin == self.embed_origin {
            Ok(())
        } else {
            Err(HostError::OriginRejected(envelope.origin.clone()))
        }
    }

    /// Produce the response for one inbound frame, if it warrants one.
    ///
    /// Frames from other origins and frames that are not requests yield `None`.
    pub async fn respond(&self, envelope: Envelope) -> Option<Response> {
        if let Err(e) = self.authorize(&envelope) {
            tracing::debug!(error = %e, "Dropping frame");
            return None;
        }

        let Frame::Request(request) = envelope.frame else {
            return None;
        };
        Some(self.answer(&request).await)
    }

    async fn answer(&self, request: &Request) -> Response {
        let command = match request.command() {
            Ok(command) => command,
            Err(ProtocolError::UnknownType(kind)) => {
                tracing::debug!(%kind, "Unknown message type");
                return Response::ok(request.id, Value::Null);
            }
            Err(e) => {
                tracing::warn!(kind = %request.kind, error = %e, "Malformed request");
                return Response::error(request.id, json!({ "message": e.to_string() }));
            }
        };

        match self.dispatcher.handle(command).await {
            Ok(payload) => Response::ok(request.id, payload),
            Err(e) => {
                tracing::warn!(kind = %request.kind, error = %e, "Host operation failed");
                Response::error(request.id, e.payload())
            }
        }
    }

    /// Serve frames until the inbound channel closes.
    ///
    /// Each authorized frame is handled on its own task, so a slow store call
    /// never holds up other requests. Responses go out as they complete.
    /// In-flight requests are finished before returning.
    pub async fn run(self, mut inbound: mpsc::Receiver<Envelope>, outbound: mpsc::Sender<Frame>) {
        tracing::info!(origin = %self.embed_origin, "Host bridge listening");
        let mut in_flight = JoinSet::new();

        while let Some(envelope) = inbound.recv().await {
            if outbound.is_closed() {
                tracing::debug!("Widget frame gone, stopping bridge");
                break;
            }
            if let Err(e) = self.authorize(&envelope) {
                tracing::debug!(error = %e, "Dropping frame");
                continue;
            }

            let bridge = self.clone();
            let outbound = outbound.clone();
            in_flight.spawn(async move {
                let Some(response) = bridge.respond(envelope).await else {
                    return;
                };
                if outbound.send(response.into()).await.is_err() {
                    tracing::debug!("Widget frame gone, dropping response");
                }
            });

            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
    }
}
