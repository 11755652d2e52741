//! Request/response messenger from the embedded widget to the host page.
//!
//! Every call gets a fresh correlation id and exactly one pending entry. The
//! entry is removed exactly once: when the matching response arrives, when
//! the deadline passes, when posting fails, or when the caller drops the
//! future. Responses that arrive after their call has settled find no entry
//! and are discarded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use modamatch_core::{Command, Envelope, Frame, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::error::MessengerError;

/// Default deadline for a host response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts frames to the host page.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Post a frame. Delivery is fire-and-forget.
    async fn post(&self, frame: Frame) -> Result<(), MessengerError>;
}

/// In-process transport that tags outbound frames with the widget's origin.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    origin: String,
    tx: mpsc::Sender<Envelope>,
}

impl ChannelTransport {
    #[must_use]
    pub fn new(origin: impl Into<String>, tx: mpsc::Sender<Envelope>) -> Self {
        Self {
            origin: origin.into(),
            tx,
        }
    }
}

#[async_trait]
impl FrameTransport for ChannelTransport {
    async fn post(&self, frame: Frame) -> Result<(), MessengerError> {
        self.tx
            .send(Envelope::new(self.origin.clone(), frame))
            .await
            .map_err(|_| MessengerError::Transport("host channel closed".to_string()))
    }
}

type PendingTable = Arc<Mutex<HashMap<Uuid, oneshot::Sender<Response>>>>;

/// Removes a call's pending entry when dropped.
struct PendingGuard {
    id: Uuid,
    pending: PendingTable,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Messenger handle. Cheap to clone; clones share the pending table.
#[derive(Clone)]
pub struct Messenger {
    inner: Arc<MessengerInner>,
}

struct MessengerInner {
    transport: Box<dyn FrameTransport>,
    pending: PendingTable,
    timeout: Duration,
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("timeout", &self.inner.timeout)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl Messenger {
    /// Create a messenger posting through `transport`.
    pub fn new(transport: impl FrameTransport + 'static, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(MessengerInner {
                transport: Box::new(transport),
                pending: Arc::new(Mutex::new(HashMap::new())),
                timeout,
            }),
        }
    }

    /// Number of calls still awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Send a command and wait for the host's payload.
    ///
    /// # Errors
    ///
    /// - `MessengerError::Timeout` if no response arrives in time
    /// - `MessengerError::HostOperationFailed` if the host answered with an error
    /// - `MessengerError::Transport` if the frame could not be posted
    #[tracing::instrument(skip(self, command), fields(kind = %command.message_type()))]
    pub async fn send(&self, command: Command) -> Result<Value, MessengerError> {
        let kind = command.message_type();
        let id = Uuid::new_v4();
        let request = command.into_request(id)?;

        let (tx, rx) = oneshot::channel();
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        let _guard = PendingGuard {
            id,
            pending: Arc::clone(&self.inner.pending),
        };

        // Posting counts against the deadline.
        let exchange = async {
            self.inner.transport.post(request.into()).await?;
            rx.await.map_err(|_| MessengerError::Closed)
        };

        let response = match tokio::time::timeout(self.inner.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(%id, "Host did not respond in time");
                return Err(MessengerError::Timeout {
                    kind,
                    after: self.inner.timeout,
                });
            }
        };

        if response.is_error {
            tracing::debug!(%id, payload = %response.payload, "Host reported failure");
            Err(MessengerError::HostOperationFailed(response.payload))
        } else {
            Ok(response.payload)
        }
    }

    /// Send a command and decode the payload as `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send`], plus `MessengerError::InvalidPayload` when the
    /// payload does not decode.
    pub async fn request<T: DeserializeOwned>(&self, command: Command) -> Result<T, MessengerError> {
        let payload = self.send(command).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Route an inbound frame to its pending call.
    ///
    /// Returns `true` if a waiting call received it. Requests and responses
    /// for settled or unknown calls are ignored.
    pub fn deliver(&self, frame: Frame) -> bool {
        let Frame::Response(response) = frame else {
            return false;
        };

        let waiter = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&response.response_to);

        match waiter {
            Some(tx) => tx.send(response).is_ok(),
            None => {
                tracing::debug!(response_to = %response.response_to, "Ignoring unmatched response");
                false
            }
        }
    }

    /// Deliver inbound frames until the channel closes.
    pub async fn listen(self, mut inbound: mpsc::Receiver<Frame>) {
        while let Some(frame) = inbound.recv().await {
            self.deliver(frame);
        }
        tracing::debug!("Messenger inbound channel closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use modamatch_core::protocol::{AddCart, LineItem};
    use modamatch_core::{Request, VariantId};
    use serde_json::json;

    /// Captures posted requests so tests can answer them.
    struct Recorder(mpsc::UnboundedSender<Request>);

    #[async_trait]
    impl FrameTransport for Recorder {
        async fn post(&self, frame: Frame) -> Result<(), MessengerError> {
            if let Frame::Request(request) = frame {
                let _ = self.0.send(request);
            }
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl FrameTransport for Broken {
        async fn post(&self, _frame: Frame) -> Result<(), MessengerError> {
            Err(MessengerError::Transport("detached".to_string()))
        }
    }

    fn messenger(timeout: Duration) -> (Messenger, mpsc::UnboundedReceiver<Request>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Messenger::new(Recorder(tx), timeout), rx)
    }

    #[tokio::test]
    async fn test_send_resolves_with_payload() {
        let (messenger, mut posted) = messenger(DEFAULT_TIMEOUT);

        let answering = messenger.clone();
        let host = tokio::spawn(async move {
            let request = posted.recv().await.unwrap();
            assert_eq!(request.kind, "getCustomer");
            answering.deliver(Response::ok(request.id, json!({"locale": "fr"})).into());
        });

        let payload = messenger.send(Command::GetCustomer).await.unwrap();
        host.await.unwrap();

        assert_eq!(payload, json!({"locale": "fr"}));
        assert_eq!(messenger.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_error_response_rejects_with_host_body() {
        let (messenger, mut posted) = messenger(DEFAULT_TIMEOUT);

        let answering = messenger.clone();
        tokio::spawn(async move {
            let request = posted.recv().await.unwrap();
            answering.deliver(
                Response::error(request.id, json!({"description": "Sold out"})).into(),
            );
        });

        let command = Command::AddCart(AddCart {
            items: vec![LineItem {
                id: VariantId::new(7),
                quantity: 1,
            }],
        });
        let err = messenger.send(command).await.unwrap_err();

        match err {
            MessengerError::HostOperationFailed(body) => {
                assert_eq!(body["description"], "Sold out");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(messenger.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_then_late_response_is_ignored() {
        let (messenger, mut posted) = messenger(Duration::from_millis(50));

        let err = messenger.send(Command::GetCurrency).await.unwrap_err();
        assert!(matches!(
            err,
            MessengerError::Timeout {
                kind: modamatch_core::MessageType::GetCurrency,
                ..
            }
        ));
        assert_eq!(messenger.pending_count(), 0);

        let request = posted.recv().await.unwrap();
        let delivered = messenger.deliver(Response::ok(request.id, json!({"active": "EUR"})).into());
        assert!(!delivered);
    }

    /// Never finishes posting.
    struct Stalled;

    #[async_trait]
    impl FrameTransport for Stalled {
        async fn post(&self, _frame: Frame) -> Result<(), MessengerError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_deadline_covers_stalled_post() {
        let messenger = Messenger::new(Stalled, Duration::from_millis(50));

        let result =
            tokio::time::timeout(Duration::from_secs(2), messenger.send(Command::GetCustomer))
                .await
                .expect("send should settle at its own deadline");

        assert!(matches!(result, Err(MessengerError::Timeout { .. })));
        assert_eq!(messenger.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_full_host_channel_times_out() {
        let (tx, _unread) = mpsc::channel(1);
        let messenger = Messenger::new(
            ChannelTransport::new("https://app.modamatch.test", tx),
            Duration::from_millis(50),
        );

        for _ in 0..2 {
            let result =
                tokio::time::timeout(Duration::from_secs(2), messenger.send(Command::GetCustomer))
                    .await
                    .expect("send should settle at its own deadline");
            assert!(matches!(result, Err(MessengerError::Timeout { .. })));
        }
        assert_eq!(messenger.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_calls_match_by_id() {
        let (messenger, mut posted) = messenger(DEFAULT_TIMEOUT);

        let first = tokio::spawn({
            let messenger = messenger.clone();
            async move { messenger.send(Command::GetCustomer).await }
        });
        let second = tokio::spawn({
            let messenger = messenger.clone();
            async move { messenger.send(Command::GetCurrency).await }
        });

        let a = posted.recv().await.unwrap();
        let b = posted.recv().await.unwrap();

        // Answer in reverse order; each call gets its own payload.
        messenger.deliver(Response::ok(b.id, json!(b.kind)).into());
        messenger.deliver(Response::ok(a.id, json!(a.kind)).into());

        assert_eq!(first.await.unwrap().unwrap(), json!("getCustomer"));
        assert_eq!(second.await.unwrap().unwrap(), json!("getCurrency"));
        assert_eq!(messenger.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_cleans_up() {
        let messenger = Messenger::new(Broken, DEFAULT_TIMEOUT);

        let err = messenger.send(Command::Close).await.unwrap_err();
        assert!(matches!(err, MessengerError::Transport(_)));
        assert_eq!(messenger.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_call_cleans_up() {
        let (messenger, mut posted) = messenger(DEFAULT_TIMEOUT);

        let call = tokio::spawn({
            let messenger = messenger.clone();
            async move { messenger.send(Command::Checkout).await }
        });
        let request = posted.recv().await.unwrap();
        assert_eq!(messenger.pending_count(), 1);

        call.abort();
        let _ = call.await;

        assert_eq!(messenger.pending_count(), 0);
        assert!(!messenger.deliver(Response::ok(request.id, Value::Null).into()));
    }

    #[tokio::test]
    async fn test_inbound_requests_are_ignored() {
        let (messenger, _posted) = messenger(DEFAULT_TIMEOUT);
        let request = Command::Close.into_request(Uuid::new_v4()).unwrap();

        assert!(!messenger.deliver(request.into()));
    }

    #[tokio::test]
    async fn test_channel_transport_tags_origin() {
        let (tx, mut rx) = mpsc::channel(4);
        let transport = ChannelTransport::new("https://app.modamatch.test", tx);

        let request = Command::Close.into_request(Uuid::new_v4()).unwrap();
        transport.post(request.clone().into()).await.unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.origin, "https://app.modamatch.test");
        assert_eq!(envelope.frame, Frame::Request(request));
    }
}
