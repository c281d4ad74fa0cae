//! Result callbacks for publish and subscribe requests.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

use crate::ids::{ClientId, SessionId};

/// Kind of discovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryKind {
    /// Publish (advertise) session.
    Publish,
    /// Subscribe (search) session.
    Subscribe,
}

/// A discovery session the service has started on behalf of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartedSession {
    /// Client that requested the session.
    pub client_id: ClientId,
    /// Service-assigned session identifier.
    pub session_id: SessionId,
    /// Publish or subscribe.
    pub kind: DiscoveryKind,
}

/// Receives the outcome of a publish or subscribe request.
///
/// Methods run on the dispatch target resolved when the request was made.
/// All methods default to doing nothing.
pub trait DiscoverySessionCallback: Send + Sync + 'static {
    /// A publish session was created.
    fn on_publish_started(&self, _session: StartedSession) {}

    /// A subscribe session was created.
    fn on_subscribe_started(&self, _session: StartedSession) {}

    /// The request was rejected or the service failed to start the session.
    fn on_session_config_failed(&self) {}
}

/// Callback outcome as a value, yielded by [`DiscoveryEvents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// See [`DiscoverySessionCallback::on_publish_started`].
    PublishStarted(StartedSession),
    /// See [`DiscoverySessionCallback::on_subscribe_started`].
    SubscribeStarted(StartedSession),
    /// See [`DiscoverySessionCallback::on_session_config_failed`].
    ConfigFailed,
}

/// Callback that forwards every outcome into a [`DiscoveryEvents`] stream.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<DiscoveryEvent>,
}

impl EventSender {
    fn send(&self, event: DiscoveryEvent) {
        if self.tx.send(event).is_err() {
            trace!("discovery event receiver dropped");
        }
    }
}

impl DiscoverySessionCallback for EventSender {
    fn on_publish_started(&self, session: StartedSession) {
        self.send(DiscoveryEvent::PublishStarted(session));
    }

    fn on_subscribe_started(&self, session: StartedSession) {
        self.send(DiscoveryEvent::SubscribeStarted(session));
    }

    fn on_session_config_failed(&self) {
        self.send(DiscoveryEvent::ConfigFailed);
    }
}

/// Stream of callback outcomes.
///
/// Ends once every [`EventSender`] clone has been dropped.
pub struct DiscoveryEvents {
    receiver: UnboundedReceiverStream<DiscoveryEvent>,
}

impl Stream for DiscoveryEvents {
    type Item = DiscoveryEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

/// Create a callback and the stream its outcomes are delivered to.
pub fn event_channel() -> (Arc<EventSender>, DiscoveryEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    let events = DiscoveryEvents {
        receiver: UnboundedReceiverStream::new(rx),
    };
    (Arc::new(EventSender { tx }), events)
}
