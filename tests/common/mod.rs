#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aware_session::{
    ClientId, DataPathRole, DiscoverySessionCallback, DispatchTarget, PublishConfig,
    RevocationToken, ServiceManager, SubscribeConfig,
};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// A call forwarded to [`MockManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Disconnect(ClientId),
    Publish(ClientId, String),
    Subscribe(ClientId, String),
    Specifier(ClientId, DataPathRole),
}

/// Manager that records every forwarded call.
///
/// Specifiers are rendered so that absent and empty tokens differ.
#[derive(Default)]
pub struct MockManager {
    calls: Mutex<Vec<Call>>,
}

impl MockManager {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ServiceManager for MockManager {
    fn disconnect(&self, client_id: ClientId, _token: &RevocationToken) {
        self.record(Call::Disconnect(client_id));
    }

    fn publish(
        &self,
        client_id: ClientId,
        _dispatch: DispatchTarget,
        config: PublishConfig,
        _callback: Arc<dyn DiscoverySessionCallback>,
    ) {
        self.record(Call::Publish(client_id, config.service_name));
    }

    fn subscribe(
        &self,
        client_id: ClientId,
        _dispatch: DispatchTarget,
        config: SubscribeConfig,
        _callback: Arc<dyn DiscoverySessionCallback>,
    ) {
        self.record(Call::Subscribe(client_id, config.service_name));
    }

    fn derive_network_specifier(
        &self,
        client_id: ClientId,
        role: DataPathRole,
        peer: Option<&[u8]>,
        token: Option<&[u8]>,
    ) -> String {
        self.record(Call::Specifier(client_id, role));
        format!("{client_id}/{role}/{peer:?}/{token:?}")
    }
}

pub struct NoopCallback;
impl DiscoverySessionCallback for NoopCallback {}

pub fn noop() -> Arc<dyn DiscoverySessionCallback> {
    Arc::new(NoopCallback)
}

struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `f` and count the warnings it logs on this thread.
pub fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, count.load(Ordering::SeqCst))
}
