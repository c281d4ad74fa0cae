//! Client-side handle for an attachment to the discovery service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use crate::callback::DiscoverySessionCallback;
use crate::config::{PublishConfig, SubscribeConfig};
use crate::dispatch::DispatchTarget;
use crate::guard::CloseGuard;
use crate::ids::{ClientId, RevocationToken};
use crate::manager::ServiceManager;
use crate::specifier::DataPathRole;

/// One application's attachment to the discovery service.
///
/// Obtained from a manager's attach call (see
/// [`AwareManager::attach`](crate::AwareManager::attach)). Publish and subscribe
/// requests and network specifiers go through this handle.
///
/// The handle never keeps its manager alive. Once [`destroy`](Self::destroy)
/// has run, or once the manager has been dropped, every operation becomes a
/// logged no-op: `publish`/`subscribe` return without invoking the callback
/// and [`create_network_specifier`](Self::create_network_specifier) returns an
/// empty string.
///
/// Dropping a handle that was not destroyed tears it down anyway and, in
/// debug builds, logs a warning.
#[derive(Debug)]
pub struct AwareSession {
    manager: Weak<dyn ServiceManager>,
    client_id: ClientId,
    token: RevocationToken,
    default_dispatch: DispatchTarget,
    terminated: AtomicBool,
    guard: CloseGuard,
}

impl AwareSession {
    /// Bind a new handle to `manager`.
    ///
    /// This is for [`ServiceManager`] implementations to call after a
    /// successful attach; applications get sessions from their manager.
    /// `token` is presented back to the manager on disconnect.
    pub fn new<M: ServiceManager>(
        manager: &Arc<M>,
        client_id: ClientId,
        token: RevocationToken,
        default_dispatch: DispatchTarget,
    ) -> Self {
        let manager: Weak<M> = Arc::downgrade(manager);
        let manager: Weak<dyn ServiceManager> = manager;
        debug!(%client_id, "new discovery session");
        Self {
            manager,
            client_id,
            token,
            default_dispatch,
            terminated: AtomicBool::new(false),
            guard: CloseGuard::open("destroy"),
        }
    }

    /// Client id assigned by the manager.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Whether the session has been torn down.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Detach from the discovery service.
    ///
    /// Ends every publish and subscribe session started through this handle.
    /// Only the first call has an effect. If the manager is already gone the
    /// connection went with it, so the handle is simply marked terminated.
    pub fn destroy(&self) {
        if self.is_terminated() {
            debug!(client_id = %self.client_id, "destroy: already terminated");
            return;
        }

        let Some(manager) = self.manager.upgrade() else {
            if self.terminated.swap(true, Ordering::AcqRel) {
                return;
            }
            warn!(client_id = %self.client_id, "destroy: service manager already dropped");
            self.guard.close();
            return;
        };

        // racing destroy/drop calls: only the winner disconnects
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        manager.disconnect(self.client_id, &self.token);
        self.guard.close();
        debug!(client_id = %self.client_id, "session destroyed");
    }

    /// Request a publish discovery session.
    ///
    /// The outcome arrives on `callback`, run on `dispatch` or, if `None`, on
    /// the session's default dispatch target.
    pub fn publish(
        &self,
        config: PublishConfig,
        callback: Arc<dyn DiscoverySessionCallback>,
        dispatch: Option<DispatchTarget>,
    ) {
        let Some(manager) = self.live_manager("publish") else {
            return;
        };
        let dispatch = self.resolve_dispatch(dispatch);
        manager.publish(self.client_id, dispatch, config, callback);
    }

    /// Request a subscribe discovery session.
    ///
    /// Same delivery rules as [`publish`](Self::publish).
    pub fn subscribe(
        &self,
        config: SubscribeConfig,
        callback: Arc<dyn DiscoverySessionCallback>,
        dispatch: Option<DispatchTarget>,
    ) {
        let Some(manager) = self.live_manager("subscribe") else {
            return;
        };
        let dispatch = self.resolve_dispatch(dispatch);
        manager.subscribe(self.client_id, dispatch, config, callback);
    }

    /// Derive a network specifier for a peer found out of band.
    ///
    /// `peer` is the peer's discovery-interface address; a responder passing
    /// `None` accepts requests from any peer. A `None` token matches any peer
    /// token, while `Some(&[])` only matches an empty one.
    ///
    /// Returns an empty string if the session is terminated or its manager
    /// is gone.
    pub fn create_network_specifier(
        &self,
        role: DataPathRole,
        peer: Option<&[u8]>,
        token: Option<&[u8]>,
    ) -> String {
        let Some(manager) = self.live_manager("create_network_specifier") else {
            return String::new();
        };
        manager.derive_network_specifier(self.client_id, role, peer, token)
    }

    fn live_manager(&self, op: &'static str) -> Option<Arc<dyn ServiceManager>> {
        let Some(manager) = self.manager.upgrade() else {
            warn!(client_id = %self.client_id, op, "{op}: called after the service manager was dropped");
            return None;
        };
        if self.is_terminated() {
            warn!(client_id = %self.client_id, op, "{op}: called after termination");
            return None;
        }
        Some(manager)
    }

    fn resolve_dispatch(&self, dispatch: Option<DispatchTarget>) -> DispatchTarget {
        dispatch.unwrap_or_else(|| self.default_dispatch.clone())
    }
}

impl Drop for AwareSession {
    fn drop(&mut self) {
        if !self.is_terminated() {
            self.guard.warn_if_open("AwareSession");
            self.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tracing::Level;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[derive(Default)]
    struct Recorder {
        disconnects: AtomicUsize,
        forwarded: Mutex<Vec<&'static str>>,
    }

    impl ServiceManager for Recorder {
        fn disconnect(&self, _client_id: ClientId, _token: &RevocationToken) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }

        fn publish(
            &self,
            _client_id: ClientId,
            _dispatch: DispatchTarget,
            _config: PublishConfig,
            _callback: Arc<dyn DiscoverySessionCallback>,
        ) {
            self.forwarded.lock().unwrap().push("publish");
        }

        fn subscribe(
            &self,
            _client_id: ClientId,
            _dispatch: DispatchTarget,
            _config: SubscribeConfig,
            _callback: Arc<dyn DiscoverySessionCallback>,
        ) {
            self.forwarded.lock().unwrap().push("subscribe");
        }

        fn derive_network_specifier(
            &self,
            _client_id: ClientId,
            _role: DataPathRole,
            _peer: Option<&[u8]>,
            _token: Option<&[u8]>,
        ) -> String {
            self.forwarded.lock().unwrap().push("specifier");
            "spec".to_string()
        }
    }

    struct NoopCallback;
    impl DiscoverySessionCallback for NoopCallback {}

    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, count.load(Ordering::SeqCst))
    }

    fn session(manager: &Arc<Recorder>) -> AwareSession {
        let dispatch = DispatchTarget::current().expect("test runs inside a runtime");
        AwareSession::new(manager, ClientId(7), RevocationToken::new(), dispatch)
    }

    #[tokio::test]
    async fn destroy_is_forwarded_once() {
        let manager = Arc::new(Recorder::default());
        let s = session(&manager);

        s.destroy();
        s.destroy();
        assert!(s.is_terminated());
        drop(s);

        assert_eq!(manager.disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn operations_after_destroy_are_dropped_with_a_warning() {
        let manager = Arc::new(Recorder::default());
        let s = session(&manager);
        s.destroy();

        let (spec, warnings) = count_warnings(|| {
            s.publish(PublishConfig::default(), Arc::new(NoopCallback), None);
            s.subscribe(SubscribeConfig::default(), Arc::new(NoopCallback), None);
            s.create_network_specifier(DataPathRole::Initiator, None, None)
        });

        assert_eq!(spec, "");
        assert_eq!(warnings, 3);
        assert!(manager.forwarded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn destroy_with_dropped_manager_still_terminates() {
        let manager = Arc::new(Recorder::default());
        let s = session(&manager);
        drop(manager);

        let ((), warnings) = count_warnings(|| s.destroy());
        assert_eq!(warnings, 1);
        assert!(s.is_terminated());
        assert!(!s.guard.is_open());

        // no leak report and no second teardown on drop
        let ((), warnings) = count_warnings(move || drop(s));
        assert_eq!(warnings, 0);
    }

    #[tokio::test]
    async fn racing_destroys_with_dropped_manager_warn_once() {
        let manager = Arc::new(Recorder::default());
        let s = session(&manager);
        drop(manager);

        let count = Arc::new(AtomicUsize::new(0));
        let dispatch =
            tracing::Dispatch::new(tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count))));
        let barrier = std::sync::Barrier::new(8);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    tracing::dispatcher::with_default(&dispatch, || {
                        barrier.wait();
                        s.destroy();
                    })
                });
            }
        });

        assert!(s.is_terminated());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drop_without_destroy_disconnects_and_reports_leak() {
        let manager = Arc::new(Recorder::default());
        let s = session(&manager);

        let ((), warnings) = count_warnings(move || drop(s));

        assert_eq!(manager.disconnects.load(Ordering::SeqCst), 1);
        let expected = if cfg!(debug_assertions) { 1 } else { 0 };
        assert_eq!(warnings, expected);
    }

    #[tokio::test]
    async fn session_does_not_keep_manager_alive() {
        let manager = Arc::new(Recorder::default());
        let s = session(&manager);
        let weak = Arc::downgrade(&manager);
        drop(manager);

        assert!(weak.upgrade().is_none());
        assert_eq!(s.create_network_specifier(DataPathRole::Responder, None, None), "");
        s.destroy();
    }

    #[test]
    fn handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AwareSession>();
    }
}
