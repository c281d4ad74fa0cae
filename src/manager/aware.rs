//! Reference [`ServiceManager`] over an [`AwareService`] backend.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use super::backend::AwareService;
use super::ServiceManager;
use crate::callback::{DiscoveryKind, DiscoverySessionCallback, StartedSession};
use crate::config::{PublishConfig, SubscribeConfig};
use crate::dispatch::DispatchTarget;
use crate::ids::{ClientId, RevocationToken, SessionId};
use crate::session::AwareSession;
use crate::specifier::{DataPathRole, NetworkSpecifier};
use crate::{Error, Result};

/// Manager owning the connection to an [`AwareService`].
///
/// Hands out [`AwareSession`]s from [`attach`](AwareManager::attach) and keeps
/// the revocation token of every attached client, so a disconnect is only
/// honoured when it comes from the session that client id was given to.
///
/// ```ignore
/// let manager = AwareManager::new(service, DispatchTarget::current().unwrap());
/// let session = manager.attach().await?;
/// let (callback, mut events) = event_channel();
/// session.publish(PublishConfig::builder("chat").build(), callback, None);
/// let started = events.next().await;
/// session.destroy();
/// ```
pub struct AwareManager {
    service: Arc<dyn AwareService>,
    default_dispatch: DispatchTarget,
    clients: Mutex<HashMap<ClientId, RevocationToken>>,
}

impl AwareManager {
    /// Create a manager. Sessions it hands out deliver callbacks on
    /// `default_dispatch` unless a request names another target.
    pub fn new(service: Arc<dyn AwareService>, default_dispatch: DispatchTarget) -> Arc<Self> {
        Arc::new(Self {
            service,
            default_dispatch,
            clients: Mutex::new(HashMap::new()),
        })
    }

    /// Attach a new client to the service.
    pub async fn attach(self: &Arc<Self>) -> Result<AwareSession> {
        let client_id = self.service.attach().await?;
        let token = RevocationToken::new();
        self.clients().insert(client_id, token.clone());
        info!(%client_id, "client attached");
        Ok(AwareSession::new(
            self,
            client_id,
            token,
            self.default_dispatch.clone(),
        ))
    }

    /// Whether `client_id` is currently attached.
    pub fn is_attached(&self, client_id: ClientId) -> bool {
        self.clients().contains_key(&client_id)
    }

    /// Ids of all attached clients, sorted.
    pub fn attached_clients(&self) -> Vec<ClientId> {
        let mut ids: Vec<_> = self.clients().keys().copied().collect();
        ids.sort();
        ids
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<ClientId, RevocationToken>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Common admission checks for publish/subscribe. On rejection the
    /// callback is told on `dispatch` and `false` is returned.
    fn admit(
        &self,
        op: &'static str,
        client_id: ClientId,
        validation: Result<()>,
        dispatch: &DispatchTarget,
        callback: &Arc<dyn DiscoverySessionCallback>,
    ) -> bool {
        let rejection = if !self.is_attached(client_id) {
            Some(Error::UnknownClient(client_id).to_string())
        } else {
            validation.err().map(|e| e.to_string())
        };
        match rejection {
            None => true,
            Some(reason) => {
                warn!(%client_id, op, %reason, "{op}: request rejected");
                let callback = Arc::clone(callback);
                dispatch.spawn(async move { callback.on_session_config_failed() });
                false
            }
        }
    }
}

/// Run a backend request on `dispatch` and report the outcome to `callback`.
fn deliver<F>(
    dispatch: &DispatchTarget,
    callback: Arc<dyn DiscoverySessionCallback>,
    client_id: ClientId,
    kind: DiscoveryKind,
    request: F,
) where
    F: Future<Output = Result<SessionId>> + Send + 'static,
{
    dispatch.spawn(async move {
        match request.await {
            Ok(session_id) => {
                debug!(%client_id, %session_id, ?kind, "discovery session started");
                let started = StartedSession {
                    client_id,
                    session_id,
                    kind,
                };
                match kind {
                    DiscoveryKind::Publish => callback.on_publish_started(started),
                    DiscoveryKind::Subscribe => callback.on_subscribe_started(started),
                }
            }
            Err(e) => {
                warn!(%client_id, ?kind, error = %e, "discovery session failed to start");
                callback.on_session_config_failed();
            }
        }
    });
}

impl ServiceManager for AwareManager {
    fn disconnect(&self, client_id: ClientId, token: &RevocationToken) {
        {
            let mut clients = self.clients();
            match clients.get(&client_id) {
                Some(known) if known == token => {
                    clients.remove(&client_id);
                }
                Some(_) => {
                    warn!(%client_id, "disconnect: revocation token mismatch, ignoring");
                    return;
                }
                None => {
                    warn!(%client_id, "disconnect: unknown client");
                    return;
                }
            }
        }

        let service = Arc::clone(&self.service);
        self.default_dispatch.spawn(async move {
            match service.disconnect(client_id).await {
                Ok(()) => info!(%client_id, "client detached"),
                Err(e) => error!(%client_id, error = %e, "failed to detach client"),
            }
        });
    }

    fn publish(
        &self,
        client_id: ClientId,
        dispatch: DispatchTarget,
        config: PublishConfig,
        callback: Arc<dyn DiscoverySessionCallback>,
    ) {
        if !self.admit("publish", client_id, config.validate(), &dispatch, &callback) {
            return;
        }
        let service = Arc::clone(&self.service);
        deliver(
            &dispatch,
            callback,
            client_id,
            DiscoveryKind::Publish,
            async move { service.publish(client_id, &config).await },
        );
    }

    fn subscribe(
        &self,
        client_id: ClientId,
        dispatch: DispatchTarget,
        config: SubscribeConfig,
        callback: Arc<dyn DiscoverySessionCallback>,
    ) {
        if !self.admit("subscribe", client_id, config.validate(), &dispatch, &callback) {
            return;
        }
        let service = Arc::clone(&self.service);
        deliver(
            &dispatch,
            callback,
            client_id,
            DiscoveryKind::Subscribe,
            async move { service.subscribe(client_id, &config).await },
        );
    }

    fn derive_network_specifier(
        &self,
        client_id: ClientId,
        role: DataPathRole,
        peer: Option<&[u8]>,
        token: Option<&[u8]>,
    ) -> String {
        if !self.is_attached(client_id) {
            warn!(%client_id, "derive_network_specifier: unknown client");
            return String::new();
        }
        match NetworkSpecifier::for_client(client_id, role, peer, token).and_then(|s| s.encode()) {
            Ok(specifier) => specifier,
            Err(e) => {
                error!(%client_id, %role, error = %e, "failed to derive network specifier");
                String::new()
            }
        }
    }
}
