//! Service manager interface and the reference implementation.
//!
//! - [`ServiceManager`]: what an [`AwareSession`](crate::AwareSession) forwards to
//! - [`AwareManager`]: manager driving a pluggable [`AwareService`] backend

pub mod aware;
pub mod backend;

use std::sync::Arc;

use crate::callback::DiscoverySessionCallback;
use crate::config::{PublishConfig, SubscribeConfig};
use crate::dispatch::DispatchTarget;
use crate::ids::{ClientId, RevocationToken};
use crate::specifier::DataPathRole;

pub use aware::AwareManager;
pub use backend::AwareService;

/// Owner of the connection to the discovery service.
///
/// Sessions hold only a weak reference to their manager and call these
/// methods after checking their own state. Every method must return without
/// blocking; results of `publish`/`subscribe` are delivered later through
/// `callback` on `dispatch`.
pub trait ServiceManager: Send + Sync + 'static {
    /// Detach a client. `token` proves the request comes from the session
    /// the client id was handed to.
    fn disconnect(&self, client_id: ClientId, token: &RevocationToken);

    /// Request a publish discovery session.
    fn publish(
        &self,
        client_id: ClientId,
        dispatch: DispatchTarget,
        config: PublishConfig,
        callback: Arc<dyn DiscoverySessionCallback>,
    );

    /// Request a subscribe discovery session.
    fn subscribe(
        &self,
        client_id: ClientId,
        dispatch: DispatchTarget,
        config: SubscribeConfig,
        callback: Arc<dyn DiscoverySessionCallback>,
    );

    /// Derive an opaque network specifier for an out-of-band peer.
    fn derive_network_specifier(
        &self,
        client_id: ClientId,
        role: DataPathRole,
        peer: Option<&[u8]>,
        token: Option<&[u8]>,
    ) -> String;
}
