//! Backend interface to the platform discovery service.

use async_trait::async_trait;

use crate::config::{PublishConfig, SubscribeConfig};
use crate::ids::{ClientId, SessionId};
use crate::Result;

/// Wire-level operations of the discovery service.
///
/// [`AwareManager`](super::AwareManager) drives an implementation of this
/// trait; platform integrations and test doubles provide one.
#[async_trait]
pub trait AwareService: Send + Sync + 'static {
    /// Attach a new client and return its id.
    async fn attach(&self) -> Result<ClientId>;

    /// Detach a client, ending all of its discovery sessions.
    async fn disconnect(&self, client_id: ClientId) -> Result<()>;

    /// Start a publish session for a client.
    async fn publish(&self, client_id: ClientId, config: &PublishConfig) -> Result<SessionId>;

    /// Start a subscribe session for a client.
    async fn subscribe(&self, client_id: ClientId, config: &SubscribeConfig) -> Result<SessionId>;
}
