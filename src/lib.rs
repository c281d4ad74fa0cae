//! Client-side session handle for proximity discovery services.
//!
//! An [`AwareSession`] is one application's attachment to the discovery
//! service. It issues publish/subscribe requests and derives network
//! specifiers through a [`ServiceManager`] it only references weakly, and it
//! is torn down exactly once, either by [`AwareSession::destroy`] or on drop.

#![deny(missing_docs)]

pub mod callback;
pub mod config;
pub mod dispatch;
pub mod error;
mod guard;
pub mod ids;
pub mod manager;
pub mod session;
pub mod specifier;

// Re-export key types
pub use callback::{
    event_channel, DiscoveryEvent, DiscoveryEvents, DiscoveryKind, DiscoverySessionCallback,
    EventSender, StartedSession,
};
pub use config::{MatchStyle, PublishConfig, PublishType, SubscribeConfig, SubscribeType};
pub use dispatch::DispatchTarget;
pub use error::{Error, Result};
pub use ids::{ClientId, RevocationToken, SessionId};
pub use manager::{AwareManager, AwareService, ServiceManager};
pub use session::AwareSession;
pub use specifier::{DataPathRole, NetworkSpecifier};
