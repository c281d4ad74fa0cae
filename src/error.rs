//! Error types for aware-session.

use crate::ids::ClientId;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
///
/// Misuse of a session handle (calls after `destroy()` or after the manager
/// went away) is never reported through this type; it is logged instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A publish or subscribe configuration failed validation.
    #[error("Invalid discovery config: {0}")]
    InvalidConfig(String),

    /// The backend discovery service reported a failure.
    #[error("Discovery service error: {0}")]
    Service(String),

    /// The client is not attached to this manager.
    #[error("Unknown client: {0}")]
    UnknownClient(ClientId),

    /// A peer discovery-interface address had the wrong length.
    #[error("Invalid peer address: expected 6 bytes, got {0}")]
    InvalidPeerAddress(usize),

    /// Network specifier encoding or decoding failed.
    #[error("Network specifier error: {0}")]
    Specifier(#[from] serde_json::Error),
}

impl Error {
    /// Create a config validation error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a backend service error.
    pub fn service<S: Into<String>>(msg: S) -> Self {
        Self::Service(msg.into())
    }
}
