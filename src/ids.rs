//! Identifiers handed out by the discovery service.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Client identifier assigned by the service manager at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClientId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier of a started publish or subscribe discovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SessionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identity capability presented to the manager when a session is torn down.
///
/// Tokens compare by identity, not by value: two tokens are equal only if one
/// was cloned from the other. A manager records the token it minted for a
/// client and rejects disconnects carrying any other token.
#[derive(Clone, Default)]
pub struct RevocationToken(Arc<()>);

impl RevocationToken {
    /// Mint a fresh token, distinct from every other live token.
    pub fn new() -> Self {
        Self(Arc::new(()))
    }
}

impl PartialEq for RevocationToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RevocationToken {}

impl fmt::Debug for RevocationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevocationToken({:p})", Arc::as_ptr(&self.0))
    }
}
