//! Network specifiers for out-of-band data-path requests.
//!
//! A specifier is an opaque string as far as a session is concerned. The
//! reference manager encodes it as JSON:
//!
//! ```json
//! {"type":"client","role":"responder","client_id":7,"peer_mac":null,"token":""}
//! ```
//!
//! Byte fields are lower-case hex. An absent token (`null`) matches any peer
//! token, an empty one (`""`) only matches an empty peer token.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::ClientId;

/// Length of a discovery-interface MAC address.
pub const PEER_ADDRESS_LEN: usize = 6;

/// Role of this device in a data-path setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataPathRole {
    /// Sends the connection request.
    Initiator,
    /// Accepts the connection request.
    Responder,
}

impl fmt::Display for DataPathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

/// Origin of the peer information in a specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecifierType {
    /// Peer address obtained out of band, bound to an attached client.
    Client,
}

/// Decoded network specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpecifier {
    /// Specifier flavour.
    #[serde(rename = "type")]
    pub kind: SpecifierType,
    /// Role of the requesting device.
    pub role: DataPathRole,
    /// Attached client the request belongs to.
    pub client_id: ClientId,
    /// Peer discovery-interface address.
    #[serde(with = "hex_opt")]
    pub peer_mac: Option<Vec<u8>>,
    /// Matching token.
    #[serde(with = "hex_opt")]
    pub token: Option<Vec<u8>>,
}

impl NetworkSpecifier {
    /// Build a client specifier, checking the peer address length.
    pub fn for_client(
        client_id: ClientId,
        role: DataPathRole,
        peer: Option<&[u8]>,
        token: Option<&[u8]>,
    ) -> Result<Self> {
        if let Some(peer) = peer {
            if peer.len() != PEER_ADDRESS_LEN {
                return Err(Error::InvalidPeerAddress(peer.len()));
            }
        }
        Ok(Self {
            kind: SpecifierType::Client,
            role,
            client_id,
            peer_mac: peer.map(<[u8]>::to_vec),
            token: token.map(<[u8]>::to_vec),
        })
    }

    /// Encode as the opaque specifier string.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a specifier string.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

mod hex_opt {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => s.serialize_str(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| hex::decode(s).map_err(D::Error::custom))
            .transpose()
    }
}
