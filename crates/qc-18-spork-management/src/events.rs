//! Wire messages and processing outcomes for the spork protocol.

use crate::domain::{SporkError, SporkMessage};

/// Command name of a signed spork message.
pub const SPORK_COMMAND: &str = "spork";

/// Command name of a request for all active sporks.
pub const GET_SPORKS_COMMAND: &str = "getsporks";

/// P2P messages handled by the spork subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SporkNetworkMessage {
    /// A signed spork
    Spork(SporkMessage),
    /// Request one `spork` reply per active entry (empty payload)
    GetSporks,
}

impl SporkNetworkMessage {
    /// Wire command name.
    pub fn command(&self) -> &'static str {
        match self {
            SporkNetworkMessage::Spork(_) => SPORK_COMMAND,
            SporkNetworkMessage::GetSporks => GET_SPORKS_COMMAND,
        }
    }

    /// Encode the payload (command name travels in the transport header).
    pub fn encode(&self) -> Result<Vec<u8>, SporkError> {
        match self {
            SporkNetworkMessage::Spork(msg) => msg.to_bytes(),
            SporkNetworkMessage::GetSporks => Ok(Vec::new()),
        }
    }

    /// Decode a payload received under `command`.
    pub fn decode(command: &str, payload: &[u8]) -> Result<Self, SporkError> {
        match command {
            SPORK_COMMAND => SporkMessage::from_bytes(payload).map(SporkNetworkMessage::Spork),
            GET_SPORKS_COMMAND => Ok(SporkNetworkMessage::GetSporks),
            other => Err(SporkError::UnknownCommand(other.to_string())),
        }
    }
}

/// What happened to an inbound spork that was not rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Stored, relayed and dispatched
    Accepted,
    /// Not newer than the active entry; dropped without penalty
    Stale,
    /// No chain tip yet; dropped silently
    NotReady,
    /// Spork processing disabled (lite mode)
    Disabled,
    /// `getsporks` answered with this many messages
    Answered(usize),
}
