//! # Inbound Ports (Driving Ports / API)
//!
//! - [`SporkApi`]: read access for any subsystem that gates on a spork
//! - [`SporkOperatorApi`]: control-plane only, never reachable from peers
//! - [`SporkMessageHandler`]: entry points for the P2P transport

use std::collections::BTreeMap;

use crate::domain::{PeerId, SporkError, SporkHash, SporkId, SporkMessage};
use crate::events::{ProcessOutcome, SporkNetworkMessage};

/// Read-only spork queries. Never blocks on the chain lock.
pub trait SporkApi: Send + Sync {
    /// Active value, else the catalog default, else `-1`.
    fn get_value(&self, spork_id: i32) -> i64;

    /// Whether the spork's activation time has been reached.
    ///
    /// Only meaningful for activation sporks; parameter sporks must be read
    /// with [`SporkApi::get_value`].
    fn is_active(&self, spork_id: i32) -> bool;

    /// Name -> current value for every catalog entry.
    fn show(&self) -> BTreeMap<&'static str, i64>;

    /// Name -> activation state for every catalog entry.
    fn active_flags(&self) -> BTreeMap<&'static str, bool>;

    /// Whether a spork with this identity was already accepted.
    fn has_seen(&self, hash: &SporkHash) -> bool;

    /// Accepted spork by identity, for serving inventory requests.
    fn find_by_identity(&self, hash: &SporkHash) -> Option<SporkMessage>;
}

/// Operator control plane.
pub trait SporkOperatorApi: Send + Sync {
    /// Install the operator key. `false` if this node cannot act as issuer.
    fn set_signing_key(&self, private_key: &str) -> bool;

    /// Sign, store and broadcast a new value. `false` leaves state untouched.
    fn issue_update(&self, spork_id: SporkId, value: i64) -> bool;

    /// [`SporkOperatorApi::issue_update`] addressed by canonical name.
    fn issue_update_by_name(&self, name: &str, value: i64) -> Result<bool, SporkError>;
}

/// Handle for messages received from the network.
pub trait SporkMessageHandler: Send + Sync {
    /// Process an inbound `spork` message from `peer`.
    ///
    /// # Errors
    /// `SporkError::InvalidSignature` after the peer has been penalized.
    fn handle_spork(&self, peer: PeerId, msg: SporkMessage) -> Result<ProcessOutcome, SporkError>;

    /// Answer an inbound `getsporks` request.
    fn handle_get_sporks(&self, peer: PeerId) -> ProcessOutcome;

    /// Route any spork-protocol message.
    fn handle_network_message(
        &self,
        peer: PeerId,
        message: SporkNetworkMessage,
    ) -> Result<ProcessOutcome, SporkError> {
        match message {
            SporkNetworkMessage::Spork(msg) => self.handle_spork(peer, msg),
            SporkNetworkMessage::GetSporks => Ok(self.handle_get_sporks(peer)),
        }
    }

    /// Ask a freshly connected peer for its active sporks.
    fn on_peer_connected(&self, peer: PeerId);
}
