//! Inbound protocol handling.
//!
//! Per `spork` message: ready check, freshness, signature, then
//! store + relay + dispatch. Signature verification runs outside the
//! registry lock; the final insert re-checks freshness atomically.

use tracing::{debug, info, instrument, warn};

use super::SporkManager;
use crate::domain::{Inventory, InsertOutcome, PeerId, SporkError, SporkMessage};
use crate::events::{ProcessOutcome, SporkNetworkMessage};
use crate::ports::inbound::SporkMessageHandler;
use crate::ports::outbound::{ChainView, PeerNetwork, SignatureScheme, TimeSource};

impl<S, N, C, T> SporkMessageHandler for SporkManager<S, N, C, T>
where
    S: SignatureScheme,
    N: PeerNetwork,
    C: ChainView,
    T: TimeSource,
{
    #[instrument(
        skip(self, msg),
        fields(spork_id = msg.spork_id, signed_time = msg.signed_time)
    )]
    fn handle_spork(&self, peer: PeerId, msg: SporkMessage) -> Result<ProcessOutcome, SporkError> {
        if self.config.lite_mode {
            return Ok(ProcessOutcome::Disabled);
        }

        if self.chain.current_tip().is_none() {
            return Ok(ProcessOutcome::NotReady);
        }

        if !self.registry.is_fresh(&msg) {
            debug!("Spork is not newer than the active entry");
            return Ok(ProcessOutcome::Stale);
        }

        let hash = msg.identity();
        info!(
            spork = msg.name(),
            value = msg.value,
            hash = %hex::encode(hash),
            %peer,
            "New spork"
        );

        if !self.verify(&msg) {
            warn!(%peer, "Invalid spork signature");
            self.network.penalize(peer, self.config.misbehavior_penalty);
            return Err(SporkError::InvalidSignature);
        }

        let (spork_id, value) = (msg.spork_id, msg.value);
        if self.registry.insert_if_newer(msg) == InsertOutcome::Stale {
            debug!("Newer spork accepted concurrently");
            return Ok(ProcessOutcome::Stale);
        }

        self.network
            .broadcast_inventory(Inventory::spork(hash), Some(peer));
        self.dispatch(spork_id, value);

        Ok(ProcessOutcome::Accepted)
    }

    fn handle_get_sporks(&self, peer: PeerId) -> ProcessOutcome {
        if self.config.lite_mode {
            return ProcessOutcome::Disabled;
        }

        let active = self.registry.active_messages();
        let count = active.len();
        for msg in active {
            self.network.send_to_peer(peer, SporkNetworkMessage::Spork(msg));
        }
        debug!(%peer, count, "Answered getsporks");
        ProcessOutcome::Answered(count)
    }

    fn on_peer_connected(&self, peer: PeerId) {
        if self.config.lite_mode {
            return;
        }
        self.network.send_to_peer(peer, SporkNetworkMessage::GetSporks);
    }
}
