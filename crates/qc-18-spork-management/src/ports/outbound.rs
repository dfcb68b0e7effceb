//! # Outbound Ports (Driven Ports / SPI)
//!
//! Capabilities this subsystem consumes from the rest of the node. The
//! production implementations live with the transport and chain layers;
//! `adapters` ships the secp256k1 signature scheme and the system clock.

use crate::domain::{
    BlockHash, BlockIndexEntry, ChainTip, ChainViewError, Inventory, OperatorKey, PeerId,
    SporkError, ValidationState,
};
use crate::events::SporkNetworkMessage;

/// Signature primitives used at the trust boundary.
pub trait SignatureScheme: Send + Sync {
    /// Check `signature` over `message` against a serialized public key.
    ///
    /// Malformed keys or signatures verify as `false`.
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;

    /// Sign `message` with the operator key.
    fn sign(&self, message: &[u8], key: &OperatorKey) -> Result<Vec<u8>, SporkError>;

    /// Serialized public key belonging to the operator key.
    fn derive_public_key(&self, key: &OperatorKey) -> Result<Vec<u8>, SporkError>;

    /// Whether `public_key` parses as a key this scheme can verify against.
    fn validate_public_key(&self, public_key: &[u8]) -> bool;
}

/// Peer network interface. All calls are fire-and-forget: messages go to
/// the transport's outbound queue.
pub trait PeerNetwork: Send + Sync {
    /// Add `amount` to the peer's misbehavior score.
    fn penalize(&self, peer: PeerId, amount: u32);

    /// Announce an inventory item to every connected peer except `except`.
    fn broadcast_inventory(&self, inventory: Inventory, except: Option<PeerId>);

    /// Queue a message for a single peer.
    fn send_to_peer(&self, peer: PeerId, message: SporkNetworkMessage);
}

/// Narrow view of the chain layer.
///
/// `reconsider_block`, `disconnect_and_reprocess` and `activate_best_chain`
/// are only called while the guard from [`ChainView::chain_lock`] is held,
/// so implementations must not take that lock again inside them.
pub trait ChainView: Send + Sync {
    /// Held for as long as the chain lock is held.
    type LockGuard<'a>
    where
        Self: 'a;

    /// Current active tip, `None` while the chain is not loaded.
    fn current_tip(&self) -> Option<ChainTip>;

    /// Blocks rejected as invalid, with the Unix time of rejection.
    fn rejected_block_timestamps(&self) -> Vec<(BlockHash, i64)>;

    /// Block index entry, if the block is still indexed.
    fn lookup_block_by_hash(&self, hash: &BlockHash) -> Option<BlockIndexEntry>;

    /// Acquire the node's global chain lock.
    fn chain_lock(&self) -> Self::LockGuard<'_>;

    /// Clear the invalid flag on a block so it can be validated again.
    fn reconsider_block(&self, block: &BlockIndexEntry) -> Result<(), ChainViewError>;

    /// Disconnect recent blocks and reprocess them. `n_blocks` is a hint.
    fn disconnect_and_reprocess(&self, n_blocks: i64) -> ValidationState;

    /// Switch to the best valid chain.
    fn activate_best_chain(&self) -> Result<(), ChainViewError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Current Unix time in seconds.
    fn now(&self) -> i64;
}
