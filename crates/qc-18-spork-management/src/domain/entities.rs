//! # Domain Entities
//!
//! Core data structures for spork distribution.
//!
//! ## Entities
//!
//! - [`SporkMessage`]: The signed `(id, value, time)` tuple gossiped by the operator
//! - [`Inventory`]: Announcement item carrying a spork's identity hash
//! - [`PeerId`]: Transport-assigned identifier of a connected peer
//! - [`ChainTip`], [`BlockIndexEntry`], [`ValidationState`]: chain-layer views

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::catalog::{SporkCatalog, SporkId};
use super::errors::SporkError;

/// 32-byte double SHA-256 digest.
pub type Hash = [u8; 32];

/// Identity hash of a spork message.
pub type SporkHash = Hash;

/// Hash of a block header.
pub type BlockHash = Hash;

/// Signed spork message.
///
/// # Wire Format
///
/// bincode with fixed-width little-endian integers:
/// `spork_id: i32 | value: i64 | signed_time: i64 | len: u64 | signature`.
///
/// # Example
///
/// ```rust
/// use qc_18_spork_management::{SporkId, SporkMessage};
///
/// let msg = SporkMessage::new(SporkId::MaxValue, 500, 1_700_000_000);
/// assert_eq!(msg.canonical_payload(), "100035001700000000");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SporkMessage {
    /// Raw wire id. Unknown ids are kept and relayed.
    pub spork_id: i32,
    /// Activation timestamp or numeric parameter, depending on the id.
    pub value: i64,
    /// Unix seconds at which the operator signed this message.
    pub signed_time: i64,
    /// Signature over [`SporkMessage::canonical_payload`].
    pub signature: Vec<u8>,
}

impl SporkMessage {
    /// Creates an unsigned message.
    pub fn new(spork_id: impl Into<i32>, value: i64, signed_time: i64) -> Self {
        Self {
            spork_id: spork_id.into(),
            value,
            signed_time,
            signature: Vec::new(),
        }
    }

    /// The catalog id, if this build knows it.
    pub fn known_id(&self) -> Option<SporkId> {
        SporkId::from_i32(self.spork_id)
    }

    /// Catalog name, or `"Unknown"`.
    pub fn name(&self) -> &'static str {
        SporkCatalog::name_by_id(self.spork_id)
    }

    /// Decimal concatenation of id, value and signed time.
    ///
    /// This string is exactly what the operator key signs.
    pub fn canonical_payload(&self) -> String {
        format!("{}{}{}", self.spork_id, self.value, self.signed_time)
    }

    /// Identity hash: double SHA-256 over `spork_id | value | signed_time`
    /// in little-endian. The signature does not contribute.
    pub fn identity(&self) -> SporkHash {
        let mut preimage = Vec::with_capacity(20);
        preimage.extend_from_slice(&self.spork_id.to_le_bytes());
        preimage.extend_from_slice(&self.value.to_le_bytes());
        preimage.extend_from_slice(&self.signed_time.to_le_bytes());
        double_sha256(&preimage)
    }

    /// Inventory item announcing this message.
    pub fn inventory(&self) -> Inventory {
        Inventory::spork(self.identity())
    }

    /// Encode to wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SporkError> {
        bincode::serialize(self).map_err(|e| SporkError::MalformedMessage(e.to_string()))
    }

    /// Decode from wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SporkError> {
        bincode::deserialize(bytes).map_err(|e| SporkError::MalformedMessage(e.to_string()))
    }
}

/// Double SHA-256.
pub fn double_sha256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Inventory item kinds this subsystem announces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InventoryKind {
    /// A spork message, identified by [`SporkMessage::identity`].
    Spork,
}

/// Inventory announcement (`inv`) item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Inventory {
    pub kind: InventoryKind,
    pub hash: Hash,
}

impl Inventory {
    /// Spork inventory for the given identity.
    pub fn spork(hash: SporkHash) -> Self {
        Self {
            kind: InventoryKind::Spork,
            hash,
        }
    }
}

/// Transport-assigned peer identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl PeerId {
    /// Creates a new peer ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Active chain tip as seen by the chain layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainTip {
    pub hash: BlockHash,
    pub height: u64,
}

/// A block still present in the block index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockIndexEntry {
    pub hash: BlockHash,
    pub height: u64,
}

/// Outcome reported by the chain layer after disconnect-and-reprocess.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationState {
    Valid,
    Invalid { reason: String },
}

impl ValidationState {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationState::Valid)
    }
}
