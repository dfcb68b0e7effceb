//! # Spork Management Subsystem (qc-18)
//!
//! Signed network feature flags ("sporks"). A trusted operator key signs
//! `(id, value, signed_time)` tuples that are gossiped to every node and let
//! the network toggle or parameterize consensus-adjacent behavior without a
//! binary upgrade.
//!
//! ## Architecture Role
//!
//! ```text
//! [Operator] ──issue_update──→ [Spork Manager (18)] ──inv(spork)──→ [Peers]
//!                                     ↑    │
//!              spork / getsporks ─────┘    ├──get_value / is_active──→ [Any subsystem]
//!                                          ↓
//!                              reconsider-blocks spork
//!                                          ↓
//!                                  [ChainReprocessor] ──chain lock──→ [Chain layer]
//! ```
//!
//! ## Security
//!
//! - Every inbound spork is verified against the network's fixed public key
//! - Bad signatures → DROP + misbehavior penalty for the relaying peer
//! - Stale updates → silent drop (ordinary gossip race)
//! - The operator API is control-plane only and never reachable from peers
//!
//! ## Invariants
//!
//! - Last signed time wins per id; equal times never replace
//! - Registry history and active maps change together under one lock
//! - Reads never take the chain lock

pub mod adapters;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{Secp256k1SignatureScheme, SystemTimeSource};
pub use domain::*;
pub use events::{ProcessOutcome, SporkNetworkMessage, GET_SPORKS_COMMAND, SPORK_COMMAND};
pub use ports::inbound::{SporkApi, SporkMessageHandler, SporkOperatorApi};
pub use ports::outbound::{ChainView, PeerNetwork, SignatureScheme, TimeSource};
pub use service::{ChainReprocessor, ReprocessReport, SporkDependencies, SporkManager};
