//! # Spork Manager Service
//!
//! The main service implementing the spork API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `SporkApi` for read-only value and activation queries
//! 2. Implements `SporkOperatorApi` for the control plane (sign + issue)
//! 3. Implements `SporkMessageHandler` for inbound peer traffic (see `handler`)
//! 4. Dispatches executable sporks to the `ChainReprocessor` (see `reprocess`)
//!
//! All collaborators are injected through [`SporkDependencies`].

mod handler;
mod reprocess;

pub use reprocess::{ChainReprocessor, ReprocessReport};

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{
    effect_for, is_activation_reached, Inventory, InsertOutcome, OperatorKey, SporkCatalog,
    SporkConfig, SporkEffect, SporkError, SporkHash, SporkId, SporkMessage, SporkRegistry,
    UNKNOWN_SPORK_VALUE,
};
use crate::ports::inbound::{SporkApi, SporkOperatorApi};
use crate::ports::outbound::{ChainView, PeerNetwork, SignatureScheme, TimeSource};

/// Spork value used for the throwaway signature in `set_signing_key`.
const KEY_CHECK_VALUE: i64 = 0;

/// Dependencies for SporkManager
pub struct SporkDependencies<S, N, C, T> {
    pub scheme: Arc<S>,
    pub network: Arc<N>,
    pub chain: Arc<C>,
    pub time_source: Arc<T>,
}

/// The spork manager.
///
/// Owns the registry and sits on the trust boundary: every message entering
/// the registry from the network has been verified against the network key.
pub struct SporkManager<S, N, C, T>
where
    S: SignatureScheme,
    N: PeerNetwork,
    C: ChainView,
    T: TimeSource,
{
    pub(crate) config: SporkConfig,
    /// Decoded `config.spork_public_key`.
    pub(crate) network_public_key: Vec<u8>,
    pub(crate) registry: SporkRegistry,
    /// Operator key; `None` unless this node issues sporks.
    pub(crate) signing_key: RwLock<Option<OperatorKey>>,
    pub(crate) scheme: Arc<S>,
    pub(crate) network: Arc<N>,
    pub(crate) chain: Arc<C>,
    pub(crate) time_source: Arc<T>,
    pub(crate) reprocessor: ChainReprocessor<C, T>,
}

impl<S, N, C, T> SporkManager<S, N, C, T>
where
    S: SignatureScheme,
    N: PeerNetwork,
    C: ChainView,
    T: TimeSource,
{
    /// Create a new manager with an empty registry.
    ///
    /// # Errors
    /// `SporkError::InvalidPublicKey` if `config.spork_public_key` is not a
    /// public key the signature scheme accepts.
    pub fn new(
        deps: SporkDependencies<S, N, C, T>,
        config: SporkConfig,
    ) -> Result<Self, SporkError> {
        let key = config.spork_public_key.trim();
        let network_public_key = hex::decode(key.strip_prefix("0x").unwrap_or(key))
            .map_err(|e| SporkError::InvalidPublicKey(e.to_string()))?;
        if !deps.scheme.validate_public_key(&network_public_key) {
            return Err(SporkError::InvalidPublicKey(format!(
                "{} is not a valid public key",
                config.spork_public_key
            )));
        }

        let reprocessor = ChainReprocessor::new(
            Arc::clone(&deps.chain),
            Arc::clone(&deps.time_source),
            config.reprocess_seconds_per_block,
        );

        Ok(Self {
            config,
            network_public_key,
            registry: SporkRegistry::new(),
            signing_key: RwLock::new(None),
            scheme: deps.scheme,
            network: deps.network,
            chain: deps.chain,
            time_source: deps.time_source,
            reprocessor,
        })
    }

    pub fn config(&self) -> &SporkConfig {
        &self.config
    }

    pub fn registry(&self) -> &SporkRegistry {
        &self.registry
    }

    /// Check `msg` against the network spork key. Pure predicate.
    pub fn verify(&self, msg: &SporkMessage) -> bool {
        self.scheme.verify(
            msg.canonical_payload().as_bytes(),
            &msg.signature,
            &self.network_public_key,
        )
    }

    /// Sign `msg` with the configured operator key.
    ///
    /// The fresh signature is checked against the key's own public key
    /// before `msg` is touched, so a failure leaves `msg` unchanged.
    pub fn sign(&self, msg: &mut SporkMessage) -> Result<(), SporkError> {
        let guard = self.signing_key.read();
        let key = guard.as_ref().ok_or(SporkError::SigningKeyMissing)?;

        let payload = msg.canonical_payload();
        let signature = self.scheme.sign(payload.as_bytes(), key)?;
        let public_key = self.scheme.derive_public_key(key)?;

        if !self.scheme.verify(payload.as_bytes(), &signature, &public_key) {
            error!(spork_id = msg.spork_id, "Freshly produced spork signature does not verify");
            return Err(SporkError::SelfVerificationFailed);
        }

        msg.signature = signature;
        Ok(())
    }

    /// Announce `msg` to every connected peer. Does not verify.
    pub fn broadcast(&self, msg: &SporkMessage) {
        self.network.broadcast_inventory(Inventory::spork(msg.identity()), None);
    }

    /// Run the effect bound to `spork_id`, if any.
    pub fn dispatch(&self, spork_id: i32, value: i64) -> Option<ReprocessReport> {
        match effect_for(spork_id, value)? {
            SporkEffect::ReconsiderBlocks { n_blocks } => Some(self.reprocessor.reprocess(n_blocks)),
        }
    }

    /// Signed message that peers will accept, or an error.
    fn try_issue(&self, spork_id: SporkId, value: i64) -> Result<SporkMessage, SporkError> {
        let mut msg = SporkMessage::new(spork_id, value, self.time_source.now());
        self.sign(&mut msg)?;
        if !self.verify(&msg) {
            return Err(SporkError::UnauthorizedSigningKey);
        }
        Ok(msg)
    }
}

impl<S, N, C, T> SporkApi for SporkManager<S, N, C, T>
where
    S: SignatureScheme,
    N: PeerNetwork,
    C: ChainView,
    T: TimeSource,
{
    fn get_value(&self, spork_id: i32) -> i64 {
        if let Some(value) = self.registry.active_value(spork_id) {
            return value;
        }
        if let Some(value) = SporkCatalog::default_value(spork_id) {
            return value;
        }
        warn!(spork_id, "Unknown spork id without an active value");
        UNKNOWN_SPORK_VALUE
    }

    fn is_active(&self, spork_id: i32) -> bool {
        is_activation_reached(
            self.get_value(spork_id),
            self.time_source.now(),
            self.config.far_future_activation,
        )
    }

    fn show(&self) -> BTreeMap<&'static str, i64> {
        SporkCatalog::definitions()
            .iter()
            .map(|d| (d.name, self.get_value(d.id.as_i32())))
            .collect()
    }

    fn active_flags(&self) -> BTreeMap<&'static str, bool> {
        SporkCatalog::definitions()
            .iter()
            .map(|d| (d.name, self.is_active(d.id.as_i32())))
            .collect()
    }

    fn has_seen(&self, hash: &SporkHash) -> bool {
        self.registry.contains(hash)
    }

    fn find_by_identity(&self, hash: &SporkHash) -> Option<SporkMessage> {
        self.registry.get_by_identity(hash)
    }
}

impl<S, N, C, T> SporkOperatorApi for SporkManager<S, N, C, T>
where
    S: SignatureScheme,
    N: PeerNetwork,
    C: ChainView,
    T: TimeSource,
{
    fn set_signing_key(&self, private_key: &str) -> bool {
        *self.signing_key.write() = Some(OperatorKey::new(private_key));

        match self.try_issue(SporkId::SwiftTx, KEY_CHECK_VALUE) {
            Ok(_) => {
                info!(network = self.config.network.as_str(), "Spork signing key configured");
                true
            }
            Err(e) => {
                warn!(error = %e, "Spork signing key cannot sign");
                false
            }
        }
    }

    fn issue_update(&self, spork_id: SporkId, value: i64) -> bool {
        let msg = match self.try_issue(spork_id, value) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(spork = spork_id.name(), error = %e, "Failed to sign spork update");
                return false;
            }
        };

        if self.registry.insert_if_newer(msg.clone()) == InsertOutcome::Stale {
            warn!(
                spork = spork_id.name(),
                signed_time = msg.signed_time,
                "An update with the same or a later signing time is already active"
            );
            return false;
        }

        self.broadcast(&msg);
        info!(
            spork = spork_id.name(),
            value,
            hash = %hex::encode(msg.identity()),
            "Spork update issued"
        );
        true
    }

    fn issue_update_by_name(&self, name: &str, value: i64) -> Result<bool, SporkError> {
        let spork_id = SporkCatalog::id_by_name(name)
            .ok_or_else(|| SporkError::UnknownSporkName(name.to_string()))?;
        Ok(self.issue_update(spork_id, value))
    }
}
