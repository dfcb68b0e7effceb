//! Test utilities for spork management.
//!
//! Mock implementations of the outbound ports for deterministic testing.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use qc_18_spork_management::test_utils::FixedTimeSource;
//! use qc_18_spork_management::TimeSource;
//!
//! let time = FixedTimeSource::new(1_700_000_000);
//! time.advance(60);
//! assert_eq!(time.now(), 1_700_000_060);
//! ```

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::adapters::Secp256k1SignatureScheme;
use crate::domain::{
    BlockHash, BlockIndexEntry, ChainTip, ChainViewError, Inventory, Network, OperatorKey, PeerId,
    SporkConfig, SporkMessage, ValidationState,
};
use crate::events::SporkNetworkMessage;
use crate::ports::outbound::{ChainView, PeerNetwork, SignatureScheme, TimeSource};
use crate::service::{SporkDependencies, SporkManager};

/// Secret matching [`Network::Regtest`]'s spork public key.
pub const REGTEST_OPERATOR_KEY: &str =
    "a754b87891039b72d772a8667207b7a03c71082b0241bb934e9e45a4d237a6b4";

/// Timestamp used by the fixtures below (2023-11-14T22:13:20Z).
pub const TEST_NOW: i64 = 1_700_000_000;

/// A time source that returns a controllable timestamp.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    timestamp: AtomicI64,
}

impl FixedTimeSource {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp: AtomicI64::new(timestamp),
        }
    }

    pub fn set(&self, timestamp: i64) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.timestamp.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> i64 {
        self.timestamp.load(Ordering::SeqCst)
    }
}

/// Peer network that records every call.
#[derive(Debug, Default)]
pub struct RecordingPeerNetwork {
    pub penalties: Mutex<Vec<(PeerId, u32)>>,
    pub broadcasts: Mutex<Vec<(Inventory, Option<PeerId>)>>,
    pub sent: Mutex<Vec<(PeerId, SporkNetworkMessage)>>,
}

impl RecordingPeerNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn penalty_count(&self) -> usize {
        self.penalties.lock().len()
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().len()
    }

    pub fn sent_to(&self, peer: PeerId) -> Vec<SporkNetworkMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(p, _)| *p == peer)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl PeerNetwork for RecordingPeerNetwork {
    fn penalize(&self, peer: PeerId, amount: u32) {
        self.penalties.lock().push((peer, amount));
    }

    fn broadcast_inventory(&self, inventory: Inventory, except: Option<PeerId>) {
        self.broadcasts.lock().push((inventory, except));
    }

    fn send_to_peer(&self, peer: PeerId, message: SporkNetworkMessage) {
        self.sent.lock().push((peer, message));
    }
}

/// Calls observed by [`MockChainView`], in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainCall {
    Reconsider(BlockHash),
    DisconnectAndReprocess(i64),
    ActivateBestChain,
}

/// In-memory chain view.
#[derive(Debug)]
pub struct MockChainView {
    pub tip: Mutex<Option<ChainTip>>,
    pub rejected: Mutex<Vec<(BlockHash, i64)>>,
    pub indexed: Mutex<HashMap<BlockHash, BlockIndexEntry>>,
    pub failing: Mutex<HashSet<BlockHash>>,
    pub reprocess_state: Mutex<ValidationState>,
    pub calls: Mutex<Vec<ChainCall>>,
    /// Whether the chain lock was held during each entry in `calls`.
    pub locked_during_call: Mutex<Vec<bool>>,
    lock: Mutex<()>,
}

impl Default for MockChainView {
    fn default() -> Self {
        Self {
            tip: Mutex::new(None),
            rejected: Mutex::new(Vec::new()),
            indexed: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            reprocess_state: Mutex::new(ValidationState::Valid),
            calls: Mutex::new(Vec::new()),
            locked_during_call: Mutex::new(Vec::new()),
            lock: Mutex::new(()),
        }
    }
}

impl MockChainView {
    /// Chain with no tip yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with a tip at `height`.
    pub fn with_tip(height: u64) -> Self {
        let view = Self::default();
        view.set_tip(Some(ChainTip {
            hash: [0xCC; 32],
            height,
        }));
        view
    }

    pub fn set_tip(&self, tip: Option<ChainTip>) {
        *self.tip.lock() = tip;
    }

    /// Record a rejected block; `indexed` controls whether it is still in the index.
    pub fn add_rejected(&self, hash: BlockHash, rejected_at: i64, indexed: bool) {
        self.rejected.lock().push((hash, rejected_at));
        if indexed {
            self.indexed.lock().insert(
                hash,
                BlockIndexEntry {
                    hash,
                    height: u64::from(hash[0]),
                },
            );
        }
    }

    pub fn fail_reconsider(&self, hash: BlockHash) {
        self.failing.lock().insert(hash);
    }

    pub fn set_reprocess_state(&self, state: ValidationState) {
        *self.reprocess_state.lock() = state;
    }

    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().clone()
    }

    pub fn reconsidered(&self) -> Vec<BlockHash> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ChainCall::Reconsider(hash) => Some(*hash),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ChainCall) {
        self.locked_during_call.lock().push(self.lock.is_locked());
        self.calls.lock().push(call);
    }
}

impl ChainView for MockChainView {
    type LockGuard<'a> = parking_lot::MutexGuard<'a, ()>;

    fn current_tip(&self) -> Option<ChainTip> {
        *self.tip.lock()
    }

    fn rejected_block_timestamps(&self) -> Vec<(BlockHash, i64)> {
        self.rejected.lock().clone()
    }

    fn lookup_block_by_hash(&self, hash: &BlockHash) -> Option<BlockIndexEntry> {
        self.indexed.lock().get(hash).copied()
    }

    fn chain_lock(&self) -> Self::LockGuard<'_> {
        self.lock.lock()
    }

    fn reconsider_block(&self, block: &BlockIndexEntry) -> Result<(), ChainViewError> {
        self.record(ChainCall::Reconsider(block.hash));
        if self.failing.lock().contains(&block.hash) {
            return Err(ChainViewError::ReconsiderFailed("still invalid".to_string()));
        }
        Ok(())
    }

    fn disconnect_and_reprocess(&self, n_blocks: i64) -> ValidationState {
        self.record(ChainCall::DisconnectAndReprocess(n_blocks));
        self.reprocess_state.lock().clone()
    }

    fn activate_best_chain(&self) -> Result<(), ChainViewError> {
        self.record(ChainCall::ActivateBestChain);
        Ok(())
    }
}

/// Manager type wired with the mocks above.
pub type TestSporkManager =
    SporkManager<Secp256k1SignatureScheme, RecordingPeerNetwork, MockChainView, FixedTimeSource>;

/// A regtest manager plus handles to its mocks.
pub struct TestHarness {
    pub manager: TestSporkManager,
    pub network: Arc<RecordingPeerNetwork>,
    pub chain: Arc<MockChainView>,
    pub time: Arc<FixedTimeSource>,
}

impl TestHarness {
    /// Regtest manager with a chain tip at height 100 and the clock at [`TEST_NOW`].
    pub fn new() -> Self {
        Self::with_config(SporkConfig::for_network(Network::Regtest))
    }

    pub fn with_config(config: SporkConfig) -> Self {
        let network = Arc::new(RecordingPeerNetwork::new());
        let chain = Arc::new(MockChainView::with_tip(100));
        let time = Arc::new(FixedTimeSource::new(TEST_NOW));
        let deps = SporkDependencies {
            scheme: Arc::new(Secp256k1SignatureScheme::new()),
            network: Arc::clone(&network),
            chain: Arc::clone(&chain),
            time_source: Arc::clone(&time),
        };
        let manager = match SporkManager::new(deps, config) {
            Ok(manager) => manager,
            Err(e) => panic!("test harness config rejected: {e}"),
        };
        Self {
            manager,
            network,
            chain,
            time,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` under a subscriber that counts WARN events.
#[cfg(test)]
pub(crate) fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
    use std::sync::atomic::AtomicUsize;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    let counter = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&counter)));
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, counter.load(Ordering::SeqCst))
}

/// Message signed with [`REGTEST_OPERATOR_KEY`].
pub fn signed_message(spork_id: impl Into<i32>, value: i64, signed_time: i64) -> SporkMessage {
    let mut msg = SporkMessage::new(spork_id, value, signed_time);
    let key = OperatorKey::new(REGTEST_OPERATOR_KEY);
    match Secp256k1SignatureScheme::new().sign(msg.canonical_payload().as_bytes(), &key) {
        Ok(signature) => msg.signature = signature,
        Err(e) => panic!("regtest key failed to sign: {e}"),
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_time_source_controls() {
        let time = FixedTimeSource::new(10);
        time.advance(5);
        assert_eq!(time.now(), 15);
        time.set(3);
        assert_eq!(time.now(), 3);
    }

    #[test]
    fn test_regtest_key_matches_network_constant() {
        let scheme = Secp256k1SignatureScheme::new();
        let public_key = scheme
            .derive_public_key(&OperatorKey::new(REGTEST_OPERATOR_KEY))
            .unwrap();
        assert_eq!(hex::encode(public_key), Network::Regtest.spork_public_key_hex());
    }

    #[test]
    fn test_mock_chain_records_lock_state() {
        let chain = MockChainView::with_tip(1);
        {
            let _guard = chain.chain_lock();
            chain.disconnect_and_reprocess(3);
        }
        chain.activate_best_chain().unwrap();
        assert_eq!(*chain.locked_during_call.lock(), vec![true, false]);
    }
}
