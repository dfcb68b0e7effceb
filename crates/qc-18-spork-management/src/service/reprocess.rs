//! # Chain Reprocessor
//!
//! Best-effort recovery after a since-fixed consensus bug rejected valid
//! blocks. Triggered by the reconsider-blocks spork.
//!
//! 1. Window `W = n_blocks * seconds_per_block`, ending now
//! 2. Reconsider every still-indexed block rejected inside `W`, one chain
//!    lock acquisition per block; failures are logged and skipped
//! 3. Under one more acquisition: disconnect-and-reprocess, then activate
//!    the best chain if the reprocess reported a valid state
//!
//! There is no rollback on partial failure.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::{is_within_window, reconsideration_window, BlockHash, ValidationState};
use crate::ports::outbound::{ChainView, TimeSource};

/// What a reprocess run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReprocessReport {
    /// Blocks whose invalid flag was cleared
    pub reconsidered: Vec<BlockHash>,
    /// Blocks the chain layer refused to reconsider
    pub failed: Vec<BlockHash>,
    /// Result of disconnect-and-reprocess
    pub validation: ValidationState,
    pub best_chain_activated: bool,
}

/// Reconsiders recently rejected blocks through a [`ChainView`].
pub struct ChainReprocessor<C: ChainView, T: TimeSource> {
    chain: Arc<C>,
    time_source: Arc<T>,
    seconds_per_block: i64,
}

impl<C: ChainView, T: TimeSource> ChainReprocessor<C, T> {
    pub fn new(chain: Arc<C>, time_source: Arc<T>, seconds_per_block: i64) -> Self {
        Self {
            chain,
            time_source,
            seconds_per_block,
        }
    }

    /// Run the full sweep for `n_blocks`.
    #[instrument(skip(self))]
    pub fn reprocess(&self, n_blocks: i64) -> ReprocessReport {
        let now = self.time_source.now();
        let window = reconsideration_window(n_blocks, self.seconds_per_block);
        info!(window, "Reconsidering recently rejected blocks");

        let mut reconsidered = Vec::new();
        let mut failed = Vec::new();

        for (hash, rejected_at) in self.chain.rejected_block_timestamps() {
            if !is_within_window(rejected_at, now, window) {
                continue;
            }
            let Some(entry) = self.chain.lookup_block_by_hash(&hash) else {
                debug!(hash = %hex::encode(hash), "Rejected block no longer indexed");
                continue;
            };

            let result = {
                let _guard = self.chain.chain_lock();
                self.chain.reconsider_block(&entry)
            };
            match result {
                Ok(()) => reconsidered.push(hash),
                Err(e) => {
                    warn!(
                        hash = %hex::encode(hash),
                        height = entry.height,
                        error = %e,
                        "Failed to reconsider block"
                    );
                    failed.push(hash);
                }
            }
        }

        let _guard = self.chain.chain_lock();
        let validation = self.chain.disconnect_and_reprocess(n_blocks);
        let best_chain_activated = match &validation {
            ValidationState::Valid => match self.chain.activate_best_chain() {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Failed to activate best chain");
                    false
                }
            },
            ValidationState::Invalid { reason } => {
                warn!(reason = %reason, "Reprocessed chain is invalid");
                false
            }
        };

        info!(
            reconsidered = reconsidered.len(),
            failed = failed.len(),
            best_chain_activated,
            "Reprocess finished"
        );

        ReprocessReport {
            reconsidered,
            failed,
            validation,
            best_chain_activated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockIndexEntry, ChainTip, ChainViewError};
    use crate::test_utils::{ChainCall, FixedTimeSource, MockChainView, TEST_NOW};
    use parking_lot::{Mutex, RwLock, RwLockWriteGuard};

    fn reprocessor(chain: &Arc<MockChainView>) -> ChainReprocessor<MockChainView, FixedTimeSource> {
        ChainReprocessor::new(
            Arc::clone(chain),
            Arc::new(FixedTimeSource::new(TEST_NOW)),
            300,
        )
    }

    #[test]
    fn test_window_edge() {
        let chain = Arc::new(MockChainView::with_tip(10));
        chain.add_rejected([1; 32], TEST_NOW - 3_000, true);
        chain.add_rejected([2; 32], TEST_NOW - 2_999, true);

        let report = reprocessor(&chain).reprocess(10);
        assert_eq!(report.reconsidered, vec![[2; 32]]);
        assert_eq!(chain.reconsidered(), vec![[2; 32]]);
    }

    #[test]
    fn test_unindexed_blocks_are_skipped() {
        let chain = Arc::new(MockChainView::with_tip(10));
        chain.add_rejected([3; 32], TEST_NOW - 10, false);

        let report = reprocessor(&chain).reprocess(1);
        assert!(report.reconsidered.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(
            chain.calls(),
            vec![ChainCall::DisconnectAndReprocess(1), ChainCall::ActivateBestChain]
        );
    }

    #[test]
    fn test_failure_does_not_stop_sweep() {
        let chain = Arc::new(MockChainView::with_tip(10));
        chain.add_rejected([4; 32], TEST_NOW - 10, true);
        chain.add_rejected([5; 32], TEST_NOW - 20, true);
        chain.fail_reconsider([4; 32]);

        let report = reprocessor(&chain).reprocess(1);
        assert_eq!(report.failed, vec![[4; 32]]);
        assert_eq!(report.reconsidered, vec![[5; 32]]);
        assert!(report.best_chain_activated);
    }

    #[test]
    fn test_invalid_reprocess_skips_activation() {
        let chain = Arc::new(MockChainView::with_tip(10));
        chain.set_reprocess_state(ValidationState::Invalid {
            reason: "bad-cb-amount".into(),
        });

        let report = reprocessor(&chain).reprocess(2);
        assert!(!report.best_chain_activated);
        assert_eq!(chain.calls(), vec![ChainCall::DisconnectAndReprocess(2)]);
    }

    #[test]
    fn test_chain_mutations_hold_lock() {
        let chain = Arc::new(MockChainView::with_tip(10));
        chain.add_rejected([6; 32], TEST_NOW - 1, true);

        reprocessor(&chain).reprocess(1);
        assert_eq!(chain.calls().len(), 3);
        assert!(chain.locked_during_call.lock().iter().all(|locked| *locked));
    }

    /// Chain view whose global lock is an `RwLock` taken for writing.
    #[derive(Default)]
    struct RwLockedChain {
        inner: MockChainView,
        lock: RwLock<()>,
        held: Mutex<Vec<bool>>,
    }

    impl RwLockedChain {
        fn note_lock(&self) {
            self.held.lock().push(self.lock.is_locked_exclusive());
        }
    }

    impl ChainView for RwLockedChain {
        type LockGuard<'a> = RwLockWriteGuard<'a, ()>;

        fn current_tip(&self) -> Option<ChainTip> {
            self.inner.current_tip()
        }

        fn rejected_block_timestamps(&self) -> Vec<(BlockHash, i64)> {
            self.inner.rejected_block_timestamps()
        }

        fn lookup_block_by_hash(&self, hash: &BlockHash) -> Option<BlockIndexEntry> {
            self.inner.lookup_block_by_hash(hash)
        }

        fn chain_lock(&self) -> Self::LockGuard<'_> {
            self.lock.write()
        }

        fn reconsider_block(&self, block: &BlockIndexEntry) -> Result<(), ChainViewError> {
            self.note_lock();
            self.inner.reconsider_block(block)
        }

        fn disconnect_and_reprocess(&self, n_blocks: i64) -> ValidationState {
            self.note_lock();
            self.inner.disconnect_and_reprocess(n_blocks)
        }

        fn activate_best_chain(&self) -> Result<(), ChainViewError> {
            self.note_lock();
            self.inner.activate_best_chain()
        }
    }

    #[test]
    fn test_reprocess_with_rwlock_chain() {
        let chain = Arc::new(RwLockedChain::default());
        chain.inner.add_rejected([7; 32], TEST_NOW - 5, true);
        chain.inner.add_rejected([8; 32], TEST_NOW - 6, true);

        let reprocessor =
            ChainReprocessor::new(Arc::clone(&chain), Arc::new(FixedTimeSource::new(TEST_NOW)), 300);
        let report = reprocessor.reprocess(1);

        assert_eq!(report.reconsidered, vec![[7; 32], [8; 32]]);
        assert!(report.best_chain_activated);
        assert_eq!(*chain.held.lock(), vec![true; 4]);
        assert!(!chain.lock.is_locked());
    }
}
