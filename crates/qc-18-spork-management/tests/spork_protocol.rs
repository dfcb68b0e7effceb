//! End-to-end spork propagation between in-process nodes.

use qc_18_spork_management::test_utils::{
    signed_message, TestHarness, REGTEST_OPERATOR_KEY, TEST_NOW,
};
use qc_18_spork_management::{
    PeerId, ProcessOutcome, SporkApi, SporkError, SporkId, SporkMessageHandler,
    SporkNetworkMessage, SporkOperatorApi,
};
use rayon::prelude::*;

/// Deliver every message `from` has queued for `to_peer` into `to`.
fn deliver(from: &TestHarness, to_peer: PeerId, to: &TestHarness, from_peer: PeerId) -> usize {
    let queued = from.network.sent_to(to_peer);
    let count = queued.len();
    for message in queued {
        let payload = message.encode().unwrap();
        let decoded = SporkNetworkMessage::decode(message.command(), &payload).unwrap();
        to.manager.handle_network_message(from_peer, decoded).unwrap();
    }
    count
}

#[test]
fn test_late_joiner_syncs_through_getsporks() {
    let issuer = TestHarness::new();
    assert!(issuer.manager.set_signing_key(REGTEST_OPERATOR_KEY));
    assert!(issuer.manager.issue_update(SporkId::MaxValue, 2_500));
    issuer.time.advance(1);
    assert!(issuer.manager.issue_update(SporkId::FreezeChain, TEST_NOW - 60));

    let joiner = TestHarness::new();
    let issuer_id = PeerId(1);
    let joiner_id = PeerId(2);

    joiner.manager.on_peer_connected(issuer_id);
    assert_eq!(deliver(&joiner, issuer_id, &issuer, joiner_id), 1);
    assert_eq!(deliver(&issuer, joiner_id, &joiner, issuer_id), 2);

    assert_eq!(joiner.manager.get_value(SporkId::MaxValue.as_i32()), 2_500);
    assert!(joiner.manager.is_active(SporkId::FreezeChain.as_i32()));
    assert_eq!(joiner.manager.show(), issuer.manager.show());
}

#[test]
fn test_concurrent_delivery_converges_to_latest() {
    let node = TestHarness::new();
    let messages: Vec<_> = (0..64)
        .map(|i| signed_message(SporkId::CoinMaturity, 100 + i, TEST_NOW + i))
        .collect();
    let latest = messages.last().cloned().unwrap();

    messages
        .par_iter()
        .enumerate()
        .for_each(|(peer, msg)| {
            let outcome = node.manager.handle_spork(PeerId(peer as u64), msg.clone());
            assert!(matches!(
                outcome,
                Ok(ProcessOutcome::Accepted) | Ok(ProcessOutcome::Stale)
            ));
        });

    let registry = node.manager.registry();
    assert_eq!(registry.active(SporkId::CoinMaturity.as_i32()), Some(latest));
    assert_eq!(registry.active_len(), 1);
    assert_eq!(registry.history_len(), node.network.broadcast_count());
    assert_eq!(node.network.penalty_count(), 0);
}

#[test]
fn test_concurrent_forgeries_each_penalized_once() {
    let node = TestHarness::new();

    (0..32u64).into_par_iter().for_each(|peer| {
        let mut forged = signed_message(SporkId::SwiftTx, 0, TEST_NOW + peer as i64);
        forged.value = 1;
        assert_eq!(
            node.manager.handle_spork(PeerId(peer), forged),
            Err(SporkError::InvalidSignature)
        );
    });

    let mut penalized: Vec<_> = node.network.penalties.lock().clone();
    penalized.sort();
    let expected: Vec<_> = (0..32u64).map(|p| (PeerId(p), 100)).collect();
    assert_eq!(penalized, expected);
    assert_eq!(node.manager.registry().history_len(), 0);
}

#[test]
fn test_reconsider_spork_runs_on_receiving_node() {
    let node = TestHarness::new();
    node.chain.add_rejected([9; 32], TEST_NOW - 100, true);

    let outcome = node
        .manager
        .handle_spork(PeerId(1), signed_message(SporkId::ReconsiderBlocks, 1, TEST_NOW))
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Accepted);
    assert_eq!(node.chain.reconsidered(), vec![[9; 32]]);
}
