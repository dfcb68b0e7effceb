//! # Spork Registry
//!
//! Every spork ever accepted (history) plus the current value per id
//! (active). One lock guards both maps so an accepted update lands in both
//! or neither.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::entities::{SporkHash, SporkMessage};
use super::services::is_newer_than;

#[derive(Debug, Default)]
struct RegistryState {
    /// identity -> message, never pruned
    history: HashMap<SporkHash, SporkMessage>,
    /// spork id -> message currently in effect
    active: BTreeMap<i32, SporkMessage>,
}

/// Result of an attempted registry insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Message became the active entry for its id.
    Inserted,
    /// An active entry with the same or a later signing time already exists.
    Stale,
}

/// Lock-guarded history and active maps.
#[derive(Debug, Default)]
pub struct SporkRegistry {
    state: RwLock<RegistryState>,
}

impl SporkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `msg` if it is strictly newer than the active entry for its id.
    ///
    /// The freshness check and both writes happen under a single write lock.
    pub fn insert_if_newer(&self, msg: SporkMessage) -> InsertOutcome {
        let mut state = self.state.write();
        if let Some(current) = state.active.get(&msg.spork_id) {
            if !is_newer_than(&msg, current) {
                return InsertOutcome::Stale;
            }
        }
        state.history.insert(msg.identity(), msg.clone());
        state.active.insert(msg.spork_id, msg);
        InsertOutcome::Inserted
    }

    /// Whether `msg` would currently be accepted as an update.
    pub fn is_fresh(&self, msg: &SporkMessage) -> bool {
        self.state
            .read()
            .active
            .get(&msg.spork_id)
            .map_or(true, |current| is_newer_than(msg, current))
    }

    /// Active message for a raw id.
    pub fn active(&self, spork_id: i32) -> Option<SporkMessage> {
        self.state.read().active.get(&spork_id).cloned()
    }

    /// Active value for a raw id.
    pub fn active_value(&self, spork_id: i32) -> Option<i64> {
        self.state.read().active.get(&spork_id).map(|m| m.value)
    }

    /// All active messages, ordered by id.
    pub fn active_messages(&self) -> Vec<SporkMessage> {
        self.state.read().active.values().cloned().collect()
    }

    /// Message from history by identity.
    pub fn get_by_identity(&self, hash: &SporkHash) -> Option<SporkMessage> {
        self.state.read().history.get(hash).cloned()
    }

    /// Whether a message with this identity was ever accepted.
    pub fn contains(&self, hash: &SporkHash) -> bool {
        self.state.read().history.contains_key(hash)
    }

    pub fn history_len(&self) -> usize {
        self.state.read().history.len()
    }

    pub fn active_len(&self) -> usize {
        self.state.read().active.len()
    }

    /// Copy of both maps, for equality checks in tests and diagnostics.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read();
        let mut history: Vec<_> = state.history.iter().map(|(h, m)| (*h, m.clone())).collect();
        history.sort_by(|a, b| a.0.cmp(&b.0));
        RegistrySnapshot {
            history,
            active: state.active.iter().map(|(id, m)| (*id, m.clone())).collect(),
        }
    }
}

/// Ordered copy of the registry contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub history: Vec<(SporkHash, SporkMessage)>,
    pub active: Vec<(i32, SporkMessage)>,
}
