//! Pure domain rules: update ordering, activation checks, effect lookup and
//! the reconsideration window.

use super::catalog::SporkId;
use super::entities::SporkMessage;
use super::value_objects::UNKNOWN_SPORK_VALUE;

/// Last-signed-time-wins: `candidate` replaces `current` only if it was
/// signed strictly later.
pub fn is_newer_than(candidate: &SporkMessage, current: &SporkMessage) -> bool {
    candidate.signed_time > current.signed_time
}

/// Value to compare against the clock. The unknown-spork marker becomes
/// `far_future`, i.e. practically never active.
pub fn effective_activation_value(value: i64, far_future: i64) -> i64 {
    if value == UNKNOWN_SPORK_VALUE {
        far_future
    } else {
        value
    }
}

/// Activation check on an already resolved value.
pub fn is_activation_reached(value: i64, now: i64, far_future: i64) -> bool {
    effective_activation_value(value, far_future) <= now
}

/// Executable effect bound to a spork id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SporkEffect {
    /// Reconsider recently rejected blocks; carries the block count.
    ReconsiderBlocks { n_blocks: i64 },
}

/// Effect to run after `spork_id` takes `value`, if any.
pub fn effect_for(spork_id: i32, value: i64) -> Option<SporkEffect> {
    match SporkId::from_i32(spork_id) {
        Some(SporkId::ReconsiderBlocks) if value > 0 => {
            Some(SporkEffect::ReconsiderBlocks { n_blocks: value })
        }
        _ => None,
    }
}

/// Seconds covered when reconsidering `n_blocks`.
///
/// `seconds_per_block` is twice the target block interval.
pub fn reconsideration_window(n_blocks: i64, seconds_per_block: i64) -> i64 {
    n_blocks.saturating_mul(seconds_per_block)
}

/// Whether a block rejected at `rejected_at` falls inside the window ending
/// at `now`. The lower bound is exclusive.
pub fn is_within_window(rejected_at: i64, now: i64, window: i64) -> bool {
    rejected_at > now.saturating_sub(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::SPORK_OFF;

    #[test]
    fn test_newer_requires_strictly_greater_time() {
        let a = SporkMessage::new(SporkId::SwiftTx, 1, 100);
        let b = SporkMessage::new(SporkId::SwiftTx, 2, 100);
        let c = SporkMessage::new(SporkId::SwiftTx, 3, 101);
        assert!(!is_newer_than(&b, &a));
        assert!(is_newer_than(&c, &a));
        assert!(!is_newer_than(&a, &c));
    }

    #[test]
    fn test_unknown_marker_maps_to_far_future() {
        assert_eq!(effective_activation_value(-1, SPORK_OFF), SPORK_OFF);
        assert_eq!(effective_activation_value(-2, SPORK_OFF), -2);
        assert_eq!(effective_activation_value(0, SPORK_OFF), 0);
    }

    #[test]
    fn test_activation_boundary_is_inclusive() {
        assert!(is_activation_reached(1000, 1000, SPORK_OFF));
        assert!(!is_activation_reached(1001, 1000, SPORK_OFF));
        assert!(!is_activation_reached(-1, 1000, SPORK_OFF));
    }

    #[test]
    fn test_effect_only_for_positive_reconsider() {
        let id = SporkId::ReconsiderBlocks.as_i32();
        assert_eq!(
            effect_for(id, 10),
            Some(SporkEffect::ReconsiderBlocks { n_blocks: 10 })
        );
        assert_eq!(effect_for(id, 0), None);
        assert_eq!(effect_for(id, -3), None);
        assert_eq!(effect_for(SporkId::FreezeChain.as_i32(), 10), None);
        assert_eq!(effect_for(123, 10), None);
    }

    #[test]
    fn test_window_bounds() {
        let window = reconsideration_window(10, 300);
        assert_eq!(window, 3000);
        assert!(is_within_window(7001, 10_000, window));
        assert!(!is_within_window(7000, 10_000, window));
        assert_eq!(reconsideration_window(i64::MAX, 300), i64::MAX);
    }
}
