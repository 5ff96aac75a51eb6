//! Unlock decisions.
//!
//! The counter is global across units: correct answers given anywhere count
//! towards opening the unit after the one currently selected.

use crate::model::CampaignRules;

/// Returns true once the running count of correct answers has reached `threshold`.
///
/// Stays true for every later count; the caller makes the unlock itself
/// idempotent by only acting on a unit that is still locked.
#[must_use]
pub fn should_unlock_next(correct_answers_count: u32, threshold: u32) -> bool {
    correct_answers_count >= threshold
}

/// Chooses which unit, if any, a correct answer opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockPolicy {
    threshold: u32,
}

impl UnlockPolicy {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub fn from_rules(rules: &CampaignRules) -> Self {
        Self::new(rules.answers_needed_to_unlock())
    }

    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns the index of the unit to unlock, or `None`.
    ///
    /// Only `current_unit + 1` is ever eligible, and only while it exists and
    /// is still locked.
    #[must_use]
    pub fn unlock_target(
        &self,
        correct_answers_count: u32,
        current_unit: usize,
        unlocked: impl Fn(usize) -> Option<bool>,
    ) -> Option<usize> {
        if !should_unlock_next(correct_answers_count, self.threshold) {
            return None;
        }
        let next = current_unit.checked_add(1)?;
        match unlocked(next) {
            Some(false) => Some(next),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        assert!(!should_unlock_next(3, 4));
        assert!(should_unlock_next(4, 4));
        assert!(should_unlock_next(40, 4));
    }

    #[test]
    fn only_the_next_locked_unit_is_eligible() {
        let flags = [true, false, false];
        let policy = UnlockPolicy::new(4);
        let lookup = |i: usize| flags.get(i).copied();

        assert_eq!(policy.unlock_target(3, 0, lookup), None);
        assert_eq!(policy.unlock_target(4, 0, lookup), Some(1));
        assert_eq!(policy.unlock_target(9, 1, lookup), Some(2));
        // last unit has no successor
        assert_eq!(policy.unlock_target(9, 2, lookup), None);
    }

    #[test]
    fn already_unlocked_successor_is_a_no_op() {
        let flags = [true, true, false];
        let policy = UnlockPolicy::new(4);
        assert_eq!(policy.unlock_target(12, 0, |i| flags.get(i).copied()), None);
    }

    #[test]
    fn overflowing_index_is_ignored() {
        let policy = UnlockPolicy::new(1);
        assert_eq!(policy.unlock_target(5, usize::MAX, |_| Some(false)), None);
    }
}
