use crate::model::CampaignRules;
use crate::policy::UnlockPolicy;

//
// ─── UNIT PROGRESS ─────────────────────────────────────────────────────────────
//

/// Per-unit progression flags and question cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitProgress {
    pub unlocked: bool,
    pub completed: bool,
    /// Index of the next question to present.
    pub next_question_index: usize,
}

impl UnitProgress {
    #[must_use]
    pub fn unlocked() -> Self {
        Self {
            unlocked: true,
            ..Self::default()
        }
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Score before and after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChange {
    pub previous: u32,
    pub current: u32,
}

impl ScoreChange {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Result of recording a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectAnswerOutcome {
    pub score: ScoreChange,
    pub correct_answers_count: u32,
    /// Unit opened by this answer, if any.
    pub unlocked: Option<usize>,
}

//
// ─── CAMPAIGN STATE ────────────────────────────────────────────────────────────
//

/// In-memory campaign progression.
///
/// Invariants held by every mutator:
/// - unit 0 is always unlocked,
/// - units are never re-locked and cursors never move backwards (except `reset`),
/// - the score never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignState {
    rules: CampaignRules,
    policy: UnlockPolicy,
    score: u32,
    correct_answers_count: u32,
    current_unit_index: usize,
    units: Vec<UnitProgress>,
}

impl CampaignState {
    /// Fresh campaign with `unit_count` units (at least one).
    #[must_use]
    pub fn new(unit_count: usize, rules: CampaignRules) -> Self {
        Self {
            rules,
            policy: UnlockPolicy::from_rules(&rules),
            score: 0,
            correct_answers_count: 0,
            current_unit_index: 0,
            units: default_units(unit_count),
        }
    }

    /// Rehydrate from persisted scalars.
    ///
    /// Negative values clamp to zero, unit 0 is forced open, and the current
    /// unit index is clamped into range.
    #[must_use]
    pub fn from_persisted(
        rules: CampaignRules,
        score: i64,
        correct_answers_count: i64,
        current_unit_index: i64,
        mut units: Vec<UnitProgress>,
    ) -> Self {
        if units.is_empty() {
            units.push(UnitProgress::default());
        }
        units[0].unlocked = true;
        let last = units.len() - 1;
        let current_unit_index = usize::try_from(current_unit_index.max(0))
            .unwrap_or(last)
            .min(last);

        Self {
            rules,
            policy: UnlockPolicy::from_rules(&rules),
            score: clamp_to_u32(score),
            correct_answers_count: clamp_to_u32(correct_answers_count),
            current_unit_index,
            units,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &CampaignRules {
        &self.rules
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn correct_answers_count(&self) -> u32 {
        self.correct_answers_count
    }

    #[must_use]
    pub fn current_unit_index(&self) -> usize {
        self.current_unit_index
    }

    #[must_use]
    pub fn units(&self) -> &[UnitProgress] {
        &self.units
    }

    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// `false` for any index outside the campaign.
    #[must_use]
    pub fn is_unlocked(&self, index: usize) -> bool {
        self.units.get(index).is_some_and(|u| u.unlocked)
    }

    /// `false` for any index outside the campaign.
    #[must_use]
    pub fn is_completed(&self, index: usize) -> bool {
        self.units.get(index).is_some_and(|u| u.completed)
    }

    #[must_use]
    pub fn next_question_index(&self, index: usize) -> Option<usize> {
        self.units.get(index).map(|u| u.next_question_index)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.units.iter().filter(|u| u.completed).count()
    }

    /// `score = max(0, score + delta)`.
    pub fn add_score(&mut self, delta: i64) -> ScoreChange {
        let previous = self.score;
        self.score = clamp_to_u32(i64::from(previous).saturating_add(delta));
        ScoreChange {
            previous,
            current: self.score,
        }
    }

    /// Awards points, bumps the global counter, and unlocks the next unit when due.
    pub fn record_correct_answer(&mut self) -> CorrectAnswerOutcome {
        let score = self.add_score(i64::from(self.rules.points_per_correct()));
        self.correct_answers_count = self.correct_answers_count.saturating_add(1);

        let units = &self.units;
        let unlocked = self
            .policy
            .unlock_target(self.correct_answers_count, self.current_unit_index, |i| {
                units.get(i).map(|u| u.unlocked)
            });
        if let Some(index) = unlocked {
            self.units[index].unlocked = true;
        }

        CorrectAnswerOutcome {
            score,
            correct_answers_count: self.correct_answers_count,
            unlocked,
        }
    }

    /// Deducts the wrong-answer penalty, clamped at zero.
    pub fn record_wrong_answer(&mut self) -> ScoreChange {
        self.add_score(-i64::from(self.rules.points_lost_per_wrong()))
    }

    /// Selects the unit later unlocks are measured from.
    ///
    /// Returns false (and changes nothing) for an out-of-range index.
    pub fn set_current_unit(&mut self, index: usize) -> bool {
        if index >= self.units.len() {
            return false;
        }
        self.current_unit_index = index;
        true
    }

    /// Moves a unit's cursor forward to `cursor`.
    ///
    /// Returns true if the cursor moved. Backward moves and unknown units are ignored.
    pub fn advance_cursor(&mut self, index: usize, cursor: usize) -> bool {
        match self.units.get_mut(index) {
            Some(unit) if cursor > unit.next_question_index => {
                unit.next_question_index = cursor;
                true
            }
            _ => false,
        }
    }

    /// Flags a unit as completed. Returns true if the flag changed.
    pub fn mark_completed(&mut self, index: usize) -> bool {
        match self.units.get_mut(index) {
            Some(unit) if !unit.completed => {
                unit.completed = true;
                true
            }
            _ => false,
        }
    }

    /// Restores campaign-start defaults, keeping the unit count and rules.
    pub fn reset(&mut self) {
        *self = Self::new(self.units.len(), self.rules);
    }
}

fn default_units(unit_count: usize) -> Vec<UnitProgress> {
    let mut units = vec![UnitProgress::default(); unit_count.max(1)];
    units[0].unlocked = true;
    units
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> CampaignState {
        CampaignState::new(5, CampaignRules::default())
    }

    #[test]
    fn first_unit_starts_unlocked() {
        let state = fresh();
        assert!(state.is_unlocked(0));
        assert!((1..5).all(|i| !state.is_unlocked(i)));
        assert!(CampaignState::new(0, CampaignRules::default()).is_unlocked(0));
    }

    #[test]
    fn out_of_range_queries_are_false() {
        let state = fresh();
        assert!(!state.is_unlocked(5));
        assert!(!state.is_completed(usize::MAX));
        assert_eq!(state.next_question_index(9), None);
    }

    #[test]
    fn four_correct_answers_unlock_exactly_the_next_unit() {
        let mut state = fresh();
        let mut unlocks = Vec::new();
        for _ in 0..4 {
            unlocks.push(state.record_correct_answer().unlocked);
        }
        assert_eq!(unlocks, vec![None, None, None, Some(1)]);
        assert_eq!(state.score(), 40);
        assert_eq!(state.correct_answers_count(), 4);
        assert!(state.is_unlocked(1));

        let fifth = state.record_correct_answer();
        assert_eq!(fifth.unlocked, None);
        assert!(!state.is_unlocked(2));
    }

    #[test]
    fn global_counter_opens_next_unit_immediately_after_switching() {
        let mut state = fresh();
        for _ in 0..4 {
            state.record_correct_answer();
        }
        assert!(state.set_current_unit(1));
        let outcome = state.record_correct_answer();
        assert_eq!(outcome.unlocked, Some(2));
    }

    #[test]
    fn score_never_goes_negative() {
        let mut state = fresh();
        let change = state.record_wrong_answer();
        assert_eq!(change, ScoreChange { previous: 0, current: 0 });
        assert!(!change.changed());

        // deterministic mixed sequence
        for step in 0_u32..200 {
            match step % 7 {
                0 | 3 => {
                    state.record_correct_answer();
                }
                1 | 2 | 4 | 5 => {
                    state.record_wrong_answer();
                }
                _ => {
                    state.add_score(-1_000);
                }
            }
            assert!(i64::from(state.score()) >= 0);
        }
        assert_eq!(state.add_score(i64::MIN).current, 0);
    }

    #[test]
    fn cursor_only_moves_forward() {
        let mut state = fresh();
        assert!(state.advance_cursor(0, 2));
        assert!(!state.advance_cursor(0, 1));
        assert!(!state.advance_cursor(0, 2));
        assert!(!state.advance_cursor(7, 3));
        assert_eq!(state.next_question_index(0), Some(2));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut state = fresh();
        for _ in 0..6 {
            state.record_correct_answer();
        }
        state.set_current_unit(1);
        state.advance_cursor(1, 1);
        state.mark_completed(0);

        state.reset();
        assert_eq!(state, fresh());
    }

    #[test]
    fn from_persisted_sanitizes_values() {
        let units = vec![UnitProgress::default(), UnitProgress::unlocked()];
        let state = CampaignState::from_persisted(CampaignRules::default(), -15, -1, 99, units);
        assert_eq!(state.score(), 0);
        assert_eq!(state.correct_answers_count(), 0);
        assert_eq!(state.current_unit_index(), 1);
        assert!(state.is_unlocked(0));
        assert!(state.is_unlocked(1));
    }
}
