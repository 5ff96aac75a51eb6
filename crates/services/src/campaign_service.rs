use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use campaign_core::model::{CampaignRules, Catalog};
use campaign_core::{CampaignState, CorrectAnswerOutcome, ScoreChange};
use storage::records::{clear_unit_keys, load_campaign, stage_campaign};
use storage::repository::{ProgressStore, StorageError};

use crate::error::CampaignError;
use crate::events::{CampaignEvent, Cue, EventHub};

/// Per-unit row of the overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub index: usize,
    pub name: String,
    pub unlocked: bool,
    pub completed: bool,
    pub next_question_index: usize,
    pub question_count: usize,
}

/// Overview data: score, completion and per-unit flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub score: u32,
    pub correct_answers_count: u32,
    pub current_unit_index: usize,
    pub completed: usize,
    pub total: usize,
    pub units: Vec<UnitSummary>,
}

/// Single owner of the campaign state.
///
/// Every mutator runs under one lock and writes through to the store before
/// releasing it. Persistence failures are logged and published, never
/// returned: play continues on the in-memory state.
pub struct CampaignService {
    catalog: Arc<Catalog>,
    store: Arc<dyn ProgressStore>,
    events: EventHub,
    state: Mutex<CampaignState>,
    degraded: AtomicBool,
}

impl CampaignService {
    /// Load progress for `catalog` from `store`, defaulting missing fields.
    ///
    /// # Errors
    ///
    /// Returns `CampaignError::Storage` if the store cannot be read.
    pub async fn load(
        catalog: Arc<Catalog>,
        rules: CampaignRules,
        store: Arc<dyn ProgressStore>,
        events: EventHub,
    ) -> Result<Self, CampaignError> {
        let state = load_campaign(store.as_ref(), catalog.len(), rules).await?;
        tracing::debug!(
            score = state.score(),
            correct = state.correct_answers_count(),
            current = state.current_unit_index(),
            "campaign loaded"
        );
        Ok(Self {
            catalog,
            store,
            events,
            state: Mutex::new(state),
            degraded: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// True once any write-through has failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    pub async fn snapshot(&self) -> CampaignState {
        self.state.lock().await.clone()
    }

    pub async fn score(&self) -> u32 {
        self.state.lock().await.score()
    }

    pub async fn is_unlocked(&self, index: usize) -> bool {
        self.state.lock().await.is_unlocked(index)
    }

    pub async fn is_completed(&self, index: usize) -> bool {
        self.state.lock().await.is_completed(index)
    }

    pub async fn next_question_index(&self, index: usize) -> Option<usize> {
        self.state.lock().await.next_question_index(index)
    }

    pub async fn progress_summary(&self) -> ProgressSummary {
        let state = self.state.lock().await;
        let units = self
            .catalog
            .units()
            .iter()
            .zip(state.units())
            .enumerate()
            .map(|(index, (def, progress))| UnitSummary {
                index,
                name: def.name.clone(),
                unlocked: progress.unlocked,
                completed: progress.completed,
                next_question_index: progress.next_question_index,
                question_count: def.question_count(),
            })
            .collect();
        ProgressSummary {
            score: state.score(),
            correct_answers_count: state.correct_answers_count(),
            current_unit_index: state.current_unit_index(),
            completed: state.completed_count(),
            total: state.unit_count(),
            units,
        }
    }

    //
    // ─── MUTATORS ──────────────────────────────────────────────────────────────
    //

    /// `score = max(0, score + delta)`, written through.
    pub async fn add_score(&self, delta: i64) -> ScoreChange {
        let (change, failure) = {
            let mut state = self.state.lock().await;
            let change = state.add_score(delta);
            tracing::debug!(delta, score = change.current, "score adjusted");
            (change, self.write_through(&state).await)
        };
        self.publish_score(change);
        self.publish_failure(failure);
        change
    }

    /// Award a correct answer, unlocking the next unit when the counter is due.
    pub async fn record_correct_answer(&self) -> CorrectAnswerOutcome {
        let (outcome, failure) = {
            let mut state = self.state.lock().await;
            let outcome = state.record_correct_answer();
            tracing::debug!(
                score = outcome.score.current,
                correct = outcome.correct_answers_count,
                "correct answer recorded"
            );
            (outcome, self.write_through(&state).await)
        };

        self.publish_score(outcome.score);
        if let Some(unit) = outcome.unlocked {
            tracing::info!(unit, "unit unlocked");
            self.events.publish(&CampaignEvent::Unlocked { unit });
            self.events.cue(Cue::Unlock);
        }
        self.publish_failure(failure);
        outcome
    }

    /// Deduct the wrong-answer penalty, clamped at zero.
    pub async fn record_wrong_answer(&self) -> ScoreChange {
        let (change, failure) = {
            let mut state = self.state.lock().await;
            let change = state.record_wrong_answer();
            tracing::debug!(score = change.current, "wrong answer recorded");
            (change, self.write_through(&state).await)
        };
        self.publish_score(change);
        self.publish_failure(failure);
        change
    }

    /// Make `index` the current unit.
    ///
    /// # Errors
    ///
    /// Returns `CampaignError::UnitNotFound`, `UnitLocked` or `UnitCompleted`
    /// when the unit cannot be entered.
    pub async fn select_unit(&self, index: usize) -> Result<(), CampaignError> {
        let failure = {
            let mut state = self.state.lock().await;
            if index >= state.unit_count() {
                return Err(CampaignError::UnitNotFound { index });
            }
            if !state.is_unlocked(index) {
                return Err(CampaignError::UnitLocked { index });
            }
            if state.is_completed(index) {
                return Err(CampaignError::UnitCompleted { index });
            }
            if state.current_unit_index() == index {
                return Ok(());
            }
            state.set_current_unit(index);
            tracing::debug!(unit = index, "unit selected");
            self.write_through(&state).await
        };
        self.publish_failure(failure);
        Ok(())
    }

    /// Move a unit's cursor forward. Returns true if it moved.
    pub async fn advance_cursor(&self, unit: usize, cursor: usize) -> bool {
        let (moved, failure) = {
            let mut state = self.state.lock().await;
            if !state.advance_cursor(unit, cursor) {
                return false;
            }
            tracing::debug!(unit, cursor, "cursor advanced");
            (true, self.write_through(&state).await)
        };
        self.publish_failure(failure);
        moved
    }

    /// Flag a unit completed with its cursor at the end. Returns true if newly completed.
    pub async fn complete_unit(&self, unit: usize, cursor: usize) -> bool {
        let (completed, failure) = {
            let mut state = self.state.lock().await;
            let moved = state.advance_cursor(unit, cursor);
            let completed = state.mark_completed(unit);
            if !moved && !completed {
                return false;
            }
            (completed, self.write_through(&state).await)
        };
        if completed {
            tracing::info!(unit, "unit completed");
            self.events.publish(&CampaignEvent::UnitCompleted { unit });
        }
        self.publish_failure(failure);
        completed
    }

    /// Delete every per-unit key and restore campaign-start defaults.
    ///
    /// Irreversible. Leaderboard entries are kept.
    ///
    /// A quiz session still open on the old progress is not closed here; use
    /// `AppServices::reset` to tear it down first.
    pub async fn reset(&self) {
        let (change, failure) = {
            let mut state = self.state.lock().await;
            let previous = state.score();
            state.reset();
            let change = ScoreChange {
                previous,
                current: state.score(),
            };
            let failure = match clear_unit_keys(self.store.as_ref()).await {
                Ok(cleared) => {
                    tracing::debug!(cleared, "unit keys cleared");
                    None
                }
                Err(err) => Some(self.note_failure(&err)),
            };
            let flushed = self.write_through(&state).await;
            (change, failure.or(flushed))
        };
        tracing::info!("campaign progress reset");
        self.events.publish(&CampaignEvent::ProgressReset);
        self.publish_score(change);
        self.publish_failure(failure);
    }

    //
    // ─── PERSISTENCE ───────────────────────────────────────────────────────────
    //

    async fn write_through(&self, state: &CampaignState) -> Option<String> {
        let result = async {
            stage_campaign(self.store.as_ref(), state).await?;
            self.store.persist().await
        }
        .await;
        match result {
            Ok(()) => None,
            Err(err) => Some(self.note_failure(&err)),
        }
    }

    fn note_failure(&self, err: &StorageError) -> String {
        tracing::error!(%err, "campaign progress was not persisted");
        self.degraded.store(true, Ordering::Relaxed);
        err.to_string()
    }

    fn publish_score(&self, change: ScoreChange) {
        if change.changed() {
            self.events.publish(&CampaignEvent::ScoreChanged {
                score: change.current,
            });
        }
    }

    fn publish_failure(&self, failure: Option<String>) {
        if let Some(message) = failure {
            self.events
                .publish(&CampaignEvent::PersistenceFailed { message });
        }
    }
}
