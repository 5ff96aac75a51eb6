use std::sync::Arc;

use campaign_core::model::AnswerIndex;

use super::session::{Advance, QuizSession, QuizState};
use super::view::{QuizConfig, QuizView};
use crate::campaign_service::CampaignService;
use crate::error::{CampaignError, QuizError};
use crate::events::{CampaignEvent, Cue, EventHub, Scene};

/// Result of submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The session was not awaiting input.
    Ignored,
    Correct {
        score: u32,
        unlocked: Option<usize>,
    },
    Wrong {
        score: u32,
    },
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_accepted(self) -> bool {
        !matches!(self, SubmitOutcome::Ignored)
    }
}

/// Result of leaving a feedback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueOutcome {
    /// The session was not showing feedback.
    Ignored,
    /// Same question again after a wrong answer.
    Retry { cursor: usize },
    /// Next question; the cursor is already persisted.
    Question { cursor: usize },
    /// Unit finished and flagged completed.
    Completed,
}

/// Drives quiz sessions against the campaign.
///
/// Sessions decide transitions; this service records their campaign effects
/// and notifies listeners.
pub struct QuizLoopService {
    campaign: Arc<CampaignService>,
    config: QuizConfig,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(campaign: Arc<CampaignService>, config: QuizConfig) -> Self {
        Self { campaign, config }
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn campaign(&self) -> Arc<CampaignService> {
        Arc::clone(&self.campaign)
    }

    fn events(&self) -> &EventHub {
        self.campaign.events()
    }

    /// Enter `unit` and open a session at its persisted cursor.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Campaign` when the unit is unknown, locked or
    /// already completed.
    pub async fn start(&self, unit: usize) -> Result<QuizSession, QuizError> {
        self.campaign.select_unit(unit).await?;
        let catalog = self.campaign.catalog();
        let scene = catalog.unit(unit).map(|def| Scene::Unit {
            index: unit,
            name: def.scene.clone(),
        });
        let cursor = self.campaign.next_question_index(unit).await.unwrap_or(0);
        let mut session = QuizSession::new(catalog, unit, cursor)
            .ok_or(CampaignError::UnitNotFound { index: unit })?;

        tracing::info!(unit, cursor, session = %session.id(), "quiz session started");
        if let Some(scene) = scene {
            self.events().load_scene(&scene);
        }
        self.publish_state(&session);

        // cursor persisted at the end without the completion flag
        if session.state() == QuizState::Completed {
            self.campaign.complete_unit(unit, session.cursor()).await;
            session.close();
            self.events().load_scene(&Scene::Overview);
        }
        Ok(session)
    }

    #[must_use]
    pub fn view(&self, session: &QuizSession) -> QuizView {
        session.view(&self.config.feedback)
    }

    /// Evaluate an answer; ignored unless the session awaits input.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        answer: AnswerIndex,
    ) -> SubmitOutcome {
        let Some(correct) = session.submit(answer) else {
            tracing::warn!(session = %session.id(), state = %session.state(), "answer ignored");
            return SubmitOutcome::Ignored;
        };
        self.events().cue(Cue::ButtonClick);

        let outcome = if correct {
            self.events().cue(Cue::CorrectAnswer);
            let recorded = self.campaign.record_correct_answer().await;
            SubmitOutcome::Correct {
                score: recorded.score.current,
                unlocked: recorded.unlocked,
            }
        } else {
            self.events().cue(Cue::WrongAnswer);
            let change = self.campaign.record_wrong_answer().await;
            SubmitOutcome::Wrong {
                score: change.current,
            }
        };
        self.publish_state(session);
        outcome
    }

    /// Leave feedback: retry, advance, or complete the unit.
    pub async fn continue_session(&self, session: &mut QuizSession) -> ContinueOutcome {
        let Some(advance) = session.proceed() else {
            tracing::warn!(session = %session.id(), state = %session.state(), "continue ignored");
            return ContinueOutcome::Ignored;
        };
        self.events().cue(Cue::ButtonClick);

        let outcome = match advance {
            Advance::Retry { cursor } => ContinueOutcome::Retry { cursor },
            Advance::Next { cursor } => {
                self.campaign.advance_cursor(session.unit(), cursor).await;
                ContinueOutcome::Question { cursor }
            }
            Advance::Completed { cursor } => {
                self.campaign.complete_unit(session.unit(), cursor).await;
                session.close();
                ContinueOutcome::Completed
            }
        };
        self.publish_state(session);
        if outcome == ContinueOutcome::Completed {
            self.events().load_scene(&Scene::Overview);
        }
        outcome
    }

    /// Leave the unit for the overview.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AwaitingContinue` while feedback is displayed.
    pub async fn back(&self, session: &mut QuizSession) -> Result<(), QuizError> {
        if !session.can_go_back() {
            return Err(QuizError::AwaitingContinue);
        }
        self.events().cue(Cue::ButtonClick);
        self.campaign
            .advance_cursor(session.unit(), session.cursor())
            .await;
        session.close();
        tracing::info!(unit = session.unit(), session = %session.id(), "left quiz");
        self.events().load_scene(&Scene::Overview);
        Ok(())
    }

    fn publish_state(&self, session: &QuizSession) {
        self.events().publish(&CampaignEvent::QuizStateChanged {
            unit: session.unit(),
            state: session.state(),
            view: self.view(session),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::recording_hub;
    use campaign_core::model::{CampaignRules, Catalog};
    use storage::repository::InMemoryProgressStore;

    async fn workflow(events: EventHub) -> QuizLoopService {
        let catalog = Arc::new(Catalog::thessaloniki().unwrap());
        let campaign = CampaignService::load(
            catalog,
            CampaignRules::default(),
            Arc::new(InMemoryProgressStore::new()),
            events,
        )
        .await
        .unwrap();
        QuizLoopService::new(Arc::new(campaign), QuizConfig::default())
    }

    #[tokio::test]
    async fn start_loads_the_unit_scene() {
        let (hub, recorder) = recording_hub();
        let workflow = workflow(hub).await;
        let session = workflow.start(0).await.unwrap();
        assert_eq!(session.state(), QuizState::Question);
        assert_eq!(
            recorder.scenes(),
            vec![Scene::Unit {
                index: 0,
                name: "WhiteTower".into()
            }]
        );
    }

    #[tokio::test]
    async fn locked_unit_cannot_start() {
        let workflow = workflow(EventHub::new()).await;
        let err = workflow.start(1).await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::Campaign(CampaignError::UnitLocked { index: 1 })
        ));
    }

    #[tokio::test]
    async fn wrong_answer_cues_and_blocks_back() {
        let (hub, recorder) = recording_hub();
        let workflow = workflow(hub).await;
        let mut session = workflow.start(0).await.unwrap();

        assert_eq!(
            workflow.submit_answer(&mut session, 3).await,
            SubmitOutcome::Wrong { score: 0 }
        );
        assert_eq!(recorder.cues(), vec![Cue::ButtonClick, Cue::WrongAnswer]);
        assert!(matches!(
            workflow.back(&mut session).await,
            Err(QuizError::AwaitingContinue)
        ));
        assert_eq!(
            workflow.view(&session),
            QuizView::Feedback {
                correct: false,
                message: "Wrong answer!".into(),
                continue_label: "Try again".into(),
            }
        );
    }

    #[tokio::test]
    async fn back_from_question_returns_to_overview() {
        let (hub, recorder) = recording_hub();
        let workflow = workflow(hub).await;
        let mut session = workflow.start(0).await.unwrap();

        workflow.back(&mut session).await.unwrap();
        assert!(session.is_closed());
        assert_eq!(recorder.scenes().last(), Some(&Scene::Overview));
        assert_eq!(
            workflow.submit_answer(&mut session, 0).await,
            SubmitOutcome::Ignored
        );
    }
}
