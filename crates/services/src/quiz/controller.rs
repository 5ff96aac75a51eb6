use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use campaign_core::model::AnswerIndex;

use super::deferred::DeferredCall;
use super::session::{QuizSession, QuizState, SessionId};
use super::view::QuizView;
use super::workflow::{ContinueOutcome, QuizLoopService, SubmitOutcome};
use crate::error::QuizError;

#[derive(Default)]
struct ActiveQuiz {
    session: Option<QuizSession>,
    pending: Option<DeferredCall>,
}

impl ActiveQuiz {
    fn cancel_pending(&mut self) {
        if let Some(call) = self.pending.take() {
            call.cancel();
        }
    }

    fn session_mut(&mut self) -> Result<&mut QuizSession, QuizError> {
        self.session.as_mut().ok_or(QuizError::NoActiveSession)
    }
}

/// Identity and phase of the session the player is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSession {
    pub id: SessionId,
    pub unit: usize,
    pub state: QuizState,
    pub cursor: usize,
}

/// Owns the one active quiz session and its scheduled continue.
///
/// All input and deferred callbacks go through a single lock, so at most one
/// operation touches the session at a time. A deferred continue only acts if
/// its session is still the active one.
#[derive(Clone)]
pub struct QuizController {
    workflow: Arc<QuizLoopService>,
    active: Arc<Mutex<ActiveQuiz>>,
}

impl QuizController {
    #[must_use]
    pub fn new(workflow: Arc<QuizLoopService>) -> Self {
        Self {
            workflow,
            active: Arc::new(Mutex::new(ActiveQuiz::default())),
        }
    }

    #[must_use]
    pub fn workflow(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.workflow)
    }

    /// Replace any active session with a new one on `unit`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Campaign` when the unit cannot be entered.
    pub async fn open(&self, unit: usize) -> Result<QuizView, QuizError> {
        let mut active = self.active.lock().await;
        active.cancel_pending();
        if let Some(mut previous) = active.session.take() {
            previous.close();
        }
        let session = self.workflow.start(unit).await?;
        let view = self.workflow.view(&session);
        active.session = Some(session);
        Ok(view)
    }

    /// Submit an answer, scheduling an automatic continue when configured.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` if no unit is open.
    pub async fn submit(&self, answer: AnswerIndex) -> Result<SubmitOutcome, QuizError> {
        let mut active = self.active.lock().await;
        let session = active.session_mut()?;
        let outcome = self.workflow.submit_answer(session, answer).await;
        let id = session.id();

        if outcome.is_accepted()
            && let Some(delay) = self.workflow.config().auto_continue
        {
            active.cancel_pending();
            active.pending = Some(self.schedule_continue(id, delay));
        }
        Ok(outcome)
    }

    /// Leave feedback now, cancelling any scheduled continue.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` if no unit is open.
    pub async fn continue_session(&self) -> Result<ContinueOutcome, QuizError> {
        let mut active = self.active.lock().await;
        active.cancel_pending();
        let session = active.session_mut()?;
        Ok(self.workflow.continue_session(session).await)
    }

    /// Leave the unit and discard the session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` if no unit is open, or
    /// `QuizError::AwaitingContinue` while feedback is displayed.
    pub async fn back(&self) -> Result<(), QuizError> {
        let mut active = self.active.lock().await;
        let session = active.session_mut()?;
        self.workflow.back(session).await?;
        active.cancel_pending();
        active.session = None;
        Ok(())
    }

    /// Drop the session without navigating, e.g. on shutdown.
    pub async fn close(&self) {
        let mut active = self.active.lock().await;
        active.cancel_pending();
        if let Some(mut session) = active.session.take() {
            session.close();
        }
    }

    pub async fn view(&self) -> Option<QuizView> {
        let active = self.active.lock().await;
        active.session.as_ref().map(|s| self.workflow.view(s))
    }

    pub async fn active_session(&self) -> Option<ActiveSession> {
        let active = self.active.lock().await;
        active.session.as_ref().map(|s| ActiveSession {
            id: s.id(),
            unit: s.unit(),
            state: s.state(),
            cursor: s.cursor(),
        })
    }

    pub async fn has_pending_continue(&self) -> bool {
        let active = self.active.lock().await;
        active.pending.as_ref().is_some_and(|call| !call.is_finished())
    }

    fn schedule_continue(&self, id: SessionId, delay: Duration) -> DeferredCall {
        let workflow = Arc::clone(&self.workflow);
        let active = Arc::clone(&self.active);
        DeferredCall::schedule(delay, async move {
            let mut active = active.lock().await;
            if let Some(own) = active.pending.take() {
                own.detach();
            }
            match active.session.as_mut() {
                Some(session) if session.id() == id => {
                    workflow.continue_session(session).await;
                }
                _ => tracing::debug!(session = %id, "stale continue skipped"),
            }
        })
    }
}

impl std::fmt::Debug for QuizController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizController").finish_non_exhaustive()
    }
}
