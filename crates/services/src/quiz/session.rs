use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use campaign_core::model::{AnswerIndex, Catalog, Question, UnitDef};

use super::view::{FeedbackText, QuizView};

/// Phase of a unit's quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    Question,
    CorrectFeedback,
    WrongFeedback,
    Completed,
}

impl QuizState {
    #[must_use]
    pub fn is_feedback(self) -> bool {
        matches!(self, QuizState::CorrectFeedback | QuizState::WrongFeedback)
    }
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuizState::Question => "question",
            QuizState::CorrectFeedback => "correct_feedback",
            QuizState::WrongFeedback => "wrong_feedback",
            QuizState::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Process-unique identity of a session instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where `proceed` moved the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Back to the same question after a wrong answer.
    Retry { cursor: usize },
    /// On to the next question.
    Next { cursor: usize },
    /// Past the last question.
    Completed { cursor: usize },
}

/// One pass through a unit's questions.
///
/// Pure state machine: it decides transitions, callers record the campaign
/// effects. A closed session accepts no further input.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: SessionId,
    catalog: Arc<Catalog>,
    unit: usize,
    cursor: usize,
    state: QuizState,
    closed: bool,
}

impl QuizSession {
    /// Open a session on `unit`, resuming at `cursor`.
    ///
    /// Returns `None` when the catalog has no such unit. A cursor already at
    /// the end starts the session in `Completed`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, unit: usize, cursor: usize) -> Option<Self> {
        let count = catalog.unit(unit)?.question_count();
        let state = if cursor >= count {
            QuizState::Completed
        } else {
            QuizState::Question
        };
        Some(Self {
            id: SessionId::next(),
            catalog,
            unit,
            cursor: cursor.min(count),
            state,
            closed: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn unit(&self) -> usize {
        self.unit
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.state
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn unit_def(&self) -> Option<&UnitDef> {
        self.catalog.unit(self.unit)
    }

    #[must_use]
    pub fn unit_name(&self) -> &str {
        self.unit_def().map_or("", |u| u.name.as_str())
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.unit_def().map_or(0, UnitDef::question_count)
    }

    /// The question under the cursor, if any remain.
    #[must_use]
    pub fn question(&self) -> Option<&Question> {
        self.unit_def()?.question(self.cursor)
    }

    /// True while an answer can be submitted.
    #[must_use]
    pub fn awaiting_input(&self) -> bool {
        !self.closed && self.state == QuizState::Question
    }

    /// Back navigation is disabled while feedback waits for `Continue`.
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        !self.state.is_feedback()
    }

    /// Evaluate an answer and enter the matching feedback state.
    ///
    /// Returns `None` (and changes nothing) unless the session is awaiting
    /// input, so a second submission during feedback is a no-op.
    pub fn submit(&mut self, answer: AnswerIndex) -> Option<bool> {
        if !self.awaiting_input() {
            return None;
        }
        let correct = self.question()?.is_correct(answer);
        self.state = if correct {
            QuizState::CorrectFeedback
        } else {
            QuizState::WrongFeedback
        };
        Some(correct)
    }

    /// Leave feedback. Returns `None` outside the feedback states.
    pub fn proceed(&mut self) -> Option<Advance> {
        if self.closed {
            return None;
        }
        match self.state {
            QuizState::WrongFeedback => {
                self.state = QuizState::Question;
                Some(Advance::Retry {
                    cursor: self.cursor,
                })
            }
            QuizState::CorrectFeedback => {
                self.cursor += 1;
                if self.cursor >= self.question_count() {
                    self.state = QuizState::Completed;
                    Some(Advance::Completed {
                        cursor: self.cursor,
                    })
                } else {
                    self.state = QuizState::Question;
                    Some(Advance::Next {
                        cursor: self.cursor,
                    })
                }
            }
            QuizState::Question | QuizState::Completed => None,
        }
    }

    /// Stop accepting input. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    #[must_use]
    pub fn view(&self, text: &FeedbackText) -> QuizView {
        match self.state {
            QuizState::Question => match self.question() {
                Some(question) => QuizView::question(question, self.cursor, self.question_count()),
                None => self.completed_view(),
            },
            QuizState::CorrectFeedback => QuizView::feedback(true, text),
            QuizState::WrongFeedback => QuizView::feedback(false, text),
            QuizState::Completed => self.completed_view(),
        }
    }

    fn completed_view(&self) -> QuizView {
        QuizView::Completed {
            unit_name: self.unit_name().to_owned(),
        }
    }
}
