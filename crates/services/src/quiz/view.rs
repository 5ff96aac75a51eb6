use std::time::Duration;

use serde::Serialize;

use campaign_core::model::Question;

/// Labels shown on the feedback panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackText {
    pub correct_message: String,
    pub next_label: String,
    pub wrong_message: String,
    pub retry_label: String,
}

impl Default for FeedbackText {
    fn default() -> Self {
        Self {
            correct_message: "Correct! You can continue".into(),
            next_label: "Next".into(),
            wrong_message: "Wrong answer!".into(),
            retry_label: "Try again".into(),
        }
    }
}

/// Presentation settings for quiz sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizConfig {
    pub feedback: FeedbackText,
    /// Continue automatically this long after feedback is shown.
    pub auto_continue: Option<Duration>,
}

impl QuizConfig {
    #[must_use]
    pub fn with_auto_continue(mut self, delay: Option<Duration>) -> Self {
        self.auto_continue = delay;
        self
    }
}

/// What the presentation layer should render for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuizView {
    Question {
        prompt: String,
        answers: Vec<String>,
        /// 1-based position within the unit.
        number: usize,
        total: usize,
    },
    Feedback {
        correct: bool,
        message: String,
        continue_label: String,
    },
    Completed {
        unit_name: String,
    },
}

impl QuizView {
    pub(crate) fn question(question: &Question, cursor: usize, total: usize) -> Self {
        Self::Question {
            prompt: question.prompt().to_owned(),
            answers: question.answers().to_vec(),
            number: cursor + 1,
            total,
        }
    }

    pub(crate) fn feedback(correct: bool, text: &FeedbackText) -> Self {
        let (message, label) = if correct {
            (&text.correct_message, &text.next_label)
        } else {
            (&text.wrong_message, &text.retry_label)
        };
        Self::Feedback {
            correct,
            message: message.clone(),
            continue_label: label.clone(),
        }
    }
}
