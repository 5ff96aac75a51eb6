use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must offer at least two answers, got {count}")]
    TooFewAnswers { count: usize },

    #[error("answer {index} is empty")]
    EmptyAnswer { index: usize },

    #[error("correct answer index {index} is out of range for {count} answers")]
    CorrectIndexOutOfRange { index: usize, count: usize },
}

/// Position of an answer within a question's answer list.
pub type AnswerIndex = usize;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly one correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionFields")]
pub struct Question {
    prompt: String,
    answers: Vec<String>,
    correct_answer_index: AnswerIndex,
}

#[derive(Deserialize)]
struct QuestionFields {
    prompt: String,
    answers: Vec<String>,
    correct_answer_index: AnswerIndex,
}

impl TryFrom<QuestionFields> for Question {
    type Error = QuestionError;

    fn try_from(fields: QuestionFields) -> Result<Self, Self::Error> {
        Self::new(fields.prompt, fields.answers, fields.correct_answer_index)
    }
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or any answer is blank, fewer than
    /// two answers are given, or the correct index does not point at an answer.
    pub fn new(
        prompt: impl Into<String>,
        answers: Vec<String>,
        correct_answer_index: AnswerIndex,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if answers.len() < 2 {
            return Err(QuestionError::TooFewAnswers {
                count: answers.len(),
            });
        }
        if let Some(index) = answers.iter().position(|a| a.trim().is_empty()) {
            return Err(QuestionError::EmptyAnswer { index });
        }
        if correct_answer_index >= answers.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_answer_index,
                count: answers.len(),
            });
        }

        Ok(Self {
            prompt,
            answers,
            correct_answer_index,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    #[must_use]
    pub fn correct_answer_index(&self) -> AnswerIndex {
        self.correct_answer_index
    }

    /// Returns true when `answer` is the correct choice.
    ///
    /// Out-of-range indices are simply wrong answers.
    #[must_use]
    pub fn is_correct(&self, answer: AnswerIndex) -> bool {
        answer == self.correct_answer_index
    }
}
