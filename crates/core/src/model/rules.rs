use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RulesError {
    #[error("points per correct answer must be > 0")]
    InvalidPointsPerCorrect,

    #[error("points lost per wrong answer must be > 0")]
    InvalidWrongPenalty,

    #[error("answers needed to unlock must be > 0")]
    InvalidUnlockThreshold,
}

/// Scoring and unlocking knobs for a campaign.
///
/// Defaults: +10 per correct answer, -5 per wrong answer (clamped at 0),
/// 4 correct answers to open the next unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RulesFields")]
pub struct CampaignRules {
    points_per_correct: u32,
    points_lost_per_wrong: u32,
    answers_needed_to_unlock: u32,
}

#[derive(Deserialize)]
struct RulesFields {
    points_per_correct: u32,
    points_lost_per_wrong: u32,
    answers_needed_to_unlock: u32,
}

impl TryFrom<RulesFields> for CampaignRules {
    type Error = RulesError;

    fn try_from(fields: RulesFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.points_per_correct,
            fields.points_lost_per_wrong,
            fields.answers_needed_to_unlock,
        )
    }
}

impl Default for CampaignRules {
    fn default() -> Self {
        Self {
            points_per_correct: 10,
            points_lost_per_wrong: 5,
            answers_needed_to_unlock: 4,
        }
    }
}

impl CampaignRules {
    /// Creates custom rules.
    ///
    /// # Errors
    ///
    /// Returns `RulesError` if any value is zero.
    pub fn new(
        points_per_correct: u32,
        points_lost_per_wrong: u32,
        answers_needed_to_unlock: u32,
    ) -> Result<Self, RulesError> {
        if points_per_correct == 0 {
            return Err(RulesError::InvalidPointsPerCorrect);
        }
        if points_lost_per_wrong == 0 {
            return Err(RulesError::InvalidWrongPenalty);
        }
        if answers_needed_to_unlock == 0 {
            return Err(RulesError::InvalidUnlockThreshold);
        }
        Ok(Self {
            points_per_correct,
            points_lost_per_wrong,
            answers_needed_to_unlock,
        })
    }

    #[must_use]
    pub fn points_per_correct(&self) -> u32 {
        self.points_per_correct
    }

    #[must_use]
    pub fn points_lost_per_wrong(&self) -> u32 {
        self.points_lost_per_wrong
    }

    #[must_use]
    pub fn answers_needed_to_unlock(&self) -> u32 {
        self.answers_needed_to_unlock
    }
}
