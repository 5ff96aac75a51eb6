//! Logical key names for persisted campaign and leaderboard fields.

use std::fmt;

/// Prefix shared by every per-unit key; `reset` deletes everything under it.
pub const UNIT_KEY_PREFIX: &str = "Unit_";

/// Prefix shared by the per-rank leaderboard keys.
pub const LEADERBOARD_KEY_PREFIX: &str = "Leaderboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressKey {
    CurrentScore,
    CorrectAnswersCount,
    CurrentUnitIndex,
    UnitQuestionIndex(usize),
    UnitUnlocked(usize),
    UnitCompleted(usize),
    LeaderboardCount,
    LeaderboardName(usize),
    LeaderboardScore(usize),
    LeaderboardDate(usize),
    PlayerName,
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressKey::CurrentScore => f.write_str("CurrentScore"),
            ProgressKey::CorrectAnswersCount => f.write_str("CorrectAnswersCount"),
            ProgressKey::CurrentUnitIndex => f.write_str("CurrentUnitIndex"),
            ProgressKey::UnitQuestionIndex(i) => write!(f, "{UNIT_KEY_PREFIX}{i}_QuestionIndex"),
            ProgressKey::UnitUnlocked(i) => write!(f, "{UNIT_KEY_PREFIX}{i}_Unlocked"),
            ProgressKey::UnitCompleted(i) => write!(f, "{UNIT_KEY_PREFIX}{i}_Completed"),
            ProgressKey::LeaderboardCount => write!(f, "{LEADERBOARD_KEY_PREFIX}Count"),
            ProgressKey::LeaderboardName(i) => write!(f, "{LEADERBOARD_KEY_PREFIX}Name_{i}"),
            ProgressKey::LeaderboardScore(i) => write!(f, "{LEADERBOARD_KEY_PREFIX}Score_{i}"),
            ProgressKey::LeaderboardDate(i) => write!(f, "{LEADERBOARD_KEY_PREFIX}Date_{i}"),
            ProgressKey::PlayerName => f.write_str("PlayerName"),
        }
    }
}
