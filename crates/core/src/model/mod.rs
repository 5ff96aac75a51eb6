mod catalog;
mod leaderboard;
mod question;
mod rules;
mod unit;

pub use catalog::{Catalog, CatalogError, CatalogFile};
pub use leaderboard::{
    LEADERBOARD_CAPACITY, Leaderboard, LeaderboardEntry, LeaderboardError, ANONYMOUS_PLAYER,
};
pub use question::{AnswerIndex, Question, QuestionError};
pub use rules::{CampaignRules, RulesError};
pub use unit::UnitDef;
