use thiserror::Error;

use crate::model::{CatalogError, LeaderboardError, QuestionError, RulesError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
}
