//! Shared error types for the services crate.

use thiserror::Error;

use campaign_core::model::CatalogError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CampaignService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CampaignError {
    #[error("unit {index} does not exist")]
    UnitNotFound { index: usize },
    #[error("unit {index} is locked")]
    UnitLocked { index: usize },
    #[error("unit {index} is already completed")]
    UnitCompleted { index: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("cannot leave while feedback is awaiting continue")]
    AwaitingContinue,
    #[error("no quiz session is active")]
    NoActiveSession,
    #[error(transparent)]
    Campaign(#[from] CampaignError),
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading a catalog file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Campaign(#[from] CampaignError),
}
