#![forbid(unsafe_code)]

pub mod app_services;
pub mod campaign_service;
pub mod error;
pub mod events;
pub mod leaderboard_service;
pub mod quiz;

pub use campaign_core::Clock;

pub use app_services::{AppServices, CampaignSetup, load_catalog};
pub use campaign_service::{CampaignService, ProgressSummary, UnitSummary};
pub use error::{AppServicesError, CampaignError, CatalogLoadError, LeaderboardError, QuizError};
pub use events::{CampaignEvent, CampaignObserver, Cue, EventHub, Notifier, Scene, SceneLoader};
pub use leaderboard_service::{DEFAULT_PLAYER_NAME, LeaderboardService, SavedScore};
pub use quiz::{
    ContinueOutcome, FeedbackText, QuizConfig, QuizController, QuizLoopService, QuizSession,
    QuizState, QuizView, SubmitOutcome,
};
