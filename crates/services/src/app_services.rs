use std::path::Path;
use std::sync::Arc;

use campaign_core::Clock;
use campaign_core::model::{CampaignRules, Catalog, CatalogError, CatalogFile};
use storage::repository::Storage;

use crate::campaign_service::CampaignService;
use crate::error::{AppServicesError, CatalogLoadError};
use crate::events::EventHub;
use crate::leaderboard_service::LeaderboardService;
use crate::quiz::{QuizConfig, QuizController, QuizLoopService};

/// Content and tuning a campaign is built from.
#[derive(Debug, Clone)]
pub struct CampaignSetup {
    pub catalog: Catalog,
    pub rules: CampaignRules,
    pub quiz: QuizConfig,
    pub clock: Clock,
}

impl CampaignSetup {
    /// The built-in Thessaloniki campaign with default rules.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the built-in content fails validation.
    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self {
            catalog: Catalog::thessaloniki()?,
            rules: CampaignRules::default(),
            quiz: QuizConfig::default(),
            clock: Clock::default(),
        })
    }

    /// Campaign content from a JSON catalog file.
    ///
    /// Rules come from the file's `rules` section when present.
    ///
    /// # Errors
    ///
    /// Returns `CatalogLoadError` if the file cannot be read, parsed or validated.
    pub fn from_catalog_file(path: &Path) -> Result<Self, CatalogLoadError> {
        let (catalog, rules) = load_catalog(path)?;
        Ok(Self {
            catalog,
            rules: rules.unwrap_or_default(),
            quiz: QuizConfig::default(),
            clock: Clock::default(),
        })
    }

    #[must_use]
    pub fn with_quiz_config(mut self, quiz: QuizConfig) -> Self {
        self.quiz = quiz;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

/// Read and validate a JSON catalog.
///
/// # Errors
///
/// Returns `CatalogLoadError` if the file cannot be read, parsed or validated.
pub fn load_catalog(path: &Path) -> Result<(Catalog, Option<CampaignRules>), CatalogLoadError> {
    let raw = std::fs::read_to_string(path)?;
    let file: CatalogFile = serde_json::from_str(&raw)?;
    let loaded = Catalog::from_file(file)?;
    tracing::debug!(path = %path.display(), units = loaded.0.len(), "catalog loaded");
    Ok(loaded)
}

/// Application root: owns the event hub and every service.
#[derive(Clone)]
pub struct AppServices {
    events: EventHub,
    campaign: Arc<CampaignService>,
    quiz: QuizController,
    leaderboard: Arc<LeaderboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or progress loading fails.
    pub async fn new_sqlite(db_url: &str, setup: CampaignSetup) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, setup).await
    }

    /// Build services over a volatile in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if progress loading fails.
    pub async fn in_memory(setup: CampaignSetup) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), setup).await
    }

    /// Build services over existing storage handles.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if progress loading fails.
    pub async fn from_storage(
        storage: Storage,
        setup: CampaignSetup,
    ) -> Result<Self, AppServicesError> {
        let events = EventHub::new();
        let campaign = Arc::new(
            CampaignService::load(
                Arc::new(setup.catalog),
                setup.rules,
                Arc::clone(&storage.progress),
                events.clone(),
            )
            .await?,
        );
        let workflow = Arc::new(QuizLoopService::new(Arc::clone(&campaign), setup.quiz));
        let quiz = QuizController::new(workflow);
        let leaderboard = Arc::new(LeaderboardService::new(
            setup.clock,
            Arc::clone(&storage.progress),
            Arc::clone(&campaign),
            events.clone(),
        ));

        Ok(Self {
            events,
            campaign,
            quiz,
            leaderboard,
        })
    }

    /// Close the active quiz, then erase campaign progress.
    ///
    /// Any scheduled continue is cancelled with the session, so nothing from
    /// the old run can move the fresh cursors. Leaderboard entries are kept.
    pub async fn reset(&self) {
        self.quiz.close().await;
        self.campaign.reset().await;
    }

    #[must_use]
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    #[must_use]
    pub fn campaign(&self) -> Arc<CampaignService> {
        Arc::clone(&self.campaign)
    }

    #[must_use]
    pub fn quiz(&self) -> QuizController {
        self.quiz.clone()
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }
}
