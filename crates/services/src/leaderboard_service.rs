use std::sync::Arc;

use tokio::sync::Mutex;

use campaign_core::Clock;
use campaign_core::model::{Leaderboard, LeaderboardEntry};
use storage::ProgressKey;
use storage::records::{clear_leaderboard, load_leaderboard, stage_leaderboard};
use storage::repository::{ProgressStore, ScalarValue};

use crate::campaign_service::CampaignService;
use crate::error::LeaderboardError;
use crate::events::{Cue, EventHub};

/// Name offered when no player name has been saved yet.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// A score written to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedScore {
    pub entry: LeaderboardEntry,
    /// 1-based position, `None` if the score did not make the board.
    pub rank: Option<usize>,
}

/// Local high-score table stored beside campaign progress.
pub struct LeaderboardService {
    clock: Clock,
    store: Arc<dyn ProgressStore>,
    campaign: Arc<CampaignService>,
    events: EventHub,
    // serializes read-modify-write of the board
    write_lock: Mutex<()>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(
        clock: Clock,
        store: Arc<dyn ProgressStore>,
        campaign: Arc<CampaignService>,
        events: EventHub,
    ) -> Self {
        Self {
            clock,
            store,
            campaign,
            events,
            write_lock: Mutex::new(()),
        }
    }

    /// Saved entries, best first.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if the store cannot be read.
    pub async fn entries(&self) -> Result<Leaderboard, LeaderboardError> {
        Ok(load_leaderboard(self.store.as_ref()).await?)
    }

    /// Name used for the last saved score.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if the store cannot be read.
    pub async fn last_player_name(&self) -> Result<String, LeaderboardError> {
        Ok(self
            .store
            .get_text_or(&ProgressKey::PlayerName.to_string(), DEFAULT_PLAYER_NAME)
            .await?)
    }

    /// Record the current campaign score under `player_name`, dated today.
    ///
    /// Blank names are saved as `Anonymous`.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if the board cannot be read or persisted.
    pub async fn save_score(&self, player_name: &str) -> Result<SavedScore, LeaderboardError> {
        let _guard = self.write_lock.lock().await;
        self.events.cue(Cue::ButtonClick);

        let score = self.campaign.score().await;
        let entry = LeaderboardEntry::new(player_name, score, self.clock.today());
        let mut board = load_leaderboard(self.store.as_ref()).await?;
        let rank = board.insert(entry.clone());

        self.store
            .set(
                &ProgressKey::PlayerName.to_string(),
                ScalarValue::Text(entry.player_name().to_owned()),
            )
            .await?;
        stage_leaderboard(self.store.as_ref(), &board).await?;
        self.store.persist().await?;

        tracing::info!(
            player = entry.player_name(),
            score,
            rank = ?rank,
            "score saved to leaderboard"
        );
        Ok(SavedScore { entry, rank })
    }

    /// Remove every saved score. The remembered player name is kept.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if the deletion cannot be persisted.
    pub async fn clear(&self) -> Result<(), LeaderboardError> {
        let _guard = self.write_lock.lock().await;
        self.events.cue(Cue::ButtonClick);
        clear_leaderboard(self.store.as_ref()).await?;
        self.store.persist().await?;
        tracing::info!("leaderboard cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::model::{CampaignRules, Catalog};
    use campaign_core::time::fixed_clock;
    use storage::repository::InMemoryProgressStore;

    async fn services(store: &InMemoryProgressStore) -> (Arc<CampaignService>, LeaderboardService) {
        let store: Arc<dyn ProgressStore> = Arc::new(store.clone());
        let campaign = Arc::new(
            CampaignService::load(
                Arc::new(Catalog::thessaloniki().unwrap()),
                CampaignRules::default(),
                Arc::clone(&store),
                EventHub::new(),
            )
            .await
            .unwrap(),
        );
        let board = LeaderboardService::new(
            fixed_clock(),
            store,
            Arc::clone(&campaign),
            EventHub::new(),
        );
        (campaign, board)
    }

    #[tokio::test]
    async fn saves_current_score_with_todays_date() {
        let store = InMemoryProgressStore::new();
        let (campaign, board) = services(&store).await;
        campaign.record_correct_answer().await;
        campaign.record_correct_answer().await;

        let saved = board.save_score("  Eleni ").await.unwrap();
        assert_eq!(saved.rank, Some(1));
        assert_eq!(saved.entry.player_name(), "Eleni");
        assert_eq!(saved.entry.score(), 20);
        assert_eq!(saved.entry.date_label(), "2023-11-14");
        assert_eq!(board.last_player_name().await.unwrap(), "Eleni");

        let reopened = store.reopen().unwrap();
        assert_eq!(load_leaderboard(&reopened).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_anonymous_and_default_name_is_player() {
        let store = InMemoryProgressStore::new();
        let (_campaign, board) = services(&store).await;
        assert_eq!(board.last_player_name().await.unwrap(), DEFAULT_PLAYER_NAME);

        let saved = board.save_score("   ").await.unwrap();
        assert_eq!(saved.entry.player_name(), "Anonymous");
    }

    #[tokio::test]
    async fn clear_keeps_campaign_and_player_name() {
        let store = InMemoryProgressStore::new();
        let (campaign, board) = services(&store).await;
        campaign.record_correct_answer().await;
        board.save_score("Nikos").await.unwrap();

        board.clear().await.unwrap();
        assert!(board.entries().await.unwrap().is_empty());
        assert_eq!(board.last_player_name().await.unwrap(), "Nikos");
        assert_eq!(campaign.score().await, 10);
    }

    #[tokio::test]
    async fn campaign_reset_keeps_the_board() {
        let store = InMemoryProgressStore::new();
        let (campaign, board) = services(&store).await;
        board.save_score("Maria").await.unwrap();
        campaign.reset().await;
        assert_eq!(board.entries().await.unwrap().len(), 1);
    }
}
