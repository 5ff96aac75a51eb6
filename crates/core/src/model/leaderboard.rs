use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of entries kept on the board.
pub const LEADERBOARD_CAPACITY: usize = 10;

/// Name recorded when the player leaves the name field blank.
pub const ANONYMOUS_PLAYER: &str = "Anonymous";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error("invalid leaderboard date: {raw}")]
    InvalidDate { raw: String },
}

/// A single saved score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    player_name: String,
    score: u32,
    date: NaiveDate,
}

impl LeaderboardEntry {
    /// Creates an entry; a blank name is recorded as `Anonymous`.
    #[must_use]
    pub fn new(player_name: &str, score: u32, date: NaiveDate) -> Self {
        let trimmed = player_name.trim();
        let player_name = if trimmed.is_empty() {
            ANONYMOUS_PLAYER.to_string()
        } else {
            trimmed.to_string()
        };
        Self {
            player_name,
            score,
            date,
        }
    }

    /// Rehydrate an entry from persisted fields.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::InvalidDate` if `date` is not `YYYY-MM-DD`.
    pub fn from_persisted(player_name: &str, score: u32, date: &str) -> Result<Self, LeaderboardError> {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            LeaderboardError::InvalidDate {
                raw: date.to_string(),
            }
        })?;
        Ok(Self::new(player_name, score, parsed))
    }

    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Date formatted for storage and display.
    #[must_use]
    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Top scores, highest first, capped at `LEADERBOARD_CAPACITY`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Builds a board from unordered entries, sorting and trimming them.
    #[must_use]
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>) -> Self {
        // Stable sort keeps earlier saves ahead of later ties.
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(LEADERBOARD_CAPACITY);
        Self { entries }
    }

    /// Inserts an entry, keeping order and capacity.
    ///
    /// Returns the 1-based rank of the new entry, or `None` if it fell off the board.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let position = self
            .entries
            .iter()
            .position(|existing| existing.score < entry.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
        self.entries.truncate(LEADERBOARD_CAPACITY);
        (position < LEADERBOARD_CAPACITY).then_some(position + 1)
    }

    #[must_use]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn blank_name_becomes_anonymous() {
        let entry = LeaderboardEntry::new("   ", 30, day());
        assert_eq!(entry.player_name(), ANONYMOUS_PLAYER);
        assert_eq!(LeaderboardEntry::new(" Eleni ", 30, day()).player_name(), "Eleni");
    }

    #[test]
    fn board_keeps_top_ten_descending() {
        let entries = (0..12)
            .map(|i| LeaderboardEntry::new(&format!("p{i}"), i * 10, day()))
            .collect();
        let board = Leaderboard::from_entries(entries);
        assert_eq!(board.len(), LEADERBOARD_CAPACITY);
        assert_eq!(board.entries()[0].score(), 110);
        assert_eq!(board.entries()[9].score(), 20);
    }

    #[test]
    fn insert_reports_rank_and_ties_go_after_existing() {
        let mut board = Leaderboard::from_entries(vec![
            LeaderboardEntry::new("a", 50, day()),
            LeaderboardEntry::new("b", 20, day()),
        ]);
        assert_eq!(board.insert(LeaderboardEntry::new("c", 20, day())), Some(3));
        assert_eq!(board.insert(LeaderboardEntry::new("d", 60, day())), Some(1));
        assert_eq!(board.entries()[3].player_name(), "c");
    }

    #[test]
    fn insert_below_full_board_is_dropped() {
        let entries = (1..=10)
            .map(|i| LeaderboardEntry::new("p", i * 10, day()))
            .collect();
        let mut board = Leaderboard::from_entries(entries);
        assert_eq!(board.insert(LeaderboardEntry::new("late", 5, day())), None);
        assert_eq!(board.len(), LEADERBOARD_CAPACITY);
    }

    #[test]
    fn persisted_date_must_parse() {
        assert!(LeaderboardEntry::from_persisted("a", 1, "2024-05-01").is_ok());
        assert_eq!(
            LeaderboardEntry::from_persisted("a", 1, "Unknown").unwrap_err(),
            LeaderboardError::InvalidDate {
                raw: "Unknown".into()
            }
        );
    }
}
