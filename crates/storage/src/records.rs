//! Mapping between domain state and flat persisted keys.
//!
//! Functions here only stage writes; callers decide when to `persist`.

use campaign_core::model::{CampaignRules, Leaderboard, LeaderboardEntry};
use campaign_core::{CampaignState, UnitProgress};

use crate::keys::{LEADERBOARD_KEY_PREFIX, ProgressKey, UNIT_KEY_PREFIX};
use crate::repository::{ProgressStore, ScalarValue, StorageError};

fn to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

//
// ─── CAMPAIGN ──────────────────────────────────────────────────────────────────
//

/// Load campaign state for `unit_count` units, defaulting any missing field.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub async fn load_campaign(
    store: &dyn ProgressStore,
    unit_count: usize,
    rules: CampaignRules,
) -> Result<CampaignState, StorageError> {
    let score = store
        .get_int_or(&ProgressKey::CurrentScore.to_string(), 0)
        .await?;
    let correct = store
        .get_int_or(&ProgressKey::CorrectAnswersCount.to_string(), 0)
        .await?;
    let current = store
        .get_int_or(&ProgressKey::CurrentUnitIndex.to_string(), 0)
        .await?;

    let mut units = Vec::with_capacity(unit_count);
    for i in 0..unit_count {
        let cursor = store
            .get_int_or(&ProgressKey::UnitQuestionIndex(i).to_string(), 0)
            .await?;
        let unlocked = i == 0
            || store
                .get_bool_or(&ProgressKey::UnitUnlocked(i).to_string(), false)
                .await?;
        let completed = store
            .get_bool_or(&ProgressKey::UnitCompleted(i).to_string(), false)
            .await?;
        units.push(UnitProgress {
            unlocked,
            completed,
            next_question_index: usize::try_from(cursor.max(0)).unwrap_or(usize::MAX),
        });
    }

    Ok(CampaignState::from_persisted(
        rules, score, correct, current, units,
    ))
}

/// Stage every campaign field.
///
/// # Errors
///
/// Returns `StorageError` if a write cannot be staged.
pub async fn stage_campaign(
    store: &dyn ProgressStore,
    state: &CampaignState,
) -> Result<(), StorageError> {
    store
        .set(
            &ProgressKey::CurrentScore.to_string(),
            ScalarValue::Int(i64::from(state.score())),
        )
        .await?;
    store
        .set(
            &ProgressKey::CorrectAnswersCount.to_string(),
            ScalarValue::Int(i64::from(state.correct_answers_count())),
        )
        .await?;
    store
        .set(
            &ProgressKey::CurrentUnitIndex.to_string(),
            ScalarValue::Int(to_i64("current_unit_index", state.current_unit_index())?),
        )
        .await?;

    for (i, unit) in state.units().iter().enumerate() {
        store
            .set(
                &ProgressKey::UnitQuestionIndex(i).to_string(),
                ScalarValue::Int(to_i64("next_question_index", unit.next_question_index)?),
            )
            .await?;
        store
            .set(
                &ProgressKey::UnitUnlocked(i).to_string(),
                ScalarValue::from_bool(unit.unlocked),
            )
            .await?;
        store
            .set(
                &ProgressKey::UnitCompleted(i).to_string(),
                ScalarValue::from_bool(unit.completed),
            )
            .await?;
    }
    Ok(())
}

/// Stage deletion of every `Unit_*` key, returning how many were found.
///
/// # Errors
///
/// Returns `StorageError` if keys cannot be listed or deleted.
pub async fn clear_unit_keys(store: &dyn ProgressStore) -> Result<usize, StorageError> {
    let keys = store.keys_with_prefix(UNIT_KEY_PREFIX).await?;
    for key in &keys {
        store.delete(key).await?;
    }
    Ok(keys.len())
}

//
// ─── LEADERBOARD ───────────────────────────────────────────────────────────────
//

/// Load the saved leaderboard; unreadable entries are skipped.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub async fn load_leaderboard(store: &dyn ProgressStore) -> Result<Leaderboard, StorageError> {
    let count = store
        .get_int_or(&ProgressKey::LeaderboardCount.to_string(), 0)
        .await?;
    let count = usize::try_from(count.max(0)).unwrap_or(0);

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let name = store
            .get_text_or(&ProgressKey::LeaderboardName(i).to_string(), "Unknown")
            .await?;
        let score = store
            .get_int_or(&ProgressKey::LeaderboardScore(i).to_string(), 0)
            .await?;
        let date = store
            .get_text_or(&ProgressKey::LeaderboardDate(i).to_string(), "")
            .await?;
        let score = u32::try_from(score.max(0)).unwrap_or(u32::MAX);
        match LeaderboardEntry::from_persisted(&name, score, &date) {
            Ok(entry) => entries.push(entry),
            Err(err) => tracing::warn!(rank = i, %err, "skipping unreadable leaderboard entry"),
        }
    }
    Ok(Leaderboard::from_entries(entries))
}

/// Replace the persisted leaderboard with `board`.
///
/// # Errors
///
/// Returns `StorageError` if writes cannot be staged.
pub async fn stage_leaderboard(
    store: &dyn ProgressStore,
    board: &Leaderboard,
) -> Result<(), StorageError> {
    clear_leaderboard(store).await?;
    store
        .set(
            &ProgressKey::LeaderboardCount.to_string(),
            ScalarValue::Int(to_i64("leaderboard_count", board.len())?),
        )
        .await?;
    for (i, entry) in board.entries().iter().enumerate() {
        store
            .set(
                &ProgressKey::LeaderboardName(i).to_string(),
                ScalarValue::Text(entry.player_name().to_owned()),
            )
            .await?;
        store
            .set(
                &ProgressKey::LeaderboardScore(i).to_string(),
                ScalarValue::Int(i64::from(entry.score())),
            )
            .await?;
        store
            .set(
                &ProgressKey::LeaderboardDate(i).to_string(),
                ScalarValue::Text(entry.date_label()),
            )
            .await?;
    }
    Ok(())
}

/// Stage deletion of every leaderboard key.
///
/// # Errors
///
/// Returns `StorageError` if keys cannot be listed or deleted.
pub async fn clear_leaderboard(store: &dyn ProgressStore) -> Result<(), StorageError> {
    for key in store.keys_with_prefix(LEADERBOARD_KEY_PREFIX).await? {
        store.delete(&key).await?;
    }
    Ok(())
}
