use std::collections::BTreeMap;
use std::sync::MutexGuard;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteProgressStore;
use crate::buffer::{Staged, WriteBuffer};
use crate::repository::{ProgressStore, ScalarValue, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// `LIKE` pattern matching keys that start with `prefix` literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn map_value_row(row: &sqlx::sqlite::SqliteRow) -> Result<ScalarValue, StorageError> {
    let kind: String = row.try_get("value_kind").map_err(ser)?;
    match kind.as_str() {
        "int" => Ok(ScalarValue::Int(row.try_get("int_value").map_err(ser)?)),
        "text" => Ok(ScalarValue::Text(row.try_get("text_value").map_err(ser)?)),
        other => Err(StorageError::Serialization(format!(
            "invalid value kind: {other}"
        ))),
    }
}

impl SqliteProgressStore {
    fn staged(&self) -> Result<MutexGuard<'_, WriteBuffer>, StorageError> {
        self.staged.lock().map_err(conn)
    }

    async fn flush(&self, pending: &BTreeMap<String, Staged>) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for (key, staged) in pending {
            match staged {
                Staged::Set(value) => {
                    let (int_value, text_value) = match value {
                        ScalarValue::Int(v) => (Some(*v), None),
                        ScalarValue::Text(v) => (None, Some(v.as_str())),
                    };
                    sqlx::query(
                        r"
                        INSERT INTO progress_entries (key, value_kind, int_value, text_value, updated_at)
                        VALUES (?1, ?2, ?3, ?4, ?5)
                        ON CONFLICT(key) DO UPDATE SET
                            value_kind = excluded.value_kind,
                            int_value = excluded.int_value,
                            text_value = excluded.text_value,
                            updated_at = excluded.updated_at
                        ",
                    )
                    .bind(key)
                    .bind(value.kind())
                    .bind(int_value)
                    .bind(text_value)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
                Staged::Delete => {
                    sqlx::query("DELETE FROM progress_entries WHERE key = ?1")
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await
    }
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn get(&self, key: &str) -> Result<Option<ScalarValue>, StorageError> {
        {
            let staged = self.staged()?;
            if let Some(value) = staged.lookup(key) {
                return Ok(value.cloned());
            }
        }

        let row = sqlx::query(
            "SELECT value_kind, int_value, text_value FROM progress_entries WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_value_row).transpose()
    }

    async fn set(&self, key: &str, value: ScalarValue) -> Result<(), StorageError> {
        self.staged()?.set(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.staged()?.delete(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query(
            "SELECT key FROM progress_entries WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key",
        )
        .bind(like_prefix(prefix))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let committed = rows
            .iter()
            .map(|row| row.try_get::<String, _>("key").map_err(ser))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.staged()?.overlay_keys(prefix, committed))
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let pending = {
            let staged = self.staged()?;
            if staged.is_empty() {
                return Ok(());
            }
            staged.snapshot()
        };

        self.flush(&pending)
            .await
            .map_err(|err| StorageError::Flush(err.to_string()))?;
        self.staged()?.settle(&pending);
        tracing::debug!(writes = pending.len(), "progress flushed");
        Ok(())
    }
}
