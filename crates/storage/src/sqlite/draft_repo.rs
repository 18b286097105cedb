use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{AttemptId, Essays};
use sqlx::Row;

use crate::repository::{DraftStore, EssayDraftRecord, StorageError};

use super::SqliteRepository;

const DRAFT_SLOT: i64 = 1;

#[async_trait]
impl DraftStore for SqliteRepository {
    async fn load_draft(&self) -> Result<Option<EssayDraftRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT attempt_id, essays_json, saved_at
            FROM essay_drafts
            WHERE slot = ?1
            ",
        )
        .bind(DRAFT_SLOT)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let attempt_id: String = row
            .try_get("attempt_id")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let essays_json: String = row
            .try_get("essays_json")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let saved_at: DateTime<Utc> = row
            .try_get("saved_at")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let essays: Essays = serde_json::from_str(&essays_json)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        Ok(Some(EssayDraftRecord {
            attempt_id: AttemptId::new(attempt_id),
            essays,
            saved_at,
        }))
    }

    async fn save_draft(&self, draft: &EssayDraftRecord) -> Result<(), StorageError> {
        let essays_json = serde_json::to_string(&draft.essays)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO essay_drafts (slot, attempt_id, essays_json, saved_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(slot) DO UPDATE SET
                attempt_id = excluded.attempt_id,
                essays_json = excluded.essays_json,
                saved_at = excluded.saved_at
            ",
        )
        .bind(DRAFT_SLOT)
        .bind(draft.attempt_id.as_str())
        .bind(essays_json)
        .bind(draft.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_draft(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM essay_drafts WHERE slot = ?1")
            .bind(DRAFT_SLOT)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
