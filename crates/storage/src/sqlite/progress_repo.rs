use super::SqliteRepository;
use super::mapping::{count_to_i64, index_to_i64, map_progress_row};
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_cursors(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT username, category, last_index, mode, served, updated_at
            FROM progress_cursors
            ORDER BY username ASC, category ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn flush_cursors(&self, records: &[ProgressRecord]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Any early return drops `tx`, which rolls the whole batch back.
        for record in records {
            let cursor = &record.cursor;
            sqlx::query(
                r"
                INSERT INTO progress_cursors (username, category, last_index, mode, served, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(username, category) DO UPDATE SET
                    last_index = excluded.last_index,
                    mode = excluded.mode,
                    served = excluded.served,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(record.key.username().as_str())
            .bind(record.key.category().as_str())
            .bind(index_to_i64("last_index", cursor.last_index())?)
            .bind(cursor.mode().as_str())
            .bind(count_to_i64("served", cursor.served())?)
            .bind(cursor.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
