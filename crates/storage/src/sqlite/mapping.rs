use vocab_core::model::{Category, ProgressCursor, ProgressKey, TraversalMode, Username};
use sqlx::Row;

use crate::repository::{ProgressRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn index_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn count_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn parse_mode(s: &str) -> Result<TraversalMode, StorageError> {
    match s {
        "ordered" => Ok(TraversalMode::Ordered),
        "unordered" => Ok(TraversalMode::Unordered),
        _ => Err(StorageError::Serialization(format!("invalid mode: {s}"))),
    }
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressRecord, StorageError> {
    let username = Username::parse(row.try_get::<String, _>("username").map_err(ser)?)
        .map_err(ser)?;
    let category: Category = row
        .try_get::<String, _>("category")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    let last_index_i64: i64 = row.try_get("last_index").map_err(ser)?;
    let last_index = usize::try_from(last_index_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid last_index: {last_index_i64}"))
    })?;

    let served_i64: i64 = row.try_get("served").map_err(ser)?;
    let served = u64::try_from(served_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid served: {served_i64}")))?;

    let mode_str: String = row.try_get("mode").map_err(ser)?;
    let cursor = ProgressCursor::from_persisted(
        last_index,
        parse_mode(&mode_str)?,
        served,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)?;

    Ok(ProgressRecord::new(ProgressKey::new(username, category), cursor))
}
