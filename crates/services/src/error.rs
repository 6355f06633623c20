//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use vocab_core::model::{Category, ProgressKey, UnknownCategory, UsernameError};
use vocab_core::selection::IndexError;

/// Errors emitted by `SelectionEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SelectionError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),
    #[error("index {index} is out of range for a category of {count} words")]
    OutOfRangeIndex { index: usize, count: usize },
    #[error("no content available for {0}")]
    EmptyCategory(Category),
    #[error("progress could not be persisted: {0}")]
    Persistence(#[from] StorageError),
    #[error("progress store still needs a flush for {key} after flushing")]
    InternalInconsistency { key: ProgressKey },
}

impl SelectionError {
    pub(crate) fn from_index(err: IndexError, category: Category) -> Self {
        match err {
            IndexError::OutOfRange { index, count } => Self::OutOfRangeIndex { index, count },
            IndexError::Empty => Self::EmptyCategory(category),
        }
    }

    /// True for errors caused by the request rather than by the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownCategory(_)
                | Self::InvalidUsername(_)
                | Self::OutOfRangeIndex { .. }
                | Self::EmptyCategory(_)
        )
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
