use std::sync::Arc;

use tracing::{debug, error, warn};
use vocab_core::model::{Category, ProgressCursor, ProgressKey, TraversalMode, Username};

use crate::error::SelectionError;
use crate::progress_store::{Admission, Advance, ProgressStore};
use crate::registry::CategoryRegistry;

/// The index chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub category: Category,
    pub index: usize,
    pub count: usize,
}

/// Word count and current cursor for one learner in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressOverview {
    pub category: Category,
    pub count: usize,
    pub cursor: Option<ProgressCursor>,
}

/// Turns update requests into recorded progress.
#[derive(Clone)]
pub struct SelectionEngine {
    registry: Arc<CategoryRegistry>,
    store: Arc<ProgressStore>,
}

impl SelectionEngine {
    #[must_use]
    pub fn new(registry: Arc<CategoryRegistry>, store: Arc<ProgressStore>) -> Self {
        Self { registry, store }
    }

    /// Word count for a category name.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownCategory` for unrecognized names.
    pub fn word_count(&self, category_name: &str) -> Result<usize, SelectionError> {
        Ok(self.registry.word_count_by_name(category_name)?)
    }

    /// Pick and record the next index for `username` in `category_name`.
    ///
    /// If the store asks for a flush, one flush is made and the update is
    /// retried with forced admission, so the retry cannot be turned away.
    /// A refusal at that point is an internal inconsistency.
    ///
    /// # Errors
    ///
    /// - `UnknownCategory` / `InvalidUsername` before the store is touched.
    /// - `EmptyCategory` when the category has no words.
    /// - `OutOfRangeIndex` for an ordered index `>= count`; the cursor is unchanged.
    /// - `Persistence` if the forced flush fails.
    /// - `InternalInconsistency` if the retry is refused again.
    pub async fn select_next(
        &self,
        username: &str,
        category_name: &str,
        mode: TraversalMode,
        reported: usize,
    ) -> Result<Selection, SelectionError> {
        let category = self.registry.resolve(category_name)?;
        let username = Username::parse(username)?;
        let count = self.registry.word_count(category);
        if count == 0 {
            return Err(SelectionError::EmptyCategory(category));
        }

        let key = ProgressKey::new(username, category);
        let index = match self.advance(&key, mode, reported, count, Admission::Bounded)? {
            Advance::Served(index) => index,
            Advance::NeedsPersist => {
                warn!(%key, "Forcing a progress flush before serving");
                self.store.force_persist().await?;
                match self.advance(&key, mode, reported, count, Admission::Forced)? {
                    Advance::Served(index) => index,
                    Advance::NeedsPersist => {
                        error!(%key, "Progress store refused an update right after a flush");
                        return Err(SelectionError::InternalInconsistency { key });
                    }
                }
            }
        };

        debug!(%key, %mode, reported, index, count, "Selected next word");
        Ok(Selection {
            category,
            index,
            count,
        })
    }

    /// Current progress of `username` in `category_name`; read-only.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory` or `InvalidUsername` for bad input.
    pub fn overview(
        &self,
        username: &str,
        category_name: &str,
    ) -> Result<ProgressOverview, SelectionError> {
        let category = self.registry.resolve(category_name)?;
        let username = Username::parse(username)?;
        let cursor = self
            .store
            .read_cursor(&ProgressKey::new(username, category));
        Ok(ProgressOverview {
            category,
            count: self.registry.word_count(category),
            cursor,
        })
    }

    fn advance(
        &self,
        key: &ProgressKey,
        mode: TraversalMode,
        reported: usize,
        count: usize,
        admission: Admission,
    ) -> Result<Advance, SelectionError> {
        self.store
            .try_advance(key, mode, reported, count, admission)
            .map_err(|err| SelectionError::from_index(err, key.category()))
    }
}
