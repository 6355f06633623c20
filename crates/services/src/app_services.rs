use std::sync::Arc;

use storage::catalog::WordCatalog;
use storage::repository::Storage;

use crate::Clock;
use crate::engine::SelectionEngine;
use crate::error::AppServicesError;
use crate::progress_store::{FlushReport, ProgressStore, StoreSettings};
use crate::registry::CategoryRegistry;

/// Assembles the registry, the progress store and the engine over one storage.
#[derive(Clone)]
pub struct AppServices {
    registry: Arc<CategoryRegistry>,
    store: Arc<ProgressStore>,
    engine: Arc<SelectionEngine>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or loading the
    /// persisted cursors fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: Arc<dyn WordCatalog>,
        clock: Clock,
        settings: StoreSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, catalog, clock, settings).await
    }

    /// Build services over an already-opened storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the persisted cursors cannot be loaded.
    pub async fn from_storage(
        storage: &Storage,
        catalog: Arc<dyn WordCatalog>,
        clock: Clock,
        settings: StoreSettings,
    ) -> Result<Self, AppServicesError> {
        let store = Arc::new(
            ProgressStore::load(Arc::clone(&storage.progress), clock, settings).await?,
        );
        let registry = Arc::new(CategoryRegistry::new(catalog));
        let engine = Arc::new(SelectionEngine::new(
            Arc::clone(&registry),
            Arc::clone(&store),
        ));

        Ok(Self {
            registry,
            store,
            engine,
        })
    }

    #[must_use]
    pub fn registry(&self) -> Arc<CategoryRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn store(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn engine(&self) -> Arc<SelectionEngine> {
        Arc::clone(&self.engine)
    }

    /// Flush pending progress; used by the periodic flusher and on shutdown.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the write fails.
    pub async fn flush(&self) -> Result<FlushReport, AppServicesError> {
        Ok(self.store.force_persist().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storage::catalog::JsonCatalog;
    use storage::repository::InMemoryRepository;
    use vocab_core::model::{Category, TraversalMode};
    use vocab_core::time::fixed_clock;

    fn catalog() -> Arc<dyn WordCatalog> {
        Arc::new(JsonCatalog::from_words([(
            Category::Nouns,
            vec![json!({"word": "tree"}); 10],
        )]))
    }

    #[tokio::test]
    async fn services_share_one_store() {
        let repo = InMemoryRepository::new();
        let storage = Storage::from_memory(repo.clone());
        let services =
            AppServices::from_storage(&storage, catalog(), fixed_clock(), StoreSettings::default())
                .await
                .unwrap();

        services
            .engine()
            .select_next("bob", "nouns", TraversalMode::Ordered, 7)
            .await
            .unwrap();
        assert_eq!(services.store().pending(), 1);

        let report = services.flush().await.unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(repo.persisted_len().unwrap(), 1);
        assert_eq!(services.registry().word_count(Category::Nouns), 10);
    }
}
