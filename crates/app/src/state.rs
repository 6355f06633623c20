use std::sync::Arc;

use services::{AppServices, CategoryRegistry, SelectionEngine};

/// Handles shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SelectionEngine>,
    pub registry: Arc<CategoryRegistry>,
}

impl AppState {
    #[must_use]
    pub fn new(services: &AppServices) -> Self {
        Self {
            engine: services.engine(),
            registry: services.registry(),
        }
    }
}
