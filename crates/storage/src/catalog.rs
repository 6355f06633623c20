//! Read-only word catalog backed by one JSON file per category.
//!
//! A catalog directory holds `<category>.json` files, each a JSON array of word
//! records. The record shape is opaque to the service: whatever object sits at
//! an index is what gets served.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use vocab_core::model::Category;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} must contain a JSON array of word records")]
    NotAnArray { path: PathBuf },
}

/// Source of canonical word records and per-category counts.
pub trait WordCatalog: Send + Sync {
    /// Number of words in `category`; zero for a registered but empty category.
    fn word_count(&self, category: Category) -> usize;

    /// The record at `index`, if any.
    fn word(&self, category: Category, index: usize) -> Option<Value>;
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    words: HashMap<Category, Vec<Value>>,
}

impl JsonCatalog {
    /// Build a catalog from already-parsed word lists.
    #[must_use]
    pub fn from_words(words: impl IntoIterator<Item = (Category, Vec<Value>)>) -> Self {
        Self {
            words: words.into_iter().collect(),
        }
    }

    /// Load `<dir>/<category>.json` for every category.
    ///
    /// A missing file leaves the category empty rather than failing startup.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when a file exists but cannot be read, is not
    /// valid JSON, or is not a JSON array.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut words = HashMap::new();
        for category in Category::ALL {
            let path = dir.join(format!("{}.json", category.as_str()));
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    warn!("No catalog file for {category} at {}", path.display());
                    continue;
                }
                Err(source) => return Err(CatalogError::Io { path, source }),
            };
            let parsed: Value = serde_json::from_str(&raw)
                .map_err(|source| CatalogError::Parse {
                    path: path.clone(),
                    source,
                })?;
            let Value::Array(list) = parsed else {
                return Err(CatalogError::NotAnArray { path });
            };
            info!("Loaded {} words for {category}", list.len());
            words.insert(category, list);
        }
        Ok(Self { words })
    }
}

impl WordCatalog for JsonCatalog {
    fn word_count(&self, category: Category) -> usize {
        self.words.get(&category).map_or(0, Vec::len)
    }

    fn word(&self, category: Category, index: usize) -> Option<Value> {
        self.words.get(&category)?.get(index).cloned()
    }
}
