use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use storage::catalog::WordCatalog;
use vocab_core::model::{Category, UnknownCategory};

/// Resolves category names and answers word counts.
///
/// Built once at startup and shared by handle; the name table never changes
/// afterwards. Counts are read live from the catalog.
pub struct CategoryRegistry {
    names: HashMap<String, Category>,
    catalog: Arc<dyn WordCatalog>,
}

impl CategoryRegistry {
    #[must_use]
    pub fn new(catalog: Arc<dyn WordCatalog>) -> Self {
        let names = Category::ALL
            .into_iter()
            .map(|category| (category.as_str().to_owned(), category))
            .collect();
        Self { names, catalog }
    }

    /// Look a category up by name.
    ///
    /// Matching ignores ASCII case and surrounding whitespace, and treats `-`
    /// and spaces like `_`, so `"Advanced Verbs"` resolves to `advanced_verbs`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory` when no category matches.
    pub fn resolve(&self, name: &str) -> Result<Category, UnknownCategory> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        self.names
            .get(&normalized)
            .copied()
            .ok_or_else(|| UnknownCategory(name.to_owned()))
    }

    #[must_use]
    pub fn word_count(&self, category: Category) -> usize {
        self.catalog.word_count(category)
    }

    /// Word count by category name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory` when the name does not resolve.
    pub fn word_count_by_name(&self, name: &str) -> Result<usize, UnknownCategory> {
        self.resolve(name).map(|category| self.word_count(category))
    }

    /// The catalog record served for `index`.
    #[must_use]
    pub fn word(&self, category: Category, index: usize) -> Option<Value> {
        self.catalog.word(category, index)
    }

    /// Every registered category with its current word count.
    pub fn categories(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        Category::ALL
            .into_iter()
            .map(|category| (category, self.word_count(category)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storage::catalog::JsonCatalog;

    fn registry() -> CategoryRegistry {
        let catalog = JsonCatalog::from_words([
            (Category::Verbs, vec![json!({"word": "go"}); 50]),
            (Category::AdvancedVerbs, vec![json!({"word": "elucidate"}); 3]),
        ]);
        CategoryRegistry::new(Arc::new(catalog))
    }

    #[test]
    fn resolves_canonical_and_loose_names() {
        let registry = registry();
        assert_eq!(registry.resolve("verbs"), Ok(Category::Verbs));
        assert_eq!(registry.resolve(" Advanced Verbs "), Ok(Category::AdvancedVerbs));
        assert_eq!(registry.resolve("phrasal-verbs"), Ok(Category::PhrasalVerbs));
    }

    #[test]
    fn unknown_category_is_reported_with_its_name() {
        let registry = registry();
        assert_eq!(
            registry.word_count_by_name("unknown_category"),
            Err(UnknownCategory("unknown_category".into()))
        );
    }

    #[test]
    fn counts_come_from_the_catalog() {
        let registry = registry();
        assert_eq!(registry.word_count_by_name("verbs"), Ok(50));
        assert_eq!(registry.word_count(Category::AdvancedVerbs), 3);
        assert_eq!(registry.word_count(Category::Nouns), 0);
        assert_eq!(registry.categories().count(), Category::ALL.len());
        assert_eq!(registry.word(Category::Verbs, 49), Some(json!({"word": "go"})));
    }
}
