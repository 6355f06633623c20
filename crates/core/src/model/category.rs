use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A category name that does not map to any known vocabulary category.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// A vocabulary traversal domain.
///
/// Each category owns its own word list and its own progress cursors; two
/// categories never share storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Verbs,
    AdvancedVerbs,
    PhrasalVerbs,
    Nouns,
    AdvancedNouns,
    Adjectives,
    AdvancedAdjectives,
    Adverbs,
    AdvancedAdverbs,
    Prepositions,
    AdvancedPrepositions,
}

impl Category {
    /// Every category, in catalog order.
    pub const ALL: [Category; 11] = [
        Category::Verbs,
        Category::AdvancedVerbs,
        Category::PhrasalVerbs,
        Category::Nouns,
        Category::AdvancedNouns,
        Category::Adjectives,
        Category::AdvancedAdjectives,
        Category::Adverbs,
        Category::AdvancedAdverbs,
        Category::Prepositions,
        Category::AdvancedPrepositions,
    ];

    /// Canonical name used on the wire, in storage and for catalog file names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Verbs => "verbs",
            Category::AdvancedVerbs => "advanced_verbs",
            Category::PhrasalVerbs => "phrasal_verbs",
            Category::Nouns => "nouns",
            Category::AdvancedNouns => "advanced_nouns",
            Category::Adjectives => "adjectives",
            Category::AdvancedAdjectives => "advanced_adjectives",
            Category::Adverbs => "adverbs",
            Category::AdvancedAdverbs => "advanced_adverbs",
            Category::Prepositions => "prepositions",
            Category::AdvancedPrepositions => "advanced_prepositions",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse of a canonical name. Lenient lookups belong to the registry.
impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_parse_back() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn parse_is_strict() {
        assert_eq!(
            "Verbs".parse::<Category>(),
            Err(UnknownCategory("Verbs".into()))
        );
        assert!("unknown_category".parse::<Category>().is_err());
    }

    #[test]
    fn display_matches_canonical_name() {
        assert_eq!(
            Category::AdvancedPrepositions.to_string(),
            "advanced_prepositions"
        );
    }
}
