use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::category::Category;

/// Longest accepted username, in bytes.
pub const MAX_USERNAME_LEN: usize = 128;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UsernameError {
    #[error("username cannot be empty")]
    Empty,
    #[error("username exceeds {MAX_USERNAME_LEN} bytes")]
    TooLong,
}

/// Identifier of a learner.
///
/// Usernames are trusted and unauthenticated; the only checks are that the
/// trimmed value is non-empty and bounded in length.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and normalize a raw username.
    ///
    /// # Errors
    ///
    /// Returns `UsernameError` when the trimmed value is empty or too long.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, UsernameError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }
        if trimmed.len() > MAX_USERNAME_LEN {
            return Err(UsernameError::TooLong);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username({})", self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// Identity of a progress cursor: one per (username, category).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgressKey {
    username: Username,
    category: Category,
}

impl ProgressKey {
    #[must_use]
    pub fn new(username: Username, category: Category) -> Self {
        Self { username, category }
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.username, self.category)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed() {
        let name = Username::parse("  alice ").unwrap();
        assert_eq!(name.as_str(), "alice");
    }

    #[test]
    fn blank_username_is_rejected() {
        assert_eq!(Username::parse("   "), Err(UsernameError::Empty));
        assert_eq!("".parse::<Username>(), Err(UsernameError::Empty));
    }

    #[test]
    fn long_username_is_rejected() {
        let raw = "x".repeat(MAX_USERNAME_LEN + 1);
        assert_eq!(Username::parse(raw), Err(UsernameError::TooLong));
        assert!(Username::parse("x".repeat(MAX_USERNAME_LEN)).is_ok());
    }

    #[test]
    fn keys_differ_by_category() {
        let alice = Username::parse("alice").unwrap();
        let verbs = ProgressKey::new(alice.clone(), Category::Verbs);
        let nouns = ProgressKey::new(alice, Category::Nouns);
        assert_ne!(verbs, nouns);
        assert_eq!(verbs.to_string(), "alice/verbs");
    }
}
