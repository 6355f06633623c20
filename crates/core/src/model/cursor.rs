use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModeError {
    #[error("unknown traversal mode: {0}")]
    Unknown(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CursorError {
    #[error("a persisted cursor must have served at least one word")]
    NeverServed,
}

//
// ─── TRAVERSAL MODE ────────────────────────────────────────────────────────────
//

/// How the next word index is chosen.
///
/// - `Ordered`: the client drives the index and the server records it.
/// - `Unordered`: the server draws the next index, never repeating the one it
///   served last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    Ordered,
    Unordered,
}

impl TraversalMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TraversalMode::Ordered => "ordered",
            TraversalMode::Unordered => "unordered",
        }
    }

    /// Maps the numeric option codes older clients send.
    ///
    /// Options 1 and 3 walk the list in order, 2 and 4 shuffle it.
    #[must_use]
    pub fn from_option_code(code: u8) -> Option<Self> {
        match code {
            1 | 3 => Some(TraversalMode::Ordered),
            2 | 4 => Some(TraversalMode::Unordered),
            _ => None,
        }
    }
}

impl fmt::Display for TraversalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraversalMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "ordered" => Ok(TraversalMode::Ordered),
            "unordered" => Ok(TraversalMode::Unordered),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(TraversalMode::from_option_code)
                .ok_or_else(|| ModeError::Unknown(trimmed.to_owned())),
        }
    }
}

//
// ─── PROGRESS CURSOR ───────────────────────────────────────────────────────────
//

/// Traversal state of one learner in one category.
///
/// `last_index` doubles as the "previous index" the unordered draw must avoid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressCursor {
    last_index: usize,
    mode: TraversalMode,
    served: u64,
    updated_at: DateTime<Utc>,
}

impl ProgressCursor {
    /// Cursor for a key that has just been served its first word.
    #[must_use]
    pub fn first(index: usize, mode: TraversalMode, at: DateTime<Utc>) -> Self {
        Self {
            last_index: index,
            mode,
            served: 1,
            updated_at: at,
        }
    }

    /// Rebuild a cursor from storage.
    ///
    /// # Errors
    ///
    /// Returns `CursorError::NeverServed` when `served` is zero, since cursors
    /// only come into existence once a word has been served.
    pub fn from_persisted(
        last_index: usize,
        mode: TraversalMode,
        served: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, CursorError> {
        if served == 0 {
            return Err(CursorError::NeverServed);
        }
        Ok(Self {
            last_index,
            mode,
            served,
            updated_at,
        })
    }

    /// Record that `index` was served under `mode`.
    pub fn record(&mut self, index: usize, mode: TraversalMode, at: DateTime<Utc>) {
        self.last_index = index;
        self.mode = mode;
        self.served = self.served.saturating_add(1);
        self.updated_at = at;
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.last_index
    }

    #[must_use]
    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    #[must_use]
    pub fn served(&self) -> u64 {
        self.served
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn mode_parses_names_and_option_codes() {
        assert_eq!("ordered".parse(), Ok(TraversalMode::Ordered));
        assert_eq!(" Unordered ".parse(), Ok(TraversalMode::Unordered));
        assert_eq!("1".parse(), Ok(TraversalMode::Ordered));
        assert_eq!("2".parse(), Ok(TraversalMode::Unordered));
        assert_eq!("3".parse(), Ok(TraversalMode::Ordered));
        assert_eq!("4".parse(), Ok(TraversalMode::Unordered));
        assert_eq!(
            "5".parse::<TraversalMode>(),
            Err(ModeError::Unknown("5".into()))
        );
        assert!("shuffled".parse::<TraversalMode>().is_err());
    }

    #[test]
    fn record_moves_cursor_and_counts() {
        let start = fixed_now();
        let mut cursor = ProgressCursor::first(3, TraversalMode::Ordered, start);
        let later = start + chrono::Duration::seconds(5);
        cursor.record(9, TraversalMode::Unordered, later);

        assert_eq!(cursor.last_index(), 9);
        assert_eq!(cursor.mode(), TraversalMode::Unordered);
        assert_eq!(cursor.served(), 2);
        assert_eq!(cursor.updated_at(), later);
    }

    #[test]
    fn persisted_cursor_requires_a_served_word() {
        let err = ProgressCursor::from_persisted(0, TraversalMode::Ordered, 0, fixed_now());
        assert_eq!(err, Err(CursorError::NeverServed));
    }
}
