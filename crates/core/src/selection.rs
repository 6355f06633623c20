//! Pure index selection for ordered and unordered traversal.
//!
//! The functions here only decide *which* index comes next. Recording the
//! choice, and serializing concurrent choices for the same learner, is the
//! progress store's job.

use rand::Rng;
use thiserror::Error;

use crate::model::TraversalMode;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    #[error("index {index} is out of range for a category of {count} words")]
    OutOfRange { index: usize, count: usize },
    #[error("category has no words")]
    Empty,
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Choose the index to serve next.
///
/// * `previous` is the index served last for this learner, if any.
/// * `reported` is the index the client reports; only ordered mode uses it.
/// * `count` is the number of words in the category.
///
/// # Errors
///
/// Returns `IndexError::Empty` when `count == 0`, and
/// `IndexError::OutOfRange` when an ordered `reported` index is `>= count`.
pub fn next_index<R: Rng>(
    rng: &mut R,
    mode: TraversalMode,
    previous: Option<usize>,
    reported: usize,
    count: usize,
) -> Result<usize, IndexError> {
    if count == 0 {
        return Err(IndexError::Empty);
    }
    match mode {
        TraversalMode::Ordered => ordered_index(reported, count),
        TraversalMode::Unordered => Ok(unordered_index(rng, previous, count)),
    }
}

/// Validate a client-driven index. Out-of-range values are rejected, never clamped.
///
/// # Errors
///
/// Returns `IndexError::OutOfRange` when `reported >= count`.
pub fn ordered_index(reported: usize, count: usize) -> Result<usize, IndexError> {
    if reported < count {
        Ok(reported)
    } else {
        Err(IndexError::OutOfRange {
            index: reported,
            count,
        })
    }
}

/// Draw uniformly from `[0, count)` excluding `previous`.
///
/// A `previous` outside the range (for example after the catalog changed) is
/// ignored. With a single word the only answer is `0`.
///
/// `count` must be non-zero.
pub fn unordered_index<R: Rng>(
    rng: &mut R,
    previous: Option<usize>,
    count: usize,
) -> usize {
    match previous.filter(|&prev| prev < count) {
        Some(prev) if count > 1 => {
            // Draw over the count - 1 remaining slots and step over `prev`.
            let draw = rng.random_range(0..count - 1);
            if draw >= prev { draw + 1 } else { draw }
        }
        _ => rng.random_range(0..count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn ordered_returns_reported_index() {
        let mut rng = StdRng::seed_from_u64(7);
        for index in 0..10 {
            let next = next_index(&mut rng, TraversalMode::Ordered, Some(3), index, 10).unwrap();
            assert_eq!(next, index);
        }
    }

    #[test]
    fn ordered_rejects_out_of_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = next_index(&mut rng, TraversalMode::Ordered, None, 12, 10).unwrap_err();
        assert_eq!(err, IndexError::OutOfRange { index: 12, count: 10 });
        assert_eq!(
            ordered_index(10, 10),
            Err(IndexError::OutOfRange { index: 10, count: 10 })
        );
    }

    #[test]
    fn empty_category_is_an_error_in_both_modes() {
        let mut rng = StdRng::seed_from_u64(7);
        for mode in [TraversalMode::Ordered, TraversalMode::Unordered] {
            assert_eq!(
                next_index(&mut rng, mode, None, 0, 0),
                Err(IndexError::Empty)
            );
        }
    }

    #[test]
    fn unordered_never_repeats_previous() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut previous = None;
        for _ in 0..2_000 {
            let next = unordered_index(&mut rng, previous, 5);
            assert!(next < 5);
            assert_ne!(Some(next), previous);
            previous = Some(next);
        }
    }

    #[test]
    fn unordered_single_word_is_always_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(unordered_index(&mut rng, None, 1), 0);
        for _ in 0..50 {
            assert_eq!(unordered_index(&mut rng, Some(0), 1), 0);
        }
    }

    #[test]
    fn unordered_ignores_stale_previous() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(unordered_index(&mut rng, Some(40), 4) < 4);
        }
    }

    #[test]
    fn unordered_is_not_biased_toward_the_start() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut hits = [0_u32; 4];
        for _ in 0..6_000 {
            hits[unordered_index(&mut rng, Some(0), 4)] += 1;
        }
        assert_eq!(hits[0], 0);
        // Expected ~2000 each for the three remaining candidates.
        for &count in &hits[1..] {
            assert!((1_700..=2_300).contains(&count), "skewed draw: {hits:?}");
        }
    }
}
