//! Retention ("thinning") engine
//!
//! Partitions a collection of timestamped items into the ones to keep and
//! the ones to discard. Two policies are supported:
//!
//! - `L<n>`: keep the `n` newest items
//! - `<d>D<w>W<m>M`: tiered decay keeping one item per day for `d` days,
//!   one per week for `w` weeks, one per calendar month for `m` months and
//!   one per year for everything older
//!
//! The engine is a pure function of its input and an explicit reference
//! time. Resolving "now" is left to the caller so decisions are
//! reproducible.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use sitebackup_core::thinning::ThinningStrategy;
//!
//! let strategy: ThinningStrategy = "L2".parse().unwrap();
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let decision = strategy.apply(vec![day(1), day(3), day(2)], day(4));
//!
//! assert_eq!(decision.keep, vec![day(3), day(2)]);
//! assert_eq!(decision.discard, vec![day(1)]);
//! ```

mod decay;
mod strategy;

pub use strategy::ThinningStrategy;

use chrono::NaiveDateTime;

/// Anything carrying the point in time the retention engine sorts by
pub trait Timestamped {
    /// Point in time of the item
    fn timestamp(&self) -> NaiveDateTime;
}

impl Timestamped for NaiveDateTime {
    fn timestamp(&self) -> NaiveDateTime {
        *self
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn timestamp(&self) -> NaiveDateTime {
        (**self).timestamp()
    }
}

/// Outcome of a retention decision
///
/// `keep` and `discard` are disjoint and together hold every input item.
/// Both are ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision<T> {
    /// Items to retain
    pub keep: Vec<T>,

    /// Items to remove
    pub discard: Vec<T>,
}

impl<T> Decision<T> {
    /// Total number of items the decision covers
    pub fn len(&self) -> usize {
        self.keep.len() + self.discard.len()
    }

    /// True when the decision covers no items
    pub fn is_empty(&self) -> bool {
        self.keep.is_empty() && self.discard.is_empty()
    }
}

impl<T> Default for Decision<T> {
    fn default() -> Self {
        Self {
            keep: Vec::new(),
            discard: Vec::new(),
        }
    }
}
