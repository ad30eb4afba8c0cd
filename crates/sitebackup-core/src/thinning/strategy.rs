//! Thinning strategy definitions and parsing

use super::decay::{self, Verdict};
use super::{Decision, Timestamped};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info};

static LATEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^L(-?\d+)").expect("latest regex is valid"));

static TIERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+)D(-?\d+)W(-?\d+)M").expect("tiered regex is valid")
});

/// Retention policy applied to the archives of one label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThinningStrategy {
    /// Keep the newest `n` items
    Latest(NonZeroU32),

    /// Grandfather-father-son schedule
    TieredDecay {
        days: NonZeroU32,
        weeks: NonZeroU32,
        months: NonZeroU32,
    },
}

impl ThinningStrategy {
    /// Create a keep-latest strategy; `count` must be positive
    pub fn latest(count: u32) -> Result<Self> {
        let count = NonZeroU32::new(count).ok_or_else(|| Error::non_positive(format!("L{count}")))?;
        Ok(Self::Latest(count))
    }

    /// Create a tiered decay strategy; all parameters must be positive
    pub fn tiered(days: u32, weeks: u32, months: u32) -> Result<Self> {
        let code = || format!("{days}D{weeks}W{months}M");
        match (
            NonZeroU32::new(days),
            NonZeroU32::new(weeks),
            NonZeroU32::new(months),
        ) {
            (Some(days), Some(weeks), Some(months)) => Ok(Self::TieredDecay {
                days,
                weeks,
                months,
            }),
            _ => Err(Error::non_positive(code())),
        }
    }

    /// Human readable name of the policy
    pub fn describe(&self) -> String {
        match self {
            Self::Latest(count) => format!("LATEST {count}"),
            Self::TieredDecay { .. } => format!("THIN OUT {self}"),
        }
    }

    /// Decide which items to keep, using the item's own timestamp
    pub fn apply<T: Timestamped>(&self, items: Vec<T>, reference: NaiveDateTime) -> Decision<T> {
        self.apply_by(items, reference, T::timestamp)
    }

    /// Decide which items to keep, projecting each item to its timestamp with `key`
    ///
    /// Items are ordered newest first; items sharing a timestamp keep their
    /// input order. `reference` is only consulted by the tiered policy, which
    /// normalises it to midnight.
    pub fn apply_by<T, F>(&self, items: Vec<T>, reference: NaiveDateTime, key: F) -> Decision<T>
    where
        F: Fn(&T) -> NaiveDateTime,
    {
        let mut stamped: Vec<(NaiveDateTime, T)> =
            items.into_iter().map(|item| (key(&item), item)).collect();
        stamped.sort_by(|a, b| b.0.cmp(&a.0));

        let stamps: Vec<NaiveDateTime> = stamped.iter().map(|(ts, _)| *ts).collect();

        info!("Applying thinning strategy {} to {} items", self, stamps.len());
        let verdicts = match *self {
            Self::Latest(count) => decay::latest(&stamps, count.get() as usize),
            Self::TieredDecay {
                days,
                weeks,
                months,
            } => decay::tiered(&stamps, days.get(), weeks.get(), months.get(), reference),
        };

        let mut decision = Decision::default();
        for ((ts, item), verdict) in stamped.into_iter().zip(verdicts) {
            match verdict {
                Verdict::Keep => {
                    debug!("KEEP {}", ts);
                    decision.keep.push(item);
                }
                Verdict::Discard => {
                    debug!("DROP {}", ts);
                    decision.discard.push(item);
                }
            }
        }

        info!(
            "Thinning strategy {} keeps {} and discards {} items",
            self,
            decision.keep.len(),
            decision.discard.len()
        );
        decision
    }
}

impl fmt::Display for ThinningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest(count) => write!(f, "L{count}"),
            Self::TieredDecay {
                days,
                weeks,
                months,
            } => write!(f, "{days}D{weeks}W{months}M"),
        }
    }
}

impl FromStr for ThinningStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(caps) = LATEST_RE.captures(s) {
            let count = parse_parameter(s, &caps[1])?;
            return Self::latest(count);
        }

        if let Some(caps) = TIERED_RE.captures(s) {
            let days = parse_parameter(s, &caps[1])?;
            let weeks = parse_parameter(s, &caps[2])?;
            let months = parse_parameter(s, &caps[3])?;
            return Self::tiered(days, weeks, months).map_err(|_| Error::non_positive(s));
        }

        Err(Error::invalid_strategy(s))
    }
}

/// Parse one numeric parameter of a strategy code
fn parse_parameter(input: &str, digits: &str) -> Result<u32> {
    let value: i64 = digits.parse().map_err(|_| Error::invalid_strategy(input))?;
    if value <= 0 {
        return Err(Error::non_positive(input));
    }
    u32::try_from(value).map_err(|_| Error::invalid_strategy(input))
}
