//! Decision rules behind the thinning strategies
//!
//! Both rules take timestamps sorted newest first and return one verdict per
//! position.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Keep,
    Discard,
}

/// Keep the first `count` positions
pub(crate) fn latest(sorted: &[NaiveDateTime], count: usize) -> Vec<Verdict> {
    (0..sorted.len())
        .map(|i| if i < count { Verdict::Keep } else { Verdict::Discard })
        .collect()
}

/// Tiered decay over days, weeks, calendar months and years
///
/// Windows are half-open date ranges `[start, end)` walking backwards from
/// the reference date. Each window keeps its oldest item.
pub(crate) fn tiered(
    sorted: &[NaiveDateTime],
    days: u32,
    weeks: u32,
    months: u32,
    reference: NaiveDateTime,
) -> Vec<Verdict> {
    let fix = reference.date();
    let mut windows = Windows::new(sorted);

    if sorted.is_empty() {
        return Vec::new();
    }

    // the newest item survives unconditionally
    windows.verdicts[0] = Some(Verdict::Keep);

    // nothing dated on or after the reference day is ever dropped
    windows.keep_all(fix, NaiveDate::MAX);

    for offset in 0..days {
        let end = days_before(fix, u64::from(offset));
        if windows.exhausted(end) {
            break;
        }
        windows.keep_oldest(days_before(end, 1), end, "day");
    }

    let days_end = days_before(fix, u64::from(days));
    for week in 0..weeks {
        let end = days_before(days_end, u64::from(week) * 7);
        if windows.exhausted(end) {
            break;
        }
        windows.keep_oldest(days_before(end, 7), end, "week");
    }

    // the fractional week up to the month boundary is kept as a whole
    let weeks_end = days_before(days_end, u64::from(weeks) * 7);
    let fix_month = weeks_end.with_day(1).unwrap_or(weeks_end);
    windows.keep_all(fix_month, weeks_end);

    for month in 0..months {
        let end = months_before(fix_month, month);
        if windows.exhausted(end) {
            break;
        }
        windows.keep_oldest(months_before(fix_month, month + 1), end, "month");
    }

    let mut year_end = months_before(fix_month, months);
    if let Some(oldest) = windows.oldest_pending() {
        while oldest < year_end {
            let start = months_before(year_end, 12);
            windows.keep_oldest(start, year_end, "year");
            year_end = start;
        }
    }

    // every position lies in exactly one window above
    windows
        .verdicts
        .into_iter()
        .map(|v| v.unwrap_or(Verdict::Keep))
        .collect()
}

/// Bookkeeping of verdicts per position while walking the windows
struct Windows<'a> {
    sorted: &'a [NaiveDateTime],
    verdicts: Vec<Option<Verdict>>,
}

impl<'a> Windows<'a> {
    fn new(sorted: &'a [NaiveDateTime]) -> Self {
        Self {
            sorted,
            verdicts: vec![None; sorted.len()],
        }
    }

    /// Undecided positions dated within `[start, end)`, newest first
    fn pending_in(&self, start: NaiveDate, end: NaiveDate) -> Vec<usize> {
        self.sorted
            .iter()
            .enumerate()
            .filter(|(i, ts)| {
                self.verdicts[*i].is_none() && start <= ts.date() && ts.date() < end
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn keep_all(&mut self, start: NaiveDate, end: NaiveDate) {
        for i in self.pending_in(start, end) {
            self.verdicts[i] = Some(Verdict::Keep);
        }
    }

    fn keep_oldest(&mut self, start: NaiveDate, end: NaiveDate, unit: &str) {
        let positions = self.pending_in(start, end);
        if let Some((&oldest, rest)) = positions.split_last() {
            debug!(
                "{} [{}, {}): keeping {}, dropping {}",
                unit,
                start,
                end,
                self.sorted[oldest],
                rest.len()
            );
            self.verdicts[oldest] = Some(Verdict::Keep);
            for &i in rest {
                self.verdicts[i] = Some(Verdict::Discard);
            }
        }
    }

    /// No undecided position is dated before `end`
    fn exhausted(&self, end: NaiveDate) -> bool {
        self.oldest_pending().is_none_or(|oldest| oldest >= end)
    }

    fn oldest_pending(&self) -> Option<NaiveDate> {
        self.sorted
            .iter()
            .zip(&self.verdicts)
            .rev()
            .find(|(_, v)| v.is_none())
            .map(|(ts, _)| ts.date())
    }
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}
