//! Pure calendar-period arithmetic.
//!
//! A [`Period`] is a (year, month) pair, comparable through an integer
//! ordinal (`year * 12 + month - 1`) so periods can be ordered, subtracted,
//! and shifted without touching a date library. Day-of-month handling is
//! deliberately forgiving: stored due days may be out of range and are
//! clamped, never rejected.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A calendar (year, month) pair - the unit of applicability, payment
/// status, and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
}

impl Period {
    /// Creates a period from a year and a 1-based month.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The period containing the given date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The current real-world period (UTC).
    #[must_use]
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// Comparable ordinal: `year * 12 + (month - 1)`. Used for ordering and
    /// subtraction only, never displayed.
    #[must_use]
    pub const fn index(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// Inverse of [`Period::index`].
    #[must_use]
    pub const fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Adds `delta` months, carrying into the year as needed.
    #[must_use]
    pub const fn shift(self, delta: i32) -> Self {
        Self::from_index(self.index() + delta as i64)
    }

    /// The trailing window of `n` periods ending at `self`, inclusive,
    /// oldest first.
    #[must_use]
    pub fn trailing(self, n: usize) -> Vec<Self> {
        (0..n)
            .rev()
            .map(|offset| Self::from_index(self.index() - offset as i64))
            .collect()
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Clamps a stored due-day value into the accepted 1-31 range.
///
/// Out-of-range values may exist in persisted rows; they are coerced here
/// rather than rejected at read time.
#[must_use]
pub const fn clamp_day(day: i32) -> u32 {
    if day < 1 {
        1
    } else if day > 31 {
        31
    } else {
        day as u32
    }
}

const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in the given month.
#[must_use]
pub const fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// The due date for `day` within `period`, with the day clamped first to
/// 1-31 and then to the month's length. Day 31 in February lands on the
/// last day of February; it never rolls into March.
#[must_use]
pub fn due_date_in(period: Period, day: i32) -> NaiveDate {
    let clamped = clamp_day(day).min(days_in_month(period.year, period.month));
    // clamped is a valid day of this month, so construction cannot fail
    NaiveDate::from_ymd_opt(period.year, period.month, clamped).unwrap_or_default()
}

/// The next date on which a bill with the given due day falls, relative to
/// `base`. Builds the due date in `base`'s month; if that is strictly
/// before `base`, rolls forward one month. The result is always >= `base`
/// (same-day counts as due).
#[must_use]
pub fn next_due_date(day: i32, base: NaiveDate) -> NaiveDate {
    let period = Period::from_date(base);
    let due = due_date_in(period, day);
    if due < base {
        due_date_in(period.shift(1), day)
    } else {
        due
    }
}
