//! Integer-minute timestamps (spec §4.2). A [`Minutes`] is a signed count
//! of minutes since the implicit epoch `01-01 00:00`; ordering and
//! addition are exact integer operations, and [`Minutes::INF`] is the
//! sentinel for "never departs" / "unbounded".
//!
//! Decomposition into date/clock and `MM-DD[ HH:MM]` parsing/formatting
//! are implemented against `chrono::NaiveDate`, anchored at a fixed
//! implicit year, so that the calendar arithmetic (how many days in each
//! month) doesn't have to be reinvented by hand.

use std::{
    fmt,
    ops::{Add, Sub},
};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The implicit calendar year every `MM-DD` is anchored to. Trains and
/// sale windows only ever reference month/day/hour/minute; the year is
/// a fixed internal encoding detail (spec §3: "treat year/month/day/
/// hour/minute as a canonical encoding").
const EPOCH_YEAR: i32 = 2024;

const MINUTES_PER_DAY: i64 = 24 * 60;

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(EPOCH_YEAR, 1, 1)
        .expect("epoch year is valid")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
}

/// A signed integer-minute timestamp, with a dedicated sentinel for
/// "never" / "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Minutes(i64);

impl Minutes {
    /// Sentinel for a terminal station's leaving time, or an unbounded
    /// range key. Chosen far outside any representable calendar offset
    /// so ordinary arithmetic never collides with it by accident.
    pub const INF: Minutes = Minutes(i64::MAX / 2);

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn from_raw(raw: i64) -> Self {
        Minutes(raw)
    }

    pub fn is_inf(self) -> bool {
        self == Self::INF
    }

    /// The midnight-aligned minute count for this timestamp's day
    /// (spec §4.2: "decompose into date ... and clock").
    pub fn date(self) -> Minutes {
        if self.is_inf() {
            return Self::INF;
        }
        Minutes(self.0.div_euclid(MINUTES_PER_DAY) * MINUTES_PER_DAY)
    }

    /// Minutes past midnight on this timestamp's day.
    pub fn clock(self) -> i64 {
        if self.is_inf() {
            return 0;
        }
        self.0.rem_euclid(MINUTES_PER_DAY)
    }

    /// Parse `MM-DD` (clock defaults to `00:00`).
    pub fn parse_date(s: &str) -> Result<Minutes, CoreError> {
        Self::parse(s, "00:00")
    }

    /// Parse `MM-DD HH:MM`.
    pub fn parse_date_time(s: &str) -> Result<Minutes, CoreError> {
        let (date_part, time_part) = s
            .split_once(' ')
            .ok_or(CoreError::Arg("expected 'MM-DD HH:MM'"))?;
        Self::parse(date_part, time_part)
    }

    fn parse(date_part: &str, time_part: &str) -> Result<Minutes, CoreError> {
        let (month, day) = date_part
            .split_once('-')
            .ok_or(CoreError::Arg("expected 'MM-DD'"))?;
        let month: u32 = month.parse().map_err(|_| CoreError::Arg("bad month"))?;
        let day: u32 = day.parse().map_err(|_| CoreError::Arg("bad day"))?;
        let (hour, minute) = time_part
            .split_once(':')
            .ok_or(CoreError::Arg("expected 'HH:MM'"))?;
        let hour: u32 = hour.parse().map_err(|_| CoreError::Arg("bad hour"))?;
        let minute: u32 = minute.parse().map_err(|_| CoreError::Arg("bad minute"))?;

        let date = NaiveDate::from_ymd_opt(EPOCH_YEAR, month, day)
            .ok_or(CoreError::Arg("date out of calendar range"))?;
        let dt = date
            .and_hms_opt(hour, minute, 0)
            .ok_or(CoreError::Arg("time out of range"))?;
        Ok(Minutes((dt - epoch()).num_minutes()))
    }

    /// Render as `MM-DD HH:MM`, or `xx-xx xx:xx` for [`Minutes::INF`].
    pub fn format(self) -> String {
        if self.is_inf() {
            return "xx-xx xx:xx".to_string();
        }
        let dt = epoch() + chrono::Duration::minutes(self.0);
        format!(
            "{:02}-{:02} {:02}:{:02}",
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute()
        )
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl Add<i64> for Minutes {
    type Output = Minutes;

    fn add(self, rhs: i64) -> Minutes {
        if self.is_inf() {
            return self;
        }
        Minutes(self.0 + rhs)
    }
}

impl Add<Minutes> for Minutes {
    type Output = Minutes;

    fn add(self, rhs: Minutes) -> Minutes {
        if self.is_inf() || rhs.is_inf() {
            return Minutes::INF;
        }
        Minutes(self.0 + rhs.0)
    }
}

/// Subtraction stays in `Minutes`, not a plain duration: the spec's own
/// arithmetic reuses the same type for both an absolute timestamp and a
/// duration (e.g. `startDay = date - leavingTimes[from].date()` produces
/// a new absolute day; `arrivingTime - leavingTime` produces a duration
/// meant to be read via [`Minutes::raw`]). Both are exact integer-minute
/// operations on the same representation.
impl Sub<Minutes> for Minutes {
    type Output = Minutes;

    fn sub(self, rhs: Minutes) -> Minutes {
        if self.is_inf() || rhs.is_inf() {
            return Minutes::INF;
        }
        Minutes(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_regular_timestamp() {
        let t = Minutes::parse_date_time("06-01 08:00").unwrap();
        assert_eq!(t.format(), "06-01 08:00");
    }

    #[test]
    fn formats_date_only_as_midnight() {
        let t = Minutes::parse_date("06-01").unwrap();
        assert_eq!(t.format(), "06-01 00:00");
    }

    #[test]
    fn inf_formats_as_sentinel() {
        assert_eq!(Minutes::INF.format(), "xx-xx xx:xx");
    }

    #[test]
    fn date_and_clock_decompose_correctly() {
        let t = Minutes::parse_date_time("06-01 08:30").unwrap();
        assert_eq!(t.clock(), 8 * 60 + 30);
        assert_eq!(t.date(), Minutes::parse_date("06-01").unwrap());
    }

    #[test]
    fn ordering_is_total_and_exact() {
        let a = Minutes::parse_date_time("06-01 08:00").unwrap();
        let b = Minutes::parse_date_time("06-01 08:01").unwrap();
        assert!(a < b);
        assert_eq!((b - a).raw(), 1);
    }

    #[test]
    fn adding_offset_crosses_midnight() {
        let t = Minutes::parse_date_time("06-01 23:50").unwrap();
        let later = t + 20i64;
        assert_eq!(later.format(), "06-02 00:10");
    }

    #[test]
    fn inf_absorbs_addition() {
        assert_eq!((Minutes::INF + 100i64), Minutes::INF);
    }
}
