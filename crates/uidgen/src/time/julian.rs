use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::time::TimeSource;

/// Default offset for [`JulianClock`]: 2020-01-01 00:00:00 UTC in the
/// calendar-composite encoding (`20` `001` `00000`).
pub const DEFAULT_JULIAN_OFFSET: i64 = 2_000_100_000;

/// A calendar-composite clock with one-second resolution.
///
/// Each tick is the decimal concatenation of the last two digits of the UTC
/// year, the zero-padded 3-digit day of the year, and the zero-padded 5-digit
/// second of the day, minus a fixed offset. 2020-10-12T13:14:15Z encodes as
/// `20` `286` `47655`, i.e. `2028647655`.
///
/// The encoding is not monotonic across a year boundary: 99-12-31 encodes to
/// a larger value than 00-01-01, and every new year restarts the day field at
/// `001`. Issuers treat the drop at new year as a clock regression. Deployments
/// spanning a new year must re-tune the offset or switch to [`EpochClock`].
///
/// [`EpochClock`]: crate::EpochClock
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct JulianClock {
    offset: i64,
}

impl Default for JulianClock {
    fn default() -> Self {
        Self::new(DEFAULT_JULIAN_OFFSET)
    }
}

impl JulianClock {
    pub const fn new(offset: i64) -> Self {
        Self { offset }
    }

    pub const fn offset(&self) -> i64 {
        self.offset
    }
}

impl TimeSource for JulianClock {
    fn current_time(&self) -> i64 {
        julian_timestamp(Utc::now(), self.offset)
    }
}

/// Encodes `time` as `YY DDD SSSSS` (2 + 3 + 5 decimal digits) and subtracts
/// `offset`.
pub fn julian_timestamp(time: DateTime<Utc>, offset: i64) -> i64 {
    let year = i64::from(time.year().rem_euclid(100));
    let day_of_year = i64::from(time.ordinal());
    let second_of_day = i64::from(time.num_seconds_from_midnight());

    (year * 100_000_000 + day_of_year * 100_000 + second_of_day).saturating_sub(offset)
}
