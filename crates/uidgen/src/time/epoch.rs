use chrono::Utc;

use crate::time::TimeSource;

/// Default offset for [`EpochClock`]: Thursday, January 1, 2015 00:00:00 UTC,
/// in milliseconds since the Unix epoch.
pub const DEFAULT_EPOCH_OFFSET: i64 = 1_420_070_400_000;

/// Wall-clock milliseconds since the Unix epoch, minus a fixed offset.
///
/// Resolution is one millisecond. The clock follows the system wall clock, so
/// it goes backwards whenever the wall clock does (NTP step, manual change);
/// issuers detect that and refuse to generate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EpochClock {
    offset: i64,
}

impl Default for EpochClock {
    fn default() -> Self {
        Self::new(DEFAULT_EPOCH_OFFSET)
    }
}

impl EpochClock {
    /// `offset` is in milliseconds since 1970-01-01T00:00:00Z and becomes
    /// tick zero.
    pub const fn new(offset: i64) -> Self {
        Self { offset }
    }

    pub const fn offset(&self) -> i64 {
        self.offset
    }
}

impl TimeSource for EpochClock {
    fn current_time(&self) -> i64 {
        Utc::now().timestamp_millis().saturating_sub(self.offset)
    }
}
