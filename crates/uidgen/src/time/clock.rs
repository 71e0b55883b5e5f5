use core::{fmt, str::FromStr};

use crate::time::{DEFAULT_EPOCH_OFFSET, DEFAULT_JULIAN_OFFSET, EpochClock, JulianClock, TimeSource};

/// The time source variants selectable at startup.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockKind {
    /// [`EpochClock`]: milliseconds since a configured epoch.
    #[default]
    Epoch,
    /// [`JulianClock`]: `YY DDD SSSSS` calendar composite, seconds resolution.
    Julian,
}

impl ClockKind {
    /// The offset used when the operator does not configure one.
    pub const fn default_offset(self) -> i64 {
        match self {
            Self::Epoch => DEFAULT_EPOCH_OFFSET,
            Self::Julian => DEFAULT_JULIAN_OFFSET,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Epoch => "epoch",
            Self::Julian => "julian",
        }
    }
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a clock name is neither `epoch` nor `julian`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown time source `{0}` (expected `epoch` or `julian`)")]
pub struct ParseClockKindError(String);

impl FromStr for ClockKind {
    type Err = ParseClockKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epoch" => Ok(Self::Epoch),
            "julian" => Ok(Self::Julian),
            _ => Err(ParseClockKindError(s.to_owned())),
        }
    }
}

/// A time source chosen at runtime.
///
/// All issuers in a pool share one `Clock`; it is `Copy` and carries no
/// mutable state, so sharing it needs no synchronization.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Clock {
    Epoch(EpochClock),
    Julian(JulianClock),
}

impl Clock {
    pub const fn new(kind: ClockKind, offset: i64) -> Self {
        match kind {
            ClockKind::Epoch => Self::Epoch(EpochClock::new(offset)),
            ClockKind::Julian => Self::Julian(JulianClock::new(offset)),
        }
    }

    /// Builds the given kind with its default offset.
    pub const fn with_default_offset(kind: ClockKind) -> Self {
        Self::new(kind, kind.default_offset())
    }

    pub const fn kind(&self) -> ClockKind {
        match self {
            Self::Epoch(_) => ClockKind::Epoch,
            Self::Julian(_) => ClockKind::Julian,
        }
    }

    pub const fn offset(&self) -> i64 {
        match self {
            Self::Epoch(clock) => clock.offset(),
            Self::Julian(clock) => clock.offset(),
        }
    }
}

impl TimeSource for Clock {
    fn current_time(&self) -> i64 {
        match self {
            Self::Epoch(clock) => clock.current_time(),
            Self::Julian(clock) => clock.current_time(),
        }
    }
}
