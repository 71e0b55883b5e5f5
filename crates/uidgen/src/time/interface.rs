use std::sync::Arc;

/// A source of integer ticks used as the timestamp field of every ID.
///
/// Implementations must be safe to read from many issuers at once without
/// any locking: a time source is a pure function of the system clock plus a
/// fixed offset. Ticks are expected to be non-decreasing; an issuer that
/// observes a tick below the last one it used fails with
/// [`Error::ClockRegression`](crate::Error::ClockRegression).
///
/// # Example
///
/// ```
/// use uidgen::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_time(&self) -> i64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_time(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current tick, relative to the source's offset.
    fn current_time(&self) -> i64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_time(&self) -> i64 {
        (**self).current_time()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_time(&self) -> i64 {
        (**self).current_time()
    }
}
