use core::time::Duration;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `uidgen` can emit.
///
/// Only [`Error::ClockRegression`] and [`Error::TimestampOutOfRange`] can come
/// out of ID generation itself. Everything else is a construction or pool
/// checkout failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The time source reported a tick earlier than the last tick an issuer
    /// handed out. Generation cannot continue without risking a duplicate.
    #[error("clock moved backwards: now {now} is behind last issued tick {last}")]
    ClockRegression {
        /// The tick the time source just reported.
        now: i64,
        /// The last tick persisted by the issuer.
        last: i64,
    },

    /// The time source reported a tick that does not fit the timestamp field
    /// (negative, or wider than the layout allows).
    #[error("tick {timestamp} does not fit the timestamp field (max {max})")]
    TimestampOutOfRange { timestamp: i64, max: u64 },

    /// A node id larger than the layout's node field.
    #[error("node id {node_id} out of range (max {max})")]
    NodeIdOutOfRange { node_id: u64, max: u64 },

    /// An issuer id larger than the layout's issuer field.
    #[error("issuer id {issuer_id} out of range (max {max})")]
    IssuerIdOutOfRange { issuer_id: u64, max: u64 },

    /// A pool must hold between one and `max` issuers.
    #[error("pool size {size} out of range (1..={max})")]
    PoolSizeOutOfRange { size: usize, max: usize },

    /// No issuer was released back to the pool before the deadline.
    #[error("no issuer became available within {0:?}")]
    AcquireTimeout(Duration),

    /// The pool's queue was torn down while a caller was waiting on it.
    #[error("issuer pool disconnected")]
    PoolDisconnected,

    /// An issuer's lock was poisoned by a panic in another thread.
    ///
    /// Poisoning is permanent: every later call on that issuer fails with
    /// this error. A pooled issuer is still returned to its pool when the
    /// panicking caller unwinds, so later checkouts of the same slot fail
    /// too until the pool is rebuilt.
    ///
    /// With the `parking-lot` feature mutexes do not poison, so this variant
    /// is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("issuer lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
