use core::{cmp::Ordering, fmt, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::{Mutex, MutexGuard},
    id::{Layout, Uid},
    time::TimeSource,
};

/// How long an exhausted issuer sleeps between clock reads while waiting for
/// the next tick.
pub const TICK_POLL_INTERVAL: Duration = Duration::from_micros(50);

/// The last `(timestamp, sequence)` pair an issuer handed out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick {
    pub timestamp: i64,
    pub sequence: u64,
}

/// A lock-based ID issuer bound to one `(node id, issuer id)` pair.
///
/// Every ID an issuer produces carries its node and issuer ids, so two
/// issuers with different pairs can never collide even when they emit the
/// same `(timestamp, sequence)`. Within one issuer, the `(timestamp,
/// sequence)` pairs it emits are strictly increasing across all calls.
///
/// The mutable state sits behind a mutex scoped to the issuer. Exclusive
/// checkout through an [`IssuerPool`] already guarantees a single caller, but
/// the lock keeps a shared `&Issuer` correct as well.
///
/// ## See Also
/// - [`IssuerPool`]
///
/// [`IssuerPool`]: crate::IssuerPool
pub struct Issuer<T>
where
    T: TimeSource,
{
    node_id: u64,
    issuer_id: u64,
    layout: Layout,
    state: Mutex<Option<Tick>>,
    time: T,
}

impl<T> Issuer<T>
where
    T: TimeSource,
{
    /// Creates an issuer using [`Layout::DEFAULT`].
    ///
    /// # Errors
    ///
    /// Fails if `node_id` exceeds 7 or `issuer_id` exceeds 31.
    ///
    /// # Example
    /// ```
    /// use uidgen::{EpochClock, Issuer};
    ///
    /// let issuer = Issuer::new(5, 3, EpochClock::default()).unwrap();
    /// let ids = issuer.generate(4).unwrap();
    ///
    /// assert_eq!(ids.len(), 4);
    /// assert!(ids.windows(2).all(|w| w[0] < w[1]));
    /// assert_eq!(ids[0].components().node_id, 5);
    /// assert_eq!(ids[0].components().issuer_id, 3);
    /// ```
    pub fn new(node_id: u64, issuer_id: u64, time: T) -> Result<Self> {
        Self::with_layout(Layout::DEFAULT, node_id, issuer_id, time)
    }

    /// Creates an issuer packing IDs with a custom [`Layout`].
    ///
    /// # Errors
    ///
    /// Fails if either id does not fit its field in `layout`.
    pub fn with_layout(layout: Layout, node_id: u64, issuer_id: u64, time: T) -> Result<Self> {
        if node_id > layout.max_node_id() {
            return Err(Error::NodeIdOutOfRange {
                node_id,
                max: layout.max_node_id(),
            });
        }
        if issuer_id > layout.max_issuer_id() {
            return Err(Error::IssuerIdOutOfRange {
                issuer_id,
                max: layout.max_issuer_id(),
            });
        }
        Ok(Self {
            node_id,
            issuer_id,
            layout,
            state: Mutex::new(None),
            time,
        })
    }

    pub const fn node_id(&self) -> u64 {
        self.node_id
    }

    pub const fn issuer_id(&self) -> u64 {
        self.issuer_id
    }

    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The last tick persisted by [`Issuer::generate`], or `None` before the
    /// first successful call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the lock is poisoned (std mutex
    /// only).
    pub fn last_tick(&self) -> Result<Option<Tick>> {
        Ok(*self.lock()?)
    }

    /// Generates `count` IDs in strictly increasing order.
    ///
    /// A `count` of zero or less is treated as one.
    ///
    /// This call **blocks**: it holds the issuer's lock for the whole batch,
    /// and when the current tick runs out of sequence numbers it sleeps in
    /// [`TICK_POLL_INTERVAL`] steps until the time source moves to a later
    /// tick. With a one-second time source that can take up to a second per
    /// 1024 IDs. Async callers should run it on a blocking thread.
    ///
    /// The call either returns the whole batch or fails without touching the
    /// issuer's state.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the time source reports a tick below
    ///   the last one this issuer used.
    /// - [`Error::TimestampOutOfRange`] if a tick does not fit the timestamp
    ///   field.
    /// - [`Error::LockPoisoned`] if the lock is poisoned (std mutex only).
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(node_id = self.node_id, issuer_id = self.issuer_id))
    )]
    pub fn generate(&self, count: i64) -> Result<Vec<Uid>> {
        let count = batch_len(count);
        let mut last = self.lock()?;

        let mut now = self.checked_tick(self.time.current_time())?;
        let mut sequence = match *last {
            None => 0,
            Some(tick) => match now.cmp(&tick.timestamp) {
                Ordering::Greater => 0,
                Ordering::Equal => tick.sequence + 1,
                Ordering::Less => return Err(Self::cold_clock_behind(now, tick.timestamp)),
            },
        };

        let mut ids = Vec::with_capacity(count.min(MAX_PREALLOCATED));
        loop {
            if sequence > self.layout.max_sequence() {
                now = self.wait_for_next_tick(now)?;
                sequence = 0;
            }

            ids.push(self.pack(now, sequence));
            if ids.len() == count {
                break;
            }
            sequence += 1;
        }

        *last = Some(Tick {
            timestamp: now,
            sequence,
        });
        Ok(ids)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Tick>>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    fn pack(&self, timestamp: i64, sequence: u64) -> Uid {
        // `checked_tick` guarantees a non-negative, in-range timestamp.
        Uid::from_components(
            &self.layout,
            timestamp as u64,
            self.node_id,
            self.issuer_id,
            sequence,
        )
    }

    fn checked_tick(&self, tick: i64) -> Result<i64> {
        let max = self.layout.max_timestamp();
        match u64::try_from(tick) {
            Ok(ts) if ts <= max => Ok(tick),
            _ => Err(Error::TimestampOutOfRange {
                timestamp: tick,
                max,
            }),
        }
    }

    /// Polls the time source until it reports a tick strictly after
    /// `current`. Only this issuer's own lock is held while waiting.
    #[cold]
    #[inline(never)]
    fn wait_for_next_tick(&self, current: i64) -> Result<i64> {
        #[cfg(feature = "tracing")]
        tracing::trace!(tick = current, "sequence exhausted, waiting for next tick");

        loop {
            let next = self.time.current_time();
            if next > current {
                return self.checked_tick(next);
            }
            std::thread::sleep(TICK_POLL_INTERVAL);
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: i64, last: i64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(now, last, "clock moved backwards");

        Error::ClockRegression { now, last }
    }
}

impl<T> fmt::Debug for Issuer<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Issuer")
            .field("node_id", &self.node_id)
            .field("issuer_id", &self.issuer_id)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

// Large batches grow the vector instead of reserving it up front.
const MAX_PREALLOCATED: usize = 1 << 16;

/// Coerces a requested batch size to at least one.
fn batch_len(count: i64) -> usize {
    usize::try_from(count.max(1)).unwrap_or(usize::MAX)
}
