//! Bounded pool of exclusively checked-out issuers.
//!
//! The pool owns one [`Issuer`] per issuer-id slot and keeps the idle ones in
//! a bounded [`crossbeam_channel`] queue. The queue doubles as a counting
//! semaphore: a caller that finds it empty blocks until another caller
//! releases its issuer. Since each issuer value lives in exactly one place
//! (the queue or one caller's [`PooledIssuer`]), two callers can never hold
//! the same `(node id, issuer id)` pair at once.

use core::{fmt, ops::Deref, time::Duration};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};

use crate::{
    error::{Error, Result},
    generator::Issuer,
    id::Layout,
    time::TimeSource,
};

/// A fixed set of issuers sharing one node id and one time source.
///
/// # Example
///
/// ```
/// use uidgen::{EpochClock, IssuerPool};
///
/// let pool = IssuerPool::new(2, EpochClock::default()).unwrap();
/// assert_eq!(pool.capacity(), 31);
///
/// let issuer = pool.acquire().unwrap();
/// let ids = issuer.generate(10).unwrap();
/// issuer.release();
///
/// assert_eq!(ids.len(), 10);
/// assert_eq!(pool.available(), 31);
/// ```
pub struct IssuerPool<T>
where
    T: TimeSource,
{
    node_id: u64,
    capacity: usize,
    tx: Sender<Issuer<T>>,
    rx: Receiver<Issuer<T>>,
}

impl<T> IssuerPool<T>
where
    T: TimeSource + Clone,
{
    /// Builds one issuer for every issuer id from 1 through the layout
    /// maximum (31).
    ///
    /// # Errors
    ///
    /// Fails if `node_id` exceeds 7.
    pub fn new(node_id: u64, time: T) -> Result<Self> {
        Self::with_size(node_id, time, Self::max_size())
    }

    /// Builds issuers with ids `1..=size`.
    ///
    /// Use this when fewer concurrent callers are expected than there are
    /// issuer-id slots.
    ///
    /// # Errors
    ///
    /// Fails if `node_id` exceeds 7 or `size` is not in `1..=31`.
    pub fn with_size(node_id: u64, time: T, size: usize) -> Result<Self> {
        let max = Self::max_size();
        if size == 0 || size > max {
            return Err(Error::PoolSizeOutOfRange { size, max });
        }

        let (tx, rx) = bounded(size);
        for issuer_id in 1..=size as u64 {
            let issuer = Issuer::new(node_id, issuer_id, time.clone())?;
            tx.try_send(issuer)
                .map_err(|_| Error::PoolDisconnected)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(node_id, size, "issuer pool ready");

        Ok(Self {
            node_id,
            capacity: size,
            tx,
            rx,
        })
    }

    /// The number of issuer-id slots available to a single node.
    pub const fn max_size() -> usize {
        Layout::DEFAULT.max_issuer_id() as usize
    }
}

impl<T> IssuerPool<T>
where
    T: TimeSource,
{
    /// Takes an issuer out of the pool, blocking until one is free.
    ///
    /// Callers beyond the pool's capacity wait here until someone releases.
    /// Wrap the call in [`IssuerPool::acquire_timeout`] to bound the wait.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolDisconnected`] only if the queue has been torn
    /// down, which cannot happen while the pool is alive.
    pub fn acquire(&self) -> Result<PooledIssuer<T>> {
        let issuer = self.rx.recv().map_err(|_| Error::PoolDisconnected)?;
        Ok(self.checkout(issuer))
    }

    /// Takes an issuer if one is free right now.
    pub fn try_acquire(&self) -> Option<PooledIssuer<T>> {
        match self.rx.try_recv() {
            Ok(issuer) => Some(self.checkout(issuer)),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Like [`IssuerPool::acquire`], but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AcquireTimeout`] if nothing was released in time.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<PooledIssuer<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(issuer) => Ok(self.checkout(issuer)),
            Err(RecvTimeoutError::Timeout) => Err(Error::AcquireTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(Error::PoolDisconnected),
        }
    }

    pub const fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Total number of issuers owned by the pool.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of issuers currently idle in the pool.
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    fn checkout(&self, issuer: Issuer<T>) -> PooledIssuer<T> {
        #[cfg(feature = "tracing")]
        tracing::trace!(issuer_id = issuer.issuer_id(), "issuer checked out");

        PooledIssuer {
            issuer: Some(issuer),
            home: self.tx.clone(),
        }
    }
}

impl<T> fmt::Debug for IssuerPool<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerPool")
            .field("node_id", &self.node_id)
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

/// An issuer checked out of an [`IssuerPool`].
///
/// Dereferences to [`Issuer`]. The issuer goes back to the pool exactly once,
/// either through [`PooledIssuer::release`] or when the guard is dropped, so
/// it is returned on every exit path including errors and panics.
pub struct PooledIssuer<T>
where
    T: TimeSource,
{
    issuer: Option<Issuer<T>>,
    home: Sender<Issuer<T>>,
}

impl<T> PooledIssuer<T>
where
    T: TimeSource,
{
    /// Returns the issuer to its pool.
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for PooledIssuer<T>
where
    T: TimeSource,
{
    type Target = Issuer<T>;

    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the issuer out.
        match &self.issuer {
            Some(issuer) => issuer,
            None => unreachable!("pooled issuer used after release"),
        }
    }
}

impl<T> Drop for PooledIssuer<T>
where
    T: TimeSource,
{
    fn drop(&mut self) {
        let Some(issuer) = self.issuer.take() else {
            return;
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(issuer_id = issuer.issuer_id(), "issuer released");

        // The queue holds at most `capacity` issuers and this one was taken
        // out of it, so there is always room. It can only fail if the pool
        // itself is gone, in which case the issuer is simply dropped.
        let _ = self.home.try_send(issuer);
    }
}

impl<T> fmt::Debug for PooledIssuer<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledIssuer").field(&self.issuer).finish()
    }
}
