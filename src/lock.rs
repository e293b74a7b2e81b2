#[cfg(doc)]
use crate::locked::Locked;
use {
    crate::execution_unit::{ExecutionUnits, OsThreads},
    opera::{PhantomNotSend, PhantomNotSync},
    parking_lot::Mutex,
    run_on_drop::on_drop,
    static_assertions::{assert_impl_all, assert_not_impl_any},
    std::{
        collections::HashMap,
        fmt::{Debug, Formatter},
        marker::PhantomData,
        num::NonZeroUsize,
        ptr,
        sync::{
            Arc,
            atomic::{
                AtomicUsize,
                Ordering::{Acquire, Relaxed, Release},
            },
        },
    },
};

#[cfg(test)]
mod tests;

/// A re-entrant shared/exclusive lock.
///
/// Any number of execution units can hold shared ownership at the same time;
/// at most one unit holds exclusive ownership, excluding all other ownership.
/// Both kinds are re-entrant: the unit that holds ownership can call the
/// matching acquisition again without blocking on itself, and releases
/// ownership only after making the matching number of release calls.
///
/// The five raw operations are [`lock`](Self::lock), [`try_lock`](Self::try_lock),
/// [`lock_shared`](Self::lock_shared), [`unlock`](Self::unlock) and
/// [`unlock_shared`](Self::unlock_shared). Most callers should prefer the
/// scoped wrappers [`write`](Self::write), [`try_write`](Self::try_write) and
/// [`read`](Self::read), whose guards release on all exit paths.
///
/// A `Lock` is a cheap cloneable handle; all clones coordinate the same
/// ownership. Data can be attached to a lock with [`Lock::wrap`].
///
/// # Example
///
/// ```
/// use recursive_shared_lock::Lock;
///
/// let lock = Lock::new();
/// let settings = lock.wrap(String::from("verbose"));
/// let guard = &lock.read();
/// let nested = &lock.read();
/// assert_eq!(*settings.get_shared(guard), "verbose");
/// assert_eq!(*settings.get_shared(nested), "verbose");
/// ```
pub struct Lock<U = OsThreads>
where
    U: ExecutionUnits,
{
    shared: Arc<Shared>,
    _units: PhantomData<fn() -> U>,
}

struct Shared {
    // We enforce the following invariants:
    // 1. writer contains 0 or the ID of the single execution unit that owns
    //    or is still acquiring exclusive ownership. It is claimed by
    //    compare-and-swap outside of state and cleared while state is locked.
    // 2. While writer is non-zero, no new entry is added to state.readers.
    //    The reader map can therefore only drain once the slot is claimed,
    //    and exclusive ownership is complete once the map is empty.
    // 3. state.writer_depth is the recursion depth of the unit in writer and
    //    is 1 whenever writer is 0, so a fresh owner starts at depth 1
    //    without writing to it.
    // 4. A unit never occupies writer while it has an entry in state.readers.
    // 5. state.waiting_writers counts lock() calls that have announced intent
    //    and not yet completed acquisition. While it is non-zero, no new
    //    entry is added to state.readers.
    writer: AtomicUsize,
    state: Mutex<State>,
}

struct State {
    waiting_writers: u32,
    writer_depth: u32,
    readers: HashMap<NonZeroUsize, u32>,
}

/// An acquired exclusive-ownership guard.
///
/// This object is created by calling [`Lock::write`] or [`Lock::try_write`].
/// It represents one exclusive recursion level of the [`Lock`] it was created
/// from and releases that level when dropped. A unit can hold any number of
/// guards of the same lock at the same time.
///
/// A guard can be used to access [`Locked`] data by calling [`Locked::get`].
///
/// # Example
///
/// ```
/// use recursive_shared_lock::Lock;
///
/// let lock = Lock::new();
/// let guard = lock.write();
/// // Re-entrant: the owning thread can take further guards.
/// let nested = lock.write();
/// drop(nested);
/// drop(guard);
/// assert!(!lock.is_locked());
/// ```
pub struct WriteGuard<'a, U = OsThreads>
where
    U: ExecutionUnits,
{
    lock: &'a Lock<U>,
    _phantom_not_send: PhantomNotSend,
    _phantom_not_sync: PhantomNotSync,
}

/// An acquired shared-ownership guard.
///
/// This object is created by calling [`Lock::read`]. It represents one
/// recursion level of the [`Lock`] it was created from and releases that
/// level when dropped. If the creating unit held exclusive ownership, the
/// level is an exclusive one, matching the re-acquisition rule of
/// [`Lock::lock_shared`].
///
/// A guard can be used to access [`Locked`] data by calling
/// [`Locked::get_shared`].
///
/// # Example
///
/// ```
/// use recursive_shared_lock::Lock;
///
/// let lock = Lock::new();
/// let guard = lock.read();
/// let nested = lock.read();
/// drop(guard);
/// drop(nested);
/// assert!(!lock.is_locked());
/// ```
pub struct ReadGuard<'a, U = OsThreads>
where
    U: ExecutionUnits,
{
    lock: &'a Lock<U>,
    _phantom_not_send: PhantomNotSend,
    _phantom_not_sync: PhantomNotSync,
}

assert_impl_all!(Lock: Send, Sync);

assert_not_impl_any!(WriteGuard<'_>: Sync, Send);

assert_not_impl_any!(ReadGuard<'_>: Sync, Send);

impl Default for Shared {
    fn default() -> Self {
        Self {
            writer: AtomicUsize::new(0),
            state: Mutex::new(State {
                waiting_writers: 0,
                writer_depth: 1,
                readers: HashMap::new(),
            }),
        }
    }
}

impl Lock {
    /// Creates a new, unlocked lock whose execution units are OS threads.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// assert!(!lock.is_locked());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<U> Lock<U>
where
    U: ExecutionUnits,
{
    /// Acquires exclusive ownership, blocking until it has been granted.
    ///
    /// Blocks while any other execution unit holds or is acquiring exclusive
    /// ownership or holds shared ownership. Re-entrant: if the calling unit
    /// already holds exclusive ownership, this only increments its recursion
    /// depth and returns immediately. Ownership is released after the
    /// matching number of [`unlock`](Self::unlock) calls.
    ///
    /// From the moment this function announces the acquisition, no new shared
    /// ownership is granted until the acquired ownership has been fully
    /// released, even while this call is still blocked. Among several blocked
    /// `lock` calls, the acquisition order is arbitrary.
    ///
    /// # Panics
    ///
    /// Panics if the calling unit holds shared ownership. Upgrading shared
    /// ownership to exclusive ownership is not supported; the check is active
    /// in all build profiles.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// lock.lock();
    /// lock.lock();
    /// // SAFETY: Both levels were acquired above and neither is owned by a
    /// // guard.
    /// unsafe {
    ///     lock.unlock();
    ///     lock.unlock();
    /// }
    /// assert!(!lock.is_locked());
    /// ```
    #[inline]
    pub fn lock(&self) {
        let unit = U::current();
        {
            let mut state = self.shared.state.lock();
            if self.reenter_exclusive(unit, &mut state) {
                return;
            }
            assert!(
                !state.readers.contains_key(&unit),
                "cannot acquire exclusive ownership while holding shared ownership",
            );
            state.waiting_writers += 1;
        }
        self.lock_slow(unit);
    }

    #[cold]
    fn lock_slow(&self, unit: NonZeroUsize) {
        loop {
            // Claim the writer slot. Synchronizes with the Release store of
            // the previous owner so that its critical section happens before
            // ours.
            let claimed = self
                .shared
                .writer
                .compare_exchange_weak(0, unit.get(), Acquire, Relaxed)
                .is_ok();
            if claimed {
                break;
            }
            U::relinquish();
        }
        // The slot is claimed, so no new readers are admitted and the reader
        // map can only drain. Wait for the last reader to leave.
        loop {
            {
                let mut state = self.shared.state.lock();
                if state.readers.is_empty() {
                    state.waiting_writers -= 1;
                    return;
                }
            }
            U::relinquish();
        }
    }

    /// Attempts to acquire exclusive ownership without blocking.
    ///
    /// Succeeds if the calling unit already holds exclusive ownership, or if
    /// no unit holds shared ownership and the writer slot can be claimed in a
    /// single attempt. Returns `false` in every other situation; a `false`
    /// return is a normal outcome, not an error.
    ///
    /// Unlike [`lock`](Self::lock), a failing probe never announces intent:
    /// it does not hold up concurrent [`lock_shared`](Self::lock_shared)
    /// calls, and a burst of probes can be outrun by blocked `lock` callers
    /// indefinitely.
    ///
    /// # Example
    ///
    /// ```
    /// use std::thread;
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// assert!(lock.try_lock());
    /// // The owning thread can probe again.
    /// assert!(lock.try_lock());
    ///
    /// thread::scope(|scope| {
    ///     scope.spawn(|| {
    ///         assert!(!lock.try_lock());
    ///     });
    /// });
    ///
    /// // SAFETY: Both probes above succeeded and acquired one level each.
    /// unsafe {
    ///     lock.unlock();
    ///     lock.unlock();
    /// }
    /// ```
    #[inline]
    pub fn try_lock(&self) -> bool {
        let unit = U::current();
        let mut state = self.shared.state.lock();
        if self.reenter_exclusive(unit, &mut state) {
            return true;
        }
        state.readers.is_empty()
            && self
                .shared
                .writer
                .compare_exchange(0, unit.get(), Acquire, Relaxed)
                .is_ok()
    }

    /// Acquires shared ownership, blocking until it has been granted.
    ///
    /// Blocks while another execution unit holds or is acquiring exclusive
    /// ownership, or has announced a [`lock`](Self::lock) call that has not
    /// completed yet. Announced intent alone is enough to hold new readers
    /// back, so a pending writer cannot be outrun by a continuous stream of
    /// fresh readers.
    ///
    /// Re-entrant: a unit already holding shared ownership only increments
    /// its recursion depth. A unit holding *exclusive* ownership also returns
    /// immediately; its acquisition is counted as another exclusive level and
    /// must be released with either release operation.
    ///
    /// # Example
    ///
    /// ```
    /// use std::thread;
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// lock.lock_shared();
    /// thread::scope(|scope| {
    ///     scope.spawn(|| {
    ///         // Shared ownership is granted to any number of threads.
    ///         lock.lock_shared();
    ///         // A writer is locked out while readers exist.
    ///         assert!(!lock.try_lock());
    ///         // SAFETY: Acquired directly above.
    ///         unsafe {
    ///             lock.unlock_shared();
    ///         }
    ///     });
    /// });
    /// // SAFETY: Acquired at the start of the example.
    /// unsafe {
    ///     lock.unlock_shared();
    /// }
    /// ```
    #[inline]
    pub fn lock_shared(&self) {
        let unit = U::current();
        {
            let mut state = self.shared.state.lock();
            // A writer re-acquiring shared ownership is counted as another
            // exclusive acquisition.
            if self.reenter_exclusive(unit, &mut state) {
                return;
            }
            if let Some(depth) = state.readers.get_mut(&unit) {
                *depth += 1;
                return;
            }
        }
        self.lock_shared_slow(unit);
    }

    #[cold]
    fn lock_shared_slow(&self, unit: NonZeroUsize) {
        loop {
            {
                let mut state = self.shared.state.lock();
                // Synchronizes with the Release store of the last exclusive
                // owner.
                if state.waiting_writers == 0 && self.shared.writer.load(Acquire) == 0 {
                    state.readers.insert(unit, 1);
                    return;
                }
            }
            U::relinquish();
        }
    }

    /// Releases one exclusive recursion level.
    ///
    /// If the calling unit acquired exclusive ownership more than once, this
    /// only decrements its recursion depth; the final call gives up the
    /// ownership entirely.
    ///
    /// # Panics
    ///
    /// Panics if the calling unit does not hold exclusive ownership. The
    /// check is active in all build profiles.
    ///
    /// # Safety
    ///
    /// - The released level must not be owned by a live [`WriteGuard`] or
    ///   [`ReadGuard`]. Guards release their own level when dropped; taking a
    ///   level away from a guard first would allow [`Locked`] data to be
    ///   accessed without ownership.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// lock.lock();
    /// assert!(lock.is_locked_exclusive());
    /// // SAFETY: The level was acquired above and is not owned by a guard.
    /// unsafe {
    ///     lock.unlock();
    /// }
    /// assert!(!lock.is_locked());
    /// ```
    pub unsafe fn unlock(&self) {
        let unit = U::current();
        let mut state = self.shared.state.lock();
        assert!(
            self.shared.writer.load(Relaxed) == unit.get(),
            "unlock called by an execution unit that does not hold exclusive ownership",
        );
        self.release_exclusive(&mut state);
    }

    /// Releases one shared recursion level.
    ///
    /// If the calling unit acquired shared ownership more than once, this
    /// only decrements its recursion depth; the final call removes the unit
    /// from the set of readers.
    ///
    /// A unit that occupies the writer slot releases one *exclusive* level
    /// instead, matching the re-acquisition rule of
    /// [`lock_shared`](Self::lock_shared): for such a unit this call is
    /// equivalent to [`unlock`](Self::unlock).
    ///
    /// # Panics
    ///
    /// Panics if the calling unit holds neither shared nor exclusive
    /// ownership. The check is active in all build profiles.
    ///
    /// # Safety
    ///
    /// - The released level must not be owned by a live [`ReadGuard`] or
    ///   [`WriteGuard`]. Guards release their own level when dropped; taking
    ///   a level away from a guard first would allow [`Locked`] data to be
    ///   accessed without ownership.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// lock.lock();
    /// lock.lock_shared(); // counted as a second exclusive level
    /// assert!(lock.is_locked_exclusive());
    /// // SAFETY: Both levels belong to this thread and no guards exist.
    /// unsafe {
    ///     lock.unlock_shared(); // releases one exclusive level
    ///     lock.unlock();
    /// }
    /// assert!(!lock.is_locked());
    /// ```
    pub unsafe fn unlock_shared(&self) {
        let unit = U::current();
        let mut state = self.shared.state.lock();
        if self.shared.writer.load(Relaxed) == unit.get() {
            self.release_exclusive(&mut state);
            return;
        }
        let Some(depth) = state.readers.get_mut(&unit) else {
            panic!("unlock_shared called by an execution unit that does not hold shared ownership");
        };
        if *depth > 1 {
            *depth -= 1;
        } else {
            state.readers.remove(&unit);
        }
    }

    /// Bumps the writer recursion depth if the calling unit occupies the
    /// writer slot. Must be called with the bookkeeping lock held.
    #[inline]
    fn reenter_exclusive(&self, unit: NonZeroUsize, state: &mut State) -> bool {
        // Only the owning unit ever stores its own ID, so observing our ID
        // means we own the slot and the depth is ours to change.
        if self.shared.writer.load(Relaxed) == unit.get() {
            state.writer_depth += 1;
            true
        } else {
            false
        }
    }

    /// Releases one exclusive recursion level. Must be called with the
    /// bookkeeping lock held by the unit that occupies the writer slot.
    #[inline]
    fn release_exclusive(&self, state: &mut State) {
        if state.writer_depth > 1 {
            state.writer_depth -= 1;
        } else {
            // Synchronizes with the Acquire operations on the writer slot in
            // lock, try_lock and lock_shared.
            self.shared.writer.store(0, Release);
        }
    }

    /// Acquires exclusive ownership and returns a guard that releases it when
    /// dropped.
    ///
    /// Equivalent to [`lock`](Self::lock) followed by a deferred
    /// [`unlock`](Self::unlock) on all exit paths. Blocks and panics under
    /// the same conditions as `lock`.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// {
    ///     let _guard = lock.write();
    ///     assert!(lock.is_locked_exclusive());
    /// }
    /// assert!(!lock.is_locked());
    /// ```
    #[inline]
    pub fn write(&self) -> WriteGuard<'_, U> {
        self.lock();
        WriteGuard {
            lock: self,
            _phantom_not_send: Default::default(),
            _phantom_not_sync: Default::default(),
        }
    }

    /// Attempts to acquire exclusive ownership without blocking, returning a
    /// guard on success.
    ///
    /// Equivalent to [`try_lock`](Self::try_lock) followed by a deferred
    /// [`unlock`](Self::unlock) on all exit paths.
    ///
    /// # Example
    ///
    /// ```
    /// use std::thread;
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let guard = lock.try_write().unwrap();
    /// thread::scope(|scope| {
    ///     scope.spawn(|| {
    ///         assert!(lock.try_write().is_none());
    ///     });
    /// });
    /// drop(guard);
    /// ```
    #[inline]
    pub fn try_write(&self) -> Option<WriteGuard<'_, U>> {
        self.try_lock().then(|| WriteGuard {
            lock: self,
            _phantom_not_send: Default::default(),
            _phantom_not_sync: Default::default(),
        })
    }

    /// Acquires shared ownership and returns a guard that releases it when
    /// dropped.
    ///
    /// Equivalent to [`lock_shared`](Self::lock_shared) followed by a
    /// deferred [`unlock_shared`](Self::unlock_shared) on all exit paths, and
    /// blocks under the same conditions.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// {
    ///     let _guard = lock.read();
    ///     let _nested = lock.read();
    ///     assert!(lock.is_locked());
    /// }
    /// assert!(!lock.is_locked());
    /// ```
    #[inline]
    pub fn read(&self) -> ReadGuard<'_, U> {
        self.lock_shared();
        ReadGuard {
            lock: self,
            _phantom_not_send: Default::default(),
            _phantom_not_sync: Default::default(),
        }
    }

    /// Returns whether any execution unit holds or is acquiring ownership of
    /// any kind.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// assert!(!lock.is_locked());
    /// let _guard = lock.read();
    /// assert!(lock.is_locked());
    /// ```
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.shared.writer.load(Relaxed) != 0 || !self.shared.state.lock().readers.is_empty()
    }

    /// Returns whether an execution unit holds or is acquiring exclusive
    /// ownership.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let _guard = lock.write();
    /// assert!(lock.is_locked_exclusive());
    /// ```
    #[inline]
    pub fn is_locked_exclusive(&self) -> bool {
        self.shared.writer.load(Relaxed) != 0
    }

    /// Returns whether the current execution unit holds ownership of any
    /// kind.
    ///
    /// # Example
    ///
    /// ```
    /// use std::thread;
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let _guard = lock.read();
    /// assert!(lock.is_locked_by_current_thread());
    ///
    /// thread::scope(|scope| {
    ///     scope.spawn(|| {
    ///         assert!(!lock.is_locked_by_current_thread());
    ///     });
    /// });
    /// ```
    #[inline]
    pub fn is_locked_by_current_thread(&self) -> bool {
        let unit = U::current();
        self.shared.writer.load(Relaxed) == unit.get()
            || self.shared.state.lock().readers.contains_key(&unit)
    }

    #[inline]
    pub(crate) fn addr(&self) -> *const u8 {
        let addr: *const Shared = &*self.shared;
        addr.cast()
    }
}

impl<U> Default for Lock<U>
where
    U: ExecutionUnits,
{
    fn default() -> Self {
        Self {
            shared: Default::default(),
            _units: PhantomData,
        }
    }
}

impl<U> Clone for Lock<U>
where
    U: ExecutionUnits,
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            _units: PhantomData,
        }
    }
}

impl<U> Debug for Lock<U>
where
    U: ExecutionUnits,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("id", &self.addr())
            .finish_non_exhaustive()
    }
}

impl<U> PartialEq for Lock<U>
where
    U: ExecutionUnits,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        ptr::eq::<Shared>(&*self.shared, &*other.shared)
    }
}

impl<U> Eq for Lock<U> where U: ExecutionUnits {}

impl<'a, U> WriteGuard<'a, U>
where
    U: ExecutionUnits,
{
    /// Returns the [`Lock`] this guard was created from.
    #[inline]
    pub fn lock(&self) -> &'a Lock<U> {
        self.lock
    }

    /// Releases this guard's recursion level, runs a function, and then
    /// re-acquires the level.
    ///
    /// If the creating unit holds further recursion levels, other units will
    /// not be able to acquire the lock even while the function is running.
    /// The guard is inaccessible while the function runs and is restored
    /// before this returns, also when the function panics.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let counter = lock.wrap(1);
    /// let mut guard = lock.write();
    /// assert_eq!(*counter.get(&guard), 1);
    /// guard.unlocked(|| {
    ///     assert!(!lock.is_locked());
    /// });
    /// assert_eq!(*counter.get(&guard), 1);
    /// ```
    #[inline]
    pub fn unlocked<T>(&mut self, f: impl FnOnce() -> T) -> T {
        // SAFETY: - This guard owns one exclusive recursion level, which is
        //           consumed here.
        //         - The on_drop closure re-acquires a level before the guard
        //           becomes accessible again, also if f panics.
        unsafe {
            self.lock.unlock();
        }
        let _relock = on_drop(|| self.lock.lock());
        f()
    }
}

impl<'a, U> ReadGuard<'a, U>
where
    U: ExecutionUnits,
{
    /// Returns the [`Lock`] this guard was created from.
    #[inline]
    pub fn lock(&self) -> &'a Lock<U> {
        self.lock
    }

    /// Releases this guard's recursion level, runs a function, and then
    /// re-acquires the level.
    ///
    /// If the creating unit holds further recursion levels, other units may
    /// still be excluded while the function is running. Re-acquisition waits
    /// for writers that became pending in the meantime, so this call can
    /// block before returning. The guard is inaccessible while the function
    /// runs and is restored before this returns, also when the function
    /// panics.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let mut guard = lock.read();
    /// guard.unlocked(|| {
    ///     assert!(!lock.is_locked());
    /// });
    /// assert!(lock.is_locked());
    /// ```
    #[inline]
    pub fn unlocked<T>(&mut self, f: impl FnOnce() -> T) -> T {
        // SAFETY: - This guard owns one recursion level, which is consumed
        //           here.
        //         - The on_drop closure re-acquires a level before the guard
        //           becomes accessible again, also if f panics.
        unsafe {
            self.lock.unlock_shared();
        }
        let _relock = on_drop(|| self.lock.lock_shared());
        f()
    }
}

impl<U> Drop for WriteGuard<'_, U>
where
    U: ExecutionUnits,
{
    #[inline]
    fn drop(&mut self) {
        // SAFETY: - This guard owns one exclusive recursion level, which is
        //           consumed exactly once, here.
        unsafe {
            self.lock.unlock();
        }
    }
}

impl<U> Drop for ReadGuard<'_, U>
where
    U: ExecutionUnits,
{
    #[inline]
    fn drop(&mut self) {
        // SAFETY: - This guard owns one recursion level, which is consumed
        //           exactly once, here.
        unsafe {
            self.lock.unlock_shared();
        }
    }
}

impl<U> Debug for WriteGuard<'_, U>
where
    U: ExecutionUnits,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteGuard")
            .field("lock_id", &self.lock.addr())
            .finish_non_exhaustive()
    }
}

impl<U> Debug for ReadGuard<'_, U>
where
    U: ExecutionUnits,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadGuard")
            .field("lock_id", &self.lock.addr())
            .finish_non_exhaustive()
    }
}
