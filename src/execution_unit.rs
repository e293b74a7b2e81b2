use std::{num::NonZeroUsize, thread};


/// A provider of execution-unit identity and voluntary descheduling.
///
/// The lock needs exactly two services from its platform: a token that
/// identifies the calling execution unit and a way to give up the processor
/// between retries of a spinning acquisition. Both are supplied through this
/// trait so that they can be substituted, for example by a test that drives
/// the lock from several simulated units on a single thread. [`OsThreads`] is
/// the provider used by default.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use recursive_shared_lock::{ExecutionUnits, Lock};
///
/// struct SingleUnit;
///
/// impl ExecutionUnits for SingleUnit {
///     fn current() -> NonZeroUsize {
///         NonZeroUsize::new(1).unwrap()
///     }
///
///     fn relinquish() {}
/// }
///
/// let lock = Lock::<SingleUnit>::default();
/// assert!(lock.try_lock());
/// assert!(lock.try_lock());
/// // SAFETY: Both probes above succeeded and acquired one level each.
/// unsafe {
///     lock.unlock();
///     lock.unlock();
/// }
/// ```
pub trait ExecutionUnits {
    /// Returns the ID of the current execution unit.
    ///
    /// The ID must be stable for the lifetime of the unit and two units that
    /// are active at the same time must never share an ID. Zero is
    /// unrepresentable here because the lock stores the ID of the exclusive
    /// owner in an atomic whose zero value means that no owner exists.
    fn current() -> NonZeroUsize;

    /// Voluntarily gives up the processor in favor of another ready unit.
    ///
    /// Called between retries of the spinning acquisition protocols. A
    /// provider of simulated units may do nothing here.
    fn relinquish();
}

/// The default [`ExecutionUnits`] provider: one execution unit per OS thread.
///
/// The ID of a unit is the address of a thread-local, which is never 0 and is
/// never shared by two live threads. Yielding is [`thread::yield_now`].
///
/// # Execution units versus threads
///
/// An execution unit is morally a single thread, except that it may span
/// multiple threads that are connected by a happens-before relationship: when
/// a thread terminates, a thread started afterwards may re-use its
/// thread-local storage and therefore its ID. This matters when
///
/// 1. a thread acquires a lock,
/// 2. terminates without releasing it,
/// 3. a later thread receives the same ID,
/// 4. and eventually releases the lock.
///
/// We allow this because the two threads cannot overlap, so treating them as
/// one unit keeps the ownership reasoning intact without special cases.
///
/// # Example
///
/// ```
/// use std::thread;
/// use recursive_shared_lock::{ExecutionUnits, OsThreads};
///
/// let here = OsThreads::current();
/// assert_eq!(here, OsThreads::current());
/// let there = thread::spawn(|| OsThreads::current()).join().unwrap();
/// assert_ne!(here, there);
/// ```
pub struct OsThreads;

impl ExecutionUnits for OsThreads {
    #[inline(always)]
    fn current() -> NonZeroUsize {
        thread_local!(static EXECUTION_UNIT_ID: u8 = const { 0 });
        EXECUTION_UNIT_ID.with(|id| {
            let id: *const u8 = id;
            // SAFETY: - A reference always has a non-null address.
            unsafe { NonZeroUsize::new_unchecked(id as usize) }
        })
    }

    #[inline]
    fn relinquish() {
        thread::yield_now();
    }
}
