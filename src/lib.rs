//! This crate provides [`Lock`], a re-entrant shared/exclusive lock.
//!
//! [`Lock`] generalizes a reader-writer lock by tracking a recursion depth per
//! thread instead of a binary held/not-held flag: the thread that holds
//! exclusive ownership may call [`Lock::lock`] again without deadlocking
//! against itself, and a thread holding shared ownership may call
//! [`Lock::lock_shared`] again freely. Ownership is released once the matching
//! number of release calls has been made.
//!
//! # Motivation
//!
//! The common reader-writer locks are not re-entrant. [`std::sync::RwLock`]
//! may deadlock or panic when the holding thread acquires it a second time,
//! [`parking_lot::RwLock`] deadlocks on a nested write, and
//! [`parking_lot::ReentrantMutex`] is re-entrant but has no shared mode. Code
//! that runs both inside and outside of a critical section — recursive
//! traversals, callback-driven designs, layered APIs where each layer takes
//! the same lock — needs nested acquisition to simply work, in both modes.
//!
//! [`Lock`] supports this with the following policy:
//!
//! - Any number of threads can hold shared ownership at the same time; at
//!   most one thread holds exclusive ownership, excluding all others.
//! - The owning thread can re-acquire its kind of ownership any number of
//!   times. A thread with exclusive ownership may also re-acquire *shared*
//!   ownership; this is counted as another exclusive acquisition.
//! - A thread that has started acquiring exclusive ownership blocks all new
//!   shared acquisitions, so a continuous stream of readers cannot starve a
//!   writer.
//! - Among several threads competing for exclusive ownership, the winner is
//!   arbitrary.
//! - Upgrading shared ownership to exclusive ownership is not supported and
//!   panics.
//!
//! # Blocking behavior
//!
//! Contention is resolved by busy-waiting with voluntary yielding rather than
//! by parking on a wait queue: a blocked acquisition repeatedly re-checks the
//! lock state and gives up the processor between checks. This trades CPU
//! cycles under sustained contention for independence from any wake-up
//! machinery. There are no timed acquisitions; callers that need bounded
//! waiting can combine [`Lock::try_lock`] with their own retry policy.
//!
//! The services the protocol needs from the platform — a per-thread identity
//! token and a voluntary yield — are modeled by the [`ExecutionUnits`] trait.
//! [`OsThreads`] is the implementation used by default; tests can substitute
//! a scripted provider to drive the lock from simulated threads.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
//! use recursive_shared_lock::Lock;
//!
//! let lock = Lock::new();
//! let stats = lock.wrap(AtomicU64::new(0));
//!
//! // Exclusive ownership is re-entrant for the owning thread.
//! {
//!     let guard = &lock.write();
//!     let nested = &lock.write();
//!     stats.get(nested).fetch_add(1, Relaxed);
//!     stats.get(guard).fetch_add(1, Relaxed);
//! }
//!
//! // Shared ownership admits any number of threads at once.
//! std::thread::scope(|scope| {
//!     let guard = &lock.read();
//!     scope.spawn(|| {
//!         let guard = &lock.read();
//!         assert_eq!(stats.get_shared(guard).load(Relaxed), 2);
//!     });
//!     assert_eq!(stats.get_shared(guard).load(Relaxed), 2);
//! });
//! ```
//!
//! Because exclusive ownership is re-entrant, [`Locked`] only ever hands out
//! shared references; mutation goes through interior mutability. See
//! [`Locked`] for the details.

pub use {
    execution_unit::{ExecutionUnits, OsThreads},
    lock::{Lock, ReadGuard, WriteGuard},
    locked::Locked,
};

mod execution_unit;
mod lock;
mod locked;
