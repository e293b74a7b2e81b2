use {
    crate::{Lock, execution_unit::ExecutionUnits},
    std::{
        cell::Cell,
        num::NonZeroUsize,
        sync::{
            Barrier,
            atomic::{AtomicBool, AtomicUsize, Ordering::Relaxed},
        },
        thread,
        time::{Duration, Instant},
    },
};

fn assert_default<U: ExecutionUnits>(lock: &Lock<U>) {
    assert_eq!(lock.shared.writer.load(Relaxed), 0);
    let state = lock.shared.state.lock();
    assert_eq!(state.waiting_writers, 0);
    assert_eq!(state.writer_depth, 1);
    assert!(state.readers.is_empty());
}

fn run_in_thread<T: Send>(f: impl FnOnce() -> T + Send) -> T {
    thread::scope(|s| s.spawn(|| f()).join().unwrap())
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while !condition() {
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "timed out waiting for condition",
        );
        thread::yield_now();
    }
}

#[test]
fn default() {
    let lock = Lock::new();
    assert_default(&lock);
}

#[test]
fn exclusive_reentrancy() {
    let lock = Lock::new();
    const DEPTH: u32 = 5;
    for _ in 0..DEPTH {
        lock.lock();
    }
    assert_eq!(lock.shared.state.lock().writer_depth, DEPTH);
    // Intermediate releases must not give up ownership.
    for _ in 0..DEPTH - 1 {
        run_in_thread(|| assert!(!lock.try_lock()));
        unsafe {
            lock.unlock();
        }
    }
    run_in_thread(|| assert!(!lock.try_lock()));
    unsafe {
        lock.unlock();
    }
    run_in_thread(|| {
        assert!(lock.try_lock());
        unsafe {
            lock.unlock();
        }
    });
    assert_default(&lock);
}

#[test]
fn shared_reentrancy() {
    let lock = Lock::new();
    const DEPTH: u32 = 5;
    for _ in 0..DEPTH {
        lock.lock_shared();
    }
    {
        let state = lock.shared.state.lock();
        assert_eq!(state.readers.len(), 1);
        assert_eq!(state.readers.values().copied().sum::<u32>(), DEPTH);
    }
    for _ in 0..DEPTH - 1 {
        run_in_thread(|| assert!(!lock.try_lock()));
        unsafe {
            lock.unlock_shared();
        }
    }
    run_in_thread(|| assert!(!lock.try_lock()));
    unsafe {
        lock.unlock_shared();
    }
    run_in_thread(|| {
        assert!(lock.try_lock());
        unsafe {
            lock.unlock();
        }
    });
    assert_default(&lock);
}

#[test]
fn try_lock() {
    let lock = Lock::new();
    assert!(lock.try_lock());
    // The owner can probe again.
    assert!(lock.try_lock());
    run_in_thread(|| assert!(!lock.try_lock()));
    unsafe {
        lock.unlock();
        lock.unlock();
    }
    run_in_thread(|| {
        assert!(lock.try_lock());
        unsafe {
            lock.unlock();
        }
    });
    assert_default(&lock);
}

#[test]
fn try_lock_fails_with_readers() {
    let lock = Lock::new();
    lock.lock_shared();
    // Even the reader itself cannot claim exclusive ownership.
    assert!(!lock.try_lock());
    run_in_thread(|| assert!(!lock.try_lock()));
    unsafe {
        lock.unlock_shared();
    }
    assert!(lock.try_lock());
    unsafe {
        lock.unlock();
    }
    assert_default(&lock);
}

#[test]
fn try_lock_does_not_announce_intent() {
    let lock = Lock::new();
    lock.lock_shared();
    run_in_thread(|| assert!(!lock.try_lock()));
    // A failed probe leaves no trace, so new readers are not held back.
    assert_eq!(lock.shared.state.lock().waiting_writers, 0);
    run_in_thread(|| {
        lock.lock_shared();
        unsafe {
            lock.unlock_shared();
        }
    });
    unsafe {
        lock.unlock_shared();
    }
    assert_default(&lock);
}

#[test]
fn writer_reenters_shared() {
    let lock = Lock::new();
    lock.lock();
    lock.lock_shared();
    {
        let state = lock.shared.state.lock();
        assert_eq!(state.writer_depth, 2);
        assert!(state.readers.is_empty());
    }
    unsafe {
        lock.unlock_shared();
    }
    assert_eq!(lock.shared.state.lock().writer_depth, 1);
    run_in_thread(|| assert!(!lock.try_lock()));
    unsafe {
        lock.unlock();
    }
    assert_default(&lock);
}

#[test]
fn unlock_shared_releases_last_exclusive_level() {
    let lock = Lock::new();
    lock.lock();
    unsafe {
        lock.unlock_shared();
    }
    assert_default(&lock);
}

#[test]
#[should_panic(expected = "cannot acquire exclusive ownership while holding shared ownership")]
fn upgrade_panics() {
    let lock = Lock::new();
    lock.lock_shared();
    lock.lock();
}

#[test]
#[should_panic(expected = "does not hold exclusive ownership")]
fn unlock_without_ownership_panics() {
    let lock = Lock::new();
    unsafe {
        lock.unlock();
    }
}

#[test]
#[should_panic(expected = "does not hold exclusive ownership")]
fn unlock_with_only_shared_ownership_panics() {
    let lock = Lock::new();
    lock.lock_shared();
    unsafe {
        lock.unlock();
    }
}

#[test]
#[should_panic(expected = "does not hold shared ownership")]
fn unlock_shared_without_ownership_panics() {
    let lock = Lock::new();
    unsafe {
        lock.unlock_shared();
    }
}

#[test]
fn mutual_exclusion() {
    let lock = Lock::new();
    let in_critical_section = AtomicBool::new(false);
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..100 {
                    lock.lock();
                    assert!(!in_critical_section.swap(true, Relaxed));
                    thread::yield_now();
                    assert!(in_critical_section.swap(false, Relaxed));
                    unsafe {
                        lock.unlock();
                    }
                }
            });
        }
    });
    assert_default(&lock);
}

#[test]
fn readers_exclude_writers() {
    let lock = Lock::new();
    let active_readers = AtomicUsize::new(0);
    thread::scope(|s| {
        for _ in 0..3 {
            s.spawn(|| {
                for _ in 0..100 {
                    lock.lock_shared();
                    active_readers.fetch_add(1, Relaxed);
                    thread::yield_now();
                    active_readers.fetch_sub(1, Relaxed);
                    unsafe {
                        lock.unlock_shared();
                    }
                }
            });
        }
        s.spawn(|| {
            for _ in 0..50 {
                lock.lock();
                assert_eq!(active_readers.load(Relaxed), 0);
                unsafe {
                    lock.unlock();
                }
            }
        });
    });
    assert_default(&lock);
}

#[test]
fn contended_writers() {
    let lock = Lock::new();
    let acquisitions = AtomicUsize::new(0);
    let barrier = Barrier::new(8);
    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                barrier.wait();
                lock.lock();
                acquisitions.fetch_add(1, Relaxed);
                unsafe {
                    lock.unlock();
                }
            });
        }
    });
    assert_eq!(acquisitions.load(Relaxed), 8);
    assert_default(&lock);
}

#[test]
fn writer_preference() {
    let lock = Lock::new();
    let release_reader = AtomicBool::new(false);
    let release_writer = AtomicBool::new(false);
    let writer_acquired = AtomicBool::new(false);
    let late_reader_acquired = AtomicBool::new(false);
    thread::scope(|s| {
        s.spawn(|| {
            lock.lock_shared();
            wait_for(|| release_reader.load(Relaxed));
            unsafe {
                lock.unlock_shared();
            }
        });
        wait_for(|| lock.shared.state.lock().readers.len() == 1);
        s.spawn(|| {
            lock.lock();
            writer_acquired.store(true, Relaxed);
            wait_for(|| release_writer.load(Relaxed));
            unsafe {
                lock.unlock();
            }
        });
        wait_for(|| lock.shared.state.lock().waiting_writers == 1);
        s.spawn(|| {
            lock.lock_shared();
            late_reader_acquired.store(true, Relaxed);
            unsafe {
                lock.unlock_shared();
            }
        });
        // The late reader must not get in while the writer is pending, even
        // though the first reader still holds the lock.
        thread::sleep(Duration::from_millis(50));
        assert!(!writer_acquired.load(Relaxed));
        assert!(!late_reader_acquired.load(Relaxed));
        release_reader.store(true, Relaxed);
        wait_for(|| writer_acquired.load(Relaxed));
        assert!(!late_reader_acquired.load(Relaxed));
        release_writer.store(true, Relaxed);
        wait_for(|| late_reader_acquired.load(Relaxed));
    });
    assert_default(&lock);
}

#[test]
fn writer_preference_blocks_reacquisition() {
    let lock = Lock::new();
    let release_reader = AtomicBool::new(false);
    let release_writer = AtomicBool::new(false);
    let writer_acquired = AtomicBool::new(false);
    let reader_cycled = AtomicBool::new(false);
    thread::scope(|s| {
        s.spawn(|| {
            lock.lock_shared();
            wait_for(|| release_reader.load(Relaxed));
            unsafe {
                lock.unlock_shared();
            }
            // Reacquisition joins the back of the line behind the announced
            // writer.
            lock.lock_shared();
            reader_cycled.store(true, Relaxed);
            unsafe {
                lock.unlock_shared();
            }
        });
        wait_for(|| lock.shared.state.lock().readers.len() == 1);
        s.spawn(|| {
            lock.lock();
            writer_acquired.store(true, Relaxed);
            wait_for(|| release_writer.load(Relaxed));
            unsafe {
                lock.unlock();
            }
        });
        wait_for(|| lock.shared.state.lock().waiting_writers == 1);
        release_reader.store(true, Relaxed);
        wait_for(|| writer_acquired.load(Relaxed));
        assert!(!reader_cycled.load(Relaxed));
        release_writer.store(true, Relaxed);
        wait_for(|| reader_cycled.load(Relaxed));
    });
    assert_default(&lock);
}

#[test]
fn clone_shares_state() {
    let lock = Lock::new();
    let clone = lock.clone();
    lock.lock();
    run_in_thread(|| assert!(!clone.try_lock()));
    assert!(clone.is_locked_by_current_thread());
    // Re-entry through the clone.
    clone.lock();
    unsafe {
        clone.unlock();
        lock.unlock();
    }
    assert_default(&lock);
}

#[test]
fn eq() {
    let lock1 = Lock::new();
    let lock2 = Lock::new();
    assert_eq!(lock1, lock1);
    assert_ne!(lock1, lock2);
    assert_eq!(lock1, lock1.clone());
    assert_eq!(lock2, lock2);
}

#[test]
fn is_locked() {
    let lock = Lock::new();
    assert!(!lock.is_locked());
    lock.lock_shared();
    assert!(lock.is_locked());
    assert!(!lock.is_locked_exclusive());
    unsafe {
        lock.unlock_shared();
    }
    lock.lock();
    assert!(lock.is_locked());
    assert!(lock.is_locked_exclusive());
    unsafe {
        lock.unlock();
    }
    assert!(!lock.is_locked());
}

#[test]
fn is_locked_by_current_thread() {
    let lock = Lock::new();
    assert!(!lock.is_locked_by_current_thread());
    lock.lock_shared();
    assert!(lock.is_locked_by_current_thread());
    run_in_thread(|| assert!(!lock.is_locked_by_current_thread()));
    unsafe {
        lock.unlock_shared();
    }
    lock.lock();
    assert!(lock.is_locked_by_current_thread());
    run_in_thread(|| assert!(!lock.is_locked_by_current_thread()));
    unsafe {
        lock.unlock();
    }
    assert!(!lock.is_locked_by_current_thread());
}

#[test]
fn write_guard_releases_on_drop() {
    let lock = Lock::new();
    let guard1 = lock.write();
    run_in_thread(|| assert!(!lock.try_lock()));
    let guard2 = lock.write();
    run_in_thread(|| assert!(!lock.try_lock()));
    drop(guard1);
    run_in_thread(|| assert!(!lock.try_lock()));
    drop(guard2);
    run_in_thread(|| {
        assert!(lock.try_lock());
        unsafe {
            lock.unlock();
        }
    });
    assert_default(&lock);
}

#[test]
fn read_guard_releases_on_drop() {
    let lock = Lock::new();
    let guard1 = lock.read();
    let guard2 = lock.read();
    run_in_thread(|| assert!(!lock.try_lock()));
    drop(guard1);
    run_in_thread(|| assert!(!lock.try_lock()));
    drop(guard2);
    run_in_thread(|| {
        assert!(lock.try_lock());
        unsafe {
            lock.unlock();
        }
    });
    assert_default(&lock);
}

#[test]
fn try_write() {
    let lock = Lock::new();
    let guard = lock.try_write().unwrap();
    run_in_thread(|| assert!(lock.try_write().is_none()));
    // Re-entrant probe by the owner.
    assert!(lock.try_write().is_some());
    drop(guard);
    run_in_thread(|| assert!(lock.try_write().is_some()));
    assert_default(&lock);
}

#[test]
fn try_write_fails_with_readers() {
    let lock = Lock::new();
    let guard = lock.read();
    assert!(lock.try_write().is_none());
    run_in_thread(|| assert!(lock.try_write().is_none()));
    drop(guard);
    assert!(lock.try_write().is_some());
    assert_default(&lock);
}

#[test]
fn read_guard_by_writer_releases_exclusive_level() {
    let lock = Lock::new();
    let write_guard = lock.write();
    let read_guard = lock.read();
    assert_eq!(lock.shared.state.lock().writer_depth, 2);
    drop(read_guard);
    assert_eq!(lock.shared.state.lock().writer_depth, 1);
    run_in_thread(|| assert!(!lock.try_lock()));
    drop(write_guard);
    assert_default(&lock);
}

#[test]
fn write_guard_unlocked() {
    let lock = Lock::new();
    let mut guard = lock.write();
    run_in_thread(|| assert!(!lock.try_lock()));
    guard.unlocked(|| {
        run_in_thread(|| {
            assert!(lock.try_lock());
            unsafe {
                lock.unlock();
            }
        });
    });
    run_in_thread(|| assert!(!lock.try_lock()));
    drop(guard);
    assert_default(&lock);
}

#[test]
fn nested_write_guard_unlocked_keeps_ownership() {
    let lock = Lock::new();
    let mut guard1 = lock.write();
    let guard2 = lock.write();
    guard1.unlocked(|| {
        // One level remains, so other threads are still locked out.
        run_in_thread(|| assert!(!lock.try_lock()));
    });
    drop(guard1);
    drop(guard2);
    assert_default(&lock);
}

#[test]
fn read_guard_unlocked() {
    let lock = Lock::new();
    let mut guard = lock.read();
    guard.unlocked(|| {
        run_in_thread(|| {
            assert!(lock.try_lock());
            unsafe {
                lock.unlock();
            }
        });
    });
    run_in_thread(|| assert!(!lock.try_lock()));
    drop(guard);
    assert_default(&lock);
}

#[test]
fn guard_lock_accessor() {
    let lock = Lock::new();
    let write_guard = lock.write();
    assert_eq!(*write_guard.lock(), lock);
    drop(write_guard);
    let read_guard = lock.read();
    assert_eq!(*read_guard.lock(), lock);
}

struct ScriptedUnits;

thread_local!(static SCRIPTED_UNIT: Cell<usize> = const { Cell::new(1) });

impl ExecutionUnits for ScriptedUnits {
    fn current() -> NonZeroUsize {
        SCRIPTED_UNIT.with(|unit| NonZeroUsize::new(unit.get()).unwrap())
    }

    fn relinquish() {}
}

fn as_unit<T>(unit: usize, f: impl FnOnce() -> T) -> T {
    SCRIPTED_UNIT.with(|cell| {
        let previous = cell.replace(unit);
        let value = f();
        cell.set(previous);
        value
    })
}

#[test]
fn simulated_units_hold_independent_shared_depths() {
    let lock = Lock::<ScriptedUnits>::default();
    as_unit(1, || lock.lock_shared());
    as_unit(2, || lock.lock_shared());
    as_unit(2, || lock.lock_shared());
    {
        let state = lock.shared.state.lock();
        assert_eq!(state.readers.len(), 2);
        assert_eq!(state.readers[&NonZeroUsize::new(1).unwrap()], 1);
        assert_eq!(state.readers[&NonZeroUsize::new(2).unwrap()], 2);
    }
    as_unit(3, || assert!(!lock.try_lock()));
    as_unit(1, || unsafe { lock.unlock_shared() });
    as_unit(2, || unsafe { lock.unlock_shared() });
    as_unit(3, || assert!(!lock.try_lock()));
    as_unit(2, || unsafe { lock.unlock_shared() });
    as_unit(3, || assert!(lock.try_lock()));
    as_unit(3, || unsafe { lock.unlock() });
    assert_default(&lock);
}

#[test]
fn simulated_unit_cannot_steal_exclusive_ownership() {
    let lock = Lock::<ScriptedUnits>::default();
    as_unit(1, || assert!(lock.try_lock()));
    as_unit(1, || assert!(lock.try_lock()));
    as_unit(2, || assert!(!lock.try_lock()));
    as_unit(2, || assert!(!lock.is_locked_by_current_thread()));
    as_unit(1, || assert!(lock.is_locked_by_current_thread()));
    as_unit(1, || unsafe { lock.unlock() });
    as_unit(2, || assert!(!lock.try_lock()));
    as_unit(1, || unsafe { lock.unlock() });
    as_unit(2, || assert!(lock.try_lock()));
    as_unit(2, || unsafe { lock.unlock() });
    assert_default(&lock);
}
