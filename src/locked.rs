#[cfg(doc)]
use std::sync::Arc;
use {
    crate::{
        execution_unit::{ExecutionUnits, OsThreads},
        lock::{Lock, ReadGuard, WriteGuard},
    },
    debug_fn::debug_fn,
    opera::PhantomNotSync,
    static_assertions::{assert_impl_all, assert_not_impl_any},
    std::{
        cell::UnsafeCell,
        fmt::{Debug, Formatter},
        ops::Deref,
    },
};


/// A value protected by a [`Lock`].
///
/// Objects of this type can be created with [`Lock::wrap`].
///
/// Access goes through the guards of the protecting lock: [`get`](Self::get)
/// with a [`WriteGuard`] for exclusive access, [`get_shared`](Self::get_shared)
/// with a [`ReadGuard`] for shared access. Both return a shared reference.
/// No `&mut T` is ever handed out, because exclusive ownership is re-entrant:
/// nested acquisitions by the owning thread would let two mutable references
/// to the same value coexist. Mutation therefore goes through interior
/// mutability. With a [`WriteGuard`], only one thread at a time can touch the
/// value, so cheap non-atomic types such as [`Cell`](std::cell::Cell) work;
/// values read through [`ReadGuard`]s are shared between threads and must be
/// [`Sync`].
///
/// This object derefs to the protecting [`Lock`].
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::sync::Arc;
/// use recursive_shared_lock::{Lock, Locked};
///
/// struct Registry {
///     lock: Lock,
///     total: Locked<Cell<u64>>,
/// }
///
/// struct Worker {
///     registry: Arc<Registry>,
///     processed: Locked<Cell<u64>>,
/// }
///
/// impl Worker {
///     fn record(&self) {
///         let guard = &self.registry.lock.write();
///         let processed = self.processed.get(guard);
///         processed.set(processed.get() + 1);
///         let total = self.registry.total.get(guard);
///         total.set(total.get() + 1);
///     }
/// }
///
/// let lock = Lock::new();
/// let registry = Arc::new(Registry {
///     total: lock.wrap(Cell::new(0)),
///     lock,
/// });
/// let worker = Worker {
///     registry: registry.clone(),
///     processed: registry.lock.wrap(Cell::new(0)),
/// };
///
/// worker.record();
/// worker.record();
///
/// let guard = &registry.lock.write();
/// assert_eq!(worker.processed.get(guard).get(), 2);
/// assert_eq!(registry.total.get(guard).get(), 2);
/// ```
pub struct Locked<T, U = OsThreads>
where
    T: ?Sized,
    U: ExecutionUnits,
{
    lock: Lock<U>,
    _phantom_not_sync: PhantomNotSync,
    value: UnsafeCell<T>,
}

#[allow(dead_code)]
const _: () = {
    fn assert_send<T: ?Sized + Send>() {}
    fn assert<T: ?Sized + Send>() {
        assert_send::<Locked<T>>();
    }
};

assert_impl_all!(Lock: Sync);

// SAFETY: - We've asserted above that Lock is Sync.
//         - The phantom field only exists so that we don't accidentally
//           implement Sync.
//         - get hands out references only while the current execution unit
//           holds exclusive ownership, and get_shared requires T: Sync on top
//           of that. Access by a T: Send + !Sync type is therefore limited to
//           one execution unit at a time and can be modeled as transferring
//           ownership every time the accessing unit changes.
unsafe impl<T, U> Sync for Locked<T, U>
where
    T: ?Sized + Send,
    U: ExecutionUnits,
{
}

impl<T, U> Deref for Locked<T, U>
where
    T: ?Sized,
    U: ExecutionUnits,
{
    type Target = Lock<U>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.lock
    }
}

impl<U> Lock<U>
where
    U: ExecutionUnits,
{
    /// Wraps a value in a [`Locked`] protected by this lock.
    ///
    /// This function clones the [`Lock`], which makes it about as expensive
    /// as cloning an [`Arc`].
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let locked = lock.wrap(5);
    /// let guard = &lock.read();
    /// assert_eq!(*locked.get_shared(guard), 5);
    /// ```
    #[inline]
    pub fn wrap<T>(&self, value: T) -> Locked<T, U> {
        Locked {
            lock: self.clone(),
            _phantom_not_sync: Default::default(),
            value: UnsafeCell::new(value),
        }
    }
}

impl<T, U> Locked<T, U>
where
    T: ?Sized,
    U: ExecutionUnits,
{
    /// Accesses the value under exclusive ownership.
    ///
    /// The guard must have been created from the same [`Lock`] that was used
    /// to create this object, that is, the [`Lock`] this object [`Deref`]s
    /// to. This function performs only a single comparison before returning
    /// the reference.
    ///
    /// # Panics
    ///
    /// Panics if the guard was created from a different [`Lock`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::cell::Cell;
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let locked = lock.wrap(Cell::new(1));
    /// let guard = &lock.write();
    /// locked.get(guard).set(2);
    /// assert_eq!(locked.get(guard).get(), 2);
    /// ```
    #[inline]
    pub fn get<'a>(&'a self, guard: &'a WriteGuard<'_, U>) -> &'a T {
        assert_not_impl_any!(WriteGuard<'_>: Sync, Send);
        assert!(
            *guard.lock() == self.lock,
            "guard does not guard this object",
        );
        // SAFETY: - It is clear that self.value is valid for the lifetime 'a.
        //         - The assert shows that the guard was created from
        //           self.lock.
        //         - A WriteGuard is neither Send nor Sync and owns one
        //           exclusive recursion level, so for as long as the guard is
        //           alive, the creating execution unit holds exclusive
        //           ownership and no other unit holds any guard of self.lock.
        //         - All references handed out by this function and get_shared
        //           borrow guards, so no other unit can have a reference to
        //           the value while this one is alive.
        //         - Therefore, for the problematic T: Send + !Sync case,
        //           returning this reference can be modeled as first moving
        //           ownership of the value to the current execution unit.
        unsafe { &*self.value.get() }
    }

    /// Accesses the value under shared ownership.
    ///
    /// The guard must have been created from the same [`Lock`] that was used
    /// to create this object, that is, the [`Lock`] this object [`Deref`]s
    /// to. Since any number of execution units can hold shared ownership at
    /// the same time, the value must be [`Sync`].
    ///
    /// # Panics
    ///
    /// Panics if the guard was created from a different [`Lock`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::thread;
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let locked = lock.wrap(5);
    /// thread::scope(|scope| {
    ///     let guard = &lock.read();
    ///     scope.spawn(|| {
    ///         let guard = &lock.read();
    ///         assert_eq!(*locked.get_shared(guard), 5);
    ///     });
    ///     assert_eq!(*locked.get_shared(guard), 5);
    /// });
    /// ```
    #[inline]
    pub fn get_shared<'a>(&'a self, guard: &'a ReadGuard<'_, U>) -> &'a T
    where
        T: Sync,
    {
        assert_not_impl_any!(ReadGuard<'_>: Sync, Send);
        assert!(
            *guard.lock() == self.lock,
            "guard does not guard this object",
        );
        // SAFETY: - It is clear that self.value is valid for the lifetime 'a.
        //         - The assert shows that the guard was created from
        //           self.lock.
        //         - A ReadGuard owns one recursion level, so for as long as
        //           the guard is alive, no other execution unit can complete
        //           an exclusive acquisition of self.lock.
        //         - All access paths hand out shared references only, and
        //           sharing &T between execution units is allowed by the
        //           T: Sync bound.
        unsafe { &*self.value.get() }
    }

    /// Unwraps the value, consuming this object.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let locked = lock.wrap(5);
    /// assert_eq!(locked.into_inner(), 5);
    /// ```
    #[inline]
    pub fn into_inner(self) -> T
    where
        T: Sized,
    {
        self.value.into_inner()
    }

    /// Returns a mutable reference to the contained value.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let mut locked = lock.wrap(5);
    /// *locked.get_mut() = 6;
    /// assert_eq!(locked.into_inner(), 6);
    /// ```
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Returns a pointer to the underlying value.
    ///
    /// # Example
    ///
    /// ```
    /// use recursive_shared_lock::Lock;
    ///
    /// let lock = Lock::new();
    /// let locked = lock.wrap(5);
    /// // SAFETY: locked hasn't been shared with any other thread.
    /// unsafe {
    ///     assert_eq!(*locked.data_ptr(), 5);
    /// }
    /// ```
    #[inline]
    pub fn data_ptr(&self) -> *const T {
        self.value.get()
    }
}

impl<T, U> Debug for Locked<T, U>
where
    T: Debug,
    U: ExecutionUnits,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locked")
            .field("lock_id", &self.lock.addr())
            .field(
                "value",
                &debug_fn(|fmt| {
                    if let Some(guard) = self.lock.try_write() {
                        Debug::fmt(self.get(&guard), fmt)
                    } else {
                        fmt.write_str("<locked>")
                    }
                }),
            )
            .finish_non_exhaustive()
    }
}
