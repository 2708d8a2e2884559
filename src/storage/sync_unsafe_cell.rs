//! Stand in for `core::cell::SyncUnsafeCell` since that is still unstable.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

#[repr(transparent)]
pub struct SyncUnsafeCell<T: ?Sized>(pub UnsafeCell<T>);

// SAFETY: Proper synchronization is left to the user of the unsafe `get`
// call. `UnsafeCell` itself doesn't implement `Sync` to prevent accidental
// mis-use.
unsafe impl<T: ?Sized + Sync> Sync for SyncUnsafeCell<T> {}

impl<T> SyncUnsafeCell<T> {
    pub fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }
}

impl<T: ?Sized> Deref for SyncUnsafeCell<T> {
    type Target = UnsafeCell<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: ?Sized> DerefMut for SyncUnsafeCell<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Default> Default for SyncUnsafeCell<T> {
    fn default() -> Self {
        Self::new(Default::default())
    }
}
