use core::{
    fmt::{self, Debug, Display, Formatter},
    marker::PhantomData,
    mem::{self, ManuallyDrop},
    ops::{Deref, DerefMut},
    ptr::{self, NonNull},
};

use uniq_mem::{GlobalAlloc, const_assert, size_of};

use crate::{Deleter, ObjectDeleter, SliceDeleter};

/// Exclusive owner of an allocation, released through its deleter exactly
/// once when dropped.
///
/// Moving a `Unique` moves ownership: the moved-from binding is never
/// dropped, so no second release can happen.
pub struct Unique<T, D>
    where
        T: ?Sized,
        D: Deleter<T>,
{
    ptr: NonNull<T>,
    deleter: D,
    _marker: PhantomData<T>,
}

/// Handle returned by [`allocate_unique`](crate::allocate_unique).
pub type UniqueObject<T, A> = Unique<T, ObjectDeleter<A>>;

/// Handle returned by the slice factories.
pub type UniqueSlice<T, A> = Unique<[T], SliceDeleter<A>>;

const_assert!(size_of!(UniqueObject<u64, &'static GlobalAlloc>) == size_of!(Option<UniqueObject<u64, &'static GlobalAlloc>>));

impl<T, D> Unique<T, D>
    where
        T: ?Sized,
        D: Deleter<T>,
{

    /// # Safety
    /// `ptr` must point to a live allocation that `deleter` knows how to
    /// release, and nothing else may release it.
    #[inline(always)]
    pub unsafe fn from_raw_parts(ptr: NonNull<T>, deleter: D) -> Self {
        Self {
            ptr,
            deleter,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> NonNull<T> {
        self.ptr
    }

    #[inline(always)]
    pub fn deleter(&self) -> &D {
        &self.deleter
    }

    /// Releases the allocation now instead of at the end of the scope.
    #[inline(always)]
    pub fn reset(self) {
        drop(self)
    }

    /// Gives up ownership without releasing. The caller becomes responsible
    /// for handing the pointer back to the deleter.
    #[inline(always)]
    pub fn into_raw_parts(self) -> (NonNull<T>, D) {
        let this = ManuallyDrop::new(self);
        let deleter = unsafe { ptr::read(&this.deleter) };
        (this.ptr, deleter)
    }

    /// Gives up ownership and never releases. The reference cannot outlive
    /// anything the deleter borrows.
    #[inline(always)]
    pub fn leak<'a>(self) -> &'a mut T
        where
            D: 'a
    {
        let (ptr, deleter) = self.into_raw_parts();
        mem::forget(deleter);
        unsafe { &mut *ptr.as_ptr() }
    }
}

impl<T, D> Drop for Unique<T, D>
    where
        T: ?Sized,
        D: Deleter<T>,
{

    fn drop(&mut self) {
        unsafe {
            self.deleter.delete(self.ptr);
        }
    }
}

impl<T, D> Deref for Unique<T, D>
    where
        T: ?Sized,
        D: Deleter<T>,
{

    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        unsafe { self.ptr.as_ref() }
    }
}

impl<T, D> DerefMut for Unique<T, D>
    where
        T: ?Sized,
        D: Deleter<T>,
{

    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.ptr.as_mut() }
    }
}

impl<T, D> AsRef<T> for Unique<T, D>
    where
        T: ?Sized,
        D: Deleter<T>,
{

    #[inline(always)]
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T, D> AsMut<T> for Unique<T, D>
    where
        T: ?Sized,
        D: Deleter<T>,
{

    #[inline(always)]
    fn as_mut(&mut self) -> &mut T {
        self
    }
}

impl<T, D> Debug for Unique<T, D>
    where
        T: ?Sized + Debug,
        D: Deleter<T>,
{

    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&**self, f)
    }
}

impl<T, D> Display for Unique<T, D>
    where
        T: ?Sized + Display,
        D: Deleter<T>,
{

    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&**self, f)
    }
}

impl<T, D, E> PartialEq<Unique<T, E>> for Unique<T, D>
    where
        T: ?Sized + PartialEq,
        D: Deleter<T>,
        E: Deleter<T>,
{

    #[inline(always)]
    fn eq(&self, other: &Unique<T, E>) -> bool {
        **self == **other
    }
}

impl<T, D> Eq for Unique<T, D>
    where
        T: ?Sized + Eq,
        D: Deleter<T>,
{}

unsafe impl<T, D> Send for Unique<T, D>
    where
        T: ?Sized + Send,
        D: Deleter<T> + Send,
{}

unsafe impl<T, D> Sync for Unique<T, D>
    where
        T: ?Sized + Sync,
        D: Deleter<T> + Sync,
{}
