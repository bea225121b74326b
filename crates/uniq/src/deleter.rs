use core::{
    mem::ManuallyDrop,
    ops::Range,
    ptr::NonNull,
};

use uniq_mem::ObjectAlloc;

/// Reverses an allocation when a [`Unique`](crate::Unique) is released.
pub trait Deleter<T: ?Sized> {

    /// # Safety
    /// `ptr` must be the live allocation this deleter was created for, and
    /// must not be used afterwards.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

/// Releases a single object through the allocator's combined
/// destruct-and-free operation.
#[derive(Clone, Debug)]
pub struct ObjectDeleter<A: ObjectAlloc> {
    alloc: A,
}

impl<A: ObjectAlloc> ObjectDeleter<A> {

    #[inline(always)]
    pub fn new(alloc: A) -> Self {
        Self {
            alloc,
        }
    }

    #[inline(always)]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }
}

impl<T, A: ObjectAlloc> Deleter<T> for ObjectDeleter<A> {

    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        trace!("deleting {} at {:p}", core::any::type_name::<T>(), ptr);
        unsafe { self.alloc.delete_object(ptr) }
    }
}

/// Releases a run of `len` elements: drops them one by one in ascending
/// order, then returns the storage with the same `len` it was allocated with.
#[derive(Clone, Debug)]
pub struct SliceDeleter<A: ObjectAlloc> {
    alloc: A,
    len: usize,
}

impl<A: ObjectAlloc> SliceDeleter<A> {

    #[inline(always)]
    pub fn new(alloc: A, len: usize) -> Self {
        Self {
            alloc,
            len,
        }
    }

    #[inline(always)]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T, A: ObjectAlloc> Deleter<[T]> for SliceDeleter<A> {

    unsafe fn delete(&mut self, ptr: NonNull<[T]>) {
        debug_assert_eq!(ptr.len(), self.len);
        trace!("deleting [{}; {}] at {:p}", core::any::type_name::<T>(), self.len, ptr);
        unsafe {
            PartialRun::constructed(ptr.cast::<T>(), &self.alloc, self.len).release();
        }
    }
}

/// Storage for `len` elements of which `live` are constructed.
///
/// Dropping it drops the remaining live elements in ascending order and
/// deallocates the storage, which is what happens when construction or
/// release unwinds.
pub(crate) struct PartialRun<'a, T, A: ObjectAlloc> {
    base: NonNull<T>,
    alloc: &'a A,
    len: usize,
    live: Range<usize>,
}

impl<'a, T, A: ObjectAlloc> PartialRun<'a, T, A> {

    #[inline(always)]
    pub fn uninit(base: NonNull<T>, alloc: &'a A, len: usize) -> Self {
        Self {
            base,
            alloc,
            len,
            live: 0..0,
        }
    }

    #[inline(always)]
    pub unsafe fn constructed(base: NonNull<T>, alloc: &'a A, len: usize) -> Self {
        Self {
            base,
            alloc,
            len,
            live: 0..len,
        }
    }

    #[inline(always)]
    pub fn initialized(&self) -> usize {
        self.live.end
    }

    /// Constructs the next element.
    #[inline(always)]
    pub fn push(&mut self, value: T) {
        assert!(self.live.end < self.len, "run is already fully constructed");
        unsafe {
            self.alloc.construct(self.base.add(self.live.end), value);
        }
        self.live.end += 1;
    }

    /// Gives up ownership of the storage and the constructed elements.
    #[inline(always)]
    pub fn finish(self) -> NonNull<[T]> {
        let this = ManuallyDrop::new(self);
        NonNull::slice_from_raw_parts(this.base, this.len)
    }

    /// Drops every live element in ascending order, then deallocates.
    pub unsafe fn release(mut self) {
        while let Some(i) = self.live.next() {
            unsafe {
                self.base.add(i).drop_in_place();
            }
        }
    }
}

impl<'a, T, A: ObjectAlloc> Drop for PartialRun<'a, T, A> {

    fn drop(&mut self) {
        for i in self.live.by_ref() {
            unsafe {
                self.base.add(i).drop_in_place();
            }
        }
        unsafe {
            self.alloc.deallocate_object(self.base, self.len);
        }
    }
}

#[cfg(test)]
mod tests {

    use std::{cell::RefCell, panic::{self, AssertUnwindSafe}};

    use uniq_alloc::CountingAlloc;

    use uniq_mem::GlobalAlloc;

    use super::*;

    struct Noisy<'a> {
        id: usize,
        log: &'a RefCell<Vec<usize>>,
        panic_on_drop: bool,
    }

    impl<'a> Drop for Noisy<'a> {

        fn drop(&mut self) {
            self.log.borrow_mut().push(self.id);
            if self.panic_on_drop {
                panic!("drop {} failed", self.id);
            }
        }
    }

    #[test]
    fn release_drops_in_order_then_deallocates() {
        let alloc = CountingAlloc::new(GlobalAlloc);
        let log = RefCell::new(Vec::new());
        let base = alloc.allocate_object::<Noisy>(3).unwrap();
        let mut run = PartialRun::uninit(base, &alloc, 3);
        for id in 0..3 {
            run.push(Noisy { id, log: &log, panic_on_drop: false });
        }
        let slice = run.finish();
        assert_eq!(alloc.stats().deallocate_object, 0);
        unsafe { SliceDeleter::new(&alloc, 3).delete(slice) };
        assert_eq!(*log.borrow(), [0, 1, 2]);
        assert_eq!(alloc.stats().deallocate_object, 1);
        assert_eq!(alloc.stats().last_deallocate_count, Some(3));
    }

    #[test]
    fn dropping_an_unfinished_run_cleans_up() {
        let alloc = CountingAlloc::new(GlobalAlloc);
        let log = RefCell::new(Vec::new());
        let base = alloc.allocate_object::<Noisy>(4).unwrap();
        let mut run = PartialRun::uninit(base, &alloc, 4);
        run.push(Noisy { id: 0, log: &log, panic_on_drop: false });
        run.push(Noisy { id: 1, log: &log, panic_on_drop: false });
        assert_eq!(run.initialized(), 2);
        drop(run);
        assert_eq!(*log.borrow(), [0, 1]);
        assert_eq!(alloc.stats().outstanding(), 0);
        assert_eq!(alloc.stats().last_deallocate_count, Some(4));
    }

    #[test]
    fn panicking_element_drop_still_releases_the_rest() {
        let alloc = CountingAlloc::new(GlobalAlloc);
        let log = RefCell::new(Vec::new());
        let base = alloc.allocate_object::<Noisy>(3).unwrap();
        let mut run = PartialRun::uninit(base, &alloc, 3);
        for id in 0..3 {
            run.push(Noisy { id, log: &log, panic_on_drop: id == 1 });
        }
        let slice = run.finish();
        let res = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            SliceDeleter::new(&alloc, 3).delete(slice)
        }));
        assert!(res.is_err());
        assert_eq!(*log.borrow(), [0, 1, 2]);
        assert_eq!(alloc.stats().outstanding(), 0);
    }
}
