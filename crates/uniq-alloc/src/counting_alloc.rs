use core::{
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use uniq_mem::{Allocator, ObjectAlloc, AllocError};

/// Snapshot of the operations a [`CountingAlloc`] has forwarded.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct AllocStats {
    pub new_object: usize,
    pub delete_object: usize,
    pub allocate_object: usize,
    pub construct: usize,
    pub deallocate_object: usize,
    pub failed: usize,
    /// Element count passed to the most recent `deallocate_object`.
    pub last_deallocate_count: Option<usize>,
}

impl AllocStats {

    /// Successful allocations that have not been returned yet.
    #[inline(always)]
    pub fn outstanding(&self) -> usize {
        (self.new_object + self.allocate_object)
            .saturating_sub(self.delete_object + self.deallocate_object)
    }
}

/// Forwards to `A` and counts every capability operation.
///
/// Also remembers the address of the last pointer handed to `delete_object`
/// and `deallocate_object`, so callers can check a release went to the
/// allocation they expect.
#[derive(Debug)]
pub struct CountingAlloc<A> {
    inner: A,
    new_object: AtomicUsize,
    delete_object: AtomicUsize,
    allocate_object: AtomicUsize,
    construct: AtomicUsize,
    deallocate_object: AtomicUsize,
    failed: AtomicUsize,
    last_deallocate_count: AtomicUsize,
    last_deleted: AtomicUsize,
    last_deallocated: AtomicUsize,
}

const NONE: usize = usize::MAX;

impl<A> CountingAlloc<A> {

    pub const fn new(inner: A) -> Self {
        Self {
            inner,
            new_object: AtomicUsize::new(0),
            delete_object: AtomicUsize::new(0),
            allocate_object: AtomicUsize::new(0),
            construct: AtomicUsize::new(0),
            deallocate_object: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            last_deallocate_count: AtomicUsize::new(NONE),
            last_deleted: AtomicUsize::new(0),
            last_deallocated: AtomicUsize::new(0),
        }
    }

    #[inline(always)]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn stats(&self) -> AllocStats {
        let last = self.last_deallocate_count.load(Ordering::Acquire);
        AllocStats {
            new_object: self.new_object.load(Ordering::Acquire),
            delete_object: self.delete_object.load(Ordering::Acquire),
            allocate_object: self.allocate_object.load(Ordering::Acquire),
            construct: self.construct.load(Ordering::Acquire),
            deallocate_object: self.deallocate_object.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            last_deallocate_count: (last != NONE).then_some(last),
        }
    }

    /// Address last passed to `delete_object`, 0 if none.
    #[inline(always)]
    pub fn last_deleted(&self) -> usize {
        self.last_deleted.load(Ordering::Acquire)
    }

    /// Address last passed to `deallocate_object`, 0 if none.
    #[inline(always)]
    pub fn last_deallocated(&self) -> usize {
        self.last_deallocated.load(Ordering::Acquire)
    }

    #[inline(always)]
    fn count<T>(&self, counter: &AtomicUsize, res: Result<T, AllocError>) -> Result<T, AllocError> {
        match &res {
            Ok(_) => counter.fetch_add(1, Ordering::AcqRel),
            Err(_) => self.failed.fetch_add(1, Ordering::AcqRel),
        };
        res
    }
}

impl<A: Default> Default for CountingAlloc<A> {

    fn default() -> Self {
        Self::new(A::default())
    }
}

impl<A: Allocator> Allocator for CountingAlloc<A> {

    #[inline(always)]
    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        unsafe { self.inner.allocate_raw(size, align) }
    }

    #[inline(always)]
    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        unsafe { self.inner.free_raw(ptr, size, align) }
    }
}

impl<A: ObjectAlloc> ObjectAlloc for CountingAlloc<A> {

    fn new_object<T>(&self, value: T) -> Result<NonNull<T>, AllocError> {
        self.count(&self.new_object, self.inner.new_object(value))
    }

    unsafe fn delete_object<T>(&self, ptr: NonNull<T>) {
        self.delete_object.fetch_add(1, Ordering::AcqRel);
        self.last_deleted.store(ptr.as_ptr() as usize, Ordering::Release);
        unsafe { self.inner.delete_object(ptr) }
    }

    fn allocate_object<T>(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        self.count(&self.allocate_object, self.inner.allocate_object(count))
    }

    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        self.construct.fetch_add(1, Ordering::AcqRel);
        unsafe { self.inner.construct(slot, value) }
    }

    unsafe fn deallocate_object<T>(&self, ptr: NonNull<T>, count: usize) {
        self.deallocate_object.fetch_add(1, Ordering::AcqRel);
        self.last_deallocate_count.store(count, Ordering::Release);
        self.last_deallocated.store(ptr.as_ptr() as usize, Ordering::Release);
        unsafe { self.inner.deallocate_object(ptr, count) }
    }
}
