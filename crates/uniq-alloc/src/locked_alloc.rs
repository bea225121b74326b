use core::ptr::NonNull;

use parking_lot::{Mutex, MutexGuard};

use uniq_mem::{Allocator, ObjectAlloc, AllocError};

/// Serializes every operation of `A` behind a mutex, turning any `Send`
/// allocator into one that can be shared between threads.
pub struct LockedAlloc<A> {
    inner: Mutex<A>,
}

impl<A> LockedAlloc<A> {

    pub const fn new(alloc: A) -> Self {
        Self {
            inner: Mutex::new(alloc),
        }
    }

    #[inline(always)]
    pub fn lock(&self) -> MutexGuard<'_, A> {
        self.inner.lock()
    }

    #[inline(always)]
    pub fn get_mut(&mut self) -> &mut A {
        self.inner.get_mut()
    }

    #[inline(always)]
    pub fn into_inner(self) -> A {
        self.inner.into_inner()
    }
}

impl<A: Allocator> Allocator for LockedAlloc<A> {

    #[inline(always)]
    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        unsafe { self.inner.lock().allocate_raw(size, align) }
    }

    #[inline(always)]
    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        unsafe { self.inner.lock().free_raw(ptr, size, align) }
    }
}

/// `new_object` and `delete_object` keep the trait defaults, so the lock is
/// never held while a value is dropped. A value that owns another handle from
/// the same allocator releases it without re-entering the mutex.
impl<A: ObjectAlloc> ObjectAlloc for LockedAlloc<A> {

    #[inline(always)]
    fn allocate_object<T>(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        self.inner.lock().allocate_object(count)
    }

    #[inline(always)]
    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        unsafe { self.inner.lock().construct(slot, value) }
    }

    #[inline(always)]
    unsafe fn deallocate_object<T>(&self, ptr: NonNull<T>, count: usize) {
        unsafe { self.inner.lock().deallocate_object(ptr, count) }
    }
}

#[cfg(test)]
mod tests {

    use std::{
        sync::{Arc, atomic::{AtomicUsize, Ordering}},
        thread,
    };

    use uniq_mem::GlobalAlloc;

    use crate::ArenaAlloc;

    use super::*;

    #[test]
    fn arena_is_shared_between_threads() {
        let alloc = Arc::new(LockedAlloc::new(ArenaAlloc::new(1024).unwrap()));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let alloc = alloc.clone();
                thread::spawn(move || {
                    let ptr = alloc.allocate_object::<u64>(8).unwrap();
                    unsafe { alloc.construct(ptr, i as u64) };
                    ptr.as_ptr() as usize
                })
            })
            .collect();
        let mut addrs: Vec<usize> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        addrs.sort();
        addrs.dedup();
        assert_eq!(addrs.len(), 4);
        assert_eq!(alloc.lock().used(), 4 * 64);
    }

    struct Node<'a> {
        next: Option<NonNull<Node<'a>>>,
        alloc: &'a LockedAlloc<GlobalAlloc>,
        dropped: &'a AtomicUsize,
    }

    impl<'a> Drop for Node<'a> {

        fn drop(&mut self) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            if let Some(next) = self.next.take() {
                unsafe { self.alloc.delete_object(next) };
            }
        }
    }

    #[test]
    fn nested_release_does_not_reenter_the_lock() {
        let alloc = LockedAlloc::new(GlobalAlloc);
        let dropped = AtomicUsize::new(0);
        let tail = alloc.new_object(Node { next: None, alloc: &alloc, dropped: &dropped }).unwrap();
        let head = alloc.new_object(Node { next: Some(tail), alloc: &alloc, dropped: &dropped }).unwrap();
        unsafe { alloc.delete_object(head) };
        assert_eq!(dropped.load(Ordering::Relaxed), 2);
        assert!(alloc.inner.try_lock().is_some());
    }

    #[test]
    fn failed_new_object_drops_the_value_outside_the_lock() {
        let alloc = LockedAlloc::new(ArenaAlloc::new(0).unwrap());
        let dropped = AtomicUsize::new(0);
        struct Witness<'a>(&'a LockedAlloc<ArenaAlloc>, &'a AtomicUsize);
        impl Drop for Witness<'_> {
            fn drop(&mut self) {
                assert!(self.0.inner.try_lock().is_some());
                self.1.fetch_add(1, Ordering::Relaxed);
            }
        }
        assert!(alloc.new_object(Witness(&alloc, &dropped)).is_err());
        assert_eq!(dropped.load(Ordering::Relaxed), 1);
    }
}
