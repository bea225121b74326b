use core::{
    alloc::Layout,
    ptr::NonNull,
};

use std::{rc::Rc, sync::Arc};

use crate::{Allocator, AllocError};

/// Layout of `count` contiguous `T`s.
#[inline(always)]
pub fn array_layout<T>(count: usize) -> Result<Layout, AllocError> {
    Layout::array::<T>(count).map_err(|_| AllocError::CapacityOverflow { count })
}

/// Typed allocation capability consumed by the `uniq` factories.
///
/// The combined operations ([`new_object`](ObjectAlloc::new_object),
/// [`delete_object`](ObjectAlloc::delete_object)) allocate and construct, or
/// destruct and free, in one step. The raw operations
/// ([`allocate_object`](ObjectAlloc::allocate_object),
/// [`deallocate_object`](ObjectAlloc::deallocate_object)) only manage storage
/// and leave element lifetimes to [`construct`](ObjectAlloc::construct) and the
/// caller.
///
/// Every operation has a default implementation on top of [`Allocator`], so
/// opting in is usually an empty `impl`. Zero-sized requests never reach the
/// byte level allocator: they produce a dangling pointer and are freed as a
/// no-op.
pub trait ObjectAlloc: Allocator {

    fn new_object<T>(&self, value: T) -> Result<NonNull<T>, AllocError> {
        let ptr = self.allocate_object::<T>(1)?;
        unsafe {
            self.construct(ptr, value);
        }
        Ok(ptr)
    }

    /// # Safety
    /// `ptr` must come from [`new_object`](ObjectAlloc::new_object) on this
    /// allocator and point to a live `T`.
    unsafe fn delete_object<T>(&self, ptr: NonNull<T>) {
        unsafe {
            ptr.drop_in_place();
            self.deallocate_object(ptr, 1);
        }
    }

    fn allocate_object<T>(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        let layout = array_layout::<T>(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling())
        }
        unsafe { self.allocate_raw(layout.size(), layout.align()) }
            .map(|ptr| ptr.cast::<T>())
            .ok_or(AllocError::OutOfMemory {
                size: layout.size(),
                align: layout.align(),
            })
    }

    /// # Safety
    /// `slot` must be valid for writes and must not hold a live `T`.
    #[inline(always)]
    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        unsafe {
            slot.write(value);
        }
    }

    /// # Safety
    /// `ptr` must come from [`allocate_object`](ObjectAlloc::allocate_object)
    /// on this allocator with the same `count`, and every element must
    /// already be dropped.
    unsafe fn deallocate_object<T>(&self, ptr: NonNull<T>, count: usize) {
        let Ok(layout) = array_layout::<T>(count) else {
            return
        };
        if layout.size() == 0 {
            return
        }
        unsafe { self.free_raw(ptr.cast::<u8>(), layout.size(), layout.align()) }
    }
}

macro_rules! forward_object_alloc {
    ($($wrapper:ty),+ $(,)?) => {
        $(
            impl<A: ObjectAlloc + ?Sized> ObjectAlloc for $wrapper {

                #[inline(always)]
                fn new_object<T>(&self, value: T) -> Result<NonNull<T>, AllocError> {
                    (**self).new_object(value)
                }

                #[inline(always)]
                unsafe fn delete_object<T>(&self, ptr: NonNull<T>) {
                    unsafe { (**self).delete_object(ptr) }
                }

                #[inline(always)]
                fn allocate_object<T>(&self, count: usize) -> Result<NonNull<T>, AllocError> {
                    (**self).allocate_object(count)
                }

                #[inline(always)]
                unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
                    unsafe { (**self).construct(slot, value) }
                }

                #[inline(always)]
                unsafe fn deallocate_object<T>(&self, ptr: NonNull<T>, count: usize) {
                    unsafe { (**self).deallocate_object(ptr, count) }
                }
            }
        )+
    };
}

forward_object_alloc!(&A, Rc<A>, Arc<A>);
