use core::{
    alloc::Layout,
    ptr::NonNull,
};

use std::{rc::Rc, sync::Arc};

/// Byte level allocation primitives.
///
/// Implementors only provide [`allocate_raw`](Allocator::allocate_raw) and
/// [`free_raw`](Allocator::free_raw). Requests for zero bytes may be answered
/// with any well-aligned non-null pointer, and freeing such a pointer must be a
/// no-op.
pub trait Allocator {

    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>>;

    unsafe fn allocate_uninit<T>(&self, count: usize) -> Option<NonNull<T>> {
        let layout = Layout::array::<T>(count).ok()?;
        unsafe { self.allocate_raw(layout.size(), layout.align()).map(|ptr| ptr.cast::<T>()) }
    }

    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize);

    unsafe fn free_uninit<T>(&self, ptr: NonNull<T>, count: usize) {
        let Ok(layout) = Layout::array::<T>(count) else {
            return
        };
        unsafe { self.free_raw(ptr.cast::<u8>(), layout.size(), layout.align()) }
    }
}

macro_rules! forward_allocator {
    ($($wrapper:ty),+ $(,)?) => {
        $(
            impl<A: Allocator + ?Sized> Allocator for $wrapper {

                #[inline(always)]
                unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
                    unsafe { (**self).allocate_raw(size, align) }
                }

                #[inline(always)]
                unsafe fn allocate_uninit<T>(&self, count: usize) -> Option<NonNull<T>> {
                    unsafe { (**self).allocate_uninit(count) }
                }

                #[inline(always)]
                unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize) {
                    unsafe { (**self).free_raw(ptr, size, align) }
                }

                #[inline(always)]
                unsafe fn free_uninit<T>(&self, ptr: NonNull<T>, count: usize) {
                    unsafe { (**self).free_uninit(ptr, count) }
                }
            }
        )+
    };
}

forward_allocator!(&A, Rc<A>, Arc<A>);
