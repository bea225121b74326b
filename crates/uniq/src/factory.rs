//! Factories pairing an allocation with the deleter that reverses it.
//!
//! Every factory takes the allocator by value. Passing `&A` ties the handle
//! to a borrow of the allocator, so the borrow checker guarantees the
//! allocator outlives the handle. Passing an `Rc<A>` or `Arc<A>` makes the
//! handle keep the allocator alive instead.

use core::{any::type_name, iter};

use uniq_mem::{AllocError, ObjectAlloc};

use crate::{
    deleter::PartialRun,
    ObjectDeleter, SliceDeleter, Unique, UniqueObject, UniqueSlice,
};

/// Moves `value` into storage obtained from `alloc`'s combined
/// allocate-and-construct operation.
///
/// Dropping the handle calls `alloc.delete_object` exactly once.
pub fn allocate_unique<T, A>(alloc: A, value: T) -> Result<UniqueObject<T, A>, AllocError>
    where
        A: ObjectAlloc,
{
    let ptr = alloc
        .new_object(value)
        .inspect_err(|err| {
            warn!("allocate_unique::<{}> failed: {}", type_name::<T>(), err);
        })?;
    trace!("allocated {} at {:p}", type_name::<T>(), ptr);
    Ok(unsafe { Unique::from_raw_parts(ptr, ObjectDeleter::new(alloc)) })
}

/// Allocates `len` elements, each a clone of `value`.
///
/// The last element receives `value` itself. Elements are constructed in
/// ascending order; if a clone panics, the elements built so far are
/// dropped and the storage is returned before the panic continues.
pub fn allocate_unique_slice<T, A>(alloc: A, len: usize, value: T) -> Result<UniqueSlice<T, A>, AllocError>
    where
        T: Clone,
        A: ObjectAlloc,
{
    allocate_run(alloc, len, iter::repeat_n(value, len))
}

/// Allocates `len` elements, each produced by a separate call to `ctor`.
pub fn allocate_unique_slice_with<T, A, F>(alloc: A, len: usize, ctor: F) -> Result<UniqueSlice<T, A>, AllocError>
    where
        A: ObjectAlloc,
        F: Fn() -> T,
{
    allocate_run(alloc, len, iter::repeat_with(ctor).take(len))
}

#[inline(always)]
pub fn allocate_unique_default_slice<T, A>(alloc: A, len: usize) -> Result<UniqueSlice<T, A>, AllocError>
    where
        T: Default,
        A: ObjectAlloc,
{
    allocate_unique_slice_with(alloc, len, T::default)
}

fn allocate_run<T, A, I>(alloc: A, len: usize, elements: I) -> Result<UniqueSlice<T, A>, AllocError>
    where
        A: ObjectAlloc,
        I: Iterator<Item = T>,
{
    let base = alloc
        .allocate_object::<T>(len)
        .inspect_err(|err| {
            warn!("allocate_unique_slice::<{}>({}) failed: {}", type_name::<T>(), len, err);
        })?;
    let mut run = PartialRun::uninit(base, &alloc, len);
    for element in elements {
        run.push(element);
    }
    debug_assert_eq!(run.initialized(), len);
    let slice = run.finish();
    trace!("allocated [{}; {}] at {:p}", type_name::<T>(), len, slice);
    Ok(unsafe { Unique::from_raw_parts(slice, SliceDeleter::new(alloc, len)) })
}

#[cfg(test)]
mod tests {

    use std::{
        cell::Cell,
        panic::{self, AssertUnwindSafe},
    };

    use uniq_alloc::{ArenaAlloc, CountingAlloc};
    use uniq_mem::GlobalAlloc;

    use super::*;

    #[test]
    fn scalar_handle_owns_value() {
        let alloc = CountingAlloc::new(GlobalAlloc);
        let handle = allocate_unique(&alloc, 42i32).unwrap();
        assert_eq!(*handle, 42);
        assert_eq!(alloc.stats().new_object, 1);
        let addr = handle.as_ptr().as_ptr() as usize;
        drop(handle);
        assert_eq!(alloc.stats().delete_object, 1);
        assert_eq!(alloc.last_deleted(), addr);
    }

    #[test]
    fn slice_is_broadcast() {
        let alloc = CountingAlloc::new(GlobalAlloc);
        let handle = allocate_unique_slice(&alloc, 5, 7i32).unwrap();
        assert_eq!(&*handle, &[7; 5]);
        assert_eq!(alloc.stats().construct, 5);
        drop(handle);
        assert_eq!(alloc.stats().deallocate_object, 1);
        assert_eq!(alloc.stats().last_deallocate_count, Some(5));
    }

    #[test]
    fn last_slot_takes_the_original_value() {
        let alloc = GlobalAlloc;
        let handle = allocate_unique_slice(&alloc, 3, String::from("x")).unwrap();
        assert_eq!(handle.len(), 3);
        assert!(handle.iter().all(|s| s == "x"));
    }

    #[test]
    fn constructor_is_called_once_per_element() {
        let calls = Cell::new(0);
        let handle = allocate_unique_slice_with(&GlobalAlloc, 4, || {
            calls.set(calls.get() + 1);
            vec![1u8; 2]
        }).unwrap();
        assert_eq!(calls.get(), 4);
        assert!(handle.iter().all(|v| v == &[1, 1]));
    }

    #[test]
    fn default_slice() {
        let handle = allocate_unique_default_slice::<u32, _>(&GlobalAlloc, 3).unwrap();
        assert_eq!(&*handle, &[0, 0, 0]);
    }

    #[test]
    fn empty_slice_still_deallocates_once() {
        let alloc = CountingAlloc::new(GlobalAlloc);
        let handle = allocate_unique_slice(&alloc, 0, 1u64).unwrap();
        assert!(handle.is_empty());
        drop(handle);
        let stats = alloc.stats();
        assert_eq!(stats.construct, 0);
        assert_eq!(stats.deallocate_object, 1);
        assert_eq!(stats.last_deallocate_count, Some(0));
    }

    #[test]
    fn allocation_failure_is_returned() {
        let arena = ArenaAlloc::new(16).unwrap();
        let err = allocate_unique_slice(&arena, 4, 0u64).unwrap_err();
        assert_eq!(err, AllocError::OutOfMemory { size: 32, align: 8 });
        assert!(allocate_unique(&arena, [0u8; 32]).is_err());
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn panicking_constructor_unwinds_cleanly() {
        let alloc = CountingAlloc::new(GlobalAlloc);
        let built = Cell::new(0);
        let res = panic::catch_unwind(AssertUnwindSafe(|| {
            allocate_unique_slice_with(&alloc, 5, || {
                if built.get() == 3 {
                    panic!("constructor failed");
                }
                built.set(built.get() + 1);
                String::from("live")
            })
        }));
        assert!(res.is_err());
        let stats = alloc.stats();
        assert_eq!(stats.construct, 3);
        assert_eq!(stats.outstanding(), 0);
        assert_eq!(stats.last_deallocate_count, Some(5));
    }

    #[test]
    fn arena_storage_is_reused_after_release() {
        let arena = ArenaAlloc::new(64).unwrap();
        let first = allocate_unique_slice(&arena, 4, 9u32).unwrap();
        assert_eq!(arena.used(), 16);
        drop(first);
        assert_eq!(arena.used(), 0);
        let second = allocate_unique(&arena, 3u64).unwrap();
        assert_eq!(*second, 3);
    }
}
