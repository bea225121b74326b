use std::alloc::{Layout, alloc, dealloc};

use core::ptr::{self, NonNull};

use crate::{Allocator, ObjectAlloc};

/// The process allocator.
#[derive(Clone, Copy, Default, Debug)]
pub struct GlobalAlloc;

pub static GLOBAL_ALLOC: GlobalAlloc = GlobalAlloc;

impl Allocator for GlobalAlloc {

    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let layout = Layout::from_size_align(size, align).ok()?;
        if layout.size() == 0 {
            return NonNull::new(ptr::without_provenance_mut(layout.align()))
        }
        let ptr = unsafe { alloc(layout) };
        NonNull::new(ptr)
    }

    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        let layout = match Layout::from_size_align(size, align) {
            Ok(l) => l,
            Err(_) => return,
        };
        if layout.size() == 0 {
            return
        }
        unsafe { dealloc(ptr.as_ptr(), layout) }
    }
}

impl ObjectAlloc for GlobalAlloc {}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn zero_sized_raw_allocation_is_aligned() {
        unsafe {
            let ptr = GLOBAL_ALLOC.allocate_raw(0, 16).unwrap();
            assert_eq!(ptr.as_ptr() as usize % 16, 0);
            GLOBAL_ALLOC.free_raw(ptr, 0, 16);
        }
    }

    #[test]
    fn objects_are_written_and_freed() {
        let ptr = GLOBAL_ALLOC.new_object(String::from("global")).unwrap();
        assert_eq!(unsafe { ptr.as_ref() }, "global");
        unsafe { GLOBAL_ALLOC.delete_object(ptr) };
    }

    #[test]
    fn invalid_alignment_is_refused() {
        assert!(unsafe { GLOBAL_ALLOC.allocate_raw(8, 3) }.is_none());
    }
}
