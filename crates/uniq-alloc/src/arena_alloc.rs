use std::alloc::{alloc, dealloc, Layout};

use core::{
    mem,
    cell::Cell,
    ptr::NonNull,
};

use uniq_mem::{Allocator, ObjectAlloc, align_up};

/// Fixed-size bump allocator.
///
/// Freeing is a no-op unless the freed block is the most recent allocation,
/// in which case the bump position moves back over it.
pub struct ArenaAlloc {
    data: NonNull<u8>,
    size: usize,
    pos: Cell<usize>,
    guard_active: Cell<bool>,
}

impl ArenaAlloc {

    pub fn new(size: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size, mem::align_of::<usize>()).ok()?;
        let data =
            if size == 0 {
                NonNull::dangling()
            } else {
                NonNull::new(unsafe { alloc(layout) })?
            };
        Some(
            Self {
                data,
                size,
                pos: Cell::new(0),
                guard_active: Cell::new(false),
            }
        )
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn used(&self) -> usize {
        self.pos.get()
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.size - self.used()
    }

    #[inline(always)]
    pub fn full(&self) -> bool {
        self.used() >= self.size
    }

    /// Resets the bump position to 0.
    #[inline(always)]
    pub fn clear(&mut self) {
        assert!(!self.guard_active.get(), "attempting to clear while guard is active");
        self.pos.set(0);
    }

    fn allocate_raw_internal(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let base = self.data.as_ptr() as usize;
        let aligned_start = align_up(base + self.used(), align);
        let end = aligned_start.checked_add(size)?;
        if end > base + self.size {
            debug!("arena exhausted: {} bytes requested, {} remaining", size, self.remaining());
            return None
        }
        self.pos.set(end - base);
        let offset = aligned_start - base;
        Some(unsafe { self.data.add(offset) })
    }

    fn free_raw_internal(&self, ptr: NonNull<u8>, size: usize) {
        let base = self.data.as_ptr() as usize;
        let start = ptr.as_ptr() as usize;
        if start + size == base + self.used() {
            self.pos.set(start - base);
        }
    }
}

impl Allocator for ArenaAlloc {

    /// Fails with `None` while an [`ArenaGuard`] is active. Allocations made
    /// then would be rolled back under live handles.
    #[inline(always)]
    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if self.guard_active.get() {
            debug!("arena is guarded: allocate through the guard instead");
            return None
        }
        if !align.is_power_of_two() {
            return None
        }
        self.allocate_raw_internal(size, align)
    }

    #[inline(always)]
    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, _align: usize) {
        if !self.guard_active.get() {
            self.free_raw_internal(ptr, size);
        }
    }
}

impl ObjectAlloc for ArenaAlloc {}

unsafe impl Send for ArenaAlloc {}

impl Drop for ArenaAlloc {

    fn drop(&mut self) {
        if self.size == 0 {
            return
        }
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.size, mem::align_of::<usize>());
            dealloc(self.data.as_ptr(), layout);
        }
    }
}

/// Scoped rollback over an [`ArenaAlloc`].
///
/// Everything allocated through the guard is discarded when the guard is
/// dropped or cleared. Only one guard may be active per arena.
pub struct ArenaGuard<'a> {
    pos_rollback: usize,
    arena: &'a ArenaAlloc,
}

impl<'a> ArenaGuard<'a> {

    #[inline(always)]
    pub fn new(arena: &'a ArenaAlloc) -> Self {
        assert!(!arena.guard_active.get(), "attempting to create concurrent guards");
        arena.guard_active.set(true);
        Self {
            pos_rollback: arena.used(),
            arena,
        }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.arena.size()
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.arena.remaining()
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.arena.pos.set(self.pos_rollback);
    }
}

impl<'a> Allocator for ArenaGuard<'a> {

    #[inline(always)]
    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if !align.is_power_of_two() {
            return None
        }
        self.arena.allocate_raw_internal(size, align)
    }

    #[inline(always)]
    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, _align: usize) {
        self.arena.free_raw_internal(ptr, size);
    }
}

impl<'a> ObjectAlloc for ArenaGuard<'a> {}

impl<'a> Drop for ArenaGuard<'a> {

    fn drop(&mut self) {
        self.arena.pos.set(self.pos_rollback);
        self.arena.guard_active.set(false);
    }
}

#[cfg(test)]
mod tests {

    use uniq_mem::AllocError;

    use super::*;

    #[test]
    fn bump_allocations_are_aligned() {
        let arena = ArenaAlloc::new(64).unwrap();
        let a = arena.allocate_object::<u8>(1).unwrap();
        let b = arena.allocate_object::<u64>(1).unwrap();
        assert_eq!(b.as_ptr() as usize % 8, 0);
        assert!(b.as_ptr() as usize > a.as_ptr() as usize);
        assert_eq!(arena.used(), 16);
    }

    #[test]
    fn exhaustion_is_reported() {
        let arena = ArenaAlloc::new(16).unwrap();
        let _a = arena.allocate_object::<u64>(2).unwrap();
        assert!(arena.full());
        let err = arena.allocate_object::<u64>(1).unwrap_err();
        assert_eq!(err, AllocError::OutOfMemory { size: 8, align: 8 });
    }

    #[test]
    fn freeing_the_last_block_rewinds() {
        let arena = ArenaAlloc::new(64).unwrap();
        let a = arena.allocate_object::<u32>(2).unwrap();
        let b = arena.allocate_object::<u32>(4).unwrap();
        assert_eq!(arena.used(), 24);
        unsafe { arena.deallocate_object(a, 2) };
        assert_eq!(arena.used(), 24);
        unsafe { arena.deallocate_object(b, 4) };
        assert_eq!(arena.used(), 8);
    }

    #[test]
    fn guard_rolls_back_on_drop() {
        let mut arena = ArenaAlloc::new(64).unwrap();
        let _kept = arena.allocate_object::<u64>(1).unwrap();
        {
            let guard = ArenaGuard::new(&arena);
            let _scratch = guard.allocate_object::<u64>(4).unwrap();
            assert_eq!(guard.remaining(), 24);
        }
        assert_eq!(arena.used(), 8);
        arena.clear();
        assert_eq!(arena.used(), 0);
    }

    #[test]
    #[should_panic(expected = "concurrent guards")]
    fn only_one_guard_at_a_time() {
        let arena = ArenaAlloc::new(64).unwrap();
        let _first = ArenaGuard::new(&arena);
        let _second = ArenaGuard::new(&arena);
    }

    #[test]
    fn allocating_past_an_active_guard_fails() {
        let arena = ArenaAlloc::new(64).unwrap();
        let guard = ArenaGuard::new(&arena);
        let err = arena.allocate_object::<u8>(1).unwrap_err();
        assert_eq!(err, AllocError::OutOfMemory { size: 1, align: 1 });
        assert_eq!(arena.used(), 0);
        drop(guard);
        assert!(arena.allocate_object::<u8>(1).is_ok());
    }

    #[test]
    fn empty_arena_still_serves_zero_sized_requests() {
        let arena = ArenaAlloc::new(0).unwrap();
        assert!(arena.allocate_object::<u8>(0).is_ok());
        assert!(arena.allocate_object::<u8>(1).is_err());
    }
}
