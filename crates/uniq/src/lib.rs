//! Allocator-generic owning handles.
//!
//! [`allocate_unique`] builds one object through an [`ObjectAlloc`] and
//! returns a [`Unique`] handle that gives it back to the same allocator when
//! dropped. [`allocate_unique_slice`] and [`allocate_unique_slice_with`] do the
//! same for a run of `n` elements constructed from identical arguments.
//!
//! ```
//! use uniq::{allocate_unique, allocate_unique_slice, ArenaAlloc};
//!
//! let arena = ArenaAlloc::new(256).unwrap();
//! let one = allocate_unique(&arena, 42u32).unwrap();
//! let many = allocate_unique_slice(&arena, 5, 7u32).unwrap();
//! assert_eq!(*one, 42);
//! assert_eq!(&*many, &[7; 5]);
//! ```
//!
//! # Failure policy
//!
//! Allocation failure is reported as [`AllocError`]. A panic while
//! constructing or dropping slice elements drops every element that is
//! still live and returns the storage before unwinding further.

#[macro_use]

mod macros;
mod deleter;
mod unique;
mod factory;

pub use deleter::{Deleter, ObjectDeleter, SliceDeleter};
pub use unique::{Unique, UniqueObject, UniqueSlice};
pub use factory::{
    allocate_unique,
    allocate_unique_slice,
    allocate_unique_slice_with,
    allocate_unique_default_slice,
};

pub use uniq_mem::{Allocator, ObjectAlloc, AllocError, GlobalAlloc, GLOBAL_ALLOC};
pub use uniq_alloc::{ArenaAlloc, ArenaGuard, LockedAlloc, CountingAlloc, AllocStats};

pub use uniq_mem as mem;

#[cfg(feature = "log")]
pub use uniq_log as log;
