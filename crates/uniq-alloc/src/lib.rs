#[macro_use]

mod macros;
mod arena_alloc;
mod locked_alloc;
mod counting_alloc;

pub use arena_alloc::{ArenaAlloc, ArenaGuard};
pub use locked_alloc::LockedAlloc;
pub use counting_alloc::{CountingAlloc, AllocStats};
