#[macro_use]

mod macros;
pub mod const_fn;
mod errors;
mod allocator;
mod object_alloc;
mod global_alloc;

pub use errors::AllocError;
pub use allocator::Allocator;
pub use object_alloc::{ObjectAlloc, array_layout};
pub use global_alloc::{GlobalAlloc, GLOBAL_ALLOC};
pub use const_fn::align_up;
