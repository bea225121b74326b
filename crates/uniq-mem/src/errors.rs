#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AllocError {
    OutOfMemory {
        size: usize,
        align: usize,
    },
    CapacityOverflow {
        count: usize,
    },
}

impl core::fmt::Display for AllocError {

    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory { size, align } => {
                write!(f, "allocator failed to provide {} bytes aligned to {}", size, align)
            },
            Self::CapacityOverflow { count } => {
                write!(f, "layout of {} elements overflows isize::MAX", count)
            },
        }
    }
}

impl core::error::Error for AllocError {}
