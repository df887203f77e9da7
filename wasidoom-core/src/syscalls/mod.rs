//! Syscall handlers, grouped by area.
//!
//! Every handler decodes a fixed little-endian argument block out of guest
//! memory, performs the host-side effect, encodes a fixed result block back,
//! and returns an errno from the closed set below. Handlers never fail at
//! the language level for conditions the guest can provoke; anything the
//! errno vocabulary cannot express is either mapped to the closest code or,
//! for memory violations, fatal.

pub mod clock;
pub mod env;
pub mod fs;

use crate::memory::GuestMemory;

/// The only status codes the guest ever sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Errno {
    Success = 0,
    /// Unknown or wrong-kind descriptor.
    BadF = 8,
    /// Operation unsupported for this descriptor's backing.
    Inval = 28,
    /// Logical path absent, or present but never opened.
    NoEnt = 44,
}

impl Errno {
    pub fn name(self) -> &'static str {
        match self {
            Errno::Success => "ESUCCESS",
            Errno::BadF => "EBADF",
            Errno::Inval => "EINVAL",
            Errno::NoEnt => "ENOENT",
        }
    }
}

/// Decode the i-th iovec entry: (guest offset, length), 8 bytes each.
pub(crate) fn iovec(mem: &GuestMemory<'_>, iovs: u32, index: u32) -> (u32, u32) {
    let base = iovs + 8 * index;
    (mem.read_u32(base), mem.read_u32(base + 4))
}
