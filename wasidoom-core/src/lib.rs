//! Host side of the WASI surface the DOOM guest talks to.
//!
//! The guest believes it is running on a POSIX-like system; in reality every
//! syscall lands here and is satisfied against a fixed virtual file table:
//! the WAD as a read-only stream, two in-memory sinks standing in for the
//! screen and palette files, console passthrough for stdout/stderr, and the
//! host wall clock.

pub mod frame;
pub mod memory;
pub mod personality;
pub mod syscalls;
pub mod vfs;

pub use frame::{PresentOutcome, Presenter};
pub use memory::GuestMemory;
pub use personality::Personality;
pub use syscalls::Errno;
