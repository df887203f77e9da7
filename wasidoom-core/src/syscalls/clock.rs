//! Wall-clock time for the guest.

use std::time::{SystemTime, UNIX_EPOCH};

use super::Errno;
use crate::memory::GuestMemory;

/// Clock id and precision hint are ignored; the guest always gets wall-clock
/// nanoseconds since the Unix epoch.
pub fn clock_time_get(
    mem: &mut GuestMemory<'_>,
    _clock_id: u32,
    _precision: u64,
    result_ptr: u32,
) -> Errno {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    mem.write_u64(result_ptr, nanos);
    Errno::Success
}
