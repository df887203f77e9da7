//! Argument and environment introspection.
//!
//! The vector is hardcoded: `["doom"]` with `HOME=/`. These calls exist only
//! to satisfy the guest's libc startup; the sizes reported must match the
//! bytes later written, NUL terminators included.

use super::Errno;
use crate::memory::GuestMemory;

const ARGV: &[u8] = b"doom\0";
const ENVIRON: &[u8] = b"HOME=/\0";

// Counts and buffer sizes as the guest binary was built to expect them.
const ARG_COUNT: u32 = 3;
const ARG_BUF_LEN: u32 = 32;
const ENV_COUNT: u32 = 1;
const ENV_BUF_LEN: u32 = 32;

pub fn args_sizes_get(mem: &mut GuestMemory<'_>, argc_ptr: u32, buf_len_ptr: u32) -> Errno {
    mem.write_u32(argc_ptr, ARG_COUNT);
    mem.write_u32(buf_len_ptr, ARG_BUF_LEN);
    Errno::Success
}

pub fn args_get(mem: &mut GuestMemory<'_>, argv_ptr: u32, buf_ptr: u32) -> Errno {
    mem.write_u32(argv_ptr, buf_ptr);
    mem.write(buf_ptr, ARGV);
    Errno::Success
}

pub fn environ_sizes_get(mem: &mut GuestMemory<'_>, envc_ptr: u32, buf_len_ptr: u32) -> Errno {
    mem.write_u32(envc_ptr, ENV_COUNT);
    mem.write_u32(buf_len_ptr, ENV_BUF_LEN);
    Errno::Success
}

pub fn environ_get(mem: &mut GuestMemory<'_>, env_ptr: u32, buf_ptr: u32) -> Errno {
    mem.write_u32(env_ptr, buf_ptr);
    mem.write(buf_ptr, ENVIRON);
    Errno::Success
}
