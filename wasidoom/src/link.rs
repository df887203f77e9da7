//! Registration of the personality layer into the guest's import table.
//!
//! The same handler set is published under both historical WASI namespace
//! names, so either revision of the guest binary links. Each wrapper pulls
//! the linear memory and the host state out of the caller, hands them to
//! the matching handler, and returns the errno as the guest's i32 result.

use std::fmt;

use anyhow::Result;
use wasidoom_core::{
    syscalls::{clock, env, fs},
    GuestMemory, Personality,
};
use wasmi::{core::Trap, Caller, Extern, Func, Linker, Store};

pub const WASI_NAMESPACES: [&str; 2] = ["wasi_unstable", "wasi_snapshot_preview1"];

/// Trap payload that unwinds the guest for `proc_exit` and for an
/// input-driven quit; carries the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSignal(pub i32);

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "guest exited with code {}", self.0)
    }
}

impl wasmi::core::HostError for ExitSignal {}

fn guest_parts<'a>(
    caller: &'a mut Caller<'_, Personality>,
) -> Result<(&'a mut [u8], &'a mut Personality), Trap> {
    let memory = caller
        .get_export("memory")
        .and_then(Extern::into_memory)
        .ok_or_else(|| Trap::new("guest module does not export a linear memory"))?;
    Ok(memory.data_and_store_mut(caller))
}

/// Build the (namespace, name) -> handler table and hand it to the linker.
pub fn link_wasi(store: &mut Store<Personality>, linker: &mut Linker<Personality>) -> Result<()> {
    let funcs: [(&str, Func); 15] = [
        (
            "args_sizes_get",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>, argc: u32, buf_len: u32| -> Result<i32, Trap> {
                    let (data, _) = guest_parts(&mut caller)?;
                    Ok(env::args_sizes_get(&mut GuestMemory::new(data), argc, buf_len) as i32)
                },
            ),
        ),
        (
            "args_get",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>, argv: u32, buf: u32| -> Result<i32, Trap> {
                    let (data, _) = guest_parts(&mut caller)?;
                    Ok(env::args_get(&mut GuestMemory::new(data), argv, buf) as i32)
                },
            ),
        ),
        (
            "environ_sizes_get",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>, envc: u32, buf_len: u32| -> Result<i32, Trap> {
                    let (data, _) = guest_parts(&mut caller)?;
                    Ok(env::environ_sizes_get(&mut GuestMemory::new(data), envc, buf_len) as i32)
                },
            ),
        ),
        (
            "environ_get",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>, envs: u32, buf: u32| -> Result<i32, Trap> {
                    let (data, _) = guest_parts(&mut caller)?;
                    Ok(env::environ_get(&mut GuestMemory::new(data), envs, buf) as i32)
                },
            ),
        ),
        (
            "fd_prestat_get",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>, fd: u32, buf: u32| -> Result<i32, Trap> {
                    let (data, host) = guest_parts(&mut caller)?;
                    Ok(fs::fd_prestat_get(host, &mut GuestMemory::new(data), fd, buf) as i32)
                },
            ),
        ),
        (
            "fd_prestat_dir_name",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>,
                 fd: u32,
                 name: u32,
                 name_len: u32|
                 -> Result<i32, Trap> {
                    let (data, host) = guest_parts(&mut caller)?;
                    Ok(
                        fs::fd_prestat_dir_name(host, &mut GuestMemory::new(data), fd, name, name_len)
                            as i32,
                    )
                },
            ),
        ),
        (
            "fd_fdstat_get",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>, fd: u32, buf: u32| -> Result<i32, Trap> {
                    let (data, host) = guest_parts(&mut caller)?;
                    Ok(fs::fd_fdstat_get(host, &mut GuestMemory::new(data), fd, buf) as i32)
                },
            ),
        ),
        (
            "path_filestat_get",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>,
                 fd: u32,
                 flags: u32,
                 path: u32,
                 path_len: u32,
                 buf: u32|
                 -> Result<i32, Trap> {
                    let (data, host) = guest_parts(&mut caller)?;
                    Ok(fs::path_filestat_get(
                        host,
                        &mut GuestMemory::new(data),
                        fd,
                        flags,
                        path,
                        path_len,
                        buf,
                    ) as i32)
                },
            ),
        ),
        (
            "path_open",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>,
                 dirfd: u32,
                 dirflags: u32,
                 path: u32,
                 path_len: u32,
                 oflags: u32,
                 rights_base: u64,
                 rights_inheriting: u64,
                 fs_flags: u32,
                 fd_out: u32|
                 -> Result<i32, Trap> {
                    let (data, host) = guest_parts(&mut caller)?;
                    Ok(fs::path_open(
                        host,
                        &mut GuestMemory::new(data),
                        dirfd,
                        dirflags,
                        path,
                        path_len,
                        oflags,
                        rights_base,
                        rights_inheriting,
                        fs_flags,
                        fd_out,
                    ) as i32)
                },
            ),
        ),
        (
            "fd_seek",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>,
                 fd: u32,
                 offset: i64,
                 whence: u32,
                 result: u32|
                 -> Result<i32, Trap> {
                    let (data, host) = guest_parts(&mut caller)?;
                    Ok(fs::fd_seek(host, &mut GuestMemory::new(data), fd, offset, whence, result)
                        as i32)
                },
            ),
        ),
        (
            "fd_close",
            Func::wrap(
                &mut *store,
                |_caller: Caller<'_, Personality>, fd: u32| -> Result<i32, Trap> {
                    Ok(fs::fd_close(fd) as i32)
                },
            ),
        ),
        (
            "fd_read",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>,
                 fd: u32,
                 iovs: u32,
                 iovs_len: u32,
                 nread: u32|
                 -> Result<i32, Trap> {
                    let (data, host) = guest_parts(&mut caller)?;
                    Ok(fs::fd_read(host, &mut GuestMemory::new(data), fd, iovs, iovs_len, nread)
                        as i32)
                },
            ),
        ),
        (
            "fd_write",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>,
                 fd: u32,
                 iovs: u32,
                 iovs_len: u32,
                 nwritten: u32|
                 -> Result<i32, Trap> {
                    let (data, host) = guest_parts(&mut caller)?;
                    let errno =
                        fs::fd_write(host, &mut GuestMemory::new(data), fd, iovs, iovs_len, nwritten);
                    // A quit observed during the publish terminates the run
                    // instead of returning to the guest.
                    if host.quit_requested() {
                        return Err(Trap::from(ExitSignal(0)));
                    }
                    Ok(errno as i32)
                },
            ),
        ),
        (
            "clock_time_get",
            Func::wrap(
                &mut *store,
                |mut caller: Caller<'_, Personality>,
                 clock_id: u32,
                 precision: u64,
                 result: u32|
                 -> Result<i32, Trap> {
                    let (data, _) = guest_parts(&mut caller)?;
                    Ok(clock::clock_time_get(&mut GuestMemory::new(data), clock_id, precision, result)
                        as i32)
                },
            ),
        ),
        (
            "proc_exit",
            Func::wrap(
                &mut *store,
                |_caller: Caller<'_, Personality>, code: u32| -> Result<(), Trap> {
                    Err(Trap::from(ExitSignal(code as i32)))
                },
            ),
        ),
    ];

    for (name, func) in funcs {
        for namespace in WASI_NAMESPACES {
            linker.define(namespace, name, func)?;
        }
    }
    Ok(())
}
