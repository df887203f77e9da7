//! Descriptor and path operations.
//!
//! Wire layouts are bit-exact: prestat is `{tag: u32, name_len: u32}`,
//! fdstat is `{filetype: u8, pad, flags: u16, pad x4, rights: u64 x2}`,
//! filestat is `{dev: u64, ino: u64, filetype: u8, pad x7, nlink: u64,
//! size: u64, atim/mtim/ctim: u64}`. Records are zeroed first so padding
//! bytes are written too.

use std::io::{SeekFrom, Write};

use super::{iovec, Errno};
use crate::memory::GuestMemory;
use crate::personality::Personality;
use crate::vfs::Backing;

/// Path bytes are UTF-8 text matched verbatim against the table keys.
fn decode_path(mem: &GuestMemory<'_>, ptr: u32, len: u32) -> Result<String, Errno> {
    match std::str::from_utf8(mem.read(ptr, len)) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Err(Errno::Inval),
    }
}

pub fn fd_prestat_get(host: &Personality, mem: &mut GuestMemory<'_>, fd: u32, buf: u32) -> Errno {
    let Some(name) = host.table().by_handle(fd).and_then(|d| d.dir_name) else {
        log::trace!("fd_prestat_get fd:{fd} => EBADF");
        return Errno::BadF;
    };
    mem.write_u32(buf, 0); // tag: preopened directory
    mem.write_u32(buf + 4, name.len() as u32);
    log::trace!("fd_prestat_get fd:{fd} | type:0, name_len:{} => ESUCCESS", name.len());
    Errno::Success
}

pub fn fd_prestat_dir_name(
    host: &Personality,
    mem: &mut GuestMemory<'_>,
    fd: u32,
    name_ptr: u32,
    _name_len: u32,
) -> Errno {
    let Some(name) = host.table().by_handle(fd).and_then(|d| d.dir_name) else {
        log::trace!("fd_prestat_dir_name fd:{fd} => EBADF");
        return Errno::BadF;
    };
    mem.write(name_ptr, name);
    Errno::Success
}

pub fn fd_fdstat_get(host: &Personality, mem: &mut GuestMemory<'_>, fd: u32, buf: u32) -> Errno {
    let Some(d) = host.table().by_handle(fd) else {
        log::trace!("fd_fdstat_get fd:{fd} => EBADF");
        return Errno::BadF;
    };

    // Rights are not modeled granularly: grant everything and rely on the
    // kind checks in the individual handlers.
    let mut rec = [0u8; 24];
    rec[0] = d.kind.filetype();
    rec[2..4].copy_from_slice(&0u16.to_le_bytes());
    rec[8..16].copy_from_slice(&u64::MAX.to_le_bytes());
    rec[16..24].copy_from_slice(&u64::MAX.to_le_bytes());
    mem.write(buf, &rec);
    Errno::Success
}

pub fn path_filestat_get(
    host: &mut Personality,
    mem: &mut GuestMemory<'_>,
    fd: u32,
    flags: u32,
    path_ptr: u32,
    path_len: u32,
    buf: u32,
) -> Errno {
    let path = match decode_path(mem, path_ptr, path_len) {
        Ok(p) => p,
        Err(errno) => return errno,
    };

    let Some(d) = host.table_mut().by_path_mut(&path) else {
        log::trace!("path_filestat_get fd:{fd}, flags:{flags:#x}, path:{path} => ENOENT");
        return Errno::NoEnt;
    };
    if !d.exists {
        log::trace!("path_filestat_get fd:{fd}, flags:{flags:#x}, path:{path} => ENOENT");
        return Errno::NoEnt;
    }

    let size = match d.size {
        Some(size) => size,
        None => d.stream_len().unwrap_or(0),
    };

    let mut rec = [0u8; 64];
    rec[0..8].copy_from_slice(&1u64.to_le_bytes()); // dev
    rec[8..16].copy_from_slice(&1u64.to_le_bytes()); // ino
    rec[16] = d.kind.filetype();
    rec[24..32].copy_from_slice(&1u64.to_le_bytes()); // nlink
    rec[32..40].copy_from_slice(&size.to_le_bytes());
    // atim/mtim/ctim stay zeroed
    mem.write(buf, &rec);
    log::trace!("path_filestat_get path:{path} | fs.size:{size} => ESUCCESS");
    Errno::Success
}

#[allow(clippy::too_many_arguments)]
pub fn path_open(
    host: &mut Personality,
    mem: &mut GuestMemory<'_>,
    dirfd: u32,
    _dirflags: u32,
    path_ptr: u32,
    path_len: u32,
    oflags: u32,
    _rights_base: u64,
    _rights_inheriting: u64,
    _fs_flags: u32,
    fd_out: u32,
) -> Errno {
    let path = match decode_path(mem, path_ptr, path_len) {
        Ok(p) => p,
        Err(errno) => return errno,
    };

    // Open/rights flags are accepted but carry no create/truncate/exclusive
    // semantics: every path in the table is openable once known.
    match host.table_mut().open(&path) {
        Some(handle) => {
            mem.write_u32(fd_out, handle);
            log::trace!("path_open dirfd:{dirfd}, path:{path}, oflags:{oflags:#x} | fd:{handle} => ESUCCESS");
            Errno::Success
        }
        None => {
            log::trace!("path_open dirfd:{dirfd}, path:{path}, oflags:{oflags:#x} => ENOENT");
            Errno::NoEnt
        }
    }
}

pub fn fd_seek(
    host: &mut Personality,
    mem: &mut GuestMemory<'_>,
    fd: u32,
    offset: i64,
    whence: u32,
    result_ptr: u32,
) -> Errno {
    let Some(d) = host.table_mut().by_handle_mut(fd) else {
        log::trace!("fd_seek fd:{fd} => EBADF");
        return Errno::BadF;
    };

    let pos = match whence {
        0 => SeekFrom::Start(offset as u64),
        1 => SeekFrom::Current(offset),
        2 => SeekFrom::End(offset),
        _ => return Errno::Inval,
    };

    match d.seek(pos) {
        Some(Ok(new_pos)) => {
            mem.write_u64(result_ptr, new_pos);
            log::trace!("fd_seek fd:{fd}, offset:{offset}, whence:{whence} | result:{new_pos} => ESUCCESS");
            Errno::Success
        }
        // seek before start of stream
        Some(Err(_)) => Errno::Inval,
        // no seekable stream behind this descriptor
        None => {
            log::trace!("fd_seek fd:{fd} => EINVAL");
            Errno::Inval
        }
    }
}

pub fn fd_close(fd: u32) -> Errno {
    // Backing streams live for the whole process; nothing to release.
    log::trace!("fd_close fd:{fd} => ESUCCESS");
    Errno::Success
}

pub fn fd_read(
    host: &mut Personality,
    mem: &mut GuestMemory<'_>,
    fd: u32,
    iovs: u32,
    iovs_len: u32,
    nread_ptr: u32,
) -> Errno {
    let mut want = 0usize;
    for i in 0..iovs_len {
        want += iovec(mem, iovs, i).1 as usize;
    }

    let data = host
        .table_mut()
        .by_handle_mut(fd)
        .and_then(|d| d.read_up_to(want));
    let data = match data {
        Some(data) if !data.is_empty() => data,
        _ => {
            log::trace!("fd_read fd:{fd} => EBADF");
            return Errno::BadF;
        }
    };

    // Scatter in iovec order, short-filling the last buffer.
    let mut consumed = 0usize;
    for i in 0..iovs_len {
        if consumed == data.len() {
            break;
        }
        let (dst, len) = iovec(mem, iovs, i);
        let take = (len as usize).min(data.len() - consumed);
        mem.write(dst, &data[consumed..consumed + take]);
        consumed += take;
    }

    mem.write_u32(nread_ptr, consumed as u32);
    log::trace!("fd_read fd:{fd} | nread:{consumed} => ESUCCESS");
    Errno::Success
}

pub fn fd_write(
    host: &mut Personality,
    mem: &mut GuestMemory<'_>,
    fd: u32,
    iovs: u32,
    iovs_len: u32,
    nwritten_ptr: u32,
) -> Errno {
    // Gather all referenced guest bytes, order preserved.
    let mut data = Vec::new();
    for i in 0..iovs_len {
        let (src, len) = iovec(mem, iovs, i);
        data.extend_from_slice(mem.read(src, len));
    }

    let Some(d) = host.table_mut().by_handle_mut(fd) else {
        log::trace!("fd_write fd:{fd} => EBADF");
        return Errno::BadF;
    };

    let mut wrote_sink = false;
    match &mut d.backing {
        Backing::Console(cb) => cb(&data),
        Backing::Sink(c) => {
            // Cannot fail: the sink is an in-memory buffer.
            let _ = c.write_all(&data);
            wrote_sink = true;
        }
        Backing::Stream(_) | Backing::None => {}
    }

    if wrote_sink {
        host.publish_sinks();
    }

    mem.write_u32(nwritten_ptr, data.len() as u32);
    log::trace!("fd_write fd:{fd} | nwritten:{} => ESUCCESS", data.len());
    Errno::Success
}
