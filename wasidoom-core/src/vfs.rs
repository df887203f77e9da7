//! The virtual file table the guest's descriptors resolve against.
//!
//! The table is fixed at startup: handles are pre-assigned, paths are matched
//! verbatim (no globbing, no `..` resolution), and nothing is ever created or
//! destroyed. Only the `exists` flags and the backing stream cursors mutate
//! over the life of a run.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

pub const FD_STDIN: u32 = 0;
pub const FD_STDOUT: u32 = 1;
pub const FD_STDERR: u32 = 2;
pub const FD_ROOT: u32 = 3;
pub const FD_WAD: u32 = 5;
pub const FD_SCREEN: u32 = 6;
pub const FD_PALETTE: u32 = 7;

pub const WAD_PATH: &str = "./doom1.wad";
pub const SCREEN_PATH: &str = "./screen.data";
pub const PALETTE_PATH: &str = "./palette.raw";

/// Name reported for the single preopened directory, NUL included.
pub const ROOT_DIR_NAME: &[u8] = b"/\0";

/// Read-only host stream backing a table entry (the WAD in production,
/// an in-memory cursor in tests).
pub trait HostStream: Read + Seek + Send {}
impl<T: Read + Seek + Send> HostStream for T {}

pub type ConsoleWriter = Box<dyn FnMut(&[u8]) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    RegularFile,
}

impl FileKind {
    /// WASI filetype tag as it appears in fdstat/filestat records.
    pub fn filetype(self) -> u8 {
        match self {
            FileKind::Directory => 3,
            FileKind::RegularFile => 4,
        }
    }
}

/// What a descriptor is actually wired to on the host side.
pub enum Backing {
    /// Nothing at all (stdin, the preopened directory).
    None,
    /// A seekable read-only stream.
    Stream(Box<dyn HostStream>),
    /// A growable in-memory byte buffer the guest overwrites per frame.
    Sink(Cursor<Vec<u8>>),
    /// A host callback receiving every gathered write (stdout/stderr).
    Console(ConsoleWriter),
}

pub struct Descriptor {
    pub handle: u32,
    pub kind: FileKind,
    pub backing: Backing,
    pub exists: bool,
    /// Overrides the computed stream length in filestat when present.
    pub size: Option<u64>,
    /// Mount name, present only on the directory entry.
    pub dir_name: Option<&'static [u8]>,
}

impl Descriptor {
    /// Seek the backing stream. `None` when there is no seekable stream
    /// behind this descriptor.
    pub fn seek(&mut self, pos: SeekFrom) -> Option<io::Result<u64>> {
        match &mut self.backing {
            Backing::Stream(s) => Some(s.seek(pos)),
            Backing::Sink(c) => Some(c.seek(pos)),
            Backing::None | Backing::Console(_) => None,
        }
    }

    /// Total stream length, with the cursor restored afterwards.
    pub fn stream_len(&mut self) -> io::Result<u64> {
        match &mut self.backing {
            Backing::Stream(s) => {
                let cur = s.stream_position()?;
                let end = s.seek(SeekFrom::End(0))?;
                s.seek(SeekFrom::Start(cur))?;
                Ok(end)
            }
            Backing::Sink(c) => Ok(c.get_ref().len() as u64),
            Backing::None | Backing::Console(_) => Ok(0),
        }
    }

    /// Pull up to `want` bytes from the backing source. `None` when the
    /// descriptor has nothing readable behind it.
    pub fn read_up_to(&mut self, want: usize) -> Option<Vec<u8>> {
        let stream: &mut dyn Read = match &mut self.backing {
            Backing::Stream(s) => s,
            Backing::Sink(c) => c,
            Backing::None | Backing::Console(_) => return None,
        };

        let mut buf = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        buf.truncate(filled);
        Some(buf)
    }
}

/// Fixed path -> descriptor mapping, also indexable by handle.
///
/// Seven entries, built once. Handle assignment matches the historical
/// layout the guest binary was produced against (4 is unused).
pub struct FileTable {
    entries: Vec<(String, Descriptor)>,
}

impl FileTable {
    pub fn new(wad: Box<dyn HostStream>) -> Self {
        let entry = |path: &str, d: Descriptor| (path.to_string(), d);
        let console = || -> ConsoleWriter {
            Box::new(|bytes| {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                let _ = out.write_all(bytes);
                let _ = out.flush();
            })
        };
        let entries = vec![
            entry(
                "<stdin>",
                Descriptor {
                    handle: FD_STDIN,
                    kind: FileKind::RegularFile,
                    backing: Backing::None,
                    exists: true,
                    size: None,
                    dir_name: None,
                },
            ),
            entry(
                "<stdout>",
                Descriptor {
                    handle: FD_STDOUT,
                    kind: FileKind::RegularFile,
                    backing: Backing::Console(console()),
                    exists: true,
                    size: None,
                    dir_name: None,
                },
            ),
            entry(
                "<stderr>",
                Descriptor {
                    handle: FD_STDERR,
                    kind: FileKind::RegularFile,
                    backing: Backing::Console(console()),
                    exists: true,
                    size: None,
                    dir_name: None,
                },
            ),
            entry(
                "/",
                Descriptor {
                    handle: FD_ROOT,
                    kind: FileKind::Directory,
                    backing: Backing::None,
                    exists: true,
                    size: None,
                    dir_name: Some(ROOT_DIR_NAME),
                },
            ),
            entry(
                WAD_PATH,
                Descriptor {
                    handle: FD_WAD,
                    kind: FileKind::RegularFile,
                    backing: Backing::Stream(wad),
                    exists: true,
                    size: None,
                    dir_name: None,
                },
            ),
            entry(
                SCREEN_PATH,
                Descriptor {
                    handle: FD_SCREEN,
                    kind: FileKind::RegularFile,
                    backing: Backing::Sink(Cursor::new(Vec::new())),
                    exists: false,
                    size: None,
                    dir_name: None,
                },
            ),
            entry(
                PALETTE_PATH,
                Descriptor {
                    handle: FD_PALETTE,
                    kind: FileKind::RegularFile,
                    backing: Backing::Sink(Cursor::new(Vec::new())),
                    exists: false,
                    size: None,
                    dir_name: None,
                },
            ),
        ];
        Self { entries }
    }

    pub fn by_handle(&self, fd: u32) -> Option<&Descriptor> {
        self.entries.iter().map(|(_, d)| d).find(|d| d.handle == fd)
    }

    pub fn by_handle_mut(&mut self, fd: u32) -> Option<&mut Descriptor> {
        self.entries
            .iter_mut()
            .map(|(_, d)| d)
            .find(|d| d.handle == fd)
    }

    pub fn by_path(&self, path: &str) -> Option<&Descriptor> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, d)| d)
    }

    pub fn by_path_mut(&mut self, path: &str) -> Option<&mut Descriptor> {
        self.entries
            .iter_mut()
            .find(|(p, _)| p == path)
            .map(|(_, d)| d)
    }

    /// Open by logical path: marks the entry as existing and yields its
    /// fixed handle. Unknown paths stay unknown, nothing is created.
    pub fn open(&mut self, path: &str) -> Option<u32> {
        let d = self.by_path_mut(path)?;
        d.exists = true;
        Some(d.handle)
    }

    /// Current contents of a sink-backed descriptor.
    pub fn sink(&self, fd: u32) -> Option<&[u8]> {
        match self.by_handle(fd)?.backing {
            Backing::Sink(ref c) => Some(c.get_ref().as_slice()),
            _ => None,
        }
    }
}
