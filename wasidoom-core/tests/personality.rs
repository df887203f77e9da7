//! End-to-end handler tests against an in-memory file table and a recording
//! presenter, driving the same entry points the runtime glue calls.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::RgbImage;
use wasidoom_core::frame::{PresentOutcome, Presenter, FRAME_BYTES, PALETTE_BYTES};
use wasidoom_core::memory::GuestMemory;
use wasidoom_core::personality::Personality;
use wasidoom_core::syscalls::{fs, Errno};
use wasidoom_core::vfs::{FileKind, FileTable, FD_PALETTE, FD_ROOT, FD_SCREEN, FD_WAD, WAD_PATH};

#[derive(Clone, Default)]
struct Recorder {
    frames: Arc<Mutex<Vec<RgbImage>>>,
}

impl Presenter for Recorder {
    fn present(&mut self, frame: &RgbImage) -> anyhow::Result<PresentOutcome> {
        self.frames.lock().unwrap().push(frame.clone());
        Ok(PresentOutcome::Continue)
    }
}

struct QuitOnFirstFrame;

impl Presenter for QuitOnFirstFrame {
    fn present(&mut self, _frame: &RgbImage) -> anyhow::Result<PresentOutcome> {
        Ok(PresentOutcome::Quit)
    }
}

fn host_with_wad(wad: &[u8]) -> (Personality, Recorder) {
    let recorder = Recorder::default();
    let table = FileTable::new(Box::new(Cursor::new(wad.to_vec())));
    (Personality::new(table, Box::new(recorder.clone())), recorder)
}

fn guest_buffer() -> Vec<u8> {
    vec![0u8; 256 * 1024]
}

fn put_str(mem: &mut GuestMemory<'_>, at: u32, s: &str) {
    mem.write(at, s.as_bytes());
}

/// Stage `chunks` in guest memory as an iovec list at offset 0 (data from
/// 4096 up) and issue one fd_write. The result slot lives at 2048.
fn write_chunks(
    host: &mut Personality,
    mem: &mut GuestMemory<'_>,
    fd: u32,
    chunks: &[&[u8]],
) -> Errno {
    let mut data_at = 4096u32;
    for (i, chunk) in chunks.iter().enumerate() {
        mem.write_u32(i as u32 * 8, data_at);
        mem.write_u32(i as u32 * 8 + 4, chunk.len() as u32);
        mem.write(data_at, chunk);
        data_at += chunk.len() as u32;
    }
    fs::fd_write(host, mem, fd, 0, chunks.len() as u32, 2048)
}

fn open_path(host: &mut Personality, mem: &mut GuestMemory<'_>, path: &str, fd_out: u32) -> Errno {
    put_str(mem, 1024, path);
    fs::path_open(host, mem, FD_ROOT, 0, 1024, path.len() as u32, 0, !0, !0, 0, fd_out)
}

#[test]
fn open_then_fdstat_reports_table_kind() {
    let (mut host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    let expectations = [
        ("<stdin>", FileKind::RegularFile),
        ("<stdout>", FileKind::RegularFile),
        ("<stderr>", FileKind::RegularFile),
        ("/", FileKind::Directory),
        ("./doom1.wad", FileKind::RegularFile),
        ("./screen.data", FileKind::RegularFile),
        ("./palette.raw", FileKind::RegularFile),
    ];
    for (path, kind) in expectations {
        assert_eq!(open_path(&mut host, &mut mem, path, 512), Errno::Success);
        let handle = mem.read_u32(512);
        assert_eq!(fs::fd_fdstat_get(&host, &mut mem, handle, 600), Errno::Success);
        assert_eq!(mem.read(600, 1)[0], kind.filetype(), "path {path}");
        // rights are all-bits-set in both slots
        assert_eq!(mem.read(608, 8), &[0xff; 8]);
        assert_eq!(mem.read(616, 8), &[0xff; 8]);
    }
}

#[test]
fn open_unknown_path_leaves_output_slot_unwritten() {
    let (mut host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    mem.write(512, &[0xAA, 0xAA, 0xAA, 0xAA]);
    assert_eq!(open_path(&mut host, &mut mem, "./doom2.wad", 512), Errno::NoEnt);
    assert_eq!(mem.read(512, 4), &[0xAA, 0xAA, 0xAA, 0xAA]);
}

#[test]
fn fdstat_of_unknown_handle_is_bad_descriptor() {
    let (host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    assert_eq!(fs::fd_fdstat_get(&host, &mut mem, 4, 0), Errno::BadF);
    assert_eq!(fs::fd_fdstat_get(&host, &mut mem, 9, 0), Errno::BadF);
}

#[test]
fn prestat_is_only_valid_for_the_root_directory() {
    let (host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    for fd in [0, 1, 2, 5, 6, 7, 8] {
        assert_eq!(fs::fd_prestat_get(&host, &mut mem, fd, 0), Errno::BadF);
    }

    assert_eq!(fs::fd_prestat_get(&host, &mut mem, FD_ROOT, 0), Errno::Success);
    assert_eq!(mem.read_u32(0), 0); // directory tag
    assert_eq!(mem.read_u32(4), 2); // strlen of "/\0"

    assert_eq!(fs::fd_prestat_dir_name(&host, &mut mem, FD_ROOT, 16, 2), Errno::Success);
    assert_eq!(mem.read(16, 2), b"/\0");
}

#[test]
fn seek_set_and_end_positions() {
    let wad = vec![7u8; 123];
    let (mut host, _) = host_with_wad(&wad);
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    assert_eq!(fs::fd_seek(&mut host, &mut mem, FD_WAD, 0, 2, 64), Errno::Success);
    assert_eq!(mem.read(64, 8), &123u64.to_le_bytes());

    assert_eq!(fs::fd_seek(&mut host, &mut mem, FD_WAD, 0, 0, 64), Errno::Success);
    assert_eq!(mem.read(64, 8), &0u64.to_le_bytes());
}

#[test]
fn seek_rejects_bad_handles_and_unseekable_backings() {
    let (mut host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    assert_eq!(fs::fd_seek(&mut host, &mut mem, 9, 0, 0, 64), Errno::BadF);
    // console and directory have no seekable stream
    assert_eq!(fs::fd_seek(&mut host, &mut mem, 1, 0, 0, 64), Errno::Inval);
    assert_eq!(fs::fd_seek(&mut host, &mut mem, FD_ROOT, 0, 0, 64), Errno::Inval);
    // whence out of range
    assert_eq!(fs::fd_seek(&mut host, &mut mem, FD_WAD, 0, 3, 64), Errno::Inval);
}

#[test]
fn read_past_end_short_fills() {
    let (mut host, _) = host_with_wad(b"IWADDATA");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    // two iovecs asking for 4 + 64 bytes against an 8-byte stream
    mem.write_u32(0, 4096);
    mem.write_u32(4, 4);
    mem.write_u32(8, 8192);
    mem.write_u32(12, 64);

    assert_eq!(fs::fd_read(&mut host, &mut mem, FD_WAD, 0, 2, 2048), Errno::Success);
    assert_eq!(mem.read_u32(2048), 8);
    assert_eq!(mem.read(4096, 4), b"IWAD");
    assert_eq!(mem.read(8192, 4), b"DATA");

    // stream exhausted now: no bytes means bad descriptor
    assert_eq!(fs::fd_read(&mut host, &mut mem, FD_WAD, 0, 2, 2048), Errno::BadF);
}

#[test]
fn read_from_unbacked_descriptors_is_bad_descriptor() {
    let (mut host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    mem.write_u32(0, 4096);
    mem.write_u32(4, 16);
    for fd in [0, 1, 3, 9] {
        assert_eq!(fs::fd_read(&mut host, &mut mem, fd, 0, 1, 2048), Errno::BadF);
    }
}

#[test]
fn wad_open_filestat_and_seek_agree_on_size() {
    let wad = vec![0u8; 4321];
    let (mut host, _) = host_with_wad(&wad);
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    assert_eq!(open_path(&mut host, &mut mem, WAD_PATH, 512), Errno::Success);
    assert_eq!(mem.read_u32(512), FD_WAD);

    put_str(&mut mem, 1024, WAD_PATH);
    assert_eq!(
        fs::path_filestat_get(&mut host, &mut mem, FD_ROOT, 0, 1024, WAD_PATH.len() as u32, 640),
        Errno::Success
    );
    assert_eq!(mem.read(640 + 32, 8), &4321u64.to_le_bytes());
    assert_eq!(mem.read(640, 8), &1u64.to_le_bytes()); // dev
    assert_eq!(mem.read(640 + 16, 1)[0], FileKind::RegularFile.filetype());

    assert_eq!(fs::fd_seek(&mut host, &mut mem, FD_WAD, 0, 2, 64), Errno::Success);
    assert_eq!(mem.read(64, 8), &4321u64.to_le_bytes());
}

#[test]
fn filestat_of_never_opened_sink_is_not_found() {
    let (mut host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    let path = "./screen.data";
    put_str(&mut mem, 1024, path);
    assert_eq!(
        fs::path_filestat_get(&mut host, &mut mem, FD_ROOT, 0, 1024, path.len() as u32, 640),
        Errno::NoEnt
    );

    assert_eq!(open_path(&mut host, &mut mem, path, 512), Errno::Success);
    assert_eq!(
        fs::path_filestat_get(&mut host, &mut mem, FD_ROOT, 0, 1024, path.len() as u32, 640),
        Errno::Success
    );
}

#[test]
fn sink_write_lands_in_backing_buffer() {
    let (mut host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    assert_eq!(
        write_chunks(&mut host, &mut mem, FD_SCREEN, &[b"abc".as_slice(), b"defg"]),
        Errno::Success
    );
    assert_eq!(mem.read_u32(2048), 7);
    assert_eq!(host.table().sink(FD_SCREEN).unwrap(), b"abcdefg");
}

#[test]
fn console_write_reports_full_length() {
    let (mut host, _) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    assert_eq!(write_chunks(&mut host, &mut mem, 2, &[b"hello\n".as_slice()]), Errno::Success);
    assert_eq!(mem.read_u32(2048), 6);
    assert_eq!(write_chunks(&mut host, &mut mem, 9, &[b"x".as_slice()]), Errno::BadF);
}

#[test]
fn publish_waits_for_both_buffers_and_fires_once() {
    let (mut host, recorder) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    let half = vec![5u8; FRAME_BYTES / 2];
    let palette: Vec<u8> = (0..=255u8).flat_map(|i| [i, i, i]).collect();
    assert_eq!(palette.len(), PALETTE_BYTES);

    // two video writes totalling a full frame: palette still empty, no publish
    assert_eq!(write_chunks(&mut host, &mut mem, FD_SCREEN, &[half.as_slice()]), Errno::Success);
    assert_eq!(write_chunks(&mut host, &mut mem, FD_SCREEN, &[half.as_slice()]), Errno::Success);
    assert_eq!(recorder.frames.lock().unwrap().len(), 0);

    // the palette write completes the pair and triggers exactly one publish
    assert_eq!(write_chunks(&mut host, &mut mem, FD_PALETTE, &[palette.as_slice()]), Errno::Success);
    let frames = recorder.frames.lock().unwrap();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].pixels().all(|p| p.0 == [5, 5, 5]));
}

#[test]
fn partial_video_buffer_never_publishes() {
    let (mut host, recorder) = host_with_wad(b"IWAD");
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    let palette: Vec<u8> = (0..=255u8).flat_map(|i| [i, i, i]).collect();
    assert_eq!(write_chunks(&mut host, &mut mem, FD_PALETTE, &[palette.as_slice()]), Errno::Success);

    let short = vec![0u8; 319 * 200];
    assert_eq!(write_chunks(&mut host, &mut mem, FD_SCREEN, &[short.as_slice()]), Errno::Success);
    assert_eq!(recorder.frames.lock().unwrap().len(), 0);
}

#[test]
fn quit_signal_from_presenter_is_latched() {
    let table = FileTable::new(Box::new(Cursor::new(b"IWAD".to_vec())));
    let mut host = Personality::new(table, Box::new(QuitOnFirstFrame));
    let mut buf = guest_buffer();
    let mut mem = GuestMemory::new(&mut buf);

    let screen = vec![0u8; FRAME_BYTES];
    let palette = vec![0u8; PALETTE_BYTES];
    assert!(!host.quit_requested());
    assert_eq!(write_chunks(&mut host, &mut mem, FD_SCREEN, &[screen.as_slice()]), Errno::Success);
    assert_eq!(write_chunks(&mut host, &mut mem, FD_PALETTE, &[palette.as_slice()]), Errno::Success);
    assert!(host.quit_requested());
}

#[test]
fn close_always_succeeds() {
    assert_eq!(fs::fd_close(FD_WAD), Errno::Success);
    assert_eq!(fs::fd_close(99), Errno::Success);
}
