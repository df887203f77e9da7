//! Indexed-color frame composition and the publish-on-write protocol.
//!
//! The guest does not signal "frame done". Instead it rewrites the screen
//! and palette sinks from offset zero, and the host re-checks completeness
//! after every sink write. Until both buffers hold exactly their required
//! byte counts the check is a no-op, so the write pattern converges to one
//! effective publish per frame.

use anyhow::Result;
use image::RgbImage;

use crate::vfs::{FileTable, FD_PALETTE, FD_SCREEN};

pub const FRAME_WIDTH: u32 = 320;
pub const FRAME_HEIGHT: u32 = 200;
pub const FRAME_BYTES: usize = (FRAME_WIDTH * FRAME_HEIGHT) as usize;
pub const PALETTE_BYTES: usize = 256 * 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Continue,
    /// The host observed a quit signal while draining input events.
    Quit,
}

/// Rendering/input side of a publish, implemented by the windowing layer.
pub trait Presenter {
    fn present(&mut self, frame: &RgbImage) -> Result<PresentOutcome>;
}

/// Map a full screen of palette indices through a full palette into RGB.
///
/// Returns `None` unless both buffers are complete; a partial frame means
/// the guest is still mid-write.
pub fn compose(screen: &[u8], palette: &[u8]) -> Option<RgbImage> {
    if screen.len() != FRAME_BYTES || palette.len() != PALETTE_BYTES {
        return None;
    }

    let mut rgb = Vec::with_capacity(FRAME_BYTES * 3);
    for &index in screen {
        let base = index as usize * 3;
        rgb.extend_from_slice(&palette[base..base + 3]);
    }
    RgbImage::from_raw(FRAME_WIDTH, FRAME_HEIGHT, rgb)
}

/// The per-write publish check: compose if both sinks are complete and hand
/// the frame to the presenter.
pub fn publish_if_complete(
    table: &FileTable,
    presenter: &mut dyn Presenter,
) -> Result<PresentOutcome> {
    let (Some(screen), Some(palette)) = (table.sink(FD_SCREEN), table.sink(FD_PALETTE)) else {
        return Ok(PresentOutcome::Continue);
    };
    match compose(screen, palette) {
        Some(frame) => presenter.present(&frame),
        None => Ok(PresentOutcome::Continue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grayscale_palette() -> Vec<u8> {
        let mut pal = Vec::with_capacity(PALETTE_BYTES);
        for i in 0..=255u8 {
            pal.extend_from_slice(&[i, i, i]);
        }
        pal
    }

    #[test]
    fn incomplete_buffers_do_not_compose() {
        let pal = grayscale_palette();
        assert!(compose(&[], &pal).is_none());
        // one column short of a full screen
        assert!(compose(&vec![0u8; 319 * 200], &pal).is_none());
        assert!(compose(&vec![0u8; FRAME_BYTES + 1], &pal).is_none());
        assert!(compose(&vec![0u8; FRAME_BYTES], &pal[..765]).is_none());
    }

    #[test]
    fn indices_map_through_palette() {
        let frame = compose(&vec![5u8; FRAME_BYTES], &grayscale_palette()).unwrap();
        assert_eq!(frame.dimensions(), (FRAME_WIDTH, FRAME_HEIGHT));
        assert!(frame.pixels().all(|p| p.0 == [5, 5, 5]));
    }

    #[test]
    fn last_palette_entry_is_reachable() {
        let frame = compose(&vec![255u8; FRAME_BYTES], &grayscale_palette()).unwrap();
        assert!(frame.pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
