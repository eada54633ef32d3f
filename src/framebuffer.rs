//! The in-memory image of the display RAM.

use crate::command::consts::*;

/// An owned bitmap covering every pixel of the panel, packed the way the chip's RAM is: 9 pages
/// of 96 bytes, where byte `x + page * 96` drives the 8 vertically-adjacent pixels of column `x`
/// in that page, LSB being the topmost row of the page's band.
///
/// The panel height is not a multiple of 8, so the top 7 bits of the last page address rows that
/// do not exist on the glass. They are stored (and transmitted) anyway; the panel does not render
/// them.
pub struct Framebuffer {
    buf: [u8; BUF_SIZE],
}

impl Framebuffer {
    /// Create a framebuffer with every pixel clear.
    pub fn new() -> Self {
        Framebuffer { buf: [0; BUF_SIZE] }
    }

    /// Set or clear the pixel at `(x, y)`. Coordinates outside the panel are silently ignored,
    /// which lets drawing helpers run shapes off the edge without clipping logic of their own.
    pub fn set_pixel(&mut self, x: u8, y: u8, on: bool) {
        if x >= NUM_PIXEL_COLS || y >= NUM_PIXEL_ROWS {
            return;
        }
        let idx = x as usize + (y as usize / 8) * NUM_PIXEL_COLS as usize;
        let bit = 1 << (y % 8);
        if on {
            self.buf[idx] |= bit;
        } else {
            self.buf[idx] &= !bit;
        }
    }

    /// Read back the pixel at `(x, y)`. Out-of-range coordinates read as clear.
    pub fn pixel(&self, x: u8, y: u8) -> bool {
        if x >= NUM_PIXEL_COLS || y >= NUM_PIXEL_ROWS {
            return false;
        }
        let idx = x as usize + (y as usize / 8) * NUM_PIXEL_COLS as usize;
        self.buf[idx] & (1 << (y % 8)) != 0
    }

    /// Clear every pixel.
    pub fn clear(&mut self) {
        self.buf = [0; BUF_SIZE];
    }

    /// Set every pixel. Note this sets every *bit*, including the off-panel rows of the last
    /// page; it is the polarity twin of `clear`, not a background fill.
    pub fn fill(&mut self) {
        self.buf = [0xFF; BUF_SIZE];
    }

    /// The 96-byte slice holding page `p`.
    pub fn page(&self, p: usize) -> &[u8] {
        let cols = NUM_PIXEL_COLS as usize;
        &self.buf[p * cols..(p + 1) * cols]
    }

    /// A view of the whole packed bitmap, for bulk image export.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Bulk-load a packed bitmap, bypassing per-pixel access. A source larger than the
    /// framebuffer is rejected and leaves the contents untouched; a smaller one overwrites from
    /// the start of page 0 and leaves the remainder as it was.
    pub fn load(&mut self, src: &[u8]) -> Result<(), ()> {
        if src.len() > BUF_SIZE {
            return Err(());
        }
        self.buf[..src.len()].copy_from_slice(src);
        Ok(())
    }
}
