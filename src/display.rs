//! The main API to the display driver. It owns the framebuffer and the reset line, sequences the
//! chip bring-up, and replicates the framebuffer into the chip's RAM page by page.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;

use crate::command::consts::*;
use crate::command::{Command, DisplayMode, InstructionSet};
use crate::config::Config;
use crate::framebuffer::Framebuffer;
use crate::interface::DisplayInterface;

/// The longest instruction sequence the driver composes (the bring-up sequence).
const MAX_SEQ_LEN: usize = 12;

/// A driver for an ST7558 display.
///
/// Drawing calls mutate the owned framebuffer only; nothing reaches the panel until `flush`. All
/// operations are blocking and the driver holds no locks, so concurrent use from multiple
/// contexts needs an external mutual-exclusion wrapper.
pub struct Display<DI, RST>
where
    DI: DisplayInterface,
    RST: OutputPin,
{
    iface: DI,
    rst: RST,
    buffer: Framebuffer,
    /// The instruction set the chip is currently expected to be interpreting. The chip offers no
    /// readback, so this mirrors what the driver has commanded; every sequence containing a
    /// function set command updates it.
    mode: InstructionSet,
}

impl<DI, RST> Display<DI, RST>
where
    DI: DisplayInterface,
    RST: OutputPin,
{
    /// Construct a new display driver connected to the interface `iface`, with the chip's RESET
    /// pin on `rst`. The framebuffer starts out all-clear. The chip itself is in an undefined
    /// state until `init` runs.
    pub fn new(iface: DI, rst: RST) -> Self {
        Display {
            iface,
            rst,
            buffer: Framebuffer::new(),
            mode: InstructionSet::Basic,
        }
    }

    /// Tear down the driver and return the bus interface and reset pin.
    pub fn release(self) -> (DI, RST) {
        (self.iface, self.rst)
    }

    /// Encode a command sequence and transmit it as one transaction, keeping the tracked
    /// instruction set in step with any function set commands in the sequence.
    fn run(&mut self, cmds: &[Command]) -> Result<(), ()> {
        let mut buf = [0u8; MAX_SEQ_LEN];
        if cmds.len() > buf.len() {
            return Err(());
        }
        for (slot, cmd) in buf.iter_mut().zip(cmds) {
            *slot = cmd.encode()?;
            if let Command::FunctionSet(is) = cmd {
                self.mode = *is;
            }
        }
        self.iface.send_commands(&buf[..cmds.len()])
    }

    /// Pulse the RESET line: inactive for 1 ms after power-up, active for 5 ms, then released.
    /// The chip ignores or corrupts commands issued before this completes. The timing is a
    /// hardware requirement. The soft reset command is not used because it does not work over
    /// I2C.
    pub fn hard_reset<D>(&mut self, delay: &mut D) -> Result<(), ()>
    where
        D: DelayMs<u8>,
    {
        self.rst.set_high().map_err(|_| ())?;
        delay.delay_ms(1);
        self.rst.set_low().map_err(|_| ())?;
        delay.delay_ms(5);
        self.rst.set_high().map_err(|_| ())
    }

    /// Reset the chip and run the bring-up sequence, leaving the display on and the chip in the
    /// basic instruction set with its address cursor at the origin. Also clears the framebuffer.
    ///
    /// The sequence order is mandated by the chip: bias, Vop, and boost are only accepted while
    /// the extended instruction set is selected, and the VLCD range, display control, and
    /// address commands that follow are only accepted after switching back to basic.
    pub fn init<D>(&mut self, delay: &mut D, config: Config) -> Result<(), ()>
    where
        D: DelayMs<u8>,
    {
        self.buffer.clear();
        self.hard_reset(delay)?;
        self.run(&[
            Command::ExtendedDisplayControl {
                mirror_x: config.mirror_x,
                mirror_y: config.mirror_y,
            },
            Command::FunctionSet(InstructionSet::Extended),
            Command::SetSystemBias,
            Command::SetVop(config.vop),
            Command::SetBoost(config.boost),
            Command::FunctionSet(InstructionSet::Basic),
            Command::SetVlcdRange(config.vlcd_range),
            Command::DisplayControl(DisplayMode::Normal),
            Command::SetPageAddress(0),
            Command::SetColumnAddress(0),
        ])
    }

    /// Set the chip's RAM write cursor. The address commands are basic-set-only, so the mode
    /// select travels in the same transaction; with no readback available, re-asserting it is
    /// the only way to be sure the address bytes are interpreted as such.
    fn set_address(&mut self, col: u8, page: u8) -> Result<(), ()> {
        self.run(&[
            Command::FunctionSet(InstructionSet::Basic),
            Command::SetColumnAddress(col),
            Command::SetPageAddress(page),
        ])
    }

    /// Transmit the entire framebuffer to the chip's RAM.
    ///
    /// Each page is addressed explicitly before its data goes out: the chip's cursor
    /// auto-increments column-first within the selected page, but it is not relied on to wrap
    /// from the end of one page to the start of the next. Within a page the 96 bytes are split
    /// into transactions of at most 31 data bytes, which the chip sees as one continuous
    /// auto-incrementing run. The cursor is left homed at (0, 0) for the next redraw.
    ///
    /// Delivery is at-least-once-issued, never confirmed: the chip sends nothing back, so a
    /// reported `Ok` means every transaction was issued, not that the panel shows the image.
    pub fn flush(&mut self) -> Result<(), ()> {
        self.set_address(0, 0)?;
        for page in 0..NUM_PAGES {
            self.set_address(0, page)?;
            for chunk in self.buffer.page(page as usize).chunks(DATA_CHUNK_LEN) {
                self.iface.send_data(chunk)?;
            }
        }
        self.set_address(0, 0)
    }

    /// Set the contrast (Vop) level. Values above 127 are masked to 7 bits. The Vop command is
    /// extended-set-only; the sequence switches back to the basic set before returning so that
    /// the addressing and display control operations can assume it.
    pub fn set_contrast(&mut self, value: u8) -> Result<(), ()> {
        self.run(&[
            Command::FunctionSet(InstructionSet::Extended),
            Command::SetVop(value),
            Command::FunctionSet(InstructionSet::Basic),
        ])
    }

    /// Select normal or inverted video. Takes effect immediately; display RAM is unaffected.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), ()> {
        let mode = if inverted {
            DisplayMode::Inverted
        } else {
            DisplayMode::Normal
        };
        self.run(&[
            Command::FunctionSet(InstructionSet::Basic),
            Command::DisplayControl(mode),
        ])
    }

    /// Switch the panel output on or off. Display RAM is retained while off.
    pub fn set_powered(&mut self, on: bool) -> Result<(), ()> {
        let mode = if on { DisplayMode::Normal } else { DisplayMode::Off };
        self.run(&[
            Command::FunctionSet(InstructionSet::Basic),
            Command::DisplayControl(mode),
        ])
    }

    /// Blank the panel and put the chip into power-down mode. RAM is retained; `init` brings the
    /// chip back.
    pub fn shutdown(&mut self) -> Result<(), ()> {
        self.run(&[
            Command::FunctionSet(InstructionSet::Basic),
            Command::DisplayControl(DisplayMode::Off),
            Command::PowerDown,
        ])
    }

    /// The instruction set the chip is currently expected to be interpreting.
    pub fn instruction_set(&self) -> InstructionSet {
        self.mode
    }

    /// Set or clear one pixel in the framebuffer. Out-of-range coordinates are silently
    /// ignored.
    pub fn set_pixel(&mut self, x: u8, y: u8, on: bool) {
        self.buffer.set_pixel(x, y, on);
    }

    /// Read back one pixel from the framebuffer.
    pub fn pixel(&self, x: u8, y: u8) -> bool {
        self.buffer.pixel(x, y)
    }

    /// Clear every pixel in the framebuffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Set every pixel in the framebuffer.
    pub fn fill(&mut self) {
        self.buffer.fill();
    }

    /// A view of the packed framebuffer bytes, for bulk image export.
    pub fn buffer(&self) -> &[u8] {
        self.buffer.bytes()
    }

    /// Bulk-load a packed bitmap into the framebuffer, bypassing per-pixel access. Sources
    /// larger than the framebuffer are rejected; smaller ones overwrite from the start.
    pub fn load_buffer(&mut self, src: &[u8]) -> Result<(), ()> {
        self.buffer.load(src)
    }

    /// The panel width in pixels.
    pub fn width(&self) -> u8 {
        NUM_PIXEL_COLS
    }

    /// The panel height in pixels.
    pub fn height(&self) -> u8 {
        NUM_PIXEL_ROWS
    }

    /// Draw the 1-pixel outline of a rectangle with its upper-left corner at `(x, y)`. Portions
    /// off the panel are dropped by the pixel primitive.
    pub fn draw_rect(&mut self, x: u8, y: u8, w: u8, h: u8, on: bool) {
        if w == 0 || h == 0 {
            return;
        }
        let x1 = x.saturating_add(w - 1);
        let y1 = y.saturating_add(h - 1);
        for cx in x..=x1 {
            self.buffer.set_pixel(cx, y, on);
            self.buffer.set_pixel(cx, y1, on);
        }
        for cy in y..=y1 {
            self.buffer.set_pixel(x, cy, on);
            self.buffer.set_pixel(x1, cy, on);
        }
    }

    /// Draw a solid rectangle with its upper-left corner at `(x, y)`.
    pub fn fill_rect(&mut self, x: u8, y: u8, w: u8, h: u8, on: bool) {
        for (cx, cy) in iproduct!(x..x.saturating_add(w), y..y.saturating_add(h)) {
            self.buffer.set_pixel(cx, cy, on);
        }
    }

    /// Draw the outline of a square with side length `side`.
    pub fn draw_square(&mut self, x: u8, y: u8, side: u8, on: bool) {
        self.draw_rect(x, y, side, side, on);
    }

    /// Draw a solid square with side length `side`.
    pub fn fill_square(&mut self, x: u8, y: u8, side: u8, on: bool) {
        self.fill_rect(x, y, side, side, on);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::command::BoostRatio;
    use crate::command::VlcdRange;
    use crate::interface::test_spy::{Sent, TestSpyInterface};

    macro_rules! cmds {
        ($($b:expr),*) => { Sent::Cmds(vec![$($b,)*]) };
    }

    struct NoopDelay;

    impl DelayMs<u8> for NoopDelay {
        fn delay_ms(&mut self, _ms: u8) {}
    }

    /// A reset pin that records each level it is driven to.
    struct SpyPin {
        levels: Rc<RefCell<Vec<bool>>>,
    }

    impl SpyPin {
        fn new() -> (Self, Rc<RefCell<Vec<bool>>>) {
            let levels = Rc::new(RefCell::new(Vec::new()));
            (
                SpyPin {
                    levels: levels.clone(),
                },
                levels,
            )
        }
    }

    impl OutputPin for SpyPin {
        type Error = ();
        fn set_low(&mut self) -> Result<(), ()> {
            self.levels.borrow_mut().push(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), ()> {
            self.levels.borrow_mut().push(true);
            Ok(())
        }
    }

    fn new_display() -> (TestSpyInterface, Display<TestSpyInterface, SpyPin>) {
        let di = TestSpyInterface::new();
        let (pin, _) = SpyPin::new();
        (di.split(), Display::new(di, pin))
    }

    fn init_display() -> (TestSpyInterface, Display<TestSpyInterface, SpyPin>) {
        let (mut di, mut disp) = new_display();
        disp.init(&mut NoopDelay, Config::new()).unwrap();
        di.clear();
        (di, disp)
    }

    #[test]
    fn hard_reset_pulse() {
        let di = TestSpyInterface::new();
        let (pin, levels) = SpyPin::new();
        let mut disp = Display::new(di.split(), pin);
        disp.hard_reset(&mut NoopDelay).unwrap();
        assert_eq!(*levels.borrow(), vec![true, false, true]);
        // The reset line is GPIO-only; nothing goes over the bus.
        di.check_multi(&[]);
    }

    #[test]
    fn init_defaults() {
        let (di, mut disp) = new_display();
        disp.init(&mut NoopDelay, Config::new()).unwrap();
        di.check_multi(&[cmds!(
            0x2E, // extended display control, mirror X and Y
            0x21, // function set, extended
            0x12, // system bias
            0xC0, // Vop 0x40
            0x0B, // boost x5
            0x20, // function set, basic
            0x11, // VLCD range high
            0x0C, // display normal
            0x40, // page address 0
            0x80  // column address 0
        )]);
        assert_eq!(disp.instruction_set(), InstructionSet::Basic);
    }

    #[test]
    fn init_custom_config() {
        let (di, mut disp) = new_display();
        let cfg = Config::new()
            .vop(70)
            .boost(BoostRatio::X2)
            .vlcd_range(VlcdRange::Low)
            .mirror(false, true);
        disp.init(&mut NoopDelay, cfg).unwrap();
        di.check_multi(&[cmds!(
            0x2C, // extended display control, mirror Y only
            0x21, // function set, extended
            0x12, // system bias
            0xC6, // Vop 70
            0x08, // boost x2
            0x20, // function set, basic
            0x10, // VLCD range low
            0x0C, // display normal
            0x40, // page address 0
            0x80  // column address 0
        )]);
    }

    #[test]
    fn init_clears_framebuffer() {
        let (_di, mut disp) = new_display();
        disp.fill();
        disp.init(&mut NoopDelay, Config::new()).unwrap();
        assert!(disp.buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn flush_addresses_every_page_and_covers_every_byte() {
        let (di, mut disp) = init_display();
        // A recognizable pattern so byte order is checked, not just byte count.
        let image: Vec<u8> = (0..BUF_SIZE).map(|i| (i % 251) as u8).collect();
        disp.load_buffer(&image).unwrap();
        disp.flush().unwrap();

        let sent = di.sent();
        let mut expect = Vec::new();
        expect.push(cmds!(0x20, 0x80, 0x40));
        for page in 0..NUM_PAGES {
            expect.push(cmds!(0x20, 0x80, 0x40 | page));
            let base = page as usize * NUM_PIXEL_COLS as usize;
            for chunk in image[base..base + NUM_PIXEL_COLS as usize].chunks(DATA_CHUNK_LEN) {
                expect.push(Sent::Data(chunk.to_vec()));
            }
        }
        expect.push(cmds!(0x20, 0x80, 0x40));
        assert_eq!(sent, expect);

        // Every framebuffer byte goes out, in page-major column-minor order, and no
        // transaction exceeds the payload cap.
        let data: Vec<u8> = sent
            .iter()
            .filter_map(|s| match s {
                Sent::Data(d) => {
                    assert!(d.len() <= DATA_CHUNK_LEN);
                    Some(d.clone())
                }
                Sent::Cmds(_) => None,
            })
            .flatten()
            .collect();
        assert_eq!(data, image);
    }

    #[test]
    fn flush_chunk_layout() {
        let (di, mut disp) = init_display();
        disp.flush().unwrap();
        // 96 bytes per page split 31+31+31+3, nine pages, bracketed by cursor homing.
        let sent = di.sent();
        let data_lens: Vec<usize> = sent
            .iter()
            .filter_map(|s| match s {
                Sent::Data(d) => Some(d.len()),
                Sent::Cmds(_) => None,
            })
            .collect();
        assert_eq!(data_lens.len(), 4 * NUM_PAGES as usize);
        assert_eq!(&data_lens[..4], &[31, 31, 31, 3]);
        assert_eq!(data_lens.iter().sum::<usize>(), BUF_SIZE);
        let addr_count = sent
            .iter()
            .filter(|s| match s {
                Sent::Cmds(_) => true,
                Sent::Data(_) => false,
            })
            .count();
        assert_eq!(addr_count, NUM_PAGES as usize + 2);
    }

    #[test]
    fn set_contrast_restores_basic_mode() {
        let (di, mut disp) = init_display();
        disp.set_contrast(200).unwrap();
        // 200 is masked to 72.
        di.check_multi(&[cmds!(0x21, 0x80 | 72, 0x20)]);
        assert_eq!(disp.instruction_set(), InstructionSet::Basic);
    }

    #[test]
    fn display_control_sequences() {
        let (mut di, mut disp) = init_display();

        disp.set_inverted(true).unwrap();
        di.check_multi(&[cmds!(0x20, 0x0D)]);
        di.clear();

        disp.set_inverted(false).unwrap();
        di.check_multi(&[cmds!(0x20, 0x0C)]);
        di.clear();

        disp.set_powered(false).unwrap();
        di.check_multi(&[cmds!(0x20, 0x08)]);
        di.clear();

        disp.set_powered(true).unwrap();
        di.check_multi(&[cmds!(0x20, 0x0C)]);
    }

    #[test]
    fn shutdown_sequence() {
        let (di, mut disp) = init_display();
        disp.shutdown().unwrap();
        di.check_multi(&[cmds!(0x20, 0x08, 0x24)]);
    }

    #[test]
    fn drawing_is_buffered_until_flush() {
        let (di, mut disp) = init_display();
        disp.set_pixel(3, 3, true);
        disp.fill_rect(10, 10, 4, 4, true);
        di.check_multi(&[]);
    }

    #[test]
    fn fill_rect_sets_expected_pixels() {
        let (_di, mut disp) = init_display();
        disp.fill_rect(10, 6, 3, 4, true);
        for (x, y) in iproduct!(0..disp.width(), 0..disp.height()) {
            let inside = (10..13).contains(&x) && (6..10).contains(&y);
            assert_eq!(disp.pixel(x, y), inside, "at ({}, {})", x, y);
        }
    }

    #[test]
    fn draw_rect_outline_only() {
        let (_di, mut disp) = init_display();
        disp.draw_rect(5, 5, 4, 3, true);
        for (x, y) in iproduct!(0..disp.width(), 0..disp.height()) {
            let on_edge = (5..9).contains(&x)
                && (5..8).contains(&y)
                && (x == 5 || x == 8 || y == 5 || y == 7);
            assert_eq!(disp.pixel(x, y), on_edge, "at ({}, {})", x, y);
        }
    }

    #[test]
    fn shapes_clip_at_panel_edges() {
        let (_di, mut disp) = init_display();
        disp.fill_square(90, 60, 10, true);
        assert!(disp.pixel(95, 64));
        // Everything past the edge was dropped; only the in-range corner is set.
        let set = disp
            .buffer()
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum::<usize>();
        assert_eq!(set, 6 * 5);
    }

    #[test]
    fn load_buffer_validates_size() {
        let (_di, mut disp) = init_display();
        assert_eq!(disp.load_buffer(&vec![0u8; BUF_SIZE + 1]), Err(()));
        assert!(disp.buffer().iter().all(|&b| b == 0));
        assert!(disp.load_buffer(&vec![0xFFu8; BUF_SIZE]).is_ok());
    }
}
