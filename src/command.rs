//! The command set for the ST7558.
//!
//! Note 1: The display RAM of the ST7558 is arranged as 102 columns by 9 pages, where each page is
//! a horizontal band of 8 rows and each byte of a page drives the 8 vertically-adjacent pixels of
//! one column (LSB is the topmost row of the band). The visible panel of the Motorola C115 module
//! covers only 96 columns and 65 rows of that RAM.
//!
//! Note 2: The chip interprets commands in one of two mutually exclusive instruction sets, basic
//! and extended, selected by the H bit of the function set command. Each instruction set accepts a
//! disjoint group of commands; function set itself and data writes are accepted in both.

use crate::interface::DisplayInterface;

pub mod consts {
    //! Constants describing the panel dimensions and RAM layout.
    pub const NUM_PIXEL_COLS: u8 = 96;
    pub const NUM_PIXEL_ROWS: u8 = 65;
    pub const NUM_PAGES: u8 = (NUM_PIXEL_ROWS + 7) / 8;
    pub const BUF_SIZE: usize = NUM_PIXEL_COLS as usize * NUM_PAGES as usize;
    pub const RAM_COL_MAX: u8 = 101;
    pub const RAM_PAGE_MAX: u8 = 8;
    /// The largest data payload that fits in one bus transaction: the I2C write buffer holds 32
    /// bytes, of which one is consumed by the control/marker byte.
    pub const DATA_CHUNK_LEN: usize = 31;
}

use self::consts::*;

/// Selection of the instruction set the chip will use to interpret subsequent commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionSet {
    /// H = 0. Accepts display control, VLCD range, and the X/Y address commands.
    Basic,
    /// H = 1. Accepts system bias, Vop (contrast), and charge pump boost commands.
    Extended,
}

/// Setting of the display control command, covering the on/off and normal/inverse video states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    /// All LCD outputs blanked; display RAM is retained.
    Off,
    /// The display shows the RAM contents, set bits rendered dark.
    Normal,
    /// The display shows the RAM contents with the video inverted.
    Inverted,
    /// All segments driven on regardless of RAM contents.
    AllSegmentsOn,
}

/// Setting of the charge pump voltage multiplication factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoostRatio {
    X2,
    X3,
    X4,
    /// VDD x5, the value the original module is driven with.
    X5,
}

/// Setting of the VLCD programming range. High range is required for the C115 panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VlcdRange {
    Low,
    High,
}

/// A single chip instruction. Every ST7558 instruction encodes to exactly one byte, formed by
/// OR-ing the command opcode with its operand bits.
#[derive(Clone, Copy, Debug)]
pub enum Command {
    /// No operation.
    Nop,
    /// Select the instruction set used to interpret subsequent commands. Accepted in either
    /// instruction set.
    FunctionSet(InstructionSet),
    /// Enter power-down mode: LCD outputs at VSS, bias and VLCD generators off, RAM retained.
    /// Accepted in either instruction set.
    PowerDown,
    /// Set the RAM column address the next data byte will be written to. Range is 0-101. The
    /// column address auto-increments after each data byte, wrapping within the current page.
    /// Basic instruction set only.
    SetColumnAddress(u8),
    /// Set the RAM page address the next data byte will be written to. Range is 0-8. Basic
    /// instruction set only.
    SetPageAddress(u8),
    /// Set the display operating mode. See enum for details. Basic instruction set only.
    DisplayControl(DisplayMode),
    /// Select the VLCD programming range. Basic instruction set only.
    SetVlcdRange(VlcdRange),
    /// Set RAM mirroring in X and Y. The module wires the panel so that both mirrors must be
    /// enabled for row 0/column 0 to land at the top-left corner.
    ExtendedDisplayControl { mirror_x: bool, mirror_y: bool },
    /// Select the internal bias ratio appropriate for the panel mux rate. Extended instruction
    /// set only.
    SetSystemBias,
    /// Set the LCD operating voltage Vop, which controls pixel contrast. The operand is masked to
    /// 7 bits; 127 is the maximum contrast level. Extended instruction set only.
    SetVop(u8),
    /// Set the charge pump voltage multiplication factor. Extended instruction set only.
    SetBoost(BoostRatio),
}

impl Command {
    /// Encode this instruction into its single wire byte. Pure data transformation; the bit
    /// layout follows the datasheet exactly. Out-of-range address operands are rejected.
    pub fn encode(self) -> Result<u8, ()> {
        match self {
            Command::Nop => Ok(0x00),
            Command::FunctionSet(is) => {
                let h = match is {
                    InstructionSet::Basic => 0x00,
                    InstructionSet::Extended => 0x01,
                };
                Ok(0x20 | h)
            }
            Command::PowerDown => Ok(0x24),
            Command::SetColumnAddress(col) => match col {
                0..=RAM_COL_MAX => Ok(0x80 | col),
                _ => Err(()),
            },
            Command::SetPageAddress(page) => match page {
                0..=RAM_PAGE_MAX => Ok(0x40 | page),
                _ => Err(()),
            },
            Command::DisplayControl(mode) => {
                let de = match mode {
                    DisplayMode::Off => 0b000,
                    DisplayMode::Normal => 0b100,
                    DisplayMode::Inverted => 0b101,
                    DisplayMode::AllSegmentsOn => 0b001,
                };
                Ok(0x08 | de)
            }
            Command::SetVlcdRange(range) => {
                let prs = match range {
                    VlcdRange::Low => 0x00,
                    VlcdRange::High => 0x01,
                };
                Ok(0x10 | prs)
            }
            Command::ExtendedDisplayControl { mirror_x, mirror_y } => {
                let mx = if mirror_x { 0x02 } else { 0x00 };
                let my = if mirror_y { 0x04 } else { 0x00 };
                Ok(0x28 | mx | my)
            }
            Command::SetSystemBias => Ok(0x12),
            Command::SetVop(vop) => Ok(0x80 | (vop & 0x7F)),
            Command::SetBoost(ratio) => {
                let bs = match ratio {
                    BoostRatio::X2 => 0x00,
                    BoostRatio::X3 => 0x01,
                    BoostRatio::X4 => 0x02,
                    BoostRatio::X5 => 0x03,
                };
                Ok(0x08 | bs)
            }
        }
    }

    /// Encode and transmit this instruction as a single-command transaction. Multi-instruction
    /// sequences should instead be encoded into one buffer by the caller so the chip receives
    /// them in a single transaction.
    pub fn send<DI>(self, iface: &mut DI) -> Result<(), ()>
    where
        DI: DisplayInterface,
    {
        iface.send_commands(&[self.encode()?])
    }
}
