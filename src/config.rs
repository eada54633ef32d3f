//! Defines a struct for storing register values of commands in the ST7558 that are associated
//! with relatively-static bring-up configuration.

use crate::command::{BoostRatio, VlcdRange};

/// A configuration for the display, consumed by `Display::init` when it composes the bring-up
/// instruction sequence. `Config::new` yields the values the C115 module is known to run with;
/// builder methods offer a declarative way to override any of them for other panel wirings.
pub struct Config {
    pub(crate) vop: u8,
    pub(crate) boost: BoostRatio,
    pub(crate) vlcd_range: VlcdRange,
    pub(crate) mirror_x: bool,
    pub(crate) mirror_y: bool,
}

impl Config {
    /// Create a configuration with the module defaults: Vop 0x40, x5 charge pump, high VLCD
    /// range, and both RAM mirrors enabled.
    pub fn new() -> Self {
        Config {
            vop: 0x40,
            boost: BoostRatio::X5,
            vlcd_range: VlcdRange::High,
            mirror_x: true,
            mirror_y: true,
        }
    }

    /// Extend this `Config` with an explicit initial contrast (Vop) level. Masked to 7 bits when
    /// encoded. See `Command::SetVop`.
    pub fn vop(self, vop: u8) -> Self {
        Self { vop, ..self }
    }

    /// Extend this `Config` with an explicit charge pump ratio. See `Command::SetBoost`.
    pub fn boost(self, boost: BoostRatio) -> Self {
        Self { boost, ..self }
    }

    /// Extend this `Config` with an explicit VLCD programming range. See
    /// `Command::SetVlcdRange`.
    pub fn vlcd_range(self, vlcd_range: VlcdRange) -> Self {
        Self { vlcd_range, ..self }
    }

    /// Extend this `Config` with an explicit RAM mirroring setting. See
    /// `Command::ExtendedDisplayControl`.
    pub fn mirror(self, mirror_x: bool, mirror_y: bool) -> Self {
        Self {
            mirror_x,
            mirror_y,
            ..self
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
