//! Driver library for the Sitronix ST7558 monochrome dot matrix LCD controller, as found in the
//! Motorola C115 display module (96x65 pixels, I2C only).
//!
//! The driver owns a packed framebuffer mirroring the chip's paged RAM layout. Drawing calls
//! mutate the framebuffer; `Display::flush` replicates it into the chip page by page, splitting
//! each page across the 32-byte I2C transaction limit.

#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate itertools;

pub mod command;
pub mod config;
pub mod display;
pub mod framebuffer;
pub mod interface;

// Re-exports for primary API.
pub use crate::command::{consts, BoostRatio, Command, DisplayMode, InstructionSet, VlcdRange};
pub use crate::config::Config;
pub use crate::display::Display;
pub use crate::framebuffer::Framebuffer;
pub use crate::interface::i2c::I2cInterface;
