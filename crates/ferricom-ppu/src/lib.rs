//! Ricoh 2C02 PPU emulation for the ferricom NES emulator.
//!
//! A dot-accurate pipeline: 341 dots by 262 scanlines, background tile
//! fetches on the 8-dot cadence, eight sprite units rebuilt per scanline,
//! and the v/t/x/w scroll unit driving VRAM addressing. The PPU runs at
//! three dots per CPU cycle; the console steps it and polls
//! [`Ppu::take_nmi`] after each batch so ownership stays acyclic.
//!
//! Memory split:
//!
//! - Pattern tables and nametables are fetched through the [`PpuBus`]
//!   trait (cartridge CHR and console CIRAM).
//! - Palette RAM and OAM live inside the [`Ppu`].
//!
//! The frame buffer holds 6-bit palette indices; [`NES_PALETTE`] maps them
//! to RGB for presentation.

mod background;
pub mod bits;
mod ctrl;
mod mask;
mod oam;
mod palette;
mod ppu;
mod scroll;
mod sprites;
mod status;

pub use ctrl::PpuCtrl;
pub use mask::PpuMask;
pub use oam::{Oam, SecondaryOam, SpriteEntry};
pub use palette::{PaletteRam, NES_PALETTE};
pub use ppu::{Ppu, PpuBus, FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH};
pub use scroll::Scroll;
pub use status::PpuStatus;
