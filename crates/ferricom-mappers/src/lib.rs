//! Cartridge parsing and mapper implementations for the ferricom NES
//! emulator.
//!
//! A cartridge is immutable after load ([`Rom`]); all writable state (bank
//! registers, PRG-RAM, CHR-RAM) lives in the [`Mapper`] built from it. The
//! mapper is a tagged enum rather than a trait object because its dispatch
//! sits on the CPU fetch path.
//!
//! # Supported mappers
//!
//! | Mapper | Name | Description |
//! |--------|------|-------------|
//! | 0 | NROM | No banking |
//! | 1 | MMC1 | Serial-shifter PRG/CHR banking + mirroring control |
//!
//! # Example
//!
//! ```no_run
//! use ferricom_mappers::{create_mapper, Rom};
//!
//! let data = std::fs::read("game.nes").expect("read ROM");
//! let rom = Rom::load(&data).expect("parse ROM");
//! let mapper = create_mapper(&rom).expect("supported mapper");
//! let first_opcode = mapper.read_prg(0x8000);
//! # let _ = first_opcode;
//! ```

mod mapper;
mod mirroring;
mod mmc1;
mod nrom;
mod rom;

pub use mapper::{create_mapper, Mapper, MapperError};
pub use mirroring::Mirroring;
pub use mmc1::Mmc1;
pub use nrom::Nrom;
pub use rom::{Rom, RomError, RomHeader};
