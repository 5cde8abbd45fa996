//! Mapper dispatch.
//!
//! The mapper sits on the CPU fetch path, so it is a tagged sum type with a
//! small match per operation rather than a trait object: the variants stay
//! inline and the calls can be inlined into the bus dispatch.

use crate::mirroring::Mirroring;
use crate::mmc1::Mmc1;
use crate::nrom::Nrom;
use crate::rom::Rom;

/// Errors from building a mapper.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MapperError {
    /// No implementation for this mapper number.
    #[error("unsupported mapper {0}")]
    Unsupported(u16),
}

/// Cartridge-side address translation and bank switching.
///
/// Six operations split across the three cartridge windows: PRG-ROM
/// ($8000-$FFFF), PRG-RAM/WRAM ($6000-$7FFF) and CHR ($0000-$1FFF on the
/// PPU bus).
#[derive(Debug, Clone)]
pub enum Mapper {
    /// Mapper 0: no banking.
    Nrom(Nrom),
    /// Mapper 1: MMC1 serial-shifter banking.
    Mmc1(Mmc1),
}

impl Mapper {
    /// Read from PRG-ROM space ($8000-$FFFF).
    #[inline]
    #[must_use]
    pub fn read_prg(&self, addr: u16) -> u8 {
        match self {
            Self::Nrom(m) => m.read_prg(addr),
            Self::Mmc1(m) => m.read_prg(addr),
        }
    }

    /// Write to PRG-ROM space. ROM ignores it; banked boards latch it.
    #[inline]
    pub fn write_prg(&mut self, addr: u16, value: u8) {
        match self {
            Self::Nrom(m) => m.write_prg(addr, value),
            Self::Mmc1(m) => m.write_prg(addr, value),
        }
    }

    /// Read CHR space ($0000-$1FFF on the PPU bus).
    #[inline]
    #[must_use]
    pub fn read_chr(&self, addr: u16) -> u8 {
        match self {
            Self::Nrom(m) => m.read_chr(addr),
            Self::Mmc1(m) => m.read_chr(addr),
        }
    }

    /// Write CHR space. Only boards with CHR-RAM accept it.
    #[inline]
    pub fn write_chr(&mut self, addr: u16, value: u8) {
        match self {
            Self::Nrom(m) => m.write_chr(addr, value),
            Self::Mmc1(m) => m.write_chr(addr, value),
        }
    }

    /// Read work RAM ($6000-$7FFF).
    #[inline]
    #[must_use]
    pub fn read_wram(&self, addr: u16) -> u8 {
        match self {
            Self::Nrom(m) => m.read_wram(addr),
            Self::Mmc1(m) => m.read_wram(addr),
        }
    }

    /// Write work RAM ($6000-$7FFF).
    #[inline]
    pub fn write_wram(&mut self, addr: u16, value: u8) {
        match self {
            Self::Nrom(m) => m.write_wram(addr, value),
            Self::Mmc1(m) => m.write_wram(addr, value),
        }
    }

    /// Current nametable arrangement. MMC1 can change it at runtime.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        match self {
            Self::Nrom(m) => m.mirroring(),
            Self::Mmc1(m) => m.mirroring(),
        }
    }

    /// Advance the mapper's notion of CPU time. MMC1 uses it to collapse
    /// back-to-back writes from read-modify-write instructions.
    #[inline]
    pub fn clock(&mut self, cpu_cycles: u64) {
        if let Self::Mmc1(m) = self {
            m.clock(cpu_cycles);
        }
    }

    /// Reset mapper-side latches (console reset; ROM contents and RAM are
    /// untouched).
    pub fn reset(&mut self) {
        if let Self::Mmc1(m) = self {
            m.reset();
        }
    }

    /// Mapper number.
    #[must_use]
    pub fn number(&self) -> u16 {
        match self {
            Self::Nrom(_) => 0,
            Self::Mmc1(_) => 1,
        }
    }

    /// Board name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nrom(_) => "NROM",
            Self::Mmc1(_) => "MMC1",
        }
    }
}

/// Build the mapper for a parsed ROM. Fails for unsupported numbers.
pub fn create_mapper(rom: &Rom) -> Result<Mapper, MapperError> {
    match rom.header.mapper_number {
        0 => Ok(Mapper::Nrom(Nrom::new(rom))),
        1 => Ok(Mapper::Mmc1(Mmc1::new(rom))),
        n => Err(MapperError::Unsupported(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomHeader;

    fn rom_with_mapper(mapper_number: u16) -> Rom {
        Rom {
            header: RomHeader {
                prg_rom_size: 16 * 1024,
                chr_rom_size: 8 * 1024,
                mapper_number,
                mirroring: Mirroring::Horizontal,
                has_battery: false,
                has_trainer: false,
            },
            prg_rom: vec![0; 16 * 1024],
            chr_rom: vec![0; 8 * 1024],
        }
    }

    #[test]
    fn factory_dispatches() {
        assert_eq!(create_mapper(&rom_with_mapper(0)).unwrap().name(), "NROM");
        assert_eq!(create_mapper(&rom_with_mapper(1)).unwrap().name(), "MMC1");
    }

    #[test]
    fn factory_rejects_unknown() {
        assert!(matches!(
            create_mapper(&rom_with_mapper(4)),
            Err(MapperError::Unsupported(4))
        ));
    }
}
