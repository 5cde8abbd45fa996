//! NROM (mapper 0).
//!
//! No bank switching: PRG-ROM appears at $8000-$FFFF, with 16 KiB boards
//! mirrored into the upper half. CHR passes straight through. A handful of
//! boards (Family BASIC) wire up work RAM, so $6000-$7FFF is backed too.

use crate::mirroring::Mirroring;
use crate::rom::Rom;

/// Mapper 0.
#[derive(Debug, Clone)]
pub struct Nrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    wram: Vec<u8>,
    mirroring: Mirroring,
}

impl Nrom {
    /// Build from a parsed ROM.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let chr_is_ram = rom.chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0; 8 * 1024]
        } else {
            rom.chr_rom.clone()
        };
        Self {
            prg_rom: rom.prg_rom.clone(),
            chr,
            chr_is_ram,
            wram: vec![0; 8 * 1024],
            mirroring: rom.header.mirroring,
        }
    }

    pub(crate) fn read_prg(&self, addr: u16) -> u8 {
        // 16 KiB boards mirror at $C000.
        let offset = (addr as usize - 0x8000) % self.prg_rom.len();
        self.prg_rom[offset]
    }

    pub(crate) fn write_prg(&mut self, addr: u16, value: u8) {
        log::trace!("ignored write {value:02X} to NROM PRG at {addr:04X}");
    }

    pub(crate) fn read_chr(&self, addr: u16) -> u8 {
        self.chr[(addr & 0x1FFF) as usize]
    }

    pub(crate) fn write_chr(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            self.chr[(addr & 0x1FFF) as usize] = value;
        }
    }

    pub(crate) fn read_wram(&self, addr: u16) -> u8 {
        self.wram[(addr & 0x1FFF) as usize]
    }

    pub(crate) fn write_wram(&mut self, addr: u16, value: u8) {
        self.wram[(addr & 0x1FFF) as usize] = value;
    }

    pub(crate) fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomHeader;

    fn make_rom(prg_banks: usize, chr_banks: usize) -> Rom {
        let prg_rom: Vec<u8> = (0..prg_banks * 16 * 1024)
            .map(|i| (i & 0xFF) as u8)
            .collect();
        let chr_rom: Vec<u8> = (0..chr_banks * 8 * 1024)
            .map(|i| ((i >> 4) & 0xFF) as u8)
            .collect();
        Rom {
            header: RomHeader {
                prg_rom_size: prg_rom.len(),
                chr_rom_size: chr_rom.len(),
                mapper_number: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
            },
            prg_rom,
            chr_rom,
        }
    }

    #[test]
    fn small_board_mirrors_prg() {
        let mut rom = make_rom(1, 1);
        rom.prg_rom[0x0000] = 0xAA;
        rom.prg_rom[0x3FFF] = 0xBB;
        let m = Nrom::new(&rom);
        assert_eq!(m.read_prg(0x8000), 0xAA);
        assert_eq!(m.read_prg(0xC000), 0xAA);
        assert_eq!(m.read_prg(0xBFFF), 0xBB);
        assert_eq!(m.read_prg(0xFFFF), 0xBB);
    }

    #[test]
    fn large_board_does_not_mirror() {
        let mut rom = make_rom(2, 1);
        rom.prg_rom[0x0000] = 0xAA;
        rom.prg_rom[0x4000] = 0xCC;
        let m = Nrom::new(&rom);
        assert_eq!(m.read_prg(0x8000), 0xAA);
        assert_eq!(m.read_prg(0xC000), 0xCC);
    }

    #[test]
    fn prg_writes_ignored() {
        let rom = make_rom(1, 1);
        let mut m = Nrom::new(&rom);
        let before = m.read_prg(0x8000);
        m.write_prg(0x8000, !before);
        assert_eq!(m.read_prg(0x8000), before);
    }

    #[test]
    fn chr_rom_is_read_only() {
        let rom = make_rom(1, 1);
        let mut m = Nrom::new(&rom);
        let before = m.read_chr(0x0123);
        m.write_chr(0x0123, !before);
        assert_eq!(m.read_chr(0x0123), before);
    }

    #[test]
    fn chr_ram_is_writable() {
        let rom = make_rom(1, 0);
        let mut m = Nrom::new(&rom);
        m.write_chr(0x0123, 0x5A);
        assert_eq!(m.read_chr(0x0123), 0x5A);
    }

    #[test]
    fn wram_round_trips() {
        let rom = make_rom(1, 1);
        let mut m = Nrom::new(&rom);
        m.write_wram(0x6000, 0x12);
        m.write_wram(0x7FFF, 0x34);
        assert_eq!(m.read_wram(0x6000), 0x12);
        assert_eq!(m.read_wram(0x7FFF), 0x34);
    }
}
