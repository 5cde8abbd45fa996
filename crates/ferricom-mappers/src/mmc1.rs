//! MMC1 (mapper 1).
//!
//! Configuration arrives through a 5-bit serial shift register: each write
//! to $8000-$FFFF contributes bit 0; the fifth write commits the latch to
//! one of four registers selected by address bits 13-14. A write with bit 7
//! set empties the shifter and forces the fix-last PRG mode.
//!
//! The board samples writes once per CPU cycle, so the double write of a
//! read-modify-write instruction counts as a single shifter write (the last
//! value on the bus is the one observed).
//!
//! Register map:
//! - $8000-$9FFF: control (mirroring, PRG mode, CHR mode)
//! - $A000-$BFFF: CHR bank 0
//! - $C000-$DFFF: CHR bank 1
//! - $E000-$FFFF: PRG bank + WRAM enable

use crate::mirroring::Mirroring;
use crate::rom::Rom;

const PRG_BANK_SIZE: usize = 16 * 1024;
const CHR_BANK_SIZE: usize = 4 * 1024;

/// PRG-ROM banking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrgMode {
    /// One 32 KiB bank at $8000 (low bit of the bank number ignored).
    Switch32K,
    /// First bank fixed at $8000, 16 KiB switching at $C000.
    FixFirst,
    /// Last bank fixed at $C000, 16 KiB switching at $8000.
    FixLast,
}

/// CHR banking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChrMode {
    /// One 8 KiB bank.
    Switch8K,
    /// Two independent 4 KiB banks.
    Switch4K,
}

/// The serially-written register file. Kept separate so a collapsed double
/// write can roll the whole set back.
#[derive(Debug, Clone, Copy)]
struct Regs {
    shift_reg: u8,
    shift_count: u8,
    mirroring: Mirroring,
    prg_mode: PrgMode,
    chr_mode: ChrMode,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
    wram_enabled: bool,
}

impl Regs {
    fn power_on(mirroring: Mirroring) -> Self {
        Self {
            shift_reg: 0,
            shift_count: 0,
            mirroring,
            prg_mode: PrgMode::FixLast,
            chr_mode: ChrMode::Switch8K,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
            wram_enabled: true,
        }
    }
}

/// Mapper 1.
#[derive(Debug, Clone)]
pub struct Mmc1 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    wram: Vec<u8>,
    prg_banks: usize,

    regs: Regs,
    regs_before_write: Regs,
    cycles: u64,
    last_write_cycle: Option<u64>,
}

impl Mmc1 {
    /// Build from a parsed ROM.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let chr_is_ram = rom.chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0; 8 * 1024]
        } else {
            rom.chr_rom.clone()
        };
        let regs = Regs::power_on(rom.header.mirroring);
        Self {
            prg_rom: rom.prg_rom.clone(),
            chr,
            chr_is_ram,
            wram: vec![0; 8 * 1024],
            prg_banks: rom.prg_rom.len() / PRG_BANK_SIZE,
            regs,
            regs_before_write: regs,
            cycles: 0,
            last_write_cycle: None,
        }
    }

    /// Advance CPU time (used to detect back-to-back writes).
    pub(crate) fn clock(&mut self, cpu_cycles: u64) {
        self.cycles += cpu_cycles;
    }

    pub(crate) fn reset(&mut self) {
        self.regs.shift_reg = 0;
        self.regs.shift_count = 0;
        self.regs.prg_mode = PrgMode::FixLast;
        self.last_write_cycle = None;
    }

    pub(crate) fn read_prg(&self, addr: u16) -> u8 {
        let offset = self.prg_offset(addr);
        self.prg_rom.get(offset).copied().unwrap_or(0)
    }

    pub(crate) fn write_prg(&mut self, addr: u16, value: u8) {
        // A write in the cycle right after the previous one is the tail of
        // a read-modify-write pair: the earlier write never lands.
        if let Some(last) = self.last_write_cycle {
            if self.cycles.saturating_sub(last) <= 1 {
                self.regs = self.regs_before_write;
            }
        }
        self.last_write_cycle = Some(self.cycles);
        self.regs_before_write = self.regs;
        self.write_shift(addr, value);
    }

    pub(crate) fn read_chr(&self, addr: u16) -> u8 {
        let offset = self.chr_offset(addr);
        self.chr.get(offset).copied().unwrap_or(0)
    }

    pub(crate) fn write_chr(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let offset = self.chr_offset(addr);
            if let Some(byte) = self.chr.get_mut(offset) {
                *byte = value;
            }
        }
    }

    pub(crate) fn read_wram(&self, addr: u16) -> u8 {
        if self.regs.wram_enabled {
            self.wram[(addr & 0x1FFF) as usize]
        } else {
            0
        }
    }

    pub(crate) fn write_wram(&mut self, addr: u16, value: u8) {
        if self.regs.wram_enabled {
            self.wram[(addr & 0x1FFF) as usize] = value;
        }
    }

    pub(crate) fn mirroring(&self) -> Mirroring {
        self.regs.mirroring
    }

    fn write_shift(&mut self, addr: u16, value: u8) {
        if value & 0x80 != 0 {
            self.regs.shift_reg = 0;
            self.regs.shift_count = 0;
            self.regs.prg_mode = PrgMode::FixLast;
            return;
        }

        // Bit 0 enters at bit 4 and walks down: the first write ends up as
        // the committed value's bit 0.
        self.regs.shift_reg = (self.regs.shift_reg >> 1) | ((value & 1) << 4);
        self.regs.shift_count += 1;

        if self.regs.shift_count == 5 {
            let latch = self.regs.shift_reg;
            match (addr >> 13) & 0x03 {
                0 => self.write_control(latch),
                1 => self.regs.chr_bank_0 = latch,
                2 => self.regs.chr_bank_1 = latch,
                3 => {
                    self.regs.prg_bank = latch & 0x0F;
                    self.regs.wram_enabled = latch & 0x10 == 0;
                }
                _ => unreachable!(),
            }
            self.regs.shift_reg = 0;
            self.regs.shift_count = 0;
        }
    }

    fn write_control(&mut self, value: u8) {
        self.regs.mirroring = match value & 0x03 {
            0 => Mirroring::SingleLower,
            1 => Mirroring::SingleUpper,
            2 => Mirroring::Vertical,
            3 => Mirroring::Horizontal,
            _ => unreachable!(),
        };
        self.regs.prg_mode = match (value >> 2) & 0x03 {
            0 | 1 => PrgMode::Switch32K,
            2 => PrgMode::FixFirst,
            3 => PrgMode::FixLast,
            _ => unreachable!(),
        };
        self.regs.chr_mode = if value & 0x10 != 0 {
            ChrMode::Switch4K
        } else {
            ChrMode::Switch8K
        };
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let bank = match self.regs.prg_mode {
            PrgMode::Switch32K => {
                let base = (self.regs.prg_bank & 0x0E) as usize;
                if addr < 0xC000 {
                    base
                } else {
                    base + 1
                }
            }
            PrgMode::FixFirst => {
                if addr < 0xC000 {
                    0
                } else {
                    self.regs.prg_bank as usize
                }
            }
            PrgMode::FixLast => {
                if addr < 0xC000 {
                    self.regs.prg_bank as usize
                } else {
                    self.prg_banks.saturating_sub(1)
                }
            }
        };
        let bank = bank % self.prg_banks.max(1);
        bank * PRG_BANK_SIZE + (addr & 0x3FFF) as usize
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let chr_banks = (self.chr.len() / CHR_BANK_SIZE).max(1);
        match self.regs.chr_mode {
            ChrMode::Switch8K => {
                let bank = (self.regs.chr_bank_0 & 0x1E) as usize % chr_banks;
                bank * CHR_BANK_SIZE + (addr & 0x1FFF) as usize
            }
            ChrMode::Switch4K => {
                let (bank, offset) = if addr < 0x1000 {
                    (self.regs.chr_bank_0 as usize, (addr & 0x0FFF) as usize)
                } else {
                    (self.regs.chr_bank_1 as usize, (addr & 0x0FFF) as usize)
                };
                (bank % chr_banks) * CHR_BANK_SIZE + offset
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomHeader;

    fn make_rom(prg_banks: usize, chr_8k_banks: usize) -> Rom {
        let prg_rom: Vec<u8> = (0..prg_banks * PRG_BANK_SIZE)
            .map(|i| (i / PRG_BANK_SIZE) as u8)
            .collect();
        let chr_rom: Vec<u8> = (0..chr_8k_banks * 8 * 1024)
            .map(|i| (i / CHR_BANK_SIZE) as u8)
            .collect();
        Rom {
            header: RomHeader {
                prg_rom_size: prg_rom.len(),
                chr_rom_size: chr_rom.len(),
                mapper_number: 1,
                mirroring: Mirroring::Horizontal,
                has_battery: false,
                has_trainer: false,
            },
            prg_rom,
            chr_rom,
        }
    }

    /// Write 5 bits serially, spacing the writes out in time the way
    /// separate store instructions would.
    fn write_serial(m: &mut Mmc1, addr: u16, value: u8) {
        for i in 0..5 {
            m.clock(4);
            m.write_prg(addr, (value >> i) & 1);
        }
    }

    #[test]
    fn five_writes_commit_prg_bank() {
        let rom = make_rom(8, 1);
        let mut m = Mmc1::new(&rom);
        // LSB sequence 1,0,1,0,1 -> 0b10101 = 21; masked to 4 bits = 5.
        for bit in [1u8, 0, 1, 0, 1] {
            m.clock(4);
            m.write_prg(0xE000, bit);
        }
        assert_eq!(m.regs.prg_bank, 21 & 0x0F);
        assert_eq!(m.regs.shift_count, 0);
    }

    #[test]
    fn bit7_resets_shifter() {
        let rom = make_rom(8, 1);
        let mut m = Mmc1::new(&rom);
        m.clock(4);
        m.write_prg(0x8000, 0x01);
        m.clock(4);
        m.write_prg(0x8000, 0x00);
        assert_eq!(m.regs.shift_count, 2);
        m.clock(4);
        m.write_prg(0xC123, 0x80);
        assert_eq!(m.regs.shift_count, 0);
        assert_eq!(m.regs.shift_reg, 0);
        assert_eq!(m.regs.prg_mode, PrgMode::FixLast);
    }

    #[test]
    fn back_to_back_writes_collapse() {
        let rom = make_rom(8, 1);
        let mut m = Mmc1::new(&rom);
        // An INC on the register area produces two writes one cycle apart;
        // only the second may shift.
        m.clock(4);
        m.write_prg(0x8000, 0x00); // stale value write
        m.clock(1);
        m.write_prg(0x8000, 0x01); // result write
        assert_eq!(m.regs.shift_count, 1);
        assert_eq!(m.regs.shift_reg, 1 << 4);
    }

    #[test]
    fn prg_fix_last_mode() {
        let rom = make_rom(8, 1);
        let mut m = Mmc1::new(&rom);
        write_serial(&mut m, 0x8000, 0x0C); // control: fix last
        write_serial(&mut m, 0xE000, 0x02); // switchable bank = 2
        assert_eq!(m.read_prg(0x8000), 2);
        assert_eq!(m.read_prg(0xC000), 7);
    }

    #[test]
    fn prg_fix_first_mode() {
        let rom = make_rom(8, 1);
        let mut m = Mmc1::new(&rom);
        write_serial(&mut m, 0x8000, 0x08); // control: fix first
        write_serial(&mut m, 0xE000, 0x03);
        assert_eq!(m.read_prg(0x8000), 0);
        assert_eq!(m.read_prg(0xC000), 3);
    }

    #[test]
    fn prg_32k_mode_ignores_low_bit() {
        let rom = make_rom(8, 1);
        let mut m = Mmc1::new(&rom);
        write_serial(&mut m, 0x8000, 0x00); // control: 32K
        write_serial(&mut m, 0xE000, 0x03); // low bit ignored -> banks 2,3
        assert_eq!(m.read_prg(0x8000), 2);
        assert_eq!(m.read_prg(0xC000), 3);
    }

    #[test]
    fn chr_4k_banks() {
        let rom = make_rom(2, 4); // 32 KiB CHR = 8 x 4K banks
        let mut m = Mmc1::new(&rom);
        write_serial(&mut m, 0x8000, 0x10); // 4K CHR mode
        write_serial(&mut m, 0xA000, 0x02);
        write_serial(&mut m, 0xC000, 0x05);
        assert_eq!(m.read_chr(0x0000), 2);
        assert_eq!(m.read_chr(0x1000), 5);
    }

    #[test]
    fn mirroring_control() {
        let rom = make_rom(2, 1);
        let mut m = Mmc1::new(&rom);
        write_serial(&mut m, 0x8000, 0x02);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
        write_serial(&mut m, 0x8000, 0x03);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
        write_serial(&mut m, 0x8000, 0x00);
        assert_eq!(m.mirroring(), Mirroring::SingleLower);
        write_serial(&mut m, 0x8000, 0x01);
        assert_eq!(m.mirroring(), Mirroring::SingleUpper);
    }

    #[test]
    fn wram_enable_bit() {
        let rom = make_rom(2, 1);
        let mut m = Mmc1::new(&rom);
        m.write_wram(0x6000, 0x42);
        assert_eq!(m.read_wram(0x6000), 0x42);
        write_serial(&mut m, 0xE000, 0x10); // bit 4 disables WRAM
        assert_eq!(m.read_wram(0x6000), 0);
        write_serial(&mut m, 0xE000, 0x00);
        assert_eq!(m.read_wram(0x6000), 0x42);
    }
}
