//! System bus: address decoding and device dispatch.
//!
//! Decoding uses a flat lookup table: one handler id per address, built up
//! by `map` registrations at wiring time. The handler set is a small enum
//! (well under 16 variants) so the dispatch match stays cheap and the
//! table stays in cache. Overlapping registrations overwrite; after the
//! console wires everything, every address resolves — the invariant is
//! checked in debug builds and tested.
//!
//! CPU memory map:
//!
//! ```text
//! $0000-$1FFF  2 KiB internal RAM, mirrored x4
//! $2000-$3FFF  PPU registers, mirrored every 8 bytes
//! $4000-$4013  APU registers (sink)
//! $4014        OAM DMA
//! $4015        APU status (sink)
//! $4016        controller 1
//! $4017        controller 2 (reads); APU frame counter (writes, sink)
//! $4018-$401F  test mode (sink)
//! $4020-$5FFF  cartridge expansion (open bus here)
//! $6000-$7FFF  cartridge WRAM
//! $8000-$FFFF  cartridge PRG-ROM
//! ```

use ferricom_cpu::Bus;
use ferricom_mappers::Mapper;
use ferricom_ppu::{Ppu, PpuBus};

use crate::input::Controller;

/// Flat address-to-handler lookup table.
///
/// `R` is the handler id type. The table covers a fixed power-of-two
/// address space; unregistered addresses resolve to `None`.
#[derive(Debug, Clone)]
pub struct MemoryMap<R> {
    table: Vec<Option<R>>,
}

impl<R: Copy> MemoryMap<R> {
    /// An empty map over `size` addresses.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            table: vec![None; size],
        }
    }

    /// Register a handler for an inclusive address range. Later
    /// registrations overwrite earlier ones.
    pub fn map(&mut self, start: u16, end: u16, region: R) {
        for entry in &mut self.table[start as usize..=end as usize] {
            *entry = Some(region);
        }
    }

    /// Handler for an address.
    #[inline]
    #[must_use]
    pub fn resolve(&self, addr: u16) -> Option<R> {
        self.table[addr as usize]
    }

    /// Every address has a handler.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.table.iter().all(Option::is_some)
    }

    /// Number of unregistered addresses.
    #[must_use]
    pub fn unmapped_count(&self) -> usize {
        self.table.iter().filter(|e| e.is_none()).count()
    }
}

/// CPU-side handler ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegion {
    /// Internal RAM and its mirrors.
    Ram,
    /// PPU register window.
    PpuRegisters,
    /// APU register sink.
    Apu,
    /// OAM DMA trigger ($4014).
    OamDma,
    /// Controller 1 ($4016).
    Controller1,
    /// Controller 2 reads; APU frame counter writes ($4017).
    Controller2,
    /// CPU test-mode registers (sink).
    TestMode,
    /// Cartridge expansion area (nothing drives it on NROM/MMC1 boards).
    Expansion,
    /// Cartridge work RAM.
    Wram,
    /// Cartridge PRG-ROM.
    Prg,
}

/// PPU-side handler ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpuRegion {
    /// Pattern tables (cartridge CHR).
    Pattern,
    /// Nametables (console CIRAM through the mapper's mirroring).
    Nametable,
}

/// The PPU's view of memory: CHR through the mapper, nametables in CIRAM.
/// Borrowed out of the [`NesBus`] for the duration of a PPU operation.
pub struct PpuMemory<'a> {
    mapper: &'a mut Mapper,
    ciram: &'a mut [u8; 0x800],
    map: &'a MemoryMap<PpuRegion>,
}

impl PpuBus for PpuMemory<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match self.map.resolve(addr) {
            Some(PpuRegion::Pattern) => self.mapper.read_chr(addr),
            Some(PpuRegion::Nametable) => {
                self.ciram[self.mapper.mirroring().ciram_index(addr)]
            }
            None => {
                debug_assert!(false, "unmapped PPU read at {addr:04X}");
                0
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;
        match self.map.resolve(addr) {
            Some(PpuRegion::Pattern) => self.mapper.write_chr(addr, value),
            Some(PpuRegion::Nametable) => {
                self.ciram[self.mapper.mirroring().ciram_index(addr)] = value;
            }
            None => debug_assert!(false, "unmapped PPU write at {addr:04X}"),
        }
    }
}

/// The console bus: owns every device the CPU can talk to.
pub struct NesBus {
    /// 2 KiB internal RAM.
    pub ram: [u8; 0x800],
    /// 2 KiB nametable RAM (CIRAM).
    pub ciram: [u8; 0x800],
    /// Picture processing unit.
    pub ppu: Ppu,
    /// Cartridge mapper.
    pub mapper: Mapper,
    /// Controller port 1.
    pub controller1: Controller,
    /// Controller port 2.
    pub controller2: Controller,

    cpu_map: MemoryMap<CpuRegion>,
    ppu_map: MemoryMap<PpuRegion>,

    oam_dma_page: Option<u8>,
    open_bus: u8,
}

impl NesBus {
    /// Wire up a bus around a mapper. Registers a handler for every CPU
    /// and PPU address.
    #[must_use]
    pub fn new(mapper: Mapper) -> Self {
        let mut cpu_map = MemoryMap::new(0x1_0000);
        cpu_map.map(0x0000, 0x1FFF, CpuRegion::Ram);
        cpu_map.map(0x2000, 0x3FFF, CpuRegion::PpuRegisters);
        cpu_map.map(0x4000, 0x4013, CpuRegion::Apu);
        cpu_map.map(0x4014, 0x4014, CpuRegion::OamDma);
        cpu_map.map(0x4015, 0x4015, CpuRegion::Apu);
        cpu_map.map(0x4016, 0x4016, CpuRegion::Controller1);
        cpu_map.map(0x4017, 0x4017, CpuRegion::Controller2);
        cpu_map.map(0x4018, 0x401F, CpuRegion::TestMode);
        cpu_map.map(0x4020, 0x5FFF, CpuRegion::Expansion);
        cpu_map.map(0x6000, 0x7FFF, CpuRegion::Wram);
        cpu_map.map(0x8000, 0xFFFF, CpuRegion::Prg);
        debug_assert!(cpu_map.is_complete());

        let mut ppu_map = MemoryMap::new(0x4000);
        ppu_map.map(0x0000, 0x1FFF, PpuRegion::Pattern);
        ppu_map.map(0x2000, 0x3FFF, PpuRegion::Nametable);
        debug_assert!(ppu_map.is_complete());

        Self {
            ram: [0; 0x800],
            ciram: [0; 0x800],
            ppu: Ppu::new(),
            mapper,
            controller1: Controller::new(),
            controller2: Controller::new(),
            cpu_map,
            ppu_map,
            oam_dma_page: None,
            open_bus: 0,
        }
    }

    /// Console reset. RAM, CIRAM and cartridge RAM keep their contents;
    /// only registers and latches clear.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.mapper.reset();
        self.controller1.reset();
        self.controller2.reset();
        self.oam_dma_page = None;
        self.open_bus = 0;
    }

    /// CPU-side decode table (for coverage checks).
    #[must_use]
    pub fn cpu_map(&self) -> &MemoryMap<CpuRegion> {
        &self.cpu_map
    }

    /// PPU-side decode table.
    #[must_use]
    pub fn ppu_map(&self) -> &MemoryMap<PpuRegion> {
        &self.ppu_map
    }

    /// Take a latched OAM DMA request.
    pub fn take_oam_dma(&mut self) -> Option<u8> {
        self.oam_dma_page.take()
    }

    /// Run the PPU for one CPU cycle (three dots) and give the mapper its
    /// clock.
    pub fn clock_ppu(&mut self) {
        let Self {
            ppu,
            mapper,
            ciram,
            ppu_map,
            ..
        } = self;
        let mut mem = PpuMemory {
            mapper,
            ciram,
            map: ppu_map,
        };
        for _ in 0..3 {
            ppu.step(&mut mem);
        }
        self.mapper.clock(1);
    }

    /// Side-effect-free read for the debugger and the DMA engine.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match self.cpu_map.resolve(addr) {
            Some(CpuRegion::Ram) => self.ram[(addr & 0x07FF) as usize],
            Some(CpuRegion::PpuRegisters) => self.ppu.peek_register(addr),
            Some(CpuRegion::Wram) => self.mapper.read_wram(addr),
            Some(CpuRegion::Prg) => self.mapper.read_prg(addr),
            Some(_) | None => self.open_bus,
        }
    }

    /// Direct read of PPU address space (debugger's VRAM source).
    #[must_use]
    pub fn peek_vram(&self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        if addr >= 0x3F00 {
            return self.ppu.peek_palette(addr);
        }
        match self.ppu_map.resolve(addr) {
            Some(PpuRegion::Pattern) => self.mapper.read_chr(addr),
            Some(PpuRegion::Nametable) | None => {
                self.ciram[self.mapper.mirroring().ciram_index(addr)]
            }
        }
    }

    /// Direct write into PPU address space (debugger's VRAM source).
    pub fn poke_vram(&mut self, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;
        if addr >= 0x3F00 {
            self.ppu.poke_palette(addr, value);
            return;
        }
        match self.ppu_map.resolve(addr) {
            Some(PpuRegion::Pattern) => self.mapper.write_chr(addr, value),
            Some(PpuRegion::Nametable) | None => {
                self.ciram[self.mapper.mirroring().ciram_index(addr)] = value;
            }
        }
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match self.cpu_map.resolve(addr) {
            Some(CpuRegion::Ram) => self.ram[(addr & 0x07FF) as usize],
            Some(CpuRegion::PpuRegisters) => {
                let Self {
                    ppu,
                    mapper,
                    ciram,
                    ppu_map,
                    ..
                } = self;
                let mut mem = PpuMemory {
                    mapper,
                    ciram,
                    map: ppu_map,
                };
                ppu.read_register(addr, &mut mem)
            }
            Some(CpuRegion::Controller1) => self.controller1.read(),
            Some(CpuRegion::Controller2) => self.controller2.read(),
            Some(CpuRegion::Wram) => self.mapper.read_wram(addr),
            Some(CpuRegion::Prg) => self.mapper.read_prg(addr),
            // APU, DMA, test mode and the expansion area do not drive the
            // bus on read.
            Some(CpuRegion::Apu | CpuRegion::OamDma | CpuRegion::TestMode | CpuRegion::Expansion) => {
                self.open_bus
            }
            None => {
                debug_assert!(false, "unmapped CPU read at {addr:04X}");
                self.open_bus
            }
        };
        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;
        match self.cpu_map.resolve(addr) {
            Some(CpuRegion::Ram) => self.ram[(addr & 0x07FF) as usize] = value,
            Some(CpuRegion::PpuRegisters) => {
                let Self {
                    ppu,
                    mapper,
                    ciram,
                    ppu_map,
                    ..
                } = self;
                let mut mem = PpuMemory {
                    mapper,
                    ciram,
                    map: ppu_map,
                };
                ppu.write_register(addr, value, &mut mem);
            }
            Some(CpuRegion::OamDma) => self.oam_dma_page = Some(value),
            Some(CpuRegion::Controller1) => {
                // The strobe line feeds both ports.
                self.controller1.write_strobe(value);
                self.controller2.write_strobe(value);
            }
            Some(CpuRegion::Wram) => self.mapper.write_wram(addr, value),
            Some(CpuRegion::Prg) => self.mapper.write_prg(addr, value),
            // $4017 writes hit the APU frame counter; all sinks here.
            Some(
                CpuRegion::Apu
                | CpuRegion::Controller2
                | CpuRegion::TestMode
                | CpuRegion::Expansion,
            ) => {}
            None => debug_assert!(false, "unmapped CPU write at {addr:04X}"),
        }
    }
}
