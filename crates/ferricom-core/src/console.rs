//! The console orchestrator.
//!
//! Owns the CPU and the bus and keeps them in phase: after every CPU
//! instruction the PPU runs three dots per cycle consumed, then the NMI
//! edge is polled out of the PPU and routed into the CPU. A frame is
//! "done" when the PPU reaches the VBlank dot (line 241, dot 1).

use ferricom_cpu::{Bus, Cpu, InvalidOpcode};
use ferricom_mappers::{create_mapper, MapperError, Rom, RomError};
use ferricom_ppu::{FRAME_HEIGHT, FRAME_WIDTH, NES_PALETTE};

use crate::bus::NesBus;
use crate::input::Button;

/// NTSC timing constants.
pub mod timing {
    /// CPU clock (NTSC): master / 12.
    pub const CPU_CLOCK_HZ: u32 = 1_789_773;
    /// PPU dots per CPU cycle.
    pub const DOTS_PER_CPU_CYCLE: u32 = 3;
    /// Nominal frame rate.
    pub const FRAME_RATE: f64 = 60.0988;
}

/// Errors from building a console.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Cartridge image did not parse.
    #[error(transparent)]
    Rom(#[from] RomError),
    /// Cartridge uses an unsupported mapper.
    #[error(transparent)]
    Mapper(#[from] MapperError),
}

/// The wired-up machine.
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    framebuffer: Vec<u8>,
    frame_done: bool,
    frame_count: u64,
    pending_invalid: Option<InvalidOpcode>,
}

impl Console {
    /// Build a console from a ROM image and run the power-on reset.
    pub fn new(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        let rom = Rom::load(rom_data)?;
        let mapper = create_mapper(&rom)?;
        let mut console = Self {
            cpu: Cpu::new(),
            bus: NesBus::new(mapper),
            framebuffer: vec![0; FRAME_WIDTH * FRAME_HEIGHT * 4],
            frame_done: false,
            frame_count: 0,
            pending_invalid: None,
        };
        console.cpu.reset(&mut console.bus);
        Ok(console)
    }

    /// Console reset: CPU registers and select PPU registers re-initialize;
    /// RAM, VRAM and palette contents survive.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.frame_done = false;
        self.pending_invalid = None;
    }

    /// Execute one CPU instruction (or one OAM DMA transfer) and bring the
    /// PPU up to date. Returns the CPU cycles consumed.
    pub fn step(&mut self) -> u32 {
        if let Some(page) = self.bus.take_oam_dma() {
            return self.run_oam_dma(page);
        }

        let cycles = u32::from(self.cpu.step(&mut self.bus));
        if let Some(inv) = self.cpu.take_invalid() {
            self.pending_invalid = Some(inv);
        }
        self.clock_ppu(cycles);
        cycles
    }

    /// OAM DMA: 256 bytes from CPU page `page` into OAM. 513 cycles, one
    /// more when the CPU is on an odd cycle. The PPU keeps running.
    fn run_oam_dma(&mut self, page: u8) -> u32 {
        let base = u16::from(page) << 8;
        let mut buffer = [0u8; 256];
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.bus.read(base + i as u16);
        }
        self.bus.ppu.oam_dma(&buffer);

        let cycles = if self.cpu.cycles % 2 == 1 { 514 } else { 513 };
        self.cpu.stall(u64::from(cycles));
        self.clock_ppu(cycles);
        cycles
    }

    /// Advance the PPU three dots per CPU cycle, then route the NMI edge.
    fn clock_ppu(&mut self, cpu_cycles: u32) {
        for _ in 0..cpu_cycles {
            self.bus.clock_ppu();
        }
        if self.bus.ppu.take_nmi() {
            self.cpu.signal_nmi();
        }
        if self.bus.ppu.take_frame_ready() {
            self.frame_done = true;
        }
    }

    /// Run until the PPU reaches the VBlank dot, then convert the frame
    /// buffer. Returns CPU cycles consumed.
    pub fn run_frame(&mut self) -> u64 {
        let mut spent = 0u64;
        while !self.frame_done {
            spent += u64::from(self.step());
        }
        self.frame_done = false;
        self.render_frame();
        spent
    }

    /// Whether the PPU crossed the VBlank dot since the last check
    /// (consumed by the read).
    pub fn take_frame_done(&mut self) -> bool {
        std::mem::take(&mut self.frame_done)
    }

    /// Convert the PPU's palette indices into the RGBA buffer. `run_frame`
    /// does this itself; callers stepping instruction-by-instruction call
    /// it when [`take_frame_done`](Self::take_frame_done) reports a frame.
    pub fn render_frame(&mut self) {
        self.frame_count += 1;
        for (i, &index) in self.bus.ppu.frame_buffer().iter().enumerate() {
            let (r, g, b) = NES_PALETTE[(index & 0x3F) as usize];
            let offset = i * 4;
            self.framebuffer[offset] = r;
            self.framebuffer[offset + 1] = g;
            self.framebuffer[offset + 2] = b;
            self.framebuffer[offset + 3] = 0xFF;
        }
    }

    /// The current frame as RGBA, row-major 256x240.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Completed frames.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total CPU cycles executed.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Undocumented opcode hit since the last check.
    pub fn take_invalid(&mut self) -> Option<InvalidOpcode> {
        self.pending_invalid.take()
    }

    /// Push the live button snapshot into controller port 1.
    pub fn set_controller1(&mut self, buttons: u8) {
        self.bus.controller1.set_buttons(buttons);
    }

    /// Push the live button snapshot into controller port 2.
    pub fn set_controller2(&mut self, buttons: u8) {
        self.bus.controller2.set_buttons(buttons);
    }

    /// Hold or release a button on port 1 (debugger).
    pub fn hold_button(&mut self, button: Button, held: bool) {
        self.bus.controller1.hold_button(button, held);
    }

    /// CPU view (debugger).
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutable CPU view (debugger register writes).
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// PPU view (debugger).
    #[must_use]
    pub fn ppu(&self) -> &ferricom_ppu::Ppu {
        &self.bus.ppu
    }

    /// Bus view.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Mutable bus view (debugger memory writes).
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Side-effect-free CPU-space read.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal NROM image: a NOP slide with the reset vector at $8000.
    fn nop_rom() -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, 2, 1, 0, 0];
        data.extend_from_slice(&[0; 8]);
        let mut prg = vec![0xEA; 32 * 1024];
        prg[0x7FFC] = 0x00;
        prg[0x7FFD] = 0x80;
        data.extend_from_slice(&prg);
        data.extend_from_slice(&[0; 8 * 1024]);
        data
    }

    #[test]
    fn power_on_loads_reset_vector() {
        let console = Console::new(&nop_rom()).unwrap();
        assert_eq!(console.cpu().pc, 0x8000);
        assert_eq!(console.cpu().sp, 0xFD);
        assert_eq!(console.cycles(), 7);
    }

    #[test]
    fn ppu_runs_three_dots_per_cpu_cycle() {
        let mut console = Console::new(&nop_rom()).unwrap();
        let dots_before =
            u64::from(console.ppu().scanline()) * 341 + u64::from(console.ppu().dot());
        let cycles_before = console.cycles();
        for _ in 0..100 {
            console.step();
        }
        let dots_after =
            u64::from(console.ppu().scanline()) * 341 + u64::from(console.ppu().dot());
        let cycle_delta = console.cycles() - cycles_before;
        assert_eq!(dots_after - dots_before, 3 * cycle_delta);
    }

    #[test]
    fn run_frame_stops_at_vblank() {
        let mut console = Console::new(&nop_rom()).unwrap();
        console.run_frame();
        assert_eq!(console.frame_count(), 1);
        // The PPU catches up in 3-dot batches after each instruction, so
        // it sits at most one instruction past the VBlank dot.
        assert_eq!(console.ppu().scanline(), 241);
        assert!(console.ppu().dot() >= 1 && console.ppu().dot() < 30);
        assert!(console.ppu().status_bits() & 0x80 != 0);
    }

    #[test]
    fn reset_preserves_ram() {
        let mut console = Console::new(&nop_rom()).unwrap();
        console.bus_mut().ram[0x123] = 0x5A;
        console.reset();
        assert_eq!(console.bus().ram[0x123], 0x5A);
        assert_eq!(console.cpu().pc, 0x8000);
    }

    #[test]
    fn rejects_unsupported_mapper() {
        let mut data = nop_rom();
        data[6] = 0x40; // mapper 4 low nibble
        assert!(matches!(
            Console::new(&data),
            Err(ConsoleError::Mapper(MapperError::Unsupported(4)))
        ));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = nop_rom();
        data[0] = 0;
        assert!(matches!(Console::new(&data), Err(ConsoleError::Rom(_))));
    }
}
