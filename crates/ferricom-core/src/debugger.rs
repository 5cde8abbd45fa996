//! Instruction-level debugger core.
//!
//! Owns the console and drives it in one of four step modes. Breakpoints
//! are address ranges checked after every instruction; erased entries keep
//! their slots so breakpoint numbers stay stable. The text shell lives in
//! the front-end; everything here is the inspection machinery it calls
//! into.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ferricom_cpu::{branch_taken, disassemble_at, instr_len, Bus, Status};

use crate::console::Console;
use crate::input::Button;

/// Which memory the debugger is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemorySource {
    /// CPU address space (through the bus, so mirrors behave).
    #[default]
    Ram,
    /// PPU address space.
    Vram,
    /// Object attribute memory.
    Oam,
}

impl MemorySource {
    /// Parse a source name as used by the shell.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ram" => Some(Self::Ram),
            "vram" => Some(Self::Vram),
            "oam" => Some(Self::Oam),
            _ => None,
        }
    }

    /// Highest valid address for this source.
    #[must_use]
    pub fn max_addr(self) -> u16 {
        match self {
            Self::Ram => 0xFFFF,
            Self::Vram => 0x3FFF,
            Self::Oam => 0x00FF,
        }
    }
}

/// An address-range breakpoint.
#[derive(Debug, Clone, Copy)]
pub struct Breakpoint {
    /// First address of the range.
    pub start: u16,
    /// Last address of the range (inclusive).
    pub end: u16,
    /// Erased entries keep their slot for stable numbering.
    pub erased: bool,
}

/// Breakpoint table with slot reuse.
#[derive(Debug, Clone, Default)]
pub struct BreakList {
    list: Vec<Breakpoint>,
}

impl BreakList {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint, reusing the first erased slot. Returns its id.
    pub fn add(&mut self, start: u16, end: u16) -> usize {
        let point = Breakpoint {
            start,
            end,
            erased: false,
        };
        if let Some(i) = self.list.iter().position(|p| p.erased) {
            self.list[i] = point;
            return i;
        }
        self.list.push(point);
        self.list.len() - 1
    }

    /// Erase a breakpoint. Returns false for an unknown or already erased
    /// id.
    pub fn erase(&mut self, id: usize) -> bool {
        match self.list.get_mut(id) {
            Some(p) if !p.erased => {
                p.erased = true;
                true
            }
            _ => false,
        }
    }

    /// First live breakpoint covering `addr`.
    #[must_use]
    pub fn test(&self, addr: u16) -> Option<usize> {
        self.list
            .iter()
            .position(|p| !p.erased && addr >= p.start && addr <= p.end)
    }

    /// Live breakpoints with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Breakpoint)> {
        self.list.iter().enumerate().filter(|(_, p)| !p.erased)
    }

    /// Any live breakpoints?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.iter().all(|p| p.erased)
    }
}

/// How far to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    /// One instruction.
    Step,
    /// One instruction, stepping over subroutine calls.
    Next,
    /// Until the NMI handler is entered (one frame).
    Frame,
    /// Until a breakpoint or an error.
    Continue,
}

/// Why the run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugEvent {
    /// The requested step completed.
    Step,
    /// A breakpoint was reached.
    Break(usize),
    /// The CPU fetched an undocumented opcode.
    InvalidInstruction {
        /// The opcode byte.
        id: u8,
        /// Where it was fetched.
        pc: u16,
    },
    /// The frame hook asked the run loop to stop.
    Stopped,
}

/// Instruction trace writer. One line per instruction: registers, flag
/// string, the PPU's VRAM address, and the next instruction.
struct Tracer {
    out: BufWriter<File>,
}

impl Tracer {
    fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }

    fn trace(&mut self, console: &Console, disasm: &str) -> io::Result<()> {
        let cpu = console.cpu();
        writeln!(
            self.out,
            "PC: ${:04X} A: ${:02X} X: ${:02X} Y: ${:02X} SP: ${:02X} {} V: ${:04X} {}",
            cpu.pc,
            cpu.a,
            cpu.x,
            cpu.y,
            cpu.sp,
            flags_string(cpu.status),
            console.ppu().vram_addr(),
            disasm,
        )
    }
}

/// Flag string: one letter per flag, upper case when set.
#[must_use]
pub fn flags_string(status: Status) -> String {
    [
        (Status::N, 'n'),
        (Status::V, 'v'),
        (Status::U, 'u'),
        (Status::B, 'b'),
        (Status::D, 'd'),
        (Status::I, 'i'),
        (Status::Z, 'z'),
        (Status::C, 'c'),
    ]
    .iter()
    .map(|&(flag, ch)| {
        if status.contains(flag) {
            ch.to_ascii_uppercase()
        } else {
            ch
        }
    })
    .collect()
}

/// The debugger: owns the console and the breakpoint table.
pub struct Debugger {
    console: Console,
    /// Breakpoint table.
    pub breakpoints: BreakList,
    tracer: Option<Tracer>,
    /// Stop the run loop when an undocumented opcode is hit. When false
    /// the event is logged and execution continues (the CPU retires the
    /// byte as a 1-byte no-op either way).
    pub stop_on_invalid: bool,
}

impl Debugger {
    /// Wrap a console.
    #[must_use]
    pub fn new(console: Console) -> Self {
        Self {
            console,
            breakpoints: BreakList::new(),
            tracer: None,
            stop_on_invalid: true,
        }
    }

    /// The wrapped console.
    #[must_use]
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Mutable console access.
    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    /// Run the console in the given mode. `on_frame` fires whenever a
    /// frame completes (the framebuffer is rendered first); returning
    /// false stops the loop, which is how the front-end threads a
    /// shutdown flag through a `continue`.
    pub fn run(
        &mut self,
        step_type: StepType,
        mut on_frame: impl FnMut(&Console) -> bool,
    ) -> DebugEvent {
        // `next` stops when the JSR/RTS depth returns to zero; `runframe`
        // stops on entry to the NMI handler.
        let nmi_handler = u16::from_le_bytes([
            self.console.peek(ferricom_cpu::vectors::NMI),
            self.console.peek(ferricom_cpu::vectors::NMI + 1),
        ]);
        let mut depth: i32 = 0;

        loop {
            let opcode = self.console.peek(self.console.cpu().pc);
            self.console.step();
            self.trace_line();

            if let Some(inv) = self.console.take_invalid() {
                if self.stop_on_invalid {
                    return DebugEvent::InvalidInstruction {
                        id: inv.id,
                        pc: inv.pc,
                    };
                }
                log::warn!("invalid instruction {:02X} at {:04X}", inv.id, inv.pc);
            }

            if self.console.take_frame_done() {
                self.console.render_frame();
                if !on_frame(&self.console) {
                    return DebugEvent::Stopped;
                }
            }

            let pc = self.console.cpu().pc;
            if let Some(id) = self.breakpoints.test(pc) {
                return DebugEvent::Break(id);
            }

            let done = match step_type {
                StepType::Step => true,
                StepType::Continue => false,
                StepType::Next => {
                    if opcode == 0x20 {
                        depth += 1;
                    } else if opcode == 0x60 {
                        depth -= 1;
                    }
                    depth <= 0
                }
                StepType::Frame => pc == nmi_handler,
            };
            if done {
                return DebugEvent::Step;
            }
        }
    }

    /// Reset the console (memory survives, registers re-initialize).
    pub fn reset(&mut self) {
        self.console.reset();
    }

    /// Hold or release a controller button.
    pub fn hold_button(&mut self, button: Button, held: bool) {
        self.console.hold_button(button, held);
    }

    // =======================================================================
    // Memory inspection
    // =======================================================================

    /// Read one byte from a memory source, side-effect free.
    #[must_use]
    pub fn read_mem(&self, addr: u16, source: MemorySource) -> u8 {
        match source {
            MemorySource::Ram => self.console.peek(addr),
            MemorySource::Vram => self.console.bus().peek_vram(addr),
            MemorySource::Oam => self.console.ppu().peek_oam(addr as u8),
        }
    }

    /// Write one byte to a memory source. RAM writes go through the bus,
    /// so register mirrors and mapper latches behave as a program write
    /// would.
    pub fn write_mem(&mut self, addr: u16, value: u8, source: MemorySource) {
        match source {
            MemorySource::Ram => self.console.bus_mut().write(addr, value),
            MemorySource::Vram => self.console.bus_mut().poke_vram(addr, value),
            MemorySource::Oam => self.console.bus_mut().ppu.poke_oam(addr as u8, value),
        }
    }

    // =======================================================================
    // Disassembly
    // =======================================================================

    /// Disassemble the instruction at PC, annotating branches with their
    /// outcome under the live flags.
    #[must_use]
    pub fn disassemble_current(&self) -> String {
        let pc = self.console.cpu().pc;
        let (text, _) = self.disassemble_one(pc);
        match branch_taken(self.console.peek(pc), self.console.cpu().status) {
            Some(true) => format!("{text} [taken]"),
            Some(false) => format!("{text} [not taken]"),
            None => text,
        }
    }

    /// Disassemble one instruction at an address. Returns text and length.
    #[must_use]
    pub fn disassemble_one(&self, addr: u16) -> (String, u16) {
        let op = self.console.peek(addr);
        let lo = self.console.peek(addr.wrapping_add(1));
        let hi = self.console.peek(addr.wrapping_add(2));
        disassemble_at(addr, op, lo, hi)
    }

    /// Linear disassembly over an address range.
    #[must_use]
    pub fn disassemble_block(&self, start: u16, end: u16) -> Vec<(u16, String)> {
        let mut out = Vec::new();
        let mut addr = start;
        while addr <= end {
            let (text, len) = self.disassemble_one(addr);
            out.push((addr, text));
            let Some(next) = addr.checked_add(len) else {
                break;
            };
            addr = next;
        }
        out
    }

    /// Instruction length at an address.
    #[must_use]
    pub fn instr_len_at(&self, addr: u16) -> u16 {
        instr_len(self.console.peek(addr))
    }

    // =======================================================================
    // Tracing
    // =======================================================================

    /// Start appending trace lines to a file.
    pub fn start_trace(&mut self, path: &Path) -> io::Result<()> {
        self.tracer = Some(Tracer::open(path)?);
        Ok(())
    }

    /// Stop tracing and flush.
    pub fn stop_trace(&mut self) {
        if let Some(mut tracer) = self.tracer.take() {
            let _ = tracer.out.flush();
        }
    }

    /// Whether a trace file is open.
    #[must_use]
    pub fn tracing(&self) -> bool {
        self.tracer.is_some()
    }

    fn trace_line(&mut self) {
        if self.tracer.is_none() {
            return;
        }
        let disasm = self.disassemble_current();
        if let Some(tracer) = self.tracer.as_mut() {
            if let Err(err) = tracer.trace(&self.console, &disasm) {
                log::error!("trace write failed: {err}");
                self.tracer = None;
            }
        }
    }
}
