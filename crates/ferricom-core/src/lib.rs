//! Console integration layer for the ferricom NES emulator.
//!
//! Wires the CPU, PPU and mapper crates into a running machine:
//!
//! - [`NesBus`]: flat lookup-table address decoding over the CPU and PPU
//!   address spaces, with every device owned in one place.
//! - [`Console`]: the orchestrator. One CPU instruction per step, three
//!   PPU dots per CPU cycle, NMI polled out of the PPU after each batch,
//!   frames delimited by the VBlank dot.
//! - [`Controller`]: the strobe/shift-register controller protocol.
//! - [`Debugger`]: breakpoints, step modes, memory inspection by source,
//!   disassembly and instruction tracing.
//!
//! # Usage
//!
//! ```no_run
//! use ferricom_core::Console;
//!
//! let rom = std::fs::read("game.nes").expect("read ROM");
//! let mut console = Console::new(&rom).expect("insert cartridge");
//!
//! loop {
//!     console.set_controller1(0);
//!     console.run_frame();
//!     let _rgba = console.framebuffer();
//! }
//! ```

mod bus;
mod console;
mod debugger;
pub mod input;

pub use bus::{CpuRegion, MemoryMap, NesBus, PpuMemory, PpuRegion};
pub use ferricom_cpu::{disassemble, disassemble_at, instr_len, InvalidOpcode};
pub use ferricom_ppu::{FRAME_HEIGHT, FRAME_WIDTH};
pub use console::{timing, Console, ConsoleError};
pub use debugger::{
    flags_string, BreakList, Breakpoint, DebugEvent, Debugger, MemorySource, StepType,
};
pub use input::{Button, Controller};
