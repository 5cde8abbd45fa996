//! The debugger shell.
//!
//! Line-oriented: one command per line, every numeric argument in hex
//! without a prefix, an empty line repeats the last command. The shell
//! runs on the emulation thread; while a `continue` is active, frames
//! keep flowing to the presenter through the debugger's frame hook.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use ferricom_core::{
    flags_string, Button, DebugEvent, Debugger, MemorySource, StepType,
};

use crate::sync::Shared;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Help,
    Continue,
    RunFrame,
    Next,
    Step,
    Break,
    ListBreaks,
    DeleteBreak,
    Status,
    Read,
    Write,
    Block,
    Disassemble,
    DisBlock,
    Trace,
    StopTrace,
    Hold,
    Unhold,
    Reset,
    Quit,
}

struct Command {
    name: &'static str,
    abbrev: &'static str,
    kind: CommandKind,
    min_args: usize,
    max_args: usize,
    help: &'static str,
}

#[rustfmt::skip]
static COMMANDS: &[Command] = &[
    Command { name: "help",        abbrev: "h",    kind: CommandKind::Help,        min_args: 0, max_args: 1, help: "print this help text" },
    Command { name: "continue",    abbrev: "c",    kind: CommandKind::Continue,    min_args: 0, max_args: 0, help: "start/continue execution" },
    Command { name: "runframe",    abbrev: "nmi",  kind: CommandKind::RunFrame,    min_args: 0, max_args: 0, help: "run one frame, stop at the nmi handler" },
    Command { name: "next",        abbrev: "n",    kind: CommandKind::Next,        min_args: 0, max_args: 0, help: "run next instruction, stepping over calls" },
    Command { name: "step",        abbrev: "s",    kind: CommandKind::Step,        min_args: 0, max_args: 0, help: "step one instruction" },
    Command { name: "break",       abbrev: "b",    kind: CommandKind::Break,       min_args: 1, max_args: 2, help: "set a breakpoint: start [end]" },
    Command { name: "listbreaks",  abbrev: "lb",   kind: CommandKind::ListBreaks,  min_args: 0, max_args: 0, help: "list breakpoints" },
    Command { name: "deletebreak", abbrev: "delb", kind: CommandKind::DeleteBreak, min_args: 1, max_args: 1, help: "delete a breakpoint" },
    Command { name: "status",      abbrev: "st",   kind: CommandKind::Status,      min_args: 0, max_args: 1, help: "print status: [cpu|ppu]" },
    Command { name: "read",        abbrev: "rd",   kind: CommandKind::Read,        min_args: 1, max_args: 2, help: "read a byte: addr [ram|vram|oam]" },
    Command { name: "write",       abbrev: "wr",   kind: CommandKind::Write,       min_args: 2, max_args: 3, help: "write a byte: addr value [ram|vram|oam]" },
    Command { name: "block",       abbrev: "bl",   kind: CommandKind::Block,       min_args: 2, max_args: 3, help: "dump a range: start end [ram|vram|oam]" },
    Command { name: "disassemble", abbrev: "dis",  kind: CommandKind::Disassemble, min_args: 1, max_args: 3, help: "disassemble raw bytes: opcode [lo] [hi]" },
    Command { name: "disblock",    abbrev: "db",   kind: CommandKind::DisBlock,    min_args: 2, max_args: 2, help: "disassemble a range: start end" },
    Command { name: "trace",       abbrev: "t",    kind: CommandKind::Trace,       min_args: 1, max_args: 1, help: "log every instruction to a file" },
    Command { name: "stoptrace",   abbrev: "str",  kind: CommandKind::StopTrace,   min_args: 0, max_args: 0, help: "stop tracing" },
    Command { name: "hold",        abbrev: "hb",   kind: CommandKind::Hold,        min_args: 1, max_args: 1, help: "hold a controller button" },
    Command { name: "unhold",      abbrev: "uhb",  kind: CommandKind::Unhold,      min_args: 1, max_args: 1, help: "release a held button" },
    Command { name: "reset",       abbrev: "r",    kind: CommandKind::Reset,       min_args: 0, max_args: 0, help: "reset the console" },
    Command { name: "quit",        abbrev: "q",    kind: CommandKind::Quit,        min_args: 0, max_args: 0, help: "quit" },
];

fn find_command(word: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == word || c.abbrev == word)
}

fn parse_u16(arg: &str) -> Result<u16, String> {
    u16::from_str_radix(arg, 16).map_err(|_| format!("invalid address: {arg}"))
}

fn parse_u8(arg: &str) -> Result<u8, String> {
    u8::from_str_radix(arg, 16).map_err(|_| format!("invalid data: {arg}"))
}

fn parse_source(args: &[&str], index: usize) -> Result<MemorySource, String> {
    match args.get(index) {
        None => Ok(MemorySource::Ram),
        Some(name) => {
            MemorySource::from_name(name).ok_or_else(|| format!("invalid memory source: {name}"))
        }
    }
}

fn parse_button(arg: &str) -> Result<Button, String> {
    Button::from_name(arg).ok_or_else(|| format!("invalid button: {arg}"))
}

/// The interactive shell wrapped around a [`Debugger`].
pub struct Repl {
    dbg: Debugger,
    shared: Arc<Shared>,
    last_line: String,
}

impl Repl {
    /// Build the shell.
    #[must_use]
    pub fn new(dbg: Debugger, shared: Arc<Shared>) -> Self {
        Self {
            dbg,
            shared,
            last_line: String::new(),
        }
    }

    /// Read-eval loop until `quit`, end of input, or window shutdown.
    pub fn run(&mut self) {
        println!("ferricom debugger. Try 'help'.");
        self.print_position();
        let stdin = io::stdin();
        loop {
            if self.shared.exiting() {
                break;
            }
            print!(">>> ");
            let _ = io::stdout().flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let trimmed = line.trim();
            let command_line = if trimmed.is_empty() {
                self.last_line.clone()
            } else {
                self.last_line = trimmed.to_string();
                trimmed.to_string()
            };
            if command_line.is_empty() {
                continue;
            }
            if self.execute(&command_line) {
                break;
            }
        }
        self.shared.stop();
    }

    /// Run one command line. Returns true on quit.
    fn execute(&mut self, line: &str) -> bool {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return false;
        };
        let args: Vec<&str> = parts.collect();

        let Some(cmd) = find_command(word) else {
            println!("Invalid command. Try 'help'.");
            return false;
        };
        if args.len() < cmd.min_args {
            println!("Not enough arguments for command {}. Try 'help'.", cmd.name);
            return false;
        }
        if args.len() > cmd.max_args {
            println!("Too many arguments for command {}. Try 'help'.", cmd.name);
            return false;
        }

        match self.eval(cmd.kind, &args) {
            Ok(quit) => quit,
            Err(message) => {
                eprintln!("{message}");
                false
            }
        }
    }

    #[allow(clippy::too_many_lines)] // one arm per command
    fn eval(&mut self, kind: CommandKind, args: &[&str]) -> Result<bool, String> {
        match kind {
            CommandKind::Help => {
                if let Some(name) = args.first() {
                    match find_command(name) {
                        Some(cmd) => println!("{}", cmd.help),
                        None => println!("not a command: {name}"),
                    }
                } else {
                    for cmd in COMMANDS {
                        println!("{:<12} {:<5} {}", cmd.name, cmd.abbrev, cmd.help);
                    }
                }
            }

            CommandKind::Continue => {
                println!("Continuing.");
                self.run_console(StepType::Continue);
            }
            CommandKind::RunFrame => self.run_console(StepType::Frame),
            CommandKind::Next => self.run_console(StepType::Next),
            CommandKind::Step => self.run_console(StepType::Step),

            CommandKind::Break => {
                let start = parse_u16(args[0])?;
                let end = args.get(1).map_or(Ok(start), |a| parse_u16(a))?;
                if end < start {
                    return Err(format!("Invalid range: {start:04X}-{end:04X}."));
                }
                let id = self.dbg.breakpoints.add(start, end);
                println!("Set breakpoint #{id} to {start:04X}-{end:04X}.");
            }

            CommandKind::ListBreaks => {
                for (id, point) in self.dbg.breakpoints.iter() {
                    println!("#{id}: {:04X}-{:04X}", point.start, point.end);
                }
            }

            CommandKind::DeleteBreak => {
                let id = usize::from_str_radix(args[0], 16)
                    .map_err(|_| format!("invalid index: {}", args[0]))?;
                if self.dbg.breakpoints.erase(id) {
                    println!("Breakpoint #{id} deleted.");
                } else {
                    return Err(format!("Invalid index: {}.", args[0]));
                }
            }

            CommandKind::Status => match args.first() {
                Some(&"ppu") => self.print_ppu_status(),
                Some(&"cpu") | None => self.print_cpu_status(),
                Some(other) => return Err(format!("invalid component: {other}")),
            },

            CommandKind::Read => {
                let addr = parse_u16(args[0])?;
                let source = parse_source(args, 1)?;
                check_range(addr, addr, source)?;
                self.dump_block(addr, addr, source);
            }

            CommandKind::Write => {
                let addr = parse_u16(args[0])?;
                let value = parse_u8(args[1])?;
                let source = parse_source(args, 2)?;
                check_range(addr, addr, source)?;
                if source == MemorySource::Ram && addr >= 0x8000 {
                    println!("Warning: writes to ROM have no effect.");
                }
                self.dbg.write_mem(addr, value, source);
            }

            CommandKind::Block => {
                let start = parse_u16(args[0])?;
                let end = parse_u16(args[1])?;
                let source = parse_source(args, 2)?;
                check_range(start, end, source)?;
                self.dump_block(start, end, source);
            }

            CommandKind::Disassemble => {
                let opcode = parse_u8(args[0])?;
                let lo = args.get(1).map_or(Ok(0), |a| parse_u8(a))?;
                let hi = args.get(2).map_or(Ok(0), |a| parse_u8(a))?;
                let (text, _) = ferricom_core::disassemble(opcode, lo, hi);
                println!("{text}");
            }

            CommandKind::DisBlock => {
                let start = parse_u16(args[0])?;
                let end = parse_u16(args[1])?;
                check_range(start, end, MemorySource::Ram)?;
                for (addr, text) in self.dbg.disassemble_block(start, end) {
                    println!("${addr:04X}: {text}");
                }
            }

            CommandKind::Trace => {
                if let Err(err) = self.dbg.start_trace(Path::new(args[0])) {
                    return Err(format!("could not open trace file {}: {err}", args[0]));
                }
            }
            CommandKind::StopTrace => self.dbg.stop_trace(),

            CommandKind::Hold => {
                let button = parse_button(args[0])?;
                self.dbg.hold_button(button, true);
                println!("Holding {}.", button.name());
            }
            CommandKind::Unhold => {
                let button = parse_button(args[0])?;
                self.dbg.hold_button(button, false);
                println!("Released {}.", button.name());
            }

            CommandKind::Reset => {
                self.dbg.reset();
                self.print_position();
            }

            CommandKind::Quit => return Ok(true),
        }
        Ok(false)
    }

    /// Drive the console, publishing frames so the window stays live.
    fn run_console(&mut self, step: StepType) {
        let shared = Arc::clone(&self.shared);
        let event = self.dbg.run(step, |console| {
            shared.publish_frame(console.framebuffer());
            !shared.exiting()
        });
        match event {
            DebugEvent::Step => self.print_position(),
            DebugEvent::Break(id) => {
                println!("Breakpoint #{id} reached.");
                self.print_position();
            }
            DebugEvent::InvalidInstruction { id, pc } => {
                println!("Found invalid instruction {id:02X} at {pc:04X}.");
            }
            DebugEvent::Stopped => {}
        }
    }

    fn print_position(&self) {
        let pc = self.dbg.console().cpu().pc;
        println!("${pc:04X}: {}", self.dbg.disassemble_current());
    }

    fn print_cpu_status(&self) {
        let cpu = self.dbg.console().cpu();
        println!(
            "PC: ${:04X} A: ${:02X} X: ${:02X} Y: ${:02X} S: ${:02X}",
            cpu.pc, cpu.a, cpu.x, cpu.y, cpu.sp
        );
        println!("Flags: [{}]", flags_string(cpu.status));
        println!("Cycles: {}", cpu.cycles);
    }

    fn print_ppu_status(&self) {
        let ppu = self.dbg.console().ppu();
        let ctrl = ppu.ctrl_bits();
        let mask = ppu.mask_bits();
        let status = ppu.status_bits();
        let onoff = |bit: bool| if bit { "ON" } else { "OFF" };

        println!("PPUCTRL ($2000): {ctrl:08b}:");
        println!("    Base NT address: ${:04X}", 0x2000 + u16::from(ctrl & 0x03) * 0x400);
        println!("    VRAM address increment: {}", if ctrl & 0x04 == 0 { 1 } else { 32 });
        println!("    Sprite pattern table: ${:04X}", u16::from(ctrl >> 3 & 1) * 0x1000);
        println!("    Background pattern table: ${:04X}", u16::from(ctrl >> 4 & 1) * 0x1000);
        println!("    Sprite size: {}", if ctrl & 0x20 != 0 { "8x16" } else { "8x8" });
        println!("    NMI enabled: {}", onoff(ctrl & 0x80 != 0));
        println!("PPUMASK ($2001): {mask:08b}:");
        println!("    Greyscale: {}", onoff(mask & 0x01 != 0));
        println!("    BG left: {}", onoff(mask & 0x02 != 0));
        println!("    Sprites left: {}", onoff(mask & 0x04 != 0));
        println!("    BG: {}", onoff(mask & 0x08 != 0));
        println!("    Sprites: {}", onoff(mask & 0x10 != 0));
        println!("PPUSTATUS ($2002): {status:08b}:");
        println!("    Sprite overflow: {}", onoff(status & 0x20 != 0));
        println!("    Sprite 0 hit: {}", onoff(status & 0x40 != 0));
        println!("    VBlank: {}", onoff(status & 0x80 != 0));
        println!("Line: {}; Dot: {}", ppu.scanline(), ppu.dot());
        println!("VRAM address: {:04X}", ppu.vram_addr());
        println!("TMP address: {:04X}", ppu.temp_addr());
        println!("Fine X: {:X}", ppu.fine_x());
    }

    fn dump_block(&self, start: u16, end: u16, source: MemorySource) {
        let mut addr = u32::from(start);
        while addr <= u32::from(end) {
            print!("${addr:04X}: ");
            for _ in 0..16 {
                if addr > u32::from(end) {
                    break;
                }
                print!("{:02X} ", self.dbg.read_mem(addr as u16, source));
                addr += 1;
            }
            println!();
        }
    }
}

fn check_range(start: u16, end: u16, source: MemorySource) -> Result<(), String> {
    if end < start {
        return Err(format!("Invalid range: {start:04X}-{end:04X}."));
    }
    if end > source.max_addr() {
        return Err(format!("Invalid range for source {source:?}."));
    }
    Ok(())
}
