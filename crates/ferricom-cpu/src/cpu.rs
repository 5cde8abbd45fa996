//! 6502 CPU core.
//!
//! Executes one instruction per [`Cpu::step`] call. The cycle counter is not
//! driven by a per-opcode table: every bus access and every internal dead
//! cycle bumps it by one, so the documented timings (page-cross penalties,
//! branch costs, the RMW stale write-back, the 7-cycle interrupt sequence)
//! follow from performing exactly the accesses the hardware performs.
//!
//! Interrupts use two latch banks: `*_pending` is set by external signals,
//! and at each instruction boundary the pending set is polled into a
//! run-next latch with reset > NMI > IRQ priority. The orchestrator owns the
//! PPU-to-CPU NMI edge; it calls [`Cpu::signal_nmi`] after its dot batch.

use crate::addressing::AddrMode;
use crate::opcodes::{Kind, OpcodeInfo, OPCODE_TABLE};
use crate::status::Status;

/// Interrupt vector addresses.
pub mod vectors {
    /// NMI vector ($FFFA-$FFFB).
    pub const NMI: u16 = 0xFFFA;
    /// Reset vector ($FFFC-$FFFD).
    pub const RESET: u16 = 0xFFFC;
    /// IRQ/BRK vector ($FFFE-$FFFF).
    pub const IRQ: u16 = 0xFFFE;
}

/// Base of the hardware stack page.
const STACK_BASE: u16 = 0x0100;

/// Memory interface the CPU drives.
///
/// Reads take `&mut self` because several NES registers have read side
/// effects ($2002 clears VBlank, $4016 shifts the controller).
pub trait Bus {
    /// Read one byte.
    fn read(&mut self, addr: u16) -> u8;
    /// Write one byte.
    fn write(&mut self, addr: u16, value: u8);

    /// Read a little-endian word.
    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }
}

/// An undocumented opcode the CPU refused to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidOpcode {
    /// The opcode byte.
    pub id: u8,
    /// Address it was fetched from.
    pub pc: u16,
}

/// MOS 6502 CPU state.
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (offset into $0100-$01FF).
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Status register.
    pub status: Status,
    /// Total cycles executed. Monotonic; bumped once per bus access or
    /// internal cycle.
    pub cycles: u64,

    // Pending latches, set by external signals.
    nmi_pending: bool,
    irq_line: bool,
    reset_pending: bool,
    // Run-next latches, set by boundary polling.
    nmi_run: bool,
    irq_run: bool,
    reset_run: bool,

    invalid: Option<InvalidOpcode>,
}

impl Cpu {
    /// Create a CPU in power-on state. The reset sequence is armed, so the
    /// first [`step`](Self::step) (or an explicit [`reset`](Self::reset))
    /// loads PC from $FFFC and leaves SP at $FD.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            status: Status::new(),
            cycles: 0,
            nmi_pending: false,
            irq_line: false,
            reset_pending: true,
            nmi_run: false,
            irq_run: false,
            reset_run: false,
            invalid: None,
        }
    }

    /// Run the reset sequence immediately: 7 cycles, SP decremented by 3
    /// with the stack writes suppressed, I set, PC loaded from $FFFC.
    /// Registers and memory are otherwise untouched.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.nmi_pending = false;
        self.irq_line = false;
        self.reset_pending = false;
        self.nmi_run = false;
        self.irq_run = false;
        self.reset_run = false;
        self.invalid = None;
        self.run_reset_sequence(bus);
    }

    /// Raise the NMI line (edge-triggered).
    pub fn signal_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Drive the IRQ line (level-triggered; sampled every boundary).
    pub fn set_irq_line(&mut self, level: bool) {
        self.irq_line = level;
    }

    /// Raise the reset line.
    pub fn signal_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Take the invalid-opcode record from the last step, if any.
    pub fn take_invalid(&mut self) -> Option<InvalidOpcode> {
        self.invalid.take()
    }

    /// Account for cycles consumed while the CPU was held off the bus
    /// (OAM DMA). Keeps the odd/even parity visible to the next DMA.
    pub fn stall(&mut self, cycles: u64) {
        self.cycles += cycles;
    }

    /// Execute one instruction (or one interrupt sequence) and return the
    /// cycles consumed.
    pub fn step(&mut self, bus: &mut impl Bus) -> u8 {
        let start = self.cycles;

        self.poll_interrupts();

        if self.reset_run {
            self.reset_run = false;
            self.run_reset_sequence(bus);
        } else if self.nmi_run {
            self.nmi_run = false;
            self.run_interrupt_sequence(bus, vectors::NMI);
        } else if self.irq_run {
            self.irq_run = false;
            self.run_interrupt_sequence(bus, vectors::IRQ);
        } else {
            let opcode = self.fetch_byte(bus);
            self.execute(bus, opcode);
        }

        (self.cycles - start) as u8
    }

    /// Instruction-boundary interrupt poll. Reset beats NMI beats IRQ.
    fn poll_interrupts(&mut self) {
        if self.reset_pending {
            self.reset_pending = false;
            self.reset_run = true;
        } else if self.nmi_pending {
            self.nmi_pending = false;
            self.nmi_run = true;
        } else if self.irq_line && !self.status.contains(Status::I) {
            self.irq_run = true;
        }
    }

    // =======================================================================
    // Bus access. Every access costs one cycle.
    // =======================================================================

    #[inline]
    fn tick(&mut self) {
        self.cycles += 1;
    }

    #[inline]
    fn read_byte(&mut self, bus: &mut impl Bus, addr: u16) -> u8 {
        self.cycles += 1;
        bus.read(addr)
    }

    #[inline]
    fn write_byte(&mut self, bus: &mut impl Bus, addr: u16, value: u8) {
        self.cycles += 1;
        bus.write(addr, value);
    }

    #[inline]
    fn fetch_byte(&mut self, bus: &mut impl Bus) -> u8 {
        let value = self.read_byte(bus, self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    #[inline]
    fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn read_word(&mut self, bus: &mut impl Bus, addr: u16) -> u16 {
        let lo = self.read_byte(bus, addr);
        let hi = self.read_byte(bus, addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn push_byte(&mut self, bus: &mut impl Bus, value: u8) {
        self.write_byte(bus, STACK_BASE | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        self.push_byte(bus, (value >> 8) as u8);
        self.push_byte(bus, (value & 0xFF) as u8);
    }

    fn pop_byte(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read_byte(bus, STACK_BASE | u16::from(self.sp))
    }

    fn pop_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pop_byte(bus);
        let hi = self.pop_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Dead cycle spent re-reading the byte after the opcode. Implied and
    /// accumulator instructions burn their second cycle this way.
    fn implied_cycle(&mut self, bus: &mut impl Bus) {
        let _ = self.read_byte(bus, self.pc);
    }

    // =======================================================================
    // Interrupt sequences
    // =======================================================================

    /// 7 cycles. The three stack cycles happen with writes suppressed, so
    /// only SP moves.
    fn run_reset_sequence(&mut self, bus: &mut impl Bus) {
        self.tick();
        self.tick();
        for _ in 0..3 {
            self.sp = self.sp.wrapping_sub(1);
            self.tick();
        }
        self.status.insert(Status::I);
        self.pc = self.read_word(bus, vectors::RESET);
    }

    /// 7 cycles. Pushes PC and status (B clear, this is a hardware
    /// interrupt), sets I, loads the new PC.
    fn run_interrupt_sequence(&mut self, bus: &mut impl Bus, vector: u16) {
        self.tick();
        self.tick();
        self.push_word(bus, self.pc);
        let p = self.status.push_byte(false);
        self.push_byte(bus, p);
        self.status.insert(Status::I);
        self.pc = self.read_word(bus, vector);
    }

    // =======================================================================
    // Operand resolution
    // =======================================================================

    /// Resolve the effective address for memory-operand modes. Stores and
    /// RMW operations always pay the address-fix cycle on indexed modes;
    /// reads pay it only when the index carries into the high byte.
    fn operand_addr(&mut self, bus: &mut impl Bus, mode: AddrMode, kind: Kind) -> u16 {
        let fix_always = kind.is_store() || kind.is_rmw();
        match mode {
            AddrMode::Zp0 => u16::from(self.fetch_byte(bus)),
            AddrMode::Zpx => {
                let base = self.fetch_byte(bus);
                self.tick();
                u16::from(base.wrapping_add(self.x))
            }
            AddrMode::Zpy => {
                let base = self.fetch_byte(bus);
                self.tick();
                u16::from(base.wrapping_add(self.y))
            }
            AddrMode::Abs => self.fetch_word(bus),
            AddrMode::Abx => {
                let base = self.fetch_word(bus);
                self.index_add(bus, base, self.x, fix_always)
            }
            AddrMode::Aby => {
                let base = self.fetch_word(bus);
                self.index_add(bus, base, self.y, fix_always)
            }
            AddrMode::Idx => {
                let zp = self.fetch_byte(bus);
                self.tick();
                let ptr = zp.wrapping_add(self.x);
                let lo = self.read_byte(bus, u16::from(ptr));
                let hi = self.read_byte(bus, u16::from(ptr.wrapping_add(1)));
                u16::from_le_bytes([lo, hi])
            }
            AddrMode::Idy => {
                let zp = self.fetch_byte(bus);
                let lo = self.read_byte(bus, u16::from(zp));
                let hi = self.read_byte(bus, u16::from(zp.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                self.index_add(bus, base, self.y, fix_always)
            }
            AddrMode::Ind => {
                let ptr = self.fetch_word(bus);
                let lo = self.read_byte(bus, ptr);
                // The pointer high-byte read does not carry across a page.
                let hi_addr = if ptr & 0x00FF == 0x00FF {
                    ptr & 0xFF00
                } else {
                    ptr.wrapping_add(1)
                };
                let hi = self.read_byte(bus, hi_addr);
                u16::from_le_bytes([lo, hi])
            }
            AddrMode::Imp | AddrMode::Acc | AddrMode::Imm | AddrMode::Rel => {
                unreachable!("mode {mode:?} has no memory operand")
            }
        }
    }

    /// Add an index register to a base address. The fix-up read happens at
    /// the address with the stale high byte.
    fn index_add(&mut self, bus: &mut impl Bus, base: u16, index: u8, fix_always: bool) -> u16 {
        let addr = base.wrapping_add(u16::from(index));
        let crossed = (base ^ addr) & 0xFF00 != 0;
        if crossed || fix_always {
            let _ = self.read_byte(bus, (base & 0xFF00) | (addr & 0x00FF));
        }
        addr
    }

    /// Fetch the operand value for read instructions.
    fn load_operand(&mut self, bus: &mut impl Bus, info: &OpcodeInfo) -> u8 {
        if info.mode == AddrMode::Imm {
            self.fetch_byte(bus)
        } else {
            let addr = self.operand_addr(bus, info.mode, info.kind);
            self.read_byte(bus, addr)
        }
    }

    // =======================================================================
    // Execution
    // =======================================================================

    #[allow(clippy::too_many_lines)] // one arm per operation
    fn execute(&mut self, bus: &mut impl Bus, opcode: u8) {
        let info = &OPCODE_TABLE[opcode as usize];
        match info.kind {
            Kind::Illegal => {
                let at = self.pc.wrapping_sub(1);
                log::debug!("undocumented opcode {opcode:02X} at {at:04X}");
                self.invalid = Some(InvalidOpcode { id: opcode, pc: at });
                self.tick();
            }

            // Loads / stores
            Kind::Lda => {
                self.a = self.load_operand(bus, info);
                self.status.set_zn(self.a);
            }
            Kind::Ldx => {
                self.x = self.load_operand(bus, info);
                self.status.set_zn(self.x);
            }
            Kind::Ldy => {
                self.y = self.load_operand(bus, info);
                self.status.set_zn(self.y);
            }
            Kind::Sta => {
                let addr = self.operand_addr(bus, info.mode, info.kind);
                self.write_byte(bus, addr, self.a);
            }
            Kind::Stx => {
                let addr = self.operand_addr(bus, info.mode, info.kind);
                self.write_byte(bus, addr, self.x);
            }
            Kind::Sty => {
                let addr = self.operand_addr(bus, info.mode, info.kind);
                self.write_byte(bus, addr, self.y);
            }

            // Arithmetic
            Kind::Adc => {
                let value = self.load_operand(bus, info);
                self.add(value);
            }
            Kind::Sbc => {
                // A + ~M + C: borrow is the complement of carry.
                let value = self.load_operand(bus, info);
                self.add(!value);
            }
            Kind::Cmp => {
                let value = self.load_operand(bus, info);
                self.compare(self.a, value);
            }
            Kind::Cpx => {
                let value = self.load_operand(bus, info);
                self.compare(self.x, value);
            }
            Kind::Cpy => {
                let value = self.load_operand(bus, info);
                self.compare(self.y, value);
            }

            // Logic
            Kind::And => {
                self.a &= self.load_operand(bus, info);
                self.status.set_zn(self.a);
            }
            Kind::Ora => {
                self.a |= self.load_operand(bus, info);
                self.status.set_zn(self.a);
            }
            Kind::Eor => {
                self.a ^= self.load_operand(bus, info);
                self.status.set_zn(self.a);
            }
            Kind::Bit => {
                let value = self.load_operand(bus, info);
                self.status.set(Status::Z, self.a & value == 0);
                self.status.set(Status::V, value & 0x40 != 0);
                self.status.set(Status::N, value & 0x80 != 0);
            }

            // Shifts and rotates
            Kind::Asl => self.rmw(bus, info, Self::asl_value),
            Kind::Lsr => self.rmw(bus, info, Self::lsr_value),
            Kind::Rol => self.rmw(bus, info, Self::rol_value),
            Kind::Ror => self.rmw(bus, info, Self::ror_value),

            // Memory increments
            Kind::Inc => self.rmw(bus, info, Self::inc_value),
            Kind::Dec => self.rmw(bus, info, Self::dec_value),

            // Register increments
            Kind::Inx => {
                self.implied_cycle(bus);
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Kind::Iny => {
                self.implied_cycle(bus);
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Kind::Dex => {
                self.implied_cycle(bus);
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Kind::Dey => {
                self.implied_cycle(bus);
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Transfers
            Kind::Tax => {
                self.implied_cycle(bus);
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Kind::Tay => {
                self.implied_cycle(bus);
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Kind::Txa => {
                self.implied_cycle(bus);
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Kind::Tya => {
                self.implied_cycle(bus);
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Kind::Tsx => {
                self.implied_cycle(bus);
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Kind::Txs => {
                // The one transfer that leaves the flags alone.
                self.implied_cycle(bus);
                self.sp = self.x;
            }

            // Flag operations
            Kind::Clc => self.flag_op(bus, Status::C, false),
            Kind::Sec => self.flag_op(bus, Status::C, true),
            Kind::Cli => self.flag_op(bus, Status::I, false),
            Kind::Sei => self.flag_op(bus, Status::I, true),
            Kind::Cld => self.flag_op(bus, Status::D, false),
            Kind::Sed => self.flag_op(bus, Status::D, true),
            Kind::Clv => self.flag_op(bus, Status::V, false),

            // Stack
            Kind::Pha => {
                self.implied_cycle(bus);
                self.push_byte(bus, self.a);
            }
            Kind::Php => {
                self.implied_cycle(bus);
                let p = self.status.push_byte(true);
                self.push_byte(bus, p);
            }
            Kind::Pla => {
                self.implied_cycle(bus);
                self.tick();
                self.a = self.pop_byte(bus);
                self.status.set_zn(self.a);
            }
            Kind::Plp => {
                self.implied_cycle(bus);
                self.tick();
                let value = self.pop_byte(bus);
                self.status = Status::pull_byte(value);
            }

            // Branches
            Kind::Bcc => self.branch(bus, !self.status.contains(Status::C)),
            Kind::Bcs => self.branch(bus, self.status.contains(Status::C)),
            Kind::Bne => self.branch(bus, !self.status.contains(Status::Z)),
            Kind::Beq => self.branch(bus, self.status.contains(Status::Z)),
            Kind::Bpl => self.branch(bus, !self.status.contains(Status::N)),
            Kind::Bmi => self.branch(bus, self.status.contains(Status::N)),
            Kind::Bvc => self.branch(bus, !self.status.contains(Status::V)),
            Kind::Bvs => self.branch(bus, self.status.contains(Status::V)),

            // Jumps and returns
            Kind::Jmp => {
                self.pc = if info.mode == AddrMode::Ind {
                    self.operand_addr(bus, AddrMode::Ind, info.kind)
                } else {
                    self.fetch_word(bus)
                };
            }
            Kind::Jsr => {
                let target = self.fetch_word(bus);
                self.tick();
                self.push_word(bus, self.pc.wrapping_sub(1));
                self.pc = target;
            }
            Kind::Rts => {
                self.implied_cycle(bus);
                self.tick();
                self.pc = self.pop_word(bus).wrapping_add(1);
                self.tick();
            }
            Kind::Rti => {
                self.implied_cycle(bus);
                self.tick();
                let value = self.pop_byte(bus);
                self.status = Status::pull_byte(value);
                self.pc = self.pop_word(bus);
            }

            Kind::Brk => {
                // The padding byte after BRK is fetched and discarded.
                let _ = self.fetch_byte(bus);
                self.push_word(bus, self.pc);
                let p = self.status.push_byte(true);
                self.push_byte(bus, p);
                self.status.insert(Status::I);
                self.pc = self.read_word(bus, vectors::IRQ);
            }

            Kind::Nop => self.implied_cycle(bus),
        }
    }

    fn flag_op(&mut self, bus: &mut impl Bus, flag: Status, value: bool) {
        self.implied_cycle(bus);
        self.status.set(flag, value);
    }

    /// Shared ADC/SBC core. Overflow is set when both inputs agree in sign
    /// and the result does not.
    fn add(&mut self, value: u8) {
        let a = u16::from(self.a);
        let m = u16::from(value);
        let c = u16::from(self.status.contains(Status::C));
        let sum = a + m + c;
        let result = (sum & 0xFF) as u8;
        self.status.set(Status::C, sum > 0xFF);
        self.status.set(Status::V, (a ^ sum) & (m ^ sum) & 0x80 != 0);
        self.a = result;
        self.status.set_zn(result);
    }

    /// Subtract without storing: C = (reg >= value), Z/N from the difference.
    fn compare(&mut self, reg: u8, value: u8) {
        self.status.set(Status::C, reg >= value);
        self.status.set_zn(reg.wrapping_sub(value));
    }

    /// Conditional branch: 2 cycles untaken, +1 taken, +1 across a page.
    fn branch(&mut self, bus: &mut impl Bus, taken: bool) {
        let offset = self.fetch_byte(bus) as i8;
        if taken {
            self.tick();
            let target = self.pc.wrapping_add(offset as u16);
            if (target ^ self.pc) & 0xFF00 != 0 {
                self.tick();
            }
            self.pc = target;
        }
    }

    /// Read-modify-write dispatch. Accumulator mode skips the bus; memory
    /// mode performs the stale write-back the hardware does between read
    /// and result.
    fn rmw(&mut self, bus: &mut impl Bus, info: &OpcodeInfo, f: fn(&mut Self, u8) -> u8) {
        if info.mode == AddrMode::Acc {
            self.implied_cycle(bus);
            let result = f(self, self.a);
            self.a = result;
        } else {
            let addr = self.operand_addr(bus, info.mode, info.kind);
            let value = self.read_byte(bus, addr);
            self.write_byte(bus, addr, value);
            let result = f(self, value);
            self.write_byte(bus, addr, result);
        }
    }

    fn asl_value(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1;
        self.status.set_zn(result);
        result
    }

    fn lsr_value(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1;
        self.status.set_zn(result);
        result
    }

    fn rol_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.status.set_zn(result);
        result
    }

    fn ror_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C)) << 7;
        self.status.set(Status::C, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.status.set_zn(result);
        result
    }

    fn inc_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.status.set_zn(result);
        result
    }

    fn dec_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.status.set_zn(result);
        result
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatBus {
        memory: Vec<u8>,
    }

    impl FlatBus {
        fn new() -> Self {
            Self {
                memory: vec![0; 0x10000],
            }
        }

        fn with_program(program: &[u8]) -> (Self, Cpu) {
            let mut bus = Self::new();
            bus.memory[0x8000..0x8000 + program.len()].copy_from_slice(program);
            bus.memory[0xFFFC] = 0x00;
            bus.memory[0xFFFD] = 0x80;
            let mut cpu = Cpu::new();
            cpu.reset(&mut bus);
            (bus, cpu)
        }
    }

    impl Bus for FlatBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.memory[addr as usize]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.memory[addr as usize] = value;
        }
    }

    #[test]
    fn reset_sequence() {
        let (_, cpu) = FlatBus::with_program(&[0xEA]);
        assert_eq!(cpu.pc, 0x8000);
        assert_eq!(cpu.sp, 0xFD);
        assert_eq!(cpu.cycles, 7);
        assert!(cpu.status.contains(Status::I));
    }

    #[test]
    fn lda_immediate() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0xA9, 0x42]);
        let cycles = cpu.step(&mut bus);
        assert_eq!(cpu.a, 0x42);
        assert_eq!(cpu.pc, 0x8002);
        assert_eq!(cycles, 2);
        assert!(!cpu.status.contains(Status::Z));
        assert!(!cpu.status.contains(Status::N));
    }

    #[test]
    fn adc_signed_overflow() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0x69, 0x50]);
        cpu.a = 0x50;
        cpu.step(&mut bus);
        assert_eq!(cpu.a, 0xA0);
        assert!(cpu.status.contains(Status::V));
        assert!(cpu.status.contains(Status::N));
        assert!(!cpu.status.contains(Status::C));
        assert!(!cpu.status.contains(Status::Z));
    }

    #[test]
    fn page_cross_penalty() {
        // LDA $80F0,X with X=$10 crosses into $8100.
        let (mut bus, mut cpu) = FlatBus::with_program(&[0xBD, 0xF0, 0x80]);
        cpu.x = 0x10;
        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 5);

        // Same read without a crossing costs 4.
        let (mut bus, mut cpu) = FlatBus::with_program(&[0xBD, 0x00, 0x80]);
        cpu.x = 0x10;
        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 4);
    }

    #[test]
    fn indexed_store_has_no_page_bonus() {
        // STA $80F0,X always takes 5, crossed or not.
        for base_lo in [0x00u8, 0xF0] {
            let (mut bus, mut cpu) = FlatBus::with_program(&[0x9D, base_lo, 0x20]);
            cpu.x = 0x10;
            cpu.a = 0x55;
            let cycles = cpu.step(&mut bus);
            assert_eq!(cycles, 5);
            let addr = (0x2000 | u16::from(base_lo)).wrapping_add(0x10);
            assert_eq!(bus.memory[addr as usize], 0x55);
        }
    }

    #[test]
    fn jmp_indirect_page_wrap() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0x6C, 0xFF, 0x02]);
        bus.memory[0x02FF] = 0x34;
        bus.memory[0x0200] = 0x12; // high byte read from the same page
        bus.memory[0x0300] = 0xFF; // must not be used
        let cycles = cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x1234);
        assert_eq!(cycles, 5);
    }

    #[test]
    fn branch_cycle_costs() {
        // Not taken: 2.
        let (mut bus, mut cpu) = FlatBus::with_program(&[0xD0, 0x10]);
        cpu.status.insert(Status::Z);
        assert_eq!(cpu.step(&mut bus), 2);

        // Taken, same page: 3.
        let (mut bus, mut cpu) = FlatBus::with_program(&[0xD0, 0x10]);
        cpu.status.remove(Status::Z);
        assert_eq!(cpu.step(&mut bus), 3);
        assert_eq!(cpu.pc, 0x8012);

        // Taken, across a page: 4.
        let (mut bus, mut cpu) = FlatBus::with_program(&[0xD0, 0x7F]);
        cpu.pc = 0x80F0;
        bus.memory[0x80F0] = 0xD0;
        bus.memory[0x80F1] = 0x7F;
        cpu.status.remove(Status::Z);
        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.pc, 0x8171);
    }

    #[test]
    fn php_plp_break_flag() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0x08, 0x28]);
        cpu.status = Status::pull_byte(0x00);
        cpu.step(&mut bus); // PHP
        let pushed = bus.memory[0x01FD];
        assert_eq!(pushed & 0x30, 0x30, "PHP pushes B and U set");
        cpu.step(&mut bus); // PLP
        assert!(!cpu.status.contains(Status::B));
        assert!(cpu.status.contains(Status::U));
    }

    #[test]
    fn jsr_rts_round_trip() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0x20, 0x10, 0x80]);
        bus.memory[0x8010] = 0x60; // RTS
        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 6);
        assert_eq!(cpu.pc, 0x8010);
        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 6);
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cpu.sp, 0xFD);
    }

    #[test]
    fn brk_pushes_and_vectors() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0x00]);
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0x90;
        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x9000);
        assert!(cpu.status.contains(Status::I));
        // Return address is PC past the padding byte; status has B set.
        assert_eq!(bus.memory[0x01FD], 0x80);
        assert_eq!(bus.memory[0x01FC], 0x02);
        assert_eq!(bus.memory[0x01FB] & 0x30, 0x30);
    }

    #[test]
    fn nmi_taken_at_boundary() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0xEA, 0xEA]);
        bus.memory[0xFFFA] = 0x00;
        bus.memory[0xFFFB] = 0x90;
        cpu.step(&mut bus); // NOP
        cpu.signal_nmi();
        let cycles = cpu.step(&mut bus); // interrupt sequence replaces the fetch
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x9000);
        // Status was pushed with B clear.
        assert_eq!(bus.memory[0x01FB] & 0x10, 0);
    }

    #[test]
    fn irq_masked_by_i_flag() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0xEA, 0x58, 0xEA, 0xEA]);
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0x90;
        cpu.set_irq_line(true);
        cpu.step(&mut bus); // NOP; I is still set from reset
        assert_eq!(cpu.pc, 0x8001);
        cpu.step(&mut bus); // CLI
        cpu.step(&mut bus); // next boundary takes the IRQ
        assert_eq!(cpu.pc, 0x9000);
    }

    #[test]
    fn rmw_writes_stale_value_first() {
        // INC $2000 must write the old value before the new one. Capture
        // the write sequence with a recording bus.
        struct Recorder {
            inner: FlatBus,
            writes: Vec<(u16, u8)>,
        }
        impl Bus for Recorder {
            fn read(&mut self, addr: u16) -> u8 {
                self.inner.read(addr)
            }
            fn write(&mut self, addr: u16, value: u8) {
                self.writes.push((addr, value));
                self.inner.write(addr, value);
            }
        }

        let (mut flat, mut cpu) = FlatBus::with_program(&[0xEE, 0x00, 0x20]);
        flat.memory[0x2000] = 0x41;
        let mut bus = Recorder {
            inner: flat,
            writes: Vec::new(),
        };
        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 6);
        assert_eq!(bus.writes, vec![(0x2000, 0x41), (0x2000, 0x42)]);
    }

    #[test]
    fn illegal_opcode_is_reported() {
        let (mut bus, mut cpu) = FlatBus::with_program(&[0x02, 0xEA]);
        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 2);
        assert_eq!(cpu.pc, 0x8001);
        let inv = cpu.take_invalid().expect("invalid opcode recorded");
        assert_eq!(inv.id, 0x02);
        assert_eq!(inv.pc, 0x8000);
        assert!(cpu.take_invalid().is_none());
    }
}
