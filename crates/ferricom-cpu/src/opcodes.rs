//! Opcode decode table.
//!
//! One entry per opcode byte: mnemonic, addressing mode, and the semantic
//! operation. Only the 151 documented opcodes decode to an operation; the
//! rest are [`Kind::Illegal`] and surface as invalid-instruction events
//! instead of executing.

use crate::addressing::AddrMode;

/// Semantic operation selected by an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
    /// Undocumented opcode. Decodes to a 1-byte, 2-cycle no-op and raises
    /// an invalid-instruction event.
    Illegal,
}

impl Kind {
    /// True for the pure store operations. Indexed stores always pay the
    /// address-fix cycle; they never read their target first.
    #[must_use]
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Sta | Self::Stx | Self::Sty)
    }

    /// True for read-modify-write operations (when not in accumulator
    /// mode). These read, write back the stale value, then write the
    /// result.
    #[must_use]
    pub const fn is_rmw(self) -> bool {
        matches!(
            self,
            Self::Asl | Self::Lsr | Self::Rol | Self::Ror | Self::Inc | Self::Dec
        )
    }

    /// True for the eight conditional branches.
    #[must_use]
    pub const fn is_branch(self) -> bool {
        matches!(
            self,
            Self::Bcc | Self::Bcs | Self::Beq | Self::Bmi | Self::Bne | Self::Bpl | Self::Bvc | Self::Bvs
        )
    }
}

/// Decode-table entry.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Three-letter mnemonic ("???" for undocumented bytes).
    pub mnemonic: &'static str,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Semantic operation.
    pub kind: Kind,
}

const fn op(mnemonic: &'static str, mode: AddrMode, kind: Kind) -> OpcodeInfo {
    OpcodeInfo { mnemonic, mode, kind }
}

/// Placeholder for undocumented bytes.
const ILL: OpcodeInfo = op("???", AddrMode::Imp, Kind::Illegal);

/// Opcode decode table, indexed by the opcode byte.
#[rustfmt::skip]
pub static OPCODE_TABLE: [OpcodeInfo; 256] = {
    use AddrMode::{Abs, Abx, Aby, Acc, Imm, Imp, Ind, Idx, Idy, Rel, Zp0, Zpx, Zpy};
    [
    /* 00 */ op("BRK", Imp, Kind::Brk), op("ORA", Idx, Kind::Ora), ILL, ILL,
    /* 04 */ ILL, op("ORA", Zp0, Kind::Ora), op("ASL", Zp0, Kind::Asl), ILL,
    /* 08 */ op("PHP", Imp, Kind::Php), op("ORA", Imm, Kind::Ora), op("ASL", Acc, Kind::Asl), ILL,
    /* 0C */ ILL, op("ORA", Abs, Kind::Ora), op("ASL", Abs, Kind::Asl), ILL,
    /* 10 */ op("BPL", Rel, Kind::Bpl), op("ORA", Idy, Kind::Ora), ILL, ILL,
    /* 14 */ ILL, op("ORA", Zpx, Kind::Ora), op("ASL", Zpx, Kind::Asl), ILL,
    /* 18 */ op("CLC", Imp, Kind::Clc), op("ORA", Aby, Kind::Ora), ILL, ILL,
    /* 1C */ ILL, op("ORA", Abx, Kind::Ora), op("ASL", Abx, Kind::Asl), ILL,
    /* 20 */ op("JSR", Abs, Kind::Jsr), op("AND", Idx, Kind::And), ILL, ILL,
    /* 24 */ op("BIT", Zp0, Kind::Bit), op("AND", Zp0, Kind::And), op("ROL", Zp0, Kind::Rol), ILL,
    /* 28 */ op("PLP", Imp, Kind::Plp), op("AND", Imm, Kind::And), op("ROL", Acc, Kind::Rol), ILL,
    /* 2C */ op("BIT", Abs, Kind::Bit), op("AND", Abs, Kind::And), op("ROL", Abs, Kind::Rol), ILL,
    /* 30 */ op("BMI", Rel, Kind::Bmi), op("AND", Idy, Kind::And), ILL, ILL,
    /* 34 */ ILL, op("AND", Zpx, Kind::And), op("ROL", Zpx, Kind::Rol), ILL,
    /* 38 */ op("SEC", Imp, Kind::Sec), op("AND", Aby, Kind::And), ILL, ILL,
    /* 3C */ ILL, op("AND", Abx, Kind::And), op("ROL", Abx, Kind::Rol), ILL,
    /* 40 */ op("RTI", Imp, Kind::Rti), op("EOR", Idx, Kind::Eor), ILL, ILL,
    /* 44 */ ILL, op("EOR", Zp0, Kind::Eor), op("LSR", Zp0, Kind::Lsr), ILL,
    /* 48 */ op("PHA", Imp, Kind::Pha), op("EOR", Imm, Kind::Eor), op("LSR", Acc, Kind::Lsr), ILL,
    /* 4C */ op("JMP", Abs, Kind::Jmp), op("EOR", Abs, Kind::Eor), op("LSR", Abs, Kind::Lsr), ILL,
    /* 50 */ op("BVC", Rel, Kind::Bvc), op("EOR", Idy, Kind::Eor), ILL, ILL,
    /* 54 */ ILL, op("EOR", Zpx, Kind::Eor), op("LSR", Zpx, Kind::Lsr), ILL,
    /* 58 */ op("CLI", Imp, Kind::Cli), op("EOR", Aby, Kind::Eor), ILL, ILL,
    /* 5C */ ILL, op("EOR", Abx, Kind::Eor), op("LSR", Abx, Kind::Lsr), ILL,
    /* 60 */ op("RTS", Imp, Kind::Rts), op("ADC", Idx, Kind::Adc), ILL, ILL,
    /* 64 */ ILL, op("ADC", Zp0, Kind::Adc), op("ROR", Zp0, Kind::Ror), ILL,
    /* 68 */ op("PLA", Imp, Kind::Pla), op("ADC", Imm, Kind::Adc), op("ROR", Acc, Kind::Ror), ILL,
    /* 6C */ op("JMP", Ind, Kind::Jmp), op("ADC", Abs, Kind::Adc), op("ROR", Abs, Kind::Ror), ILL,
    /* 70 */ op("BVS", Rel, Kind::Bvs), op("ADC", Idy, Kind::Adc), ILL, ILL,
    /* 74 */ ILL, op("ADC", Zpx, Kind::Adc), op("ROR", Zpx, Kind::Ror), ILL,
    /* 78 */ op("SEI", Imp, Kind::Sei), op("ADC", Aby, Kind::Adc), ILL, ILL,
    /* 7C */ ILL, op("ADC", Abx, Kind::Adc), op("ROR", Abx, Kind::Ror), ILL,
    /* 80 */ ILL, op("STA", Idx, Kind::Sta), ILL, ILL,
    /* 84 */ op("STY", Zp0, Kind::Sty), op("STA", Zp0, Kind::Sta), op("STX", Zp0, Kind::Stx), ILL,
    /* 88 */ op("DEY", Imp, Kind::Dey), ILL, op("TXA", Imp, Kind::Txa), ILL,
    /* 8C */ op("STY", Abs, Kind::Sty), op("STA", Abs, Kind::Sta), op("STX", Abs, Kind::Stx), ILL,
    /* 90 */ op("BCC", Rel, Kind::Bcc), op("STA", Idy, Kind::Sta), ILL, ILL,
    /* 94 */ op("STY", Zpx, Kind::Sty), op("STA", Zpx, Kind::Sta), op("STX", Zpy, Kind::Stx), ILL,
    /* 98 */ op("TYA", Imp, Kind::Tya), op("STA", Aby, Kind::Sta), op("TXS", Imp, Kind::Txs), ILL,
    /* 9C */ ILL, op("STA", Abx, Kind::Sta), ILL, ILL,
    /* A0 */ op("LDY", Imm, Kind::Ldy), op("LDA", Idx, Kind::Lda), op("LDX", Imm, Kind::Ldx), ILL,
    /* A4 */ op("LDY", Zp0, Kind::Ldy), op("LDA", Zp0, Kind::Lda), op("LDX", Zp0, Kind::Ldx), ILL,
    /* A8 */ op("TAY", Imp, Kind::Tay), op("LDA", Imm, Kind::Lda), op("TAX", Imp, Kind::Tax), ILL,
    /* AC */ op("LDY", Abs, Kind::Ldy), op("LDA", Abs, Kind::Lda), op("LDX", Abs, Kind::Ldx), ILL,
    /* B0 */ op("BCS", Rel, Kind::Bcs), op("LDA", Idy, Kind::Lda), ILL, ILL,
    /* B4 */ op("LDY", Zpx, Kind::Ldy), op("LDA", Zpx, Kind::Lda), op("LDX", Zpy, Kind::Ldx), ILL,
    /* B8 */ op("CLV", Imp, Kind::Clv), op("LDA", Aby, Kind::Lda), op("TSX", Imp, Kind::Tsx), ILL,
    /* BC */ op("LDY", Abx, Kind::Ldy), op("LDA", Abx, Kind::Lda), op("LDX", Aby, Kind::Ldx), ILL,
    /* C0 */ op("CPY", Imm, Kind::Cpy), op("CMP", Idx, Kind::Cmp), ILL, ILL,
    /* C4 */ op("CPY", Zp0, Kind::Cpy), op("CMP", Zp0, Kind::Cmp), op("DEC", Zp0, Kind::Dec), ILL,
    /* C8 */ op("INY", Imp, Kind::Iny), op("CMP", Imm, Kind::Cmp), op("DEX", Imp, Kind::Dex), ILL,
    /* CC */ op("CPY", Abs, Kind::Cpy), op("CMP", Abs, Kind::Cmp), op("DEC", Abs, Kind::Dec), ILL,
    /* D0 */ op("BNE", Rel, Kind::Bne), op("CMP", Idy, Kind::Cmp), ILL, ILL,
    /* D4 */ ILL, op("CMP", Zpx, Kind::Cmp), op("DEC", Zpx, Kind::Dec), ILL,
    /* D8 */ op("CLD", Imp, Kind::Cld), op("CMP", Aby, Kind::Cmp), ILL, ILL,
    /* DC */ ILL, op("CMP", Abx, Kind::Cmp), op("DEC", Abx, Kind::Dec), ILL,
    /* E0 */ op("CPX", Imm, Kind::Cpx), op("SBC", Idx, Kind::Sbc), ILL, ILL,
    /* E4 */ op("CPX", Zp0, Kind::Cpx), op("SBC", Zp0, Kind::Sbc), op("INC", Zp0, Kind::Inc), ILL,
    /* E8 */ op("INX", Imp, Kind::Inx), op("SBC", Imm, Kind::Sbc), op("NOP", Imp, Kind::Nop), ILL,
    /* EC */ op("CPX", Abs, Kind::Cpx), op("SBC", Abs, Kind::Sbc), op("INC", Abs, Kind::Inc), ILL,
    /* F0 */ op("BEQ", Rel, Kind::Beq), op("SBC", Idy, Kind::Sbc), ILL, ILL,
    /* F4 */ ILL, op("SBC", Zpx, Kind::Sbc), op("INC", Zpx, Kind::Inc), ILL,
    /* F8 */ op("SED", Imp, Kind::Sed), op("SBC", Aby, Kind::Sbc), ILL, ILL,
    /* FC */ ILL, op("SBC", Abx, Kind::Sbc), op("INC", Abx, Kind::Inc), ILL,
    ]
};

/// True if the opcode byte is one of the 151 documented opcodes.
#[must_use]
pub fn is_documented(opcode: u8) -> bool {
    OPCODE_TABLE[opcode as usize].kind != Kind::Illegal
}
