//! Instruction disassembly.
//!
//! Works on a 3-byte window: the opcode and up to two operand bytes. The
//! returned length says how many of those bytes the instruction actually
//! consumes, which is what a linear disassembler needs to walk a block.

use crate::addressing::AddrMode;
use crate::opcodes::{Kind, OPCODE_TABLE};
use crate::status::Status;

/// Disassemble one instruction from an opcode byte and the two bytes that
/// follow it. Returns the text and the instruction length (1-3).
///
/// Undocumented opcodes disassemble as `.byte $XX` with length 1, matching
/// how the CPU retires them.
#[must_use]
pub fn disassemble(opcode: u8, lo: u8, hi: u8) -> (String, u16) {
    let info = &OPCODE_TABLE[opcode as usize];
    if info.kind == Kind::Illegal {
        return (format!(".byte ${opcode:02X}"), 1);
    }

    let m = info.mnemonic;
    let word = u16::from_le_bytes([lo, hi]);
    let text = match info.mode {
        AddrMode::Imp => m.to_string(),
        AddrMode::Acc => format!("{m} A"),
        AddrMode::Imm => format!("{m} #${lo:02X}"),
        AddrMode::Zp0 => format!("{m} ${lo:02X}"),
        AddrMode::Zpx => format!("{m} ${lo:02X},X"),
        AddrMode::Zpy => format!("{m} ${lo:02X},Y"),
        AddrMode::Abs => format!("{m} ${word:04X}"),
        AddrMode::Abx => format!("{m} ${word:04X},X"),
        AddrMode::Aby => format!("{m} ${word:04X},Y"),
        AddrMode::Ind => format!("{m} (${word:04X})"),
        AddrMode::Idx => format!("{m} (${lo:02X},X)"),
        AddrMode::Idy => format!("{m} (${lo:02X}),Y"),
        // Branch targets are relative; without a base address the raw
        // offset is shown. See `disassemble_at` for resolved targets.
        AddrMode::Rel => format!("{m} {:+}", lo as i8),
    };
    (text, info.mode.instr_len())
}

/// Disassemble with a known instruction address, resolving branch targets
/// to absolute addresses.
#[must_use]
pub fn disassemble_at(addr: u16, opcode: u8, lo: u8, hi: u8) -> (String, u16) {
    let info = &OPCODE_TABLE[opcode as usize];
    if info.mode == AddrMode::Rel && info.kind != Kind::Illegal {
        let target = addr.wrapping_add(2).wrapping_add(lo as i8 as u16);
        return (format!("{} ${target:04X}", info.mnemonic), 2);
    }
    disassemble(opcode, lo, hi)
}

/// Whether the branch `opcode` would be taken under `status`. Returns
/// `None` for non-branch opcodes.
#[must_use]
pub fn branch_taken(opcode: u8, status: Status) -> Option<bool> {
    let taken = match OPCODE_TABLE[opcode as usize].kind {
        Kind::Bcc => !status.contains(Status::C),
        Kind::Bcs => status.contains(Status::C),
        Kind::Bne => !status.contains(Status::Z),
        Kind::Beq => status.contains(Status::Z),
        Kind::Bpl => !status.contains(Status::N),
        Kind::Bmi => status.contains(Status::N),
        Kind::Bvc => !status.contains(Status::V),
        Kind::Bvs => status.contains(Status::V),
        _ => return None,
    };
    Some(taken)
}

/// Instruction length for an opcode byte (1-3).
#[must_use]
pub fn instr_len(opcode: u8) -> u16 {
    let info = &OPCODE_TABLE[opcode as usize];
    if info.kind == Kind::Illegal {
        1
    } else {
        info.mode.instr_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_by_mode() {
        assert_eq!(disassemble(0xA9, 0x42, 0x00).0, "LDA #$42");
        assert_eq!(disassemble(0xA5, 0x42, 0x00).0, "LDA $42");
        assert_eq!(disassemble(0xB5, 0x42, 0x00).0, "LDA $42,X");
        assert_eq!(disassemble(0xAD, 0x34, 0x12).0, "LDA $1234");
        assert_eq!(disassemble(0x6C, 0xFF, 0x02).0, "JMP ($02FF)");
        assert_eq!(disassemble(0xA1, 0x20, 0x00).0, "LDA ($20,X)");
        assert_eq!(disassemble(0xB1, 0x20, 0x00).0, "LDA ($20),Y");
        assert_eq!(disassemble(0x0A, 0x00, 0x00).0, "ASL A");
        assert_eq!(disassemble(0xEA, 0x00, 0x00).0, "NOP");
    }

    #[test]
    fn lengths_match_modes() {
        assert_eq!(disassemble(0xEA, 0, 0).1, 1);
        assert_eq!(disassemble(0xA9, 0, 0).1, 2);
        assert_eq!(disassemble(0xAD, 0, 0).1, 3);
        assert_eq!(disassemble(0x02, 0, 0).1, 1); // undocumented
    }

    #[test]
    fn branch_targets_resolve() {
        // BNE +$10 from $8000 lands at $8012.
        let (text, len) = disassemble_at(0x8000, 0xD0, 0x10, 0x00);
        assert_eq!(text, "BNE $8012");
        assert_eq!(len, 2);
        // Negative offset.
        let (text, _) = disassemble_at(0x8000, 0xD0, 0xFE, 0x00);
        assert_eq!(text, "BNE $8000");
    }

    #[test]
    fn branch_taken_predicate() {
        let mut p = Status::new();
        assert_eq!(branch_taken(0xD0, p), Some(true)); // BNE, Z clear
        p.insert(Status::Z);
        assert_eq!(branch_taken(0xD0, p), Some(false));
        assert_eq!(branch_taken(0xF0, p), Some(true)); // BEQ
        assert_eq!(branch_taken(0xEA, p), None); // NOP is not a branch
    }

    #[test]
    fn every_documented_length_is_1_to_3() {
        for op in 0u16..=0xFF {
            let len = instr_len(op as u8);
            assert!((1..=3).contains(&len), "opcode {op:02X} length {len}");
        }
    }
}
