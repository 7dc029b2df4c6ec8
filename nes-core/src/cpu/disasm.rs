//! One-instruction disassembly, used by the `trace!` logging in
//! [`super::Cpu::tick`] and by `nes-platform`'s debug view. Grounded in the
//! teacher's `cpu/trace.rs`/`cpu/debug.rs` nestest-style line format, reduced
//! to a pure mnemonic+operand string (no file I/O, no register dump — those
//! are the caller's concern).

use super::opcode::lookup;
use super::AddressingMode;
use crate::mem::Mmu;

/// Render the instruction at `pc` as `"MNEMONIC operand"`, without mutating
/// `mmu` beyond ordinary reads (no PPU callbacks are triggered since port
/// reads are never disassembly targets in practice, but a `None` PPU keeps
/// this side-effect-free even if they are).
pub fn disasm(pc: u16, mmu: &mut Mmu) -> String {
    let opcode_byte = match mmu.read_byte(pc, None) {
        Ok(b) => b,
        Err(_) => return format!("{:02X}       .byte ${:02X}", pc, 0),
    };

    let descriptor = match lookup(opcode_byte) {
        Some(d) => d,
        None => return format!("{:02X}       .byte ${:02X}", pc, opcode_byte),
    };

    let operand = match descriptor.mode {
        AddressingMode::Implied | AddressingMode::Accumulator => String::new(),
        AddressingMode::Immediate => {
            let b = mmu.read_byte(pc.wrapping_add(1), None).unwrap_or(0);
            format!("#${:02X}", b)
        }
        AddressingMode::ZeroPage => format!("${:02X}", mmu.read_byte(pc.wrapping_add(1), None).unwrap_or(0)),
        AddressingMode::ZeroPageX => format!("${:02X},X", mmu.read_byte(pc.wrapping_add(1), None).unwrap_or(0)),
        AddressingMode::ZeroPageY => format!("${:02X},Y", mmu.read_byte(pc.wrapping_add(1), None).unwrap_or(0)),
        AddressingMode::Relative => {
            let offset = mmu.read_byte(pc.wrapping_add(1), None).unwrap_or(0) as i8;
            let target = pc.wrapping_add(2).wrapping_add(offset as u16);
            format!("${:04X}", target)
        }
        AddressingMode::Absolute => format!("${:04X}", mmu.read_word(pc.wrapping_add(1), None).unwrap_or(0)),
        AddressingMode::AbsoluteX => format!("${:04X},X", mmu.read_word(pc.wrapping_add(1), None).unwrap_or(0)),
        AddressingMode::AbsoluteY => format!("${:04X},Y", mmu.read_word(pc.wrapping_add(1), None).unwrap_or(0)),
        AddressingMode::Indirect => format!("(${:04X})", mmu.read_word(pc.wrapping_add(1), None).unwrap_or(0)),
        AddressingMode::IndexedIndirect => format!("(${:02X},X)", mmu.read_byte(pc.wrapping_add(1), None).unwrap_or(0)),
        AddressingMode::IndirectIndexed => format!("(${:02X}),Y", mmu.read_byte(pc.wrapping_add(1), None).unwrap_or(0)),
    };

    if operand.is_empty() {
        format!("{:02X}       {}", opcode_byte, descriptor.mnemonic)
    } else {
        format!("{:02X}       {} {}", opcode_byte, descriptor.mnemonic, operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::Mmu;

    #[test]
    fn disassembles_immediate_load() {
        let mut mmu = Mmu::new();
        mmu.map(0xC000, 0xC002, vec![0xA9, 0x42], true, false).unwrap();
        mmu.sort();
        assert_eq!(disasm(0xC000, &mut mmu), "A9       LDA #$42");
    }

    #[test]
    fn disassembles_implied_instruction() {
        let mut mmu = Mmu::new();
        mmu.map(0xC000, 0xC001, vec![0xEA], true, false).unwrap();
        mmu.sort();
        assert_eq!(disasm(0xC000, &mut mmu), "EA       NOP");
    }

    #[test]
    fn renders_unassigned_opcode_as_raw_byte() {
        let mut mmu = Mmu::new();
        mmu.map(0xC000, 0xC001, vec![0x02], true, false).unwrap();
        mmu.sort();
        assert_eq!(disasm(0xC000, &mut mmu), "C000       .byte $02");
    }
}
