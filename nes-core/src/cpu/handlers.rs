//! Instruction semantics (spec §4.3 "Handler catalog"). Each handler is
//! invoked by [`super::Cpu::tick`] with the argument and effective address
//! the eval framework already resolved; a `Some(value)` return triggers the
//! generic accumulator-or-memory writeback spec §4.3 describes.

use super::opcode::HandlerArg;
use super::{AddressingMode, Cpu};
use crate::error::CpuError;
use crate::mem::Mmu;
use crate::ppu::Ppu;

fn byte(arg: HandlerArg) -> u8 {
    match arg {
        HandlerArg::Byte(b) => b,
        _ => unreachable!("handler invoked with an argument its class never produces"),
    }
}

fn addr16(arg: HandlerArg) -> u16 {
    match arg {
        HandlerArg::Addr(a) => a,
        _ => unreachable!("handler invoked with an argument its class never produces"),
    }
}

pub fn adc(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let m = byte(arg);
    let carry_in = cpu.carry() as u16;
    let sum = cpu.a as u16 + m as u16 + carry_in;
    let result = sum as u8;
    cpu.set_carry(sum > 0xFF);
    cpu.set_overflow((cpu.a ^ result) & (m ^ result) & 0x80 != 0);
    cpu.a = result;
    cpu.update_prev(result);
    Ok(None)
}

pub fn sbc(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let m = byte(arg) ^ 0xFF;
    let carry_in = cpu.carry() as u16;
    let sum = cpu.a as u16 + m as u16 + carry_in;
    let result = sum as u8;
    cpu.set_carry(sum > 0xFF);
    cpu.set_overflow((cpu.a ^ result) & (m ^ result) & 0x80 != 0);
    cpu.a = result;
    cpu.update_prev(result);
    Ok(None)
}

fn bitwise(cpu: &mut Cpu, arg: HandlerArg, f: impl Fn(u8, u8) -> u8) -> Result<Option<u8>, CpuError> {
    let result = f(cpu.a, byte(arg));
    cpu.a = result;
    cpu.update_prev(result);
    Ok(None)
}

pub fn and(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    bitwise(cpu, arg, |a, m| a & m)
}

pub fn ora(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    bitwise(cpu, arg, |a, m| a | m)
}

pub fn eor(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    bitwise(cpu, arg, |a, m| a ^ m)
}

pub fn asl(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let m = byte(arg);
    cpu.set_carry(m & 0x80 != 0);
    let result = m << 1;
    cpu.update_prev(result);
    Ok(Some(result))
}

pub fn lsr(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let m = byte(arg);
    cpu.set_carry(m & 0x01 != 0);
    let result = m >> 1;
    cpu.update_prev(result);
    Ok(Some(result))
}

pub fn rol(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let m = byte(arg);
    let old_carry = cpu.carry() as u8;
    cpu.set_carry(m & 0x80 != 0);
    let result = (m << 1) | old_carry;
    cpu.update_prev(result);
    Ok(Some(result))
}

pub fn ror(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let m = byte(arg);
    let old_carry = cpu.carry() as u8;
    cpu.set_carry(m & 0x01 != 0);
    let result = (m >> 1) | (old_carry << 7);
    cpu.update_prev(result);
    Ok(Some(result))
}

fn compare(cpu: &mut Cpu, register: u8, arg: HandlerArg) -> Result<Option<u8>, CpuError> {
    let m = byte(arg);
    cpu.set_carry(register >= m);
    cpu.update_prev(register.wrapping_sub(m));
    Ok(None)
}

pub fn cmp(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    compare(cpu, cpu.a, arg)
}

pub fn cpx(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    compare(cpu, cpu.x, arg)
}

pub fn cpy(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    compare(cpu, cpu.y, arg)
}

pub fn inc(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let result = byte(arg).wrapping_add(1);
    cpu.update_prev(result);
    Ok(Some(result))
}

pub fn dec(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let result = byte(arg).wrapping_sub(1);
    cpu.update_prev(result);
    Ok(Some(result))
}

pub fn inx(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.x = cpu.x.wrapping_add(1);
    cpu.update_prev(cpu.x);
    Ok(None)
}

pub fn iny(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.y = cpu.y.wrapping_add(1);
    cpu.update_prev(cpu.y);
    Ok(None)
}

pub fn dex(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.x = cpu.x.wrapping_sub(1);
    cpu.update_prev(cpu.x);
    Ok(None)
}

pub fn dey(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.y = cpu.y.wrapping_sub(1);
    cpu.update_prev(cpu.y);
    Ok(None)
}

pub fn lda(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.a = byte(arg);
    cpu.update_prev(cpu.a);
    Ok(None)
}

pub fn ldx(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.x = byte(arg);
    cpu.update_prev(cpu.x);
    Ok(None)
}

pub fn ldy(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.y = byte(arg);
    cpu.update_prev(cpu.y);
    Ok(None)
}

pub fn sta(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    Ok(Some(cpu.a))
}

pub fn stx(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    Ok(Some(cpu.x))
}

pub fn sty(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    Ok(Some(cpu.y))
}

pub fn jmp(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.pc = addr16(arg);
    Ok(None)
}

pub fn jsr(cpu: &mut Cpu, mmu: &mut Mmu, mut ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let target = addr16(arg);
    let return_addr = cpu.pc.wrapping_sub(1);
    cpu.push(mmu, ppu.as_deref_mut(), (return_addr >> 8) as u8)?;
    cpu.push(mmu, ppu, return_addr as u8)?;
    cpu.pc = target;
    Ok(None)
}

pub fn rts(cpu: &mut Cpu, mmu: &mut Mmu, mut ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let lo = cpu.pop(mmu, ppu.as_deref_mut())?;
    let hi = cpu.pop(mmu, ppu)?;
    cpu.pc = u16::from_le_bytes([lo, hi]).wrapping_add(1);
    Ok(None)
}

pub fn rti(cpu: &mut Cpu, mmu: &mut Mmu, mut ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let p = cpu.pop(mmu, ppu.as_deref_mut())?;
    cpu.set_p(p & !0b0001_0000); // clear B on restore
    let lo = cpu.pop(mmu, ppu.as_deref_mut())?;
    let hi = cpu.pop(mmu, ppu)?;
    cpu.pc = u16::from_le_bytes([lo, hi]);
    Ok(None)
}

fn branch_if(cpu: &mut Cpu, taken: bool, arg: HandlerArg) -> Result<Option<u8>, CpuError> {
    if taken {
        let offset = byte(arg) as i8;
        cpu.pc = cpu.pc.wrapping_add(offset as u16);
    }
    Ok(None)
}

pub fn bcc(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    branch_if(cpu, !cpu.carry(), arg)
}

pub fn bcs(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    branch_if(cpu, cpu.carry(), arg)
}

pub fn beq(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    branch_if(cpu, cpu.zero(), arg)
}

pub fn bne(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    branch_if(cpu, !cpu.zero(), arg)
}

pub fn bmi(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    branch_if(cpu, cpu.negative(), arg)
}

pub fn bpl(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    branch_if(cpu, !cpu.negative(), arg)
}

pub fn bvc(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    branch_if(cpu, !cpu.overflow(), arg)
}

pub fn bvs(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    branch_if(cpu, cpu.overflow(), arg)
}

pub fn pha(cpu: &mut Cpu, mmu: &mut Mmu, ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let a = cpu.a;
    cpu.push(mmu, ppu, a)?;
    Ok(None)
}

pub fn php(cpu: &mut Cpu, mmu: &mut Mmu, ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    // The B flag (and bit 5) are always pushed set for PHP (6502 quirk).
    let p = cpu.p() | 0b0011_0000;
    cpu.push(mmu, ppu, p)?;
    Ok(None)
}

pub fn pla(cpu: &mut Cpu, mmu: &mut Mmu, ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let v = cpu.pop(mmu, ppu)?;
    cpu.a = v;
    cpu.update_prev(v);
    Ok(None)
}

pub fn plp(cpu: &mut Cpu, mmu: &mut Mmu, ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    let v = cpu.pop(mmu, ppu)?;
    cpu.set_p(v);
    Ok(None)
}

pub fn clc(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.set_carry(false);
    Ok(None)
}

pub fn sec(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.set_carry(true);
    Ok(None)
}

pub fn cld(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.status.set(super::StatusBits::DECIMAL, false);
    Ok(None)
}

pub fn sed(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.status.set(super::StatusBits::DECIMAL, true);
    Ok(None)
}

pub fn cli(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.status.set(super::StatusBits::INTERRUPT_DISABLE, false);
    Ok(None)
}

pub fn sei(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.status.set(super::StatusBits::INTERRUPT_DISABLE, true);
    Ok(None)
}

pub fn clv(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.set_overflow(false);
    Ok(None)
}

pub fn tax(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.x = cpu.a;
    cpu.update_prev(cpu.x);
    Ok(None)
}

pub fn tay(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.y = cpu.a;
    cpu.update_prev(cpu.y);
    Ok(None)
}

pub fn tsx(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.x = cpu.sp;
    cpu.update_prev(cpu.x);
    Ok(None)
}

pub fn txa(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.a = cpu.x;
    cpu.update_prev(cpu.a);
    Ok(None)
}

pub fn txs(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    // TXS alone does not update `prev` (spec §4.3).
    cpu.sp = cpu.x;
    Ok(None)
}

pub fn tya(cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    cpu.a = cpu.y;
    cpu.update_prev(cpu.a);
    Ok(None)
}

pub fn nop(_cpu: &mut Cpu, _mmu: &mut Mmu, _ppu: Option<&mut Ppu>, _arg: HandlerArg, _addr: Option<u16>) -> Result<Option<u8>, CpuError> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with(a: u8, carry: bool) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.a = a;
        cpu.set_carry(carry);
        cpu
    }

    #[test]
    fn adc_sets_carry_and_overflow_on_signed_overflow() {
        let mut cpu = cpu_with(0x7F, false);
        let mut mmu = Mmu::new();
        adc(&mut cpu, &mut mmu, None, HandlerArg::Byte(0x01), None).unwrap();
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.overflow());
        assert!(!cpu.carry());
    }

    #[test]
    fn sbc_borrows_via_inverted_carry() {
        let mut cpu = cpu_with(0x05, true); // carry set = no borrow
        let mut mmu = Mmu::new();
        sbc(&mut cpu, &mut mmu, None, HandlerArg::Byte(0x01), None).unwrap();
        assert_eq!(cpu.a, 0x04);
        assert!(cpu.carry());
    }

    #[test]
    fn compare_sets_carry_when_register_is_greater_or_equal() {
        let mut cpu = cpu_with(0x10, false);
        let mut mmu = Mmu::new();
        cmp(&mut cpu, &mut mmu, None, HandlerArg::Byte(0x10), None).unwrap();
        assert!(cpu.carry());
        assert!(cpu.zero());
    }

    #[test]
    fn txs_does_not_touch_prev() {
        let mut cpu = Cpu::new();
        cpu.update_prev(0); // force zero flag
        cpu.x = 0xAB;
        let mut mmu = Mmu::new();
        txs(&mut cpu, &mut mmu, None, HandlerArg::None, None).unwrap();
        assert_eq!(cpu.sp, 0xAB);
        assert!(cpu.zero()); // unchanged
    }
}
