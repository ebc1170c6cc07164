/*!
8-bit arithmetic/logic, the accumulator rotates, DAA, and the 16-bit
arithmetic group.

Flag subtleties encoded here:
- INC/DEC r derive H from the low-nibble boundary and leave C alone;
- 16-bit INC/DEC touch no flags at all (but their address-bus activity
  feeds the OAM corruption hook);
- ADD HL,rr takes H from bit 11 and C from bit 15, leaves Z alone;
- ADD SP,r8 computes H and C from the unsigned low byte and forces Z and
  N clear;
- CP is SUB with the result dropped;
- DAA implements the published binary-coded-decimal table.
*/

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::ppu::oam_bug::CorruptionKind;

use super::{Reg8, Wide};

// -----------------------------
// Shared ALU cores
// -----------------------------

fn add_core(cpu: &mut Cpu, value: u8, carry_in: bool) {
    let a = cpu.regs.a;
    let c = carry_in as u8;
    let result = a.wrapping_add(value).wrapping_add(c);
    cpu.regs.set_c(a as u16 + value as u16 + c as u16 > 0xFF);
    cpu.regs.set_h((a & 0x0F) + (value & 0x0F) + c > 0x0F);
    cpu.regs.set_n(false);
    cpu.regs.set_z(result == 0);
    cpu.regs.a = result;
}

fn sub_core(cpu: &mut Cpu, value: u8, carry_in: bool) {
    let a = cpu.regs.a;
    let c = carry_in as u8;
    let result = a.wrapping_sub(value).wrapping_sub(c);
    cpu.regs.set_c((a as u16) < value as u16 + c as u16);
    cpu.regs.set_h((a & 0x0F) < (value & 0x0F) + c);
    cpu.regs.set_n(true);
    cpu.regs.set_z(result == 0);
    cpu.regs.a = result;
}

fn cp_core(cpu: &mut Cpu, value: u8) {
    let a = cpu.regs.a;
    cpu.regs.set_c(a < value);
    cpu.regs.set_h((a & 0x0F) < (value & 0x0F));
    cpu.regs.set_n(true);
    cpu.regs.set_z(a == value);
}

fn and_core(cpu: &mut Cpu, value: u8) {
    cpu.regs.a &= value;
    let z = cpu.regs.a == 0;
    cpu.regs.f = 0;
    cpu.regs.set_h(true);
    cpu.regs.set_z(z);
}

fn or_core(cpu: &mut Cpu, value: u8) {
    cpu.regs.a |= value;
    let z = cpu.regs.a == 0;
    cpu.regs.f = 0;
    cpu.regs.set_z(z);
}

fn xor_core(cpu: &mut Cpu, value: u8) {
    cpu.regs.a ^= value;
    let z = cpu.regs.a == 0;
    cpu.regs.f = 0;
    cpu.regs.set_z(z);
}

/// Register form: single M-cycle, effect inside the overlapped fetch.
macro_rules! alu_register_forms {
    ($($name:ident => $core:ident),+ $(,)?) => {
        $(
            pub(crate) fn $name(cpu: &mut Cpu, bus: &mut Bus, src: Reg8) -> bool {
                let value = src.get(&cpu.regs);
                $core(cpu, value);
                cpu.finish(bus)
            }
        )+
    };
}

/// (HL) form: read, then act during the fetch cycle.
macro_rules! alu_indirect_forms {
    ($($name:ident => $core:ident),+ $(,)?) => {
        $(
            pub(crate) fn $name(cpu: &mut Cpu, bus: &mut Bus) -> bool {
                match cpu.m_cycle {
                    2 => {
                        cpu.byte = bus.read_byte(cpu.regs.hl());
                        false
                    }
                    _ => {
                        let value = cpu.byte;
                        $core(cpu, value);
                        cpu.finish(bus)
                    }
                }
            }
        )+
    };
}

/// Immediate form: fetch operand, then act during the fetch cycle.
macro_rules! alu_immediate_forms {
    ($($name:ident => $core:ident),+ $(,)?) => {
        $(
            pub(crate) fn $name(cpu: &mut Cpu, bus: &mut Bus) -> bool {
                match cpu.m_cycle {
                    2 => {
                        cpu.byte = cpu.read_pc_byte(bus);
                        false
                    }
                    _ => {
                        let value = cpu.byte;
                        $core(cpu, value);
                        cpu.finish(bus)
                    }
                }
            }
        )+
    };
}

fn add_no_carry(cpu: &mut Cpu, value: u8) {
    add_core(cpu, value, false);
}

fn add_with_carry(cpu: &mut Cpu, value: u8) {
    let carry = cpu.regs.flag_c();
    add_core(cpu, value, carry);
}

fn sub_no_carry(cpu: &mut Cpu, value: u8) {
    sub_core(cpu, value, false);
}

fn sub_with_carry(cpu: &mut Cpu, value: u8) {
    let carry = cpu.regs.flag_c();
    sub_core(cpu, value, carry);
}

alu_register_forms! {
    add_r => add_no_carry,
    adc_r => add_with_carry,
    sub_r => sub_no_carry,
    sbc_r => sub_with_carry,
    and_r => and_core,
    or_r => or_core,
    xor_r => xor_core,
    cp_r => cp_core,
}

alu_indirect_forms! {
    add_hl_indirect => add_no_carry,
    adc_hl_indirect => add_with_carry,
    sub_hl_indirect => sub_no_carry,
    sbc_hl_indirect => sub_with_carry,
    and_hl_indirect => and_core,
    or_hl_indirect => or_core,
    xor_hl_indirect => xor_core,
    cp_hl_indirect => cp_core,
}

alu_immediate_forms! {
    add_imm => add_no_carry,
    adc_imm => add_with_carry,
    sub_imm => sub_no_carry,
    sbc_imm => sub_with_carry,
    and_imm => and_core,
    or_imm => or_core,
    xor_imm => xor_core,
    cp_imm => cp_core,
}

// -----------------------------
// INC/DEC
// -----------------------------

pub(crate) fn inc_r(cpu: &mut Cpu, bus: &mut Bus, target: Reg8) -> bool {
    let value = target.get(&cpu.regs);
    cpu.regs.set_h(value & 0x0F == 0x0F);
    let result = value.wrapping_add(1);
    cpu.regs.set_z(result == 0);
    cpu.regs.set_n(false);
    target.set(&mut cpu.regs, result);
    cpu.finish(bus)
}

pub(crate) fn dec_r(cpu: &mut Cpu, bus: &mut Bus, target: Reg8) -> bool {
    let value = target.get(&cpu.regs);
    cpu.regs.set_h(value & 0x0F == 0x00);
    let result = value.wrapping_sub(1);
    cpu.regs.set_z(result == 0);
    cpu.regs.set_n(true);
    target.set(&mut cpu.regs, result);
    cpu.finish(bus)
}

pub(crate) fn inc_hl_indirect(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = bus.read_byte(cpu.regs.hl());
            false
        }
        3 => {
            cpu.regs.set_h(cpu.byte & 0x0F == 0x0F);
            let result = cpu.byte.wrapping_add(1);
            cpu.regs.set_z(result == 0);
            cpu.regs.set_n(false);
            bus.write_byte(cpu.regs.hl(), result);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn dec_hl_indirect(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = bus.read_byte(cpu.regs.hl());
            false
        }
        3 => {
            cpu.regs.set_h(cpu.byte & 0x0F == 0x00);
            let result = cpu.byte.wrapping_sub(1);
            cpu.regs.set_z(result == 0);
            cpu.regs.set_n(true);
            bus.write_byte(cpu.regs.hl(), result);
            false
        }
        _ => cpu.finish(bus),
    }
}

/// No flags, but the value sits on the address bus for a cycle.
pub(crate) fn inc16(cpu: &mut Cpu, bus: &mut Bus, target: Wide) -> bool {
    match cpu.m_cycle {
        2 => {
            let value = target.get(cpu);
            bus.oam_corruption(value, CorruptionKind::Write);
            target.set(cpu, value.wrapping_add(1));
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn dec16(cpu: &mut Cpu, bus: &mut Bus, target: Wide) -> bool {
    match cpu.m_cycle {
        2 => {
            let value = target.get(cpu);
            bus.oam_corruption(value, CorruptionKind::Write);
            target.set(cpu, value.wrapping_sub(1));
            false
        }
        _ => cpu.finish(bus),
    }
}

// -----------------------------
// 16-bit adds
// -----------------------------

pub(crate) fn add_hl(cpu: &mut Cpu, bus: &mut Bus, src: Wide) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = src.get(cpu);
            false
        }
        _ => {
            let hl = cpu.regs.hl();
            cpu.regs.set_c(hl > 0xFFFF - cpu.word);
            cpu.regs.set_h((hl & 0x07FF) + (cpu.word & 0x07FF) > 0x07FF);
            cpu.regs.set_n(false);
            cpu.regs.set_hl(hl.wrapping_add(cpu.word));
            cpu.finish(bus)
        }
    }
}

pub(crate) fn add_sp_imm(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = cpu.read_pc_byte(bus) as i8 as i16 as u16;
            false
        }
        3 => {
            cpu.regs.set_c((cpu.sp & 0xFF) + (cpu.word & 0xFF) > 0xFF);
            cpu.regs.set_h((cpu.sp & 0x0F) + (cpu.word & 0x0F) > 0x0F);
            cpu.regs.set_n(false);
            cpu.regs.set_z(false);
            false
        }
        4 => {
            cpu.sp = cpu.sp.wrapping_add(cpu.word);
            false
        }
        _ => cpu.finish(bus),
    }
}

// -----------------------------
// Accumulator rotates and flag ops
// -----------------------------

pub(crate) fn rlca(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    let carry = cpu.regs.a >> 7;
    cpu.regs.a = cpu.regs.a << 1 | carry;
    cpu.regs.f = 0;
    cpu.regs.set_c(carry != 0);
    cpu.finish(bus)
}

pub(crate) fn rrca(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    let carry = cpu.regs.a & 0x01;
    cpu.regs.a = cpu.regs.a >> 1 | carry << 7;
    cpu.regs.f = 0;
    cpu.regs.set_c(carry != 0);
    cpu.finish(bus)
}

pub(crate) fn rla(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    let carry_in = cpu.regs.flag_c() as u8;
    let carry_out = cpu.regs.a >> 7;
    cpu.regs.a = cpu.regs.a << 1 | carry_in;
    cpu.regs.f = 0;
    cpu.regs.set_c(carry_out != 0);
    cpu.finish(bus)
}

pub(crate) fn rra(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    let carry_in = cpu.regs.flag_c() as u8;
    let carry_out = cpu.regs.a & 0x01;
    cpu.regs.a = cpu.regs.a >> 1 | carry_in << 7;
    cpu.regs.f = 0;
    cpu.regs.set_c(carry_out != 0);
    cpu.finish(bus)
}

pub(crate) fn daa(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    let mut adjust = 0u8;
    let mut carry = cpu.regs.flag_c();

    if !cpu.regs.flag_n() {
        if cpu.regs.flag_h() || cpu.regs.a & 0x0F > 0x09 {
            adjust |= 0x06;
        }
        if cpu.regs.flag_c() || cpu.regs.a > 0x99 {
            adjust |= 0x60;
            carry = true;
        }
        cpu.regs.a = cpu.regs.a.wrapping_add(adjust);
    } else {
        if cpu.regs.flag_h() {
            adjust |= 0x06;
        }
        if cpu.regs.flag_c() {
            adjust |= 0x60;
        }
        cpu.regs.a = cpu.regs.a.wrapping_sub(adjust);
    }

    cpu.regs.set_c(carry);
    cpu.regs.set_z(cpu.regs.a == 0);
    cpu.regs.set_h(false);
    cpu.finish(bus)
}

pub(crate) fn cpl(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    cpu.regs.a = !cpu.regs.a;
    cpu.regs.set_n(true);
    cpu.regs.set_h(true);
    cpu.finish(bus)
}

pub(crate) fn scf(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    cpu.regs.set_n(false);
    cpu.regs.set_h(false);
    cpu.regs.set_c(true);
    cpu.finish(bus)
}

pub(crate) fn ccf(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    cpu.regs.set_n(false);
    cpu.regs.set_h(false);
    let carry = cpu.regs.flag_c();
    cpu.regs.set_c(!carry);
    cpu.finish(bus)
}
