/*!
Opcode dispatch.

One `match` arm per opcode, delegating to family handlers that branch on
the CPU's M-cycle index. Operand shapes (register, register pair,
condition, stack target, RST vector) travel as plain enums so a family
needs exactly one function; everything is statically dispatched.

Families live in:
- `load.rs`     - 8/16-bit moves, stack ops, LDH forms
- `alu.rs`      - 8-bit arithmetic/logic, DAA, 16-bit add/inc/dec
- `control.rs`  - jumps, calls, returns, RST, HALT/STOP/EI/DI
- `prefixed.rs` - the 0xCB table
*/

pub(crate) mod alu;
pub(crate) mod control;
pub(crate) mod load;
pub(crate) mod prefixed;

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::cpu::regs::Registers;

use Cond::*;
use Reg8::*;
use Wide::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Reg8 {
    #[inline]
    pub fn get(self, regs: &Registers) -> u8 {
        match self {
            A => regs.a,
            B => regs.b,
            C => regs.c,
            D => regs.d,
            E => regs.e,
            H => regs.h,
            L => regs.l,
        }
    }

    #[inline]
    pub fn set(self, regs: &mut Registers, value: u8) {
        match self {
            A => regs.a = value,
            B => regs.b = value,
            C => regs.c = value,
            D => regs.d = value,
            E => regs.e = value,
            H => regs.h = value,
            L => regs.l = value,
        }
    }
}

/// 16-bit register operand (SP where the encoding says so).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wide {
    BC,
    DE,
    HL,
    SP,
}

impl Wide {
    #[inline]
    pub fn get(self, cpu: &Cpu) -> u16 {
        match self {
            BC => cpu.regs.bc(),
            DE => cpu.regs.de(),
            HL => cpu.regs.hl(),
            SP => cpu.sp,
        }
    }

    #[inline]
    pub fn set(self, cpu: &mut Cpu, value: u16) {
        match self {
            BC => cpu.regs.set_bc(value),
            DE => cpu.regs.set_de(value),
            HL => cpu.regs.set_hl(value),
            SP => cpu.sp = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackReg {
    BC,
    DE,
    HL,
    AF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cond {
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

impl Cond {
    #[inline]
    pub fn holds(self, regs: &Registers) -> bool {
        match self {
            NotZero => !regs.flag_z(),
            Zero => regs.flag_z(),
            NotCarry => !regs.flag_c(),
            Carry => regs.flag_c(),
        }
    }
}

/// Run one M-cycle of the current opcode; true when the instruction
/// completed (and fetched its successor).
pub(crate) fn execute(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    if cpu.prefixed {
        return prefixed::execute(cpu, bus);
    }
    match cpu.opcode {
        0x00 => control::nop(cpu, bus),
        0x01 => load::ld_wide_imm(cpu, bus, BC),
        0x02 => load::ld_bc_a(cpu, bus),
        0x03 => alu::inc16(cpu, bus, BC),
        0x04 => alu::inc_r(cpu, bus, B),
        0x05 => alu::dec_r(cpu, bus, B),
        0x06 => load::ld_r_imm(cpu, bus, B),
        0x07 => alu::rlca(cpu, bus),
        0x08 => load::ld_a16_sp(cpu, bus),
        0x09 => alu::add_hl(cpu, bus, BC),
        0x0A => load::ld_a_bc(cpu, bus),
        0x0B => alu::dec16(cpu, bus, BC),
        0x0C => alu::inc_r(cpu, bus, C),
        0x0D => alu::dec_r(cpu, bus, C),
        0x0E => load::ld_r_imm(cpu, bus, C),
        0x0F => alu::rrca(cpu, bus),
        0x10 => control::stop(cpu, bus),
        0x11 => load::ld_wide_imm(cpu, bus, DE),
        0x12 => load::ld_de_a(cpu, bus),
        0x13 => alu::inc16(cpu, bus, DE),
        0x14 => alu::inc_r(cpu, bus, D),
        0x15 => alu::dec_r(cpu, bus, D),
        0x16 => load::ld_r_imm(cpu, bus, D),
        0x17 => alu::rla(cpu, bus),
        0x18 => control::jr(cpu, bus, None),
        0x19 => alu::add_hl(cpu, bus, DE),
        0x1A => load::ld_a_de(cpu, bus),
        0x1B => alu::dec16(cpu, bus, DE),
        0x1C => alu::inc_r(cpu, bus, E),
        0x1D => alu::dec_r(cpu, bus, E),
        0x1E => load::ld_r_imm(cpu, bus, E),
        0x1F => alu::rra(cpu, bus),
        0x20 => control::jr(cpu, bus, Some(NotZero)),
        0x21 => load::ld_wide_imm(cpu, bus, HL),
        0x22 => load::ld_hli_a(cpu, bus),
        0x23 => alu::inc16(cpu, bus, HL),
        0x24 => alu::inc_r(cpu, bus, H),
        0x25 => alu::dec_r(cpu, bus, H),
        0x26 => load::ld_r_imm(cpu, bus, H),
        0x27 => alu::daa(cpu, bus),
        0x28 => control::jr(cpu, bus, Some(Zero)),
        0x29 => alu::add_hl(cpu, bus, HL),
        0x2A => load::ld_a_hli(cpu, bus),
        0x2B => alu::dec16(cpu, bus, HL),
        0x2C => alu::inc_r(cpu, bus, L),
        0x2D => alu::dec_r(cpu, bus, L),
        0x2E => load::ld_r_imm(cpu, bus, L),
        0x2F => alu::cpl(cpu, bus),
        0x30 => control::jr(cpu, bus, Some(NotCarry)),
        0x31 => load::ld_wide_imm(cpu, bus, SP),
        0x32 => load::ld_hld_a(cpu, bus),
        0x33 => alu::inc16(cpu, bus, SP),
        0x34 => alu::inc_hl_indirect(cpu, bus),
        0x35 => alu::dec_hl_indirect(cpu, bus),
        0x36 => load::ld_hl_imm(cpu, bus),
        0x37 => alu::scf(cpu, bus),
        0x38 => control::jr(cpu, bus, Some(Carry)),
        0x39 => alu::add_hl(cpu, bus, SP),
        0x3A => load::ld_a_hld(cpu, bus),
        0x3B => alu::dec16(cpu, bus, SP),
        0x3C => alu::inc_r(cpu, bus, A),
        0x3D => alu::dec_r(cpu, bus, A),
        0x3E => load::ld_r_imm(cpu, bus, A),
        0x3F => alu::ccf(cpu, bus),
        0x40 => load::ld_r_r(cpu, bus, B, B),
        0x41 => load::ld_r_r(cpu, bus, B, C),
        0x42 => load::ld_r_r(cpu, bus, B, D),
        0x43 => load::ld_r_r(cpu, bus, B, E),
        0x44 => load::ld_r_r(cpu, bus, B, H),
        0x45 => load::ld_r_r(cpu, bus, B, L),
        0x46 => load::ld_r_hl(cpu, bus, B),
        0x47 => load::ld_r_r(cpu, bus, B, A),
        0x48 => load::ld_r_r(cpu, bus, C, B),
        0x49 => load::ld_r_r(cpu, bus, C, C),
        0x4A => load::ld_r_r(cpu, bus, C, D),
        0x4B => load::ld_r_r(cpu, bus, C, E),
        0x4C => load::ld_r_r(cpu, bus, C, H),
        0x4D => load::ld_r_r(cpu, bus, C, L),
        0x4E => load::ld_r_hl(cpu, bus, C),
        0x4F => load::ld_r_r(cpu, bus, C, A),
        0x50 => load::ld_r_r(cpu, bus, D, B),
        0x51 => load::ld_r_r(cpu, bus, D, C),
        0x52 => load::ld_r_r(cpu, bus, D, D),
        0x53 => load::ld_r_r(cpu, bus, D, E),
        0x54 => load::ld_r_r(cpu, bus, D, H),
        0x55 => load::ld_r_r(cpu, bus, D, L),
        0x56 => load::ld_r_hl(cpu, bus, D),
        0x57 => load::ld_r_r(cpu, bus, D, A),
        0x58 => load::ld_r_r(cpu, bus, E, B),
        0x59 => load::ld_r_r(cpu, bus, E, C),
        0x5A => load::ld_r_r(cpu, bus, E, D),
        0x5B => load::ld_r_r(cpu, bus, E, E),
        0x5C => load::ld_r_r(cpu, bus, E, H),
        0x5D => load::ld_r_r(cpu, bus, E, L),
        0x5E => load::ld_r_hl(cpu, bus, E),
        0x5F => load::ld_r_r(cpu, bus, E, A),
        0x60 => load::ld_r_r(cpu, bus, H, B),
        0x61 => load::ld_r_r(cpu, bus, H, C),
        0x62 => load::ld_r_r(cpu, bus, H, D),
        0x63 => load::ld_r_r(cpu, bus, H, E),
        0x64 => load::ld_r_r(cpu, bus, H, H),
        0x65 => load::ld_r_r(cpu, bus, H, L),
        0x66 => load::ld_r_hl(cpu, bus, H),
        0x67 => load::ld_r_r(cpu, bus, H, A),
        0x68 => load::ld_r_r(cpu, bus, L, B),
        0x69 => load::ld_r_r(cpu, bus, L, C),
        0x6A => load::ld_r_r(cpu, bus, L, D),
        0x6B => load::ld_r_r(cpu, bus, L, E),
        0x6C => load::ld_r_r(cpu, bus, L, H),
        0x6D => load::ld_r_r(cpu, bus, L, L),
        0x6E => load::ld_r_hl(cpu, bus, L),
        0x6F => load::ld_r_r(cpu, bus, L, A),
        0x70 => load::ld_hl_r(cpu, bus, B),
        0x71 => load::ld_hl_r(cpu, bus, C),
        0x72 => load::ld_hl_r(cpu, bus, D),
        0x73 => load::ld_hl_r(cpu, bus, E),
        0x74 => load::ld_hl_r(cpu, bus, H),
        0x75 => load::ld_hl_r(cpu, bus, L),
        0x76 => control::halt(cpu, bus),
        0x77 => load::ld_hl_r(cpu, bus, A),
        0x78 => load::ld_r_r(cpu, bus, A, B),
        0x79 => load::ld_r_r(cpu, bus, A, C),
        0x7A => load::ld_r_r(cpu, bus, A, D),
        0x7B => load::ld_r_r(cpu, bus, A, E),
        0x7C => load::ld_r_r(cpu, bus, A, H),
        0x7D => load::ld_r_r(cpu, bus, A, L),
        0x7E => load::ld_r_hl(cpu, bus, A),
        0x7F => load::ld_r_r(cpu, bus, A, A),
        0x80 => alu::add_r(cpu, bus, B),
        0x81 => alu::add_r(cpu, bus, C),
        0x82 => alu::add_r(cpu, bus, D),
        0x83 => alu::add_r(cpu, bus, E),
        0x84 => alu::add_r(cpu, bus, H),
        0x85 => alu::add_r(cpu, bus, L),
        0x86 => alu::add_hl_indirect(cpu, bus),
        0x87 => alu::add_r(cpu, bus, A),
        0x88 => alu::adc_r(cpu, bus, B),
        0x89 => alu::adc_r(cpu, bus, C),
        0x8A => alu::adc_r(cpu, bus, D),
        0x8B => alu::adc_r(cpu, bus, E),
        0x8C => alu::adc_r(cpu, bus, H),
        0x8D => alu::adc_r(cpu, bus, L),
        0x8E => alu::adc_hl_indirect(cpu, bus),
        0x8F => alu::adc_r(cpu, bus, A),
        0x90 => alu::sub_r(cpu, bus, B),
        0x91 => alu::sub_r(cpu, bus, C),
        0x92 => alu::sub_r(cpu, bus, D),
        0x93 => alu::sub_r(cpu, bus, E),
        0x94 => alu::sub_r(cpu, bus, H),
        0x95 => alu::sub_r(cpu, bus, L),
        0x96 => alu::sub_hl_indirect(cpu, bus),
        0x97 => alu::sub_r(cpu, bus, A),
        0x98 => alu::sbc_r(cpu, bus, B),
        0x99 => alu::sbc_r(cpu, bus, C),
        0x9A => alu::sbc_r(cpu, bus, D),
        0x9B => alu::sbc_r(cpu, bus, E),
        0x9C => alu::sbc_r(cpu, bus, H),
        0x9D => alu::sbc_r(cpu, bus, L),
        0x9E => alu::sbc_hl_indirect(cpu, bus),
        0x9F => alu::sbc_r(cpu, bus, A),
        0xA0 => alu::and_r(cpu, bus, B),
        0xA1 => alu::and_r(cpu, bus, C),
        0xA2 => alu::and_r(cpu, bus, D),
        0xA3 => alu::and_r(cpu, bus, E),
        0xA4 => alu::and_r(cpu, bus, H),
        0xA5 => alu::and_r(cpu, bus, L),
        0xA6 => alu::and_hl_indirect(cpu, bus),
        0xA7 => alu::and_r(cpu, bus, A),
        0xA8 => alu::xor_r(cpu, bus, B),
        0xA9 => alu::xor_r(cpu, bus, C),
        0xAA => alu::xor_r(cpu, bus, D),
        0xAB => alu::xor_r(cpu, bus, E),
        0xAC => alu::xor_r(cpu, bus, H),
        0xAD => alu::xor_r(cpu, bus, L),
        0xAE => alu::xor_hl_indirect(cpu, bus),
        0xAF => alu::xor_r(cpu, bus, A),
        0xB0 => alu::or_r(cpu, bus, B),
        0xB1 => alu::or_r(cpu, bus, C),
        0xB2 => alu::or_r(cpu, bus, D),
        0xB3 => alu::or_r(cpu, bus, E),
        0xB4 => alu::or_r(cpu, bus, H),
        0xB5 => alu::or_r(cpu, bus, L),
        0xB6 => alu::or_hl_indirect(cpu, bus),
        0xB7 => alu::or_r(cpu, bus, A),
        0xB8 => alu::cp_r(cpu, bus, B),
        0xB9 => alu::cp_r(cpu, bus, C),
        0xBA => alu::cp_r(cpu, bus, D),
        0xBB => alu::cp_r(cpu, bus, E),
        0xBC => alu::cp_r(cpu, bus, H),
        0xBD => alu::cp_r(cpu, bus, L),
        0xBE => alu::cp_hl_indirect(cpu, bus),
        0xBF => alu::cp_r(cpu, bus, A),
        0xC0 => control::ret_cond(cpu, bus, NotZero),
        0xC1 => load::pop(cpu, bus, StackReg::BC),
        0xC2 => control::jp_cond(cpu, bus, NotZero),
        0xC3 => control::jp(cpu, bus),
        0xC4 => control::call_cond(cpu, bus, NotZero),
        0xC5 => load::push(cpu, bus, StackReg::BC),
        0xC6 => alu::add_imm(cpu, bus),
        0xC7 => control::rst(cpu, bus, 0x00),
        0xC8 => control::ret_cond(cpu, bus, Zero),
        0xC9 => control::ret(cpu, bus),
        0xCA => control::jp_cond(cpu, bus, Zero),
        0xCB => control::prefix(cpu, bus),
        0xCC => control::call_cond(cpu, bus, Zero),
        0xCD => control::call(cpu, bus),
        0xCE => alu::adc_imm(cpu, bus),
        0xCF => control::rst(cpu, bus, 0x08),
        0xD0 => control::ret_cond(cpu, bus, NotCarry),
        0xD1 => load::pop(cpu, bus, StackReg::DE),
        0xD2 => control::jp_cond(cpu, bus, NotCarry),
        0xD4 => control::call_cond(cpu, bus, NotCarry),
        0xD5 => load::push(cpu, bus, StackReg::DE),
        0xD6 => alu::sub_imm(cpu, bus),
        0xD7 => control::rst(cpu, bus, 0x10),
        0xD8 => control::ret_cond(cpu, bus, Carry),
        0xD9 => control::reti(cpu, bus),
        0xDA => control::jp_cond(cpu, bus, Carry),
        0xDC => control::call_cond(cpu, bus, Carry),
        0xDE => alu::sbc_imm(cpu, bus),
        0xDF => control::rst(cpu, bus, 0x18),
        0xE0 => load::ldh_a8_a(cpu, bus),
        0xE1 => load::pop(cpu, bus, StackReg::HL),
        0xE2 => load::ldh_c_a(cpu, bus),
        0xE5 => load::push(cpu, bus, StackReg::HL),
        0xE6 => alu::and_imm(cpu, bus),
        0xE7 => control::rst(cpu, bus, 0x20),
        0xE8 => alu::add_sp_imm(cpu, bus),
        0xE9 => control::jp_hl(cpu, bus),
        0xEA => load::ld_a16_a(cpu, bus),
        0xEE => alu::xor_imm(cpu, bus),
        0xEF => control::rst(cpu, bus, 0x28),
        0xF0 => load::ldh_a_a8(cpu, bus),
        0xF1 => load::pop(cpu, bus, StackReg::AF),
        0xF2 => load::ldh_a_c(cpu, bus),
        0xF3 => control::di(cpu, bus),
        0xF5 => load::push(cpu, bus, StackReg::AF),
        0xF6 => alu::or_imm(cpu, bus),
        0xF7 => control::rst(cpu, bus, 0x30),
        0xF8 => load::ld_hl_sp_imm(cpu, bus),
        0xF9 => load::ld_sp_hl(cpu, bus),
        0xFA => load::ld_a_a16(cpu, bus),
        0xFB => control::ei(cpu, bus),
        0xFE => alu::cp_imm(cpu, bus),
        0xFF => control::rst(cpu, bus, 0x38),
        // 0xD3 0xDB 0xDD 0xE3 0xE4 0xEB 0xEC 0xED 0xF4 0xFC 0xFD:
        // the hardware latches up for good.
        _ => control::lock_up(cpu),
    }
}
