/*!
The 0xCB opcode page: rotates/shifts/SWAP/SRL over the eight targets,
plus BIT/RES/SET for each bit index.

The encoding is fully regular - bits 7-6 select the family, bits 5-3 the
shift kind or bit index, bits 2-0 the target - so decode happens
structurally instead of through a 256-arm table. Register forms run in
the single overlapped cycle; (HL) forms add a read and (for
read-modify-write) a write cycle.
*/

use crate::bus::Bus;
use crate::cpu::Cpu;

use super::Reg8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Register(Reg8),
    HlIndirect,
}

fn target_of(opcode: u8) -> Target {
    match opcode & 0x07 {
        0 => Target::Register(Reg8::B),
        1 => Target::Register(Reg8::C),
        2 => Target::Register(Reg8::D),
        3 => Target::Register(Reg8::E),
        4 => Target::Register(Reg8::H),
        5 => Target::Register(Reg8::L),
        6 => Target::HlIndirect,
        _ => Target::Register(Reg8::A),
    }
}

/// Apply a shift/rotate kind (bits 5-3 of the opcode) to a value.
fn shift_op(cpu: &mut Cpu, kind: u8, value: u8) -> u8 {
    let carry_in = cpu.regs.flag_c() as u8;
    let (result, carry_out) = match kind {
        0 => (value << 1 | value >> 7, value & 0x80 != 0), // RLC
        1 => (value >> 1 | value << 7, value & 0x01 != 0), // RRC
        2 => (value << 1 | carry_in, value & 0x80 != 0),   // RL
        3 => (value >> 1 | carry_in << 7, value & 0x01 != 0), // RR
        4 => (value << 1, value & 0x80 != 0),              // SLA
        5 => ((value >> 1) | (value & 0x80), value & 0x01 != 0), // SRA
        6 => (value << 4 | value >> 4, false),             // SWAP
        _ => (value >> 1, value & 0x01 != 0),              // SRL
    };
    cpu.regs.f = 0;
    cpu.regs.set_z(result == 0);
    cpu.regs.set_c(carry_out);
    result
}

pub(crate) fn execute(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    let opcode = cpu.opcode;
    let family = opcode >> 6;
    let index = (opcode >> 3) & 0x07;

    match (family, target_of(opcode)) {
        // Shifts and rotates
        (0, Target::Register(reg)) => {
            let value = reg.get(&cpu.regs);
            let result = shift_op(cpu, index, value);
            reg.set(&mut cpu.regs, result);
            cpu.finish(bus)
        }
        (0, Target::HlIndirect) => match cpu.m_cycle {
            2 => {
                cpu.byte = bus.read_byte(cpu.regs.hl());
                false
            }
            3 => {
                let value = cpu.byte;
                let result = shift_op(cpu, index, value);
                bus.write_byte(cpu.regs.hl(), result);
                false
            }
            _ => cpu.finish(bus),
        },

        // BIT: Z from the complement of the tested bit, C untouched.
        (1, Target::Register(reg)) => {
            let value = reg.get(&cpu.regs);
            cpu.regs.set_z(value & (1 << index) == 0);
            cpu.regs.set_n(false);
            cpu.regs.set_h(true);
            cpu.finish(bus)
        }
        (1, Target::HlIndirect) => match cpu.m_cycle {
            2 => {
                cpu.byte = bus.read_byte(cpu.regs.hl());
                false
            }
            _ => {
                cpu.regs.set_z(cpu.byte & (1 << index) == 0);
                cpu.regs.set_n(false);
                cpu.regs.set_h(true);
                cpu.finish(bus)
            }
        },

        // RES / SET: no flags.
        (_, Target::Register(reg)) => {
            let value = reg.get(&cpu.regs);
            let result = if family == 2 { value & !(1 << index) } else { value | 1 << index };
            reg.set(&mut cpu.regs, result);
            cpu.finish(bus)
        }
        (_, Target::HlIndirect) => match cpu.m_cycle {
            2 => {
                cpu.byte = bus.read_byte(cpu.regs.hl());
                false
            }
            3 => {
                let result = if family == 2 {
                    cpu.byte & !(1 << index)
                } else {
                    cpu.byte | 1 << index
                };
                bus.write_byte(cpu.regs.hl(), result);
                false
            }
            _ => cpu.finish(bus),
        },
    }
}
