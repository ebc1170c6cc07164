/*!
Load family: 8-bit moves, (HL)/(BC)/(DE) indirects, HL+/-
autoincrement forms, the 0xFF00-page LDH accesses, 16-bit immediate
loads, stack pushes/pops, and the SP plumbing (LD (a16),SP / LD SP,HL /
LD HL,SP+r8).

Every handler is entered once per M-cycle with `cpu.m_cycle` starting at
2 (cycle 1 was the overlapped opcode fetch) and finishes by fetching the
next opcode. The HL+/- forms and stack accesses run the 16-bit address
through the OAM corruption hook, which is what the DMG OAM-bug ROMs
measure.
*/

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::ppu::oam_bug::CorruptionKind;

use super::{Reg8, StackReg, Wide};

pub(crate) fn ld_r_r(cpu: &mut Cpu, bus: &mut Bus, dst: Reg8, src: Reg8) -> bool {
    let value = src.get(&cpu.regs);
    dst.set(&mut cpu.regs, value);
    cpu.finish(bus)
}

pub(crate) fn ld_r_imm(cpu: &mut Cpu, bus: &mut Bus, dst: Reg8) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = cpu.read_pc_byte(bus);
            false
        }
        _ => {
            dst.set(&mut cpu.regs, cpu.byte);
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ld_r_hl(cpu: &mut Cpu, bus: &mut Bus, dst: Reg8) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = bus.read_byte(cpu.regs.hl());
            false
        }
        _ => {
            dst.set(&mut cpu.regs, cpu.byte);
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ld_hl_r(cpu: &mut Cpu, bus: &mut Bus, src: Reg8) -> bool {
    match cpu.m_cycle {
        2 => {
            bus.write_byte(cpu.regs.hl(), src.get(&cpu.regs));
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_hl_imm(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = cpu.read_pc_byte(bus);
            false
        }
        3 => {
            bus.write_byte(cpu.regs.hl(), cpu.byte);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_a_bc(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = bus.read_byte(cpu.regs.bc());
            false
        }
        _ => {
            cpu.regs.a = cpu.byte;
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ld_a_de(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = bus.read_byte(cpu.regs.de());
            false
        }
        _ => {
            cpu.regs.a = cpu.byte;
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ld_bc_a(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            bus.write_byte(cpu.regs.bc(), cpu.regs.a);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_de_a(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            bus.write_byte(cpu.regs.de(), cpu.regs.a);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_a_hli(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            let hl = cpu.regs.hl();
            cpu.byte = bus.read_byte(hl);
            bus.oam_corruption(hl, CorruptionKind::ReadWrite);
            cpu.regs.set_hl(hl.wrapping_add(1));
            false
        }
        _ => {
            cpu.regs.a = cpu.byte;
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ld_a_hld(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            let hl = cpu.regs.hl();
            cpu.byte = bus.read_byte(hl);
            bus.oam_corruption(hl, CorruptionKind::ReadWrite);
            cpu.regs.set_hl(hl.wrapping_sub(1));
            false
        }
        _ => {
            cpu.regs.a = cpu.byte;
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ld_hli_a(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            let hl = cpu.regs.hl();
            bus.oam_corruption(hl, CorruptionKind::Write);
            bus.write_byte(hl, cpu.regs.a);
            cpu.regs.set_hl(hl.wrapping_add(1));
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_hld_a(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            let hl = cpu.regs.hl();
            bus.oam_corruption(hl, CorruptionKind::Write);
            bus.write_byte(hl, cpu.regs.a);
            cpu.regs.set_hl(hl.wrapping_sub(1));
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_a_a16(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = cpu.read_pc_byte(bus) as u16;
            false
        }
        3 => {
            cpu.word |= (cpu.read_pc_byte(bus) as u16) << 8;
            false
        }
        4 => {
            cpu.regs.a = bus.read_byte(cpu.word);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_a16_a(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = cpu.read_pc_byte(bus) as u16;
            false
        }
        3 => {
            cpu.word |= (cpu.read_pc_byte(bus) as u16) << 8;
            false
        }
        4 => {
            bus.write_byte(cpu.word, cpu.regs.a);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ldh_a_a8(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = cpu.read_pc_byte(bus);
            false
        }
        3 => {
            cpu.byte = bus.read_byte(0xFF00 | cpu.byte as u16);
            false
        }
        _ => {
            cpu.regs.a = cpu.byte;
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ldh_a8_a(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = cpu.read_pc_byte(bus);
            false
        }
        3 => {
            bus.write_byte(0xFF00 | cpu.byte as u16, cpu.regs.a);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ldh_a_c(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = bus.read_byte(0xFF00 | cpu.regs.c as u16);
            false
        }
        _ => {
            cpu.regs.a = cpu.byte;
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ldh_c_a(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            bus.write_byte(0xFF00 | cpu.regs.c as u16, cpu.regs.a);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_wide_imm(cpu: &mut Cpu, bus: &mut Bus, dst: Wide) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = cpu.read_pc_byte(bus) as u16;
            false
        }
        3 => {
            cpu.word |= (cpu.read_pc_byte(bus) as u16) << 8;
            false
        }
        _ => {
            dst.set(cpu, cpu.word);
            cpu.finish(bus)
        }
    }
}

pub(crate) fn ld_a16_sp(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = cpu.read_pc_byte(bus) as u16;
            false
        }
        3 => {
            cpu.word |= (cpu.read_pc_byte(bus) as u16) << 8;
            false
        }
        4 => {
            bus.write_byte(cpu.word, cpu.sp as u8);
            cpu.word = cpu.word.wrapping_add(1);
            false
        }
        5 => {
            bus.write_byte(cpu.word, (cpu.sp >> 8) as u8);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ld_sp_hl(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.sp = cpu.regs.hl();
            false
        }
        _ => cpu.finish(bus),
    }
}

/// Flags come from the unsigned low-byte addition; Z and N are zero.
pub(crate) fn ld_hl_sp_imm(cpu: &mut Cpu, bus: &mut Bus) -> bool {
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
        _ => {
            cpu.regs.set_hl(cpu.sp.wrapping_add(cpu.word));
            cpu.finish(bus)
        }
    }
}

pub(crate) fn push(cpu: &mut Cpu, bus: &mut Bus, src: StackReg) -> bool {
    match cpu.m_cycle {
        2 => {
            bus.oam_corruption(cpu.sp, CorruptionKind::Write);
            cpu.sp = cpu.sp.wrapping_sub(1);
            false
        }
        3 => {
            bus.oam_corruption(cpu.sp, CorruptionKind::Write);
            cpu.word = match src {
                StackReg::BC => cpu.regs.bc(),
                StackReg::DE => cpu.regs.de(),
                StackReg::HL => cpu.regs.hl(),
                StackReg::AF => cpu.regs.af(),
            };
            bus.write_byte(cpu.sp, (cpu.word >> 8) as u8);
            cpu.sp = cpu.sp.wrapping_sub(1);
            false
        }
        4 => {
            bus.oam_corruption(cpu.sp, CorruptionKind::Write);
            bus.write_byte(cpu.sp, cpu.word as u8);
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn pop(cpu: &mut Cpu, bus: &mut Bus, dst: StackReg) -> bool {
    match cpu.m_cycle {
        2 => {
            bus.oam_corruption(cpu.sp, CorruptionKind::ReadWrite);
            cpu.word = bus.read_byte(cpu.sp) as u16;
            cpu.sp = cpu.sp.wrapping_add(1);
            false
        }
        3 => {
            bus.oam_corruption(cpu.sp, CorruptionKind::Read);
            cpu.word |= (bus.read_byte(cpu.sp) as u16) << 8;
            cpu.sp = cpu.sp.wrapping_add(1);
            false
        }
        _ => {
            match dst {
                StackReg::BC => cpu.regs.set_bc(cpu.word),
                StackReg::DE => cpu.regs.set_de(cpu.word),
                StackReg::HL => cpu.regs.set_hl(cpu.word),
                // The flag register has no low nibble to write.
                StackReg::AF => cpu.regs.set_af(cpu.word & 0xFFF0),
            }
            cpu.finish(bus)
        }
    }
}
