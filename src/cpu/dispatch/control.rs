/*!
Control flow: jumps, calls, returns, RST, and the machine-state opcodes
(HALT, STOP, EI/DI, the CB prefix, and the lock-up codes).

Conditional forms evaluate their condition on the documented M-cycle and
either continue into the taken path or finish early with the overlapped
fetch. RET's final jump overlays the fetch cycle, CALL pushes through
the same stack choreography as PUSH.
*/

use log::warn;

use crate::bus::Bus;
use crate::cpu::Cpu;

use super::Cond;

pub(crate) fn nop(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    cpu.finish(bus)
}

pub(crate) fn jr(cpu: &mut Cpu, bus: &mut Bus, cond: Option<Cond>) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.byte = cpu.read_pc_byte(bus);
            cpu.condition = cond.map(|c| c.holds(&cpu.regs)).unwrap_or(true);
            false
        }
        3 => {
            if cpu.condition {
                cpu.pc = cpu.pc.wrapping_add(cpu.byte as i8 as i16 as u16);
                return false;
            }
            cpu.finish(bus)
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn jp(cpu: &mut Cpu, bus: &mut Bus) -> bool {
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
            cpu.pc = cpu.word;
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn jp_cond(cpu: &mut Cpu, bus: &mut Bus, cond: Cond) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = cpu.read_pc_byte(bus) as u16;
            false
        }
        3 => {
            cpu.word |= (cpu.read_pc_byte(bus) as u16) << 8;
            cpu.condition = cond.holds(&cpu.regs);
            false
        }
        4 => {
            if cpu.condition {
                cpu.pc = cpu.word;
                return false;
            }
            cpu.finish(bus)
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn jp_hl(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    cpu.pc = cpu.regs.hl();
    cpu.finish(bus)
}

pub(crate) fn call(cpu: &mut Cpu, bus: &mut Bus) -> bool {
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
            cpu.sp = cpu.sp.wrapping_sub(1);
            false
        }
        5 => {
            bus.write_byte(cpu.sp, (cpu.pc >> 8) as u8);
            cpu.sp = cpu.sp.wrapping_sub(1);
            false
        }
        6 => {
            bus.write_byte(cpu.sp, cpu.pc as u8);
            cpu.pc = cpu.word;
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn call_cond(cpu: &mut Cpu, bus: &mut Bus, cond: Cond) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = cpu.read_pc_byte(bus) as u16;
            false
        }
        3 => {
            cpu.word |= (cpu.read_pc_byte(bus) as u16) << 8;
            cpu.condition = cond.holds(&cpu.regs);
            false
        }
        4 => {
            if cpu.condition {
                cpu.sp = cpu.sp.wrapping_sub(1);
                return false;
            }
            cpu.finish(bus)
        }
        5 => {
            bus.write_byte(cpu.sp, (cpu.pc >> 8) as u8);
            cpu.sp = cpu.sp.wrapping_sub(1);
            false
        }
        6 => {
            bus.write_byte(cpu.sp, cpu.pc as u8);
            cpu.pc = cpu.word;
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ret(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = bus.read_byte(cpu.sp) as u16;
            cpu.sp = cpu.sp.wrapping_add(1);
            false
        }
        3 => {
            cpu.word |= (bus.read_byte(cpu.sp) as u16) << 8;
            cpu.sp = cpu.sp.wrapping_add(1);
            false
        }
        4 => {
            cpu.pc = cpu.word;
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn ret_cond(cpu: &mut Cpu, bus: &mut Bus, cond: Cond) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.condition = cond.holds(&cpu.regs);
            false
        }
        3 => {
            if cpu.condition {
                cpu.word = bus.read_byte(cpu.sp) as u16;
                cpu.sp = cpu.sp.wrapping_add(1);
                return false;
            }
            cpu.finish(bus)
        }
        4 => {
            cpu.word |= (bus.read_byte(cpu.sp) as u16) << 8;
            cpu.sp = cpu.sp.wrapping_add(1);
            false
        }
        5 => {
            cpu.pc = cpu.word;
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn reti(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.word = bus.read_byte(cpu.sp) as u16;
            cpu.sp = cpu.sp.wrapping_add(1);
            false
        }
        3 => {
            cpu.word |= (bus.read_byte(cpu.sp) as u16) << 8;
            cpu.sp = cpu.sp.wrapping_add(1);
            false
        }
        4 => {
            cpu.pc = cpu.word;
            // Unlike EI there is no one-instruction delay here.
            bus.interrupts.ime = true;
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn rst(cpu: &mut Cpu, bus: &mut Bus, vector: u16) -> bool {
    match cpu.m_cycle {
        2 => {
            cpu.sp = cpu.sp.wrapping_sub(1);
            false
        }
        3 => {
            bus.write_byte(cpu.sp, (cpu.pc >> 8) as u8);
            cpu.sp = cpu.sp.wrapping_sub(1);
            false
        }
        4 => {
            bus.write_byte(cpu.sp, cpu.pc as u8);
            cpu.pc = vector;
            false
        }
        _ => cpu.finish(bus),
    }
}

pub(crate) fn di(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    bus.interrupts.ime = false;
    bus.interrupts.ei_delay = false;
    cpu.finish(bus)
}

pub(crate) fn ei(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    if !bus.interrupts.ime {
        bus.interrupts.ime = true;
        bus.interrupts.ei_delay = true;
    }
    cpu.finish(bus)
}

pub(crate) fn halt(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    if !bus.interrupts.ime && bus.interrupts.pending() != 0 {
        // Halt bug: the fetch below will not stick; the next opcode byte
        // executes twice.
        cpu.halt_bug = true;
    } else {
        cpu.halted = true;
    }
    cpu.finish(bus)
}

pub(crate) fn stop(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    let switching = bus.cgb && bus.speed_armed;
    bus.timer.reset_div();
    if switching {
        bus.change_speed();
        // The clocks pause while the oscillator settles.
        bus.cpu_stall += 2050 * 4;
    } else {
        cpu.stopped = true;
    }
    cpu.finish(bus)
}

pub(crate) fn prefix(cpu: &mut Cpu, bus: &mut Bus) -> bool {
    cpu.finish(bus);
    cpu.mark_prefix();
    true
}

/// Undocumented opcode: the CPU wedges permanently.
pub(crate) fn lock_up(cpu: &mut Cpu) -> bool {
    warn!("undocumented opcode {:#04x} at {:#06x}: CPU locked up", cpu.opcode, cpu.pc.wrapping_sub(1));
    cpu.locked_up = true;
    false
}
