/*!
cpu - SM83 core driven at M-cycle granularity.

Every instruction is a sequence of 1-6 M-cycles; the engine keeps a
1-based M-cycle index and re-enters the current opcode's handler once per
M-cycle until it reports completion. A handler's final M-cycle also
performs the opcode fetch for the *next* instruction (the fetch/execute
overlap), so `pc` always sits one byte past the prefetched opcode at an
instruction boundary.

Boundaries are where everything interesting happens:
- the halt bug rewinds `pc` so one opcode byte runs twice;
- EI's one-instruction delay is consumed;
- pending interrupts (IME set) divert into a 5-M-cycle dispatch: two
  idle cycles, PC-high push, PC-low push, and the vector jump whose final
  M-cycle performs the overlapped fetch.

The undocumented opcodes hard-lock the CPU: `locked_up` goes sticky and
no further micro-ops execute, while the rest of the machine keeps
ticking.

Submodules: `regs` (register file), `dispatch` (opcode handlers split by
family).
*/

pub(crate) mod dispatch;
pub mod regs;
#[cfg(test)]
mod tests;

use crate::bus::Bus;
use crate::error::Result;
use crate::interrupts::Interrupt;
use crate::state::{StateReader, StateWriter};
use regs::Registers;

pub struct Cpu {
    pub regs: Registers,
    pub pc: u16,
    pub sp: u16,

    /// Opcode currently executing.
    pub opcode: u8,
    /// Executing from the 0xCB table.
    pub prefixed: bool,
    /// 1-based M-cycle index inside the current instruction; handlers
    /// are first entered at 2 (cycle 1 was the overlapped fetch).
    pub m_cycle: u8,
    /// Opcode fetched during the current instruction's final M-cycle.
    next_opcode: u8,
    /// The completed instruction was the 0xCB prefix.
    prefix_pending: bool,

    pub halted: bool,
    pub halt_bug: bool,
    pub stopped: bool,
    pub locked_up: bool,

    // Scratch operand latches shared by the micro-op handlers.
    pub(crate) word: u16,
    pub(crate) byte: u8,
    pub(crate) condition: bool,

    /// 0 = executing normally; 1-5 = interrupt dispatch micro-state.
    dispatch_cycle: u8,
    dispatch_vector: u16,

    pub master_cycles: u64,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            regs: Registers::default(),
            pc: 0,
            sp: 0,
            opcode: 0,
            prefixed: false,
            m_cycle: 1,
            next_opcode: 0,
            prefix_pending: false,
            halted: false,
            halt_bug: false,
            stopped: false,
            locked_up: false,
            word: 0,
            byte: 0,
            condition: false,
            dispatch_cycle: 0,
            dispatch_vector: 0,
            master_cycles: 0,
        }
    }

    /// Post-boot state for a machine started without a boot ROM. The
    /// first opcode is prefetched so the pipeline invariant holds.
    pub fn reset_post_boot(&mut self, bus: &Bus, cgb: bool) {
        self.regs.set_startup_values(cgb);
        self.sp = 0xFFFE;
        self.pc = 0x0100;
        self.opcode = bus.read_byte(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.m_cycle = 1;
    }

    /// Boot ROM entry: execution starts cold at 0x0000.
    pub fn reset_boot_rom(&mut self, bus: &Bus) {
        self.pc = 0x0000;
        self.sp = 0x0000;
        self.opcode = bus.read_byte(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.m_cycle = 1;
    }

    /// Advance one M-cycle.
    pub fn step_m_cycle(&mut self, bus: &mut Bus) {
        self.master_cycles += 1;

        if self.locked_up {
            return;
        }
        if self.stopped {
            // STOP ends on any pressed key.
            if bus.joypad.any_pressed() {
                self.stopped = false;
            }
            return;
        }
        if self.halted {
            if bus.interrupts.pending() == 0 {
                return;
            }
            self.halted = false;
            if bus.interrupts.ime {
                self.begin_interrupt_dispatch();
            }
            return;
        }
        if self.dispatch_cycle > 0 {
            self.step_interrupt_dispatch(bus);
            return;
        }

        self.m_cycle += 1;
        if dispatch::execute(self, bus) {
            self.instruction_boundary(bus);
        }
    }

    fn instruction_boundary(&mut self, bus: &mut Bus) {
        self.m_cycle = 1;
        if self.prefix_pending {
            // CB opcodes are atomic with their prefix; no interrupt
            // sampling in between.
            self.prefix_pending = false;
            self.opcode = self.next_opcode;
            self.prefixed = true;
            return;
        }
        self.prefixed = false;

        if self.halt_bug {
            // The fetch that just happened failed to increment PC.
            self.pc = self.pc.wrapping_sub(1);
            self.halt_bug = false;
        }

        if bus.interrupts.ei_delay {
            bus.interrupts.ei_delay = false;
        } else if bus.interrupts.ime && bus.interrupts.pending() != 0 {
            self.begin_interrupt_dispatch();
            return;
        }

        self.opcode = self.next_opcode;
    }

    fn begin_interrupt_dispatch(&mut self) {
        self.dispatch_cycle = 1;
    }

    /// Five M-cycles: idle, idle, push PCH, push PCL, vector + fetch.
    fn step_interrupt_dispatch(&mut self, bus: &mut Bus) {
        match self.dispatch_cycle {
            1 => {
                // Un-do the prefetch: the pushed address must point at
                // the instruction that never got to run.
                self.pc = self.pc.wrapping_sub(1);
                let bit = bus
                    .interrupts
                    .take_pending()
                    .expect("dispatch started without a pending interrupt");
                self.dispatch_vector = Interrupt::vector(bit);
            }
            2 => {
                self.sp = self.sp.wrapping_sub(1);
            }
            3 => {
                bus.write_byte(self.sp, (self.pc >> 8) as u8);
                self.sp = self.sp.wrapping_sub(1);
            }
            4 => {
                bus.write_byte(self.sp, self.pc as u8);
            }
            5 => {
                self.pc = self.dispatch_vector;
                self.opcode = bus.read_byte(self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.dispatch_cycle = 0;
                self.m_cycle = 1;
                return;
            }
            _ => unreachable!("interrupt dispatch cycle out of range"),
        }
        self.dispatch_cycle += 1;
    }

    // -----------------------------
    // Helpers shared by the opcode handlers
    // -----------------------------

    /// Final M-cycle of every instruction: overlapped fetch of the next
    /// opcode.
    #[inline]
    pub(crate) fn finish(&mut self, bus: &mut Bus) -> bool {
        self.next_opcode = bus.read_byte(self.pc);
        self.pc = self.pc.wrapping_add(1);
        true
    }

    #[inline]
    pub(crate) fn read_pc_byte(&mut self, bus: &mut Bus) -> u8 {
        let value = bus.read_byte(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    pub(crate) fn mark_prefix(&mut self) {
        self.prefix_pending = true;
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        self.regs.save_state(w);
        w.put_u16(self.pc);
        w.put_u16(self.sp);
        w.put_u8(self.opcode);
        w.put_bool(self.prefixed);
        w.put_u8(self.m_cycle);
        w.put_u8(self.next_opcode);
        w.put_bool(self.prefix_pending);
        w.put_bool(self.halted);
        w.put_bool(self.halt_bug);
        w.put_bool(self.stopped);
        w.put_bool(self.locked_up);
        w.put_u16(self.word);
        w.put_u8(self.byte);
        w.put_bool(self.condition);
        w.put_u8(self.dispatch_cycle);
        w.put_u16(self.dispatch_vector);
        w.put_u64(self.master_cycles);
    }

    pub(crate) fn load_state(&mut self, r: &mut StateReader) -> Result<()> {
        self.regs.load_state(r)?;
        self.pc = r.get_u16()?;
        self.sp = r.get_u16()?;
        self.opcode = r.get_u8()?;
        self.prefixed = r.get_bool()?;
        self.m_cycle = r.get_u8()?;
        self.next_opcode = r.get_u8()?;
        self.prefix_pending = r.get_bool()?;
        self.halted = r.get_bool()?;
        self.halt_bug = r.get_bool()?;
        self.stopped = r.get_bool()?;
        self.locked_up = r.get_bool()?;
        self.word = r.get_u16()?;
        self.byte = r.get_u8()?;
        self.condition = r.get_bool()?;
        self.dispatch_cycle = r.get_u8()?;
        self.dispatch_vector = r.get_u16()?;
        self.master_cycles = r.get_u64()?;
        Ok(())
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}
