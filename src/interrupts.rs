/*!
Interrupt controller: IF (0xFF0F), IE (0xFFFF), and the master enable.

Two timing details live here rather than in the CPU:
- PPU-originated requests (VBlank, STAT) land in IF only after a 4-T-cycle
  delay; `tick` drains that delay once per T-cycle.
- EI takes effect one instruction late; the CPU consults `ei_delay` at
  instruction boundaries.

IF reads have the upper three bits set; IE reads back whatever was
written.
*/

use crate::error::Result;
use crate::state::{StateReader, StateWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Interrupt {
    #[inline]
    pub fn mask(self) -> u8 {
        1 << self as u8
    }

    /// Vector for the lowest-numbered pending source.
    #[inline]
    pub fn vector(bit: u8) -> u16 {
        0x0040 + 8 * bit as u16
    }
}

#[derive(Debug, Default)]
pub struct Interrupts {
    pub enable: u8,
    pub flag: u8,
    pub ime: bool,
    /// Set by EI; cleared at the first instruction boundary, which is the
    /// one boundary EI must not dispatch on.
    pub ei_delay: bool,
    flag_delayed: u8,
    set_delay: u8,
}

impl Interrupts {
    pub fn new() -> Self {
        Interrupts { flag: 0xE1, ..Default::default() }
    }

    /// Request an interrupt. `delayed` postpones the IF update by 4
    /// T-cycles (PPU events only). Requests landing inside an open
    /// window accumulate; VBlank and STAT can rise on the same dot.
    pub fn request(&mut self, int: Interrupt, delayed: bool) {
        if delayed {
            self.set_delay = 4;
            self.flag_delayed |= int.mask();
        } else {
            self.flag |= int.mask();
        }
    }

    /// Drain the delayed-set window; called once per T-cycle.
    pub fn tick(&mut self) {
        if self.set_delay > 0 {
            self.set_delay -= 1;
            if self.set_delay == 0 {
                self.flag |= self.flag_delayed;
                self.flag_delayed = 0;
            }
        }
    }

    #[inline]
    pub fn pending(&self) -> u8 {
        self.enable & self.flag & 0x1F
    }

    /// Lowest-numbered pending bit, acknowledged (cleared from IF) along
    /// with IME as part of dispatch.
    pub fn take_pending(&mut self) -> Option<u8> {
        let pending = self.pending();
        if pending == 0 {
            return None;
        }
        let bit = pending.trailing_zeros() as u8;
        self.flag &= !(1 << bit);
        self.ime = false;
        Some(bit)
    }

    pub fn read_flag(&self) -> u8 {
        self.flag | 0xE0
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.put_u8(self.enable);
        w.put_u8(self.flag);
        w.put_bool(self.ime);
        w.put_bool(self.ei_delay);
        w.put_u8(self.flag_delayed);
        w.put_u8(self.set_delay);
    }

    pub(crate) fn load_state(&mut self, r: &mut StateReader) -> Result<()> {
        self.enable = r.get_u8()?;
        self.flag = r.get_u8()?;
        self.ime = r.get_bool()?;
        self.ei_delay = r.get_bool()?;
        self.flag_delayed = r.get_u8()?;
        self.set_delay = r.get_u8()?;
        Ok(())
    }
}
