/*!
OAM DMA engine (0xFF46).

Writing the register latches the source page and arms the transfer. For
one M-cycle of startup OAM stays accessible; after that the engine copies
one byte per M-cycle for 160 bytes while the bus answers all external OAM
accesses with 0xFF. Writing 0xFF46 again mid-transfer schedules a restart
from the new page after a fresh startup window; a write that lands inside
the startup window of the previous transfer replaces the source
immediately.
*/

use crate::bus::Bus;
use crate::error::Result;
use crate::state::{StateReader, StateWriter};

/// Startup length in M-cycles.
const STARTUP_CYCLES: u16 = 1;
const TOTAL_BYTES: u8 = 0xA0;

#[derive(Debug, Default)]
pub struct OamDma {
    pub written_value: u8,
    start_address: u16,
    current_byte: u8,
    tick_counter: u8,
    ticks: u16,
    active: bool,
    complete: bool,
    restart_pending: bool,
    pending_start: u16,
    restart_countdown: u16,
}

impl OamDma {
    pub fn set(&mut self, value: u8) {
        self.written_value = value;
        let new_source = (value as u16) << 8;
        if self.active && self.ticks >= STARTUP_CYCLES {
            // Past the setup window: schedule a restart.
            self.restart_pending = true;
            self.pending_start = new_source;
            self.restart_countdown = STARTUP_CYCLES + 1;
        } else {
            self.active = true;
            self.start_address = new_source;
            self.current_byte = 0;
            self.ticks = 0;
        }
    }

    /// OAM is locked away from the CPU once the startup window elapsed.
    #[inline]
    pub fn blocks_oam(&self) -> bool {
        self.active && self.ticks > STARTUP_CYCLES
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.put_u8(self.written_value);
        w.put_u16(self.start_address);
        w.put_u8(self.current_byte);
        w.put_u8(self.tick_counter);
        w.put_u16(self.ticks);
        w.put_bool(self.active);
        w.put_bool(self.complete);
        w.put_bool(self.restart_pending);
        w.put_u16(self.pending_start);
        w.put_u16(self.restart_countdown);
    }

    pub(crate) fn load_state(&mut self, r: &mut StateReader) -> Result<()> {
        self.written_value = r.get_u8()?;
        self.start_address = r.get_u16()?;
        self.current_byte = r.get_u8()?;
        self.tick_counter = r.get_u8()?;
        self.ticks = r.get_u16()?;
        self.active = r.get_bool()?;
        self.complete = r.get_bool()?;
        self.restart_pending = r.get_bool()?;
        self.pending_start = r.get_u16()?;
        self.restart_countdown = r.get_u16()?;
        Ok(())
    }
}

impl Bus {
    /// One T-cycle of the DMA engine; byte transfers land every 4th.
    pub(crate) fn tick_dma(&mut self) {
        self.dma.tick_counter += 1;
        if self.dma.tick_counter % 4 != 0 {
            return;
        }
        self.dma.tick_counter = 0;

        if self.dma.complete {
            self.dma.active = false;
            self.dma.complete = false;
            self.dma.ticks = 0;
            self.dma.current_byte = 0;
        }
        if !self.dma.active {
            return;
        }
        if self.dma.restart_pending {
            self.dma.restart_countdown -= 1;
            if self.dma.restart_countdown == 0 {
                self.dma.restart_pending = false;
                self.dma.start_address = self.dma.pending_start;
                self.dma.current_byte = 0;
                self.dma.ticks = 1;
            }
        }

        self.dma.ticks += 1;
        if self.dma.ticks <= STARTUP_CYCLES {
            return;
        }

        let index = self.dma.current_byte;
        let value = self.read_dma_source(self.dma.start_address.wrapping_add(index as u16));
        self.ppu.oam[index as usize] = value;
        self.dma.current_byte += 1;
        if self.dma.current_byte == TOTAL_BYTES {
            self.dma.complete = true;
        }
    }

    /// DMA source reads bypass the mode lockout the CPU sees.
    fn read_dma_source(&self, address: u16) -> u8 {
        match address >> 8 {
            0x00..=0x7F => self.cartridge.read(address),
            0x80..=0x9F => self.ppu.read_vram(address),
            0xA0..=0xBF => self.cartridge.read(address),
            _ => {
                // 0xC0-0xFF all mirror work RAM for DMA purposes.
                let offset = (address as usize - 0xC000) & 0x1FFF;
                self.read_wram_offset(offset)
            }
        }
    }
}
