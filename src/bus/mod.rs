/*!
Bus: the address decoder gluing CPU, PPU, APU, timer, serial, joypad,
cartridge, and the DMA engines together.

Address map:
- 0x0000-0x7FFF: cartridge ROM (boot ROM overlay while 0xFF50 unwritten;
  the CGB overlay skips 0x0100-0x01FF where the cartridge header lives)
- 0x8000-0x9FFF: VRAM (reads 0xFF / writes dropped during mode 3)
- 0xA000-0xBFFF: cartridge RAM / RTC window
- 0xC000-0xDFFF: WRAM (bank 1-7 switchable at 0xD000 on CGB)
- 0xE000-0xFDFF: echo of WRAM
- 0xFE00-0xFE9F: OAM (locked during modes 2-3 and while OAM DMA runs)
- 0xFEA0-0xFEFF: unusable, reads 0xFF
- 0xFF00-0xFF7F: peripheral registers, routed per address below
- 0xFF80-0xFFFE: HRAM; 0xFFFF: IE

The bus also owns the per-T-cycle tick fan-out: the timer (whose events
feed the timer interrupt and the APU frame sequencer), OAM DMA, serial,
the joypad interrupt edge, and - at the dot-clock rate, which is every
other cycle in double speed - the delayed interrupt window, PPU, APU and
cartridge RTC. CPU stall debt from GDMA/HDMA blocks and the speed-switch
pause accumulates in `cpu_stall` for the sequencer.
*/

pub(crate) mod dma;
pub(crate) mod hdma;
#[cfg(test)]
mod tests;

use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::error::Result;
use crate::interrupts::{Interrupt, Interrupts};
use crate::joypad::Joypad;
use crate::ppu::oam_bug::CorruptionKind;
use crate::ppu::Ppu;
use crate::serial::Serial;
use crate::state::{StateReader, StateWriter};
use crate::timer::Timer;
use dma::OamDma;
use hdma::Hdma;

pub struct Bus {
    pub cartridge: Cartridge,
    pub ppu: Ppu,
    pub apu: Apu,
    pub timer: Timer,
    pub serial: Serial,
    pub joypad: Joypad,
    pub interrupts: Interrupts,
    pub(crate) dma: OamDma,
    pub(crate) hdma: Hdma,

    wram: Box<[u8; 0x8000]>,
    wram_bank: u8,
    hram: [u8; 0x7F],

    boot_rom: Option<Vec<u8>>,
    boot_rom_enabled: bool,

    pub cgb: bool,
    pub double_speed: bool,
    pub speed_armed: bool,
    /// T-cycles the CPU still owes to a blocking transfer or the speed
    /// switch pause.
    pub(crate) cpu_stall: u32,
    dot_phase: bool,
}

impl Bus {
    pub fn new(cartridge: Cartridge, cgb: bool, sample_rate: u32, boot_rom: Option<Vec<u8>>) -> Self {
        let mut apu = Apu::new(sample_rate);
        apu.set_dmg(!cgb);
        Bus {
            cartridge,
            ppu: Ppu::new(cgb),
            apu,
            timer: Timer::new(),
            serial: Serial::new(),
            joypad: Joypad::new(),
            interrupts: Interrupts::new(),
            dma: OamDma::default(),
            hdma: Hdma::default(),
            wram: Box::new([0; 0x8000]),
            wram_bank: 1,
            hram: [0; 0x7F],
            boot_rom_enabled: boot_rom.is_some(),
            boot_rom,
            cgb,
            double_speed: false,
            speed_armed: false,
            cpu_stall: 0,
            dot_phase: false,
        }
    }

    // -----------------------------
    // Per-T-cycle tick fan-out
    // -----------------------------

    pub fn tick_t_cycle(&mut self) {
        let frame_seq_bit = if self.cgb && self.double_speed { 13 } else { 12 };
        let events = self.timer.tick(frame_seq_bit);
        if events.irq {
            self.interrupts.request(Interrupt::Timer, false);
        }
        if events.frame_seq {
            self.apu.tick_frame_sequencer();
        }

        self.tick_dma();
        if self.serial.tick() {
            self.interrupts.request(Interrupt::Serial, false);
        }
        if self.joypad.take_irq_edge() {
            self.interrupts.request(Interrupt::Joypad, false);
        }

        // Dot-clock domain: half rate while in double speed.
        self.dot_phase = !self.dot_phase;
        if !self.double_speed || self.dot_phase {
            self.interrupts.tick();
            let ppu_events = self.ppu.tick(&mut self.interrupts);
            if ppu_events.entered_hblank {
                self.tick_hdma_hblank();
            }
            self.apu.tick();
            self.cartridge.rtc_tick();
        }
    }

    /// STOP with the switch armed: toggle clocks and reset DIV.
    pub fn change_speed(&mut self) {
        if self.speed_armed {
            self.double_speed = !self.double_speed;
            self.speed_armed = false;
        }
    }

    /// OAM corruption hook for 16-bit address-bus quirks (DMG only; the
    /// PPU rejects it outside mode 2).
    pub fn oam_corruption(&mut self, address: u16, kind: CorruptionKind) {
        if (0xFE00..=0xFEFF).contains(&address) {
            self.ppu.corrupt_oam(kind);
        }
    }

    /// WRAM addressed as a 0x2000 window with the switchable upper half.
    pub(crate) fn read_wram_offset(&self, offset: usize) -> u8 {
        if offset < 0x1000 {
            self.wram[offset]
        } else {
            self.wram[self.wram_bank as usize * 0x1000 + (offset - 0x1000)]
        }
    }

    fn boot_overlay(&self, address: u16) -> Option<u8> {
        if !self.boot_rom_enabled {
            return None;
        }
        let boot = self.boot_rom.as_ref()?;
        let a = address as usize;
        let overlaid = if self.cgb {
            a < 0x100 || ((0x200..boot.len()).contains(&a))
        } else {
            a < 0x100
        };
        if overlaid { boot.get(a).copied() } else { None }
    }

    // -----------------------------
    // CPU-visible memory interface
    // -----------------------------

    pub fn read_byte(&self, address: u16) -> u8 {
        if (0xFE00..=0xFE9F).contains(&address) && self.dma.blocks_oam() {
            return 0xFF;
        }
        match address {
            0x0000..=0x7FFF => self
                .boot_overlay(address)
                .unwrap_or_else(|| self.cartridge.read(address)),
            0x8000..=0x9FFF => {
                if self.ppu.vram_blocked() {
                    0xFF
                } else {
                    self.ppu.read_vram(address)
                }
            }
            0xA000..=0xBFFF => self.cartridge.read(address),
            0xC000..=0xFDFF => self.read_wram_offset((address as usize - 0xC000) & 0x1FFF),
            0xFE00..=0xFE9F => {
                if self.ppu.oam_blocked() {
                    0xFF
                } else {
                    self.ppu.oam[(address - 0xFE00) as usize]
                }
            }
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00 => self.joypad.read(),
            0xFF01..=0xFF02 => self.serial.read(address),
            0xFF04..=0xFF07 => self.timer.read(address),
            0xFF0F => self.interrupts.read_flag(),
            0xFF10..=0xFF3F => self.apu.read(address),
            0xFF46 => self.dma.written_value,
            0xFF4D => {
                if self.cgb {
                    (self.double_speed as u8) << 7 | 0x7E | self.speed_armed as u8
                } else {
                    0xFF
                }
            }
            0xFF40..=0xFF4C | 0xFF4E..=0xFF4F | 0xFF68..=0xFF6C => self.ppu.read_register(address),
            0xFF50..=0xFF55 => self.hdma.read(address, self.cgb),
            0xFF70 => {
                if self.cgb {
                    0xF8 | self.wram_bank
                } else {
                    0xFF
                }
            }
            0xFF80..=0xFFFE => self.hram[(address - 0xFF80) as usize],
            0xFFFF => self.interrupts.enable,
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        if (0xFE00..=0xFE9F).contains(&address) && self.dma.blocks_oam() {
            return;
        }
        match address {
            0x0000..=0x7FFF => self.cartridge.write(address, value),
            0x8000..=0x9FFF => {
                if !self.ppu.vram_blocked() {
                    self.ppu.write_vram(address, value);
                }
            }
            0xA000..=0xBFFF => self.cartridge.write(address, value),
            0xC000..=0xFDFF => {
                let offset = (address as usize - 0xC000) & 0x1FFF;
                if offset < 0x1000 {
                    self.wram[offset] = value;
                } else {
                    self.wram[self.wram_bank as usize * 0x1000 + (offset - 0x1000)] = value;
                }
            }
            0xFE00..=0xFE9F => {
                if !self.ppu.oam_blocked() {
                    self.ppu.oam[(address - 0xFE00) as usize] = value;
                }
            }
            0xFEA0..=0xFEFF => {}
            0xFF00 => self.joypad.write(value),
            0xFF01..=0xFF02 => {
                self.serial.write(address, value, self.double_speed, self.cgb)
            }
            0xFF04..=0xFF07 => self.timer.write(address, value),
            0xFF0F => self.interrupts.flag = value,
            0xFF10..=0xFF3F => self.apu.write(address, value),
            0xFF46 => self.dma.set(value),
            0xFF4D => {
                if self.cgb {
                    self.speed_armed = value & 0x01 != 0;
                }
            }
            0xFF50 => {
                // Write-once boot ROM disable.
                if value & 0x01 != 0 {
                    self.boot_rom_enabled = false;
                }
            }
            0xFF51..=0xFF55 => self.write_hdma(address, value),
            0xFF40..=0xFF4C | 0xFF4E..=0xFF4F | 0xFF68..=0xFF6C => {
                self.ppu.write_register(address, value)
            }
            0xFF70 => {
                if self.cgb {
                    self.wram_bank = if value & 0x07 != 0 { value & 0x07 } else { 1 };
                }
            }
            0xFF80..=0xFFFE => self.hram[(address - 0xFF80) as usize] = value,
            0xFFFF => self.interrupts.enable = value,
            _ => {}
        }
    }

    pub fn read_word(&self, address: u16) -> u16 {
        self.read_byte(address) as u16 | (self.read_byte(address.wrapping_add(1)) as u16) << 8
    }

    pub fn write_word(&mut self, address: u16, value: u16) {
        self.write_byte(address, value as u8);
        self.write_byte(address.wrapping_add(1), (value >> 8) as u8);
    }

    // -----------------------------
    // Save state
    // -----------------------------

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.put_bytes(self.wram.as_slice());
        w.put_u8(self.wram_bank);
        w.put_bytes(&self.hram);
        w.put_bool(self.boot_rom_enabled);
        w.put_bool(self.double_speed);
        w.put_bool(self.speed_armed);
        w.put_u32(self.cpu_stall);
        w.put_bool(self.dot_phase);
        self.interrupts.save_state(w);
        self.timer.save_state(w);
        self.serial.save_state(w);
        self.joypad.save_state(w);
        self.dma.save_state(w);
        self.hdma.save_state(w);
        self.ppu.save_state(w);
        self.apu.save_state(w);
        self.cartridge.save_state(w);
    }

    pub(crate) fn load_state(&mut self, r: &mut StateReader) -> Result<()> {
        r.get_bytes(self.wram.as_mut_slice())?;
        self.wram_bank = r.get_u8()?;
        r.get_bytes(&mut self.hram)?;
        self.boot_rom_enabled = r.get_bool()?;
        self.double_speed = r.get_bool()?;
        self.speed_armed = r.get_bool()?;
        self.cpu_stall = r.get_u32()?;
        self.dot_phase = r.get_bool()?;
        self.interrupts.load_state(r)?;
        self.timer.load_state(r)?;
        self.serial.load_state(r)?;
        self.joypad.load_state(r)?;
        self.dma.load_state(r)?;
        self.hdma.load_state(r)?;
        self.ppu.load_state(r)?;
        self.apu.load_state(r)?;
        self.cartridge.load_state(r)
    }
}
