/*!
Cartridge: ROM image, external RAM, MBC latches, battery persistence.

The header at 0x0100-0x014F drives everything: 0x0143 selects CGB mode
(when the machine is constructed with `ModeHint::Auto`), 0x0147 the
controller family plus RAM/battery/timer/rumble capabilities, 0x0148 the
ROM size (including the legacy 0x52-0x54 codes), 0x0149 the RAM size.

Battery-backed RAM is flushed to the configured save path on every
falling edge of the RAM-enable latch while dirty, and on demand through
`Gameboy::request_save_ram`. MBC3 timer carts prepend the fixed RTC
snapshot so time keeps flowing across sessions. A flush failure on the
automatic path is logged and emulation continues with the in-memory copy.
*/

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Error, Result};
use crate::mbc::{ControlEffect, Mbc, RamTarget};
use crate::rtc::Rtc;
use crate::state::{StateReader, StateWriter};

const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00,
    0x0D, 0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD,
    0xD9, 0x99, 0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB,
    0xB9, 0x33, 0x3E,
];

const RTC_SNAPSHOT_LEN: usize = 19;

pub type RumbleCallback = Box<dyn FnMut(bool) + Send>;

pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    pub mbc: Mbc,
    rom_banks: usize,
    ram_enabled: bool,
    prev_ram_enable: bool,
    ram_dirty: bool,
    battery: bool,
    has_rtc: bool,
    pub rtc: Rtc,
    save_path: Option<PathBuf>,
    rumble_callback: Option<RumbleCallback>,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("mbc", &self.mbc)
            .field("rom_banks", &self.rom_banks)
            .field("ram_len", &self.ram.len())
            .field("battery", &self.battery)
            .field("has_rtc", &self.has_rtc)
            .finish()
    }
}

impl Cartridge {
    pub fn from_file(path: &Path, real_rtc: bool) -> Result<Self> {
        let rom = fs::read(path)?;
        let save_path = Some(path.with_extension("sav"));
        Cartridge::from_bytes(rom, save_path, real_rtc)
    }

    pub fn from_bytes(rom: Vec<u8>, save_path: Option<PathBuf>, real_rtc: bool) -> Result<Self> {
        if rom.len() < 0x0150 {
            return Err(Error::RomTooSmall(rom.len()));
        }

        let mbc_code = rom[0x0147];
        let rom_size = Cartridge::rom_size(rom[0x0148])?;
        let rom_banks = (rom_size / 0x4000).max(1);

        let (has_ram, battery, has_rtc, has_rumble) = match mbc_code {
            0x00 | 0x01 | 0x11 | 0x19 => (false, false, false, false),
            0x02 | 0x12 | 0x1A => (true, false, false, false),
            0x03 | 0x13 | 0x1B => (true, true, false, false),
            0x05 => (true, false, false, false),
            0x06 => (true, true, false, false),
            0x0F => (false, true, true, false),
            0x10 => (true, true, true, false),
            0x1C => (false, false, false, true),
            0x1D => (true, false, false, true),
            0x1E => (true, true, false, true),
            other => return Err(Error::UnsupportedMbc(other)),
        };

        let ram_len = match mbc_code {
            // MBC2's 512 half-byte cells are internal; the header RAM
            // size byte is 0.
            0x05 | 0x06 => 0x200,
            _ if has_ram => Cartridge::ram_size(rom[0x0149])?,
            _ => 0,
        };

        let mbc = match mbc_code {
            0x00 => Mbc::None,
            0x01..=0x03 => {
                let multicart = Cartridge::is_likely_multicart(&rom);
                Mbc::Mbc1 { bank1: 1, bank2: 0, mode: 0, multicart }
            }
            0x05 | 0x06 => Mbc::Mbc2 { rom_bank: 1 },
            0x0F..=0x13 => Mbc::Mbc3 { rom_bank: 1, ram_bank: 0, latch_arm: false },
            0x19..=0x1E => Mbc::Mbc5 { rom_bank: 1, ram_bank: 0, rumble: false, has_rumble },
            _ => unreachable!("mbc code validated above"),
        };

        let mut cart = Cartridge {
            rom,
            ram: vec![0; ram_len],
            mbc,
            rom_banks,
            ram_enabled: false,
            prev_ram_enable: false,
            ram_dirty: false,
            battery,
            has_rtc,
            rtc: Rtc::new(real_rtc),
            save_path,
            rumble_callback: None,
        };
        if battery {
            cart.load_battery_ram();
        }
        Ok(cart)
    }

    fn rom_size(byte: u8) -> Result<usize> {
        const BANK: usize = 0x4000;
        match byte {
            0x00..=0x08 => Ok(BANK * (2 << byte)),
            0x52 => Ok(BANK * 72),
            0x53 => Ok(BANK * 80),
            0x54 => Ok(BANK * 96),
            other => Err(Error::UnsupportedRomSize(other)),
        }
    }

    fn ram_size(byte: u8) -> Result<usize> {
        match byte {
            0x00 => Ok(0),
            0x01 => Ok(0x400 * 2),
            0x02 => Ok(0x400 * 8),
            0x03 => Ok(0x400 * 32),
            0x04 => Ok(0x400 * 128),
            0x05 => Ok(0x400 * 64),
            other => Err(Error::UnsupportedRamSize(other)),
        }
    }

    /// MBC1 multicarts wire bank2 four bits up instead of five. There is
    /// no header bit for this; detect the 1 MiB collections by a second
    /// logo in bank 0x10 or by the duplicated 256 KiB blocks they carry.
    fn is_likely_multicart(rom: &[u8]) -> bool {
        if rom.len() != 0x10_0000 {
            return false;
        }
        const BANK: usize = 0x4000;
        let bank10 = &rom[0x10 * BANK..0x11 * BANK];
        if bank10[0x0104..0x0104 + 48] == NINTENDO_LOGO
            || bank10.windows(48).any(|w| w == NINTENDO_LOGO)
        {
            return true;
        }
        const BLOCK: usize = 0x10 * BANK;
        let dup1 = rom[BLOCK..2 * BLOCK] == rom[..BLOCK];
        let dup2 = rom[3 * BLOCK..] == rom[2 * BLOCK..3 * BLOCK];
        dup1 && dup2
    }

    pub fn is_cgb(&self) -> bool {
        self.rom[0x0143] & 0x80 == 0x80
    }

    pub fn set_rumble_callback(&mut self, callback: RumbleCallback) {
        self.rumble_callback = Some(callback);
    }

    pub fn read(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x7FFF => {
                let bank = self.mbc.rom_bank(address, self.rom_banks);
                let offset = bank * 0x4000 + (address as usize & 0x3FFF);
                self.rom.get(offset).copied().unwrap_or(0xFF)
            }
            0xA000..=0xBFFF => {
                if !self.ram_enabled {
                    return 0xFF;
                }
                match self.mbc.ram_target(address, self.ram.len()) {
                    RamTarget::Ram(offset) => {
                        if matches!(self.mbc, Mbc::Mbc2 { .. }) {
                            0xF0 | (self.ram[offset] & 0x0F)
                        } else {
                            self.ram[offset]
                        }
                    }
                    RamTarget::Rtc(index) => self.rtc.read(index),
                    RamTarget::None => 0xFF,
                }
            }
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=0x7FFF => match self.mbc.write_control(address, value) {
                ControlEffect::RamEnable(enable) => self.apply_ram_enable(enable),
                ControlEffect::LatchRtc => self.rtc.latch(),
                ControlEffect::Rumble(on) => {
                    if let Some(cb) = self.rumble_callback.as_mut() {
                        cb(on);
                    }
                }
                ControlEffect::None => {}
            },
            0xA000..=0xBFFF => {
                if !self.ram_enabled {
                    return;
                }
                match self.mbc.ram_target(address, self.ram.len()) {
                    RamTarget::Ram(offset) => {
                        let value =
                            if matches!(self.mbc, Mbc::Mbc2 { .. }) { value & 0x0F } else { value };
                        self.ram[offset] = value;
                        self.ram_dirty = true;
                    }
                    RamTarget::Rtc(index) => {
                        self.rtc.write(index, value);
                        self.ram_dirty = true;
                    }
                    RamTarget::None => {}
                }
            }
            _ => {}
        }
    }

    /// Games disable RAM when they are done writing saves; that falling
    /// edge is the flush point.
    fn apply_ram_enable(&mut self, enable: bool) {
        if self.prev_ram_enable && !enable && self.ram_dirty {
            if let Err(err) = self.save_battery_ram() {
                warn!("battery RAM flush failed: {err}");
            } else {
                self.ram_dirty = false;
            }
        }
        self.prev_ram_enable = enable;
        self.ram_enabled = enable;
    }

    /// Write the battery file (RTC snapshot first for timer carts).
    pub fn save_battery_ram(&self) -> Result<()> {
        if !self.battery || (self.ram.is_empty() && !self.has_rtc) {
            return Ok(());
        }
        let Some(path) = self.save_path.as_ref() else {
            return Ok(());
        };
        let mut data = Vec::with_capacity(self.ram.len() + RTC_SNAPSHOT_LEN);
        if self.has_rtc {
            data.extend_from_slice(&self.rtc.snapshot());
        }
        data.extend_from_slice(&self.ram);
        fs::write(path, data)?;
        Ok(())
    }

    fn load_battery_ram(&mut self) {
        let Some(path) = self.save_path.as_ref() else {
            return;
        };
        let Ok(data) = fs::read(path) else {
            return;
        };
        let ram_part = if self.has_rtc {
            if data.len() < RTC_SNAPSHOT_LEN {
                return;
            }
            let snap: [u8; RTC_SNAPSHOT_LEN] = data[..RTC_SNAPSHOT_LEN].try_into().unwrap();
            self.rtc.restore(&snap);
            &data[RTC_SNAPSHOT_LEN..]
        } else {
            &data[..]
        };
        let n = ram_part.len().min(self.ram.len());
        self.ram[..n].copy_from_slice(&ram_part[..n]);
    }

    pub fn rtc_tick(&mut self) {
        if self.has_rtc {
            self.rtc.tick();
        }
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.put_blob(&self.ram);
        w.put_bool(self.ram_enabled);
        w.put_bool(self.prev_ram_enable);
        w.put_bool(self.ram_dirty);
        match &self.mbc {
            Mbc::None => w.put_u8(0),
            Mbc::Mbc1 { bank1, bank2, mode, .. } => {
                w.put_u8(1);
                w.put_u8(*bank1);
                w.put_u8(*bank2);
                w.put_u8(*mode);
            }
            Mbc::Mbc2 { rom_bank } => {
                w.put_u8(2);
                w.put_u8(*rom_bank);
            }
            Mbc::Mbc3 { rom_bank, ram_bank, latch_arm } => {
                w.put_u8(3);
                w.put_u8(*rom_bank);
                w.put_u8(*ram_bank);
                w.put_bool(*latch_arm);
            }
            Mbc::Mbc5 { rom_bank, ram_bank, rumble, .. } => {
                w.put_u8(5);
                w.put_u16(*rom_bank);
                w.put_u8(*ram_bank);
                w.put_bool(*rumble);
            }
        }
        self.rtc.save_state(w);
    }

    pub(crate) fn load_state(&mut self, r: &mut StateReader) -> Result<()> {
        r.get_blob(&mut self.ram)?;
        self.ram_enabled = r.get_bool()?;
        self.prev_ram_enable = r.get_bool()?;
        self.ram_dirty = r.get_bool()?;
        let tag = r.get_u8()?;
        match (&mut self.mbc, tag) {
            (Mbc::None, 0) => {}
            (Mbc::Mbc1 { bank1, bank2, mode, .. }, 1) => {
                *bank1 = r.get_u8()?;
                *bank2 = r.get_u8()?;
                *mode = r.get_u8()?;
            }
            (Mbc::Mbc2 { rom_bank }, 2) => *rom_bank = r.get_u8()?,
            (Mbc::Mbc3 { rom_bank, ram_bank, latch_arm }, 3) => {
                *rom_bank = r.get_u8()?;
                *ram_bank = r.get_u8()?;
                *latch_arm = r.get_bool()?;
            }
            (Mbc::Mbc5 { rom_bank, ram_bank, rumble, .. }, 5) => {
                *rom_bank = r.get_u16()?;
                *ram_bank = r.get_u8()?;
                *rumble = r.get_bool()?;
            }
            _ => return Err(Error::StateTruncated),
        }
        self.rtc.load_state(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RomBuilder;

    #[test]
    fn rejects_short_images() {
        assert!(matches!(
            Cartridge::from_bytes(vec![0; 0x100], None, false),
            Err(Error::RomTooSmall(_))
        ));
    }

    #[test]
    fn rejects_unknown_mbc_codes() {
        let rom = RomBuilder::new().mbc_code(0x20).build();
        assert!(matches!(
            Cartridge::from_bytes(rom, None, false),
            Err(Error::UnsupportedMbc(0x20))
        ));
    }

    #[test]
    fn rom_only_reads_linear() {
        let mut builder = RomBuilder::new();
        builder.poke(0x0000, 0x11);
        builder.poke(0x7FFF, 0x22);
        let cart = Cartridge::from_bytes(builder.build(), None, false).unwrap();
        assert_eq!(cart.read(0x0000), 0x11);
        assert_eq!(cart.read(0x7FFF), 0x22);
    }

    #[test]
    fn mbc1_switches_banks() {
        let mut builder = RomBuilder::new().mbc_code(0x01).rom_size_code(0x04); // 32 banks
        for bank in 0..32u8 {
            builder.poke_bank(bank as usize, 0x0000, bank);
        }
        let mut cart = Cartridge::from_bytes(builder.build(), None, false).unwrap();
        assert_eq!(cart.read(0x4000), 1);
        cart.write(0x2000, 7);
        assert_eq!(cart.read(0x4000), 7);
        cart.write(0x2000, 0);
        assert_eq!(cart.read(0x4000), 1, "bank 0 aliases to 1");
    }

    #[test]
    fn ram_requires_enable_and_persists_values() {
        let rom = RomBuilder::new().mbc_code(0x02).ram_size_code(0x02).build();
        let mut cart = Cartridge::from_bytes(rom, None, false).unwrap();
        cart.write(0xA000, 0x5A);
        assert_eq!(cart.read(0xA000), 0xFF, "disabled RAM reads 0xFF");
        cart.write(0x0000, 0x0A);
        cart.write(0xA000, 0x5A);
        assert_eq!(cart.read(0xA000), 0x5A);
        cart.write(0x0000, 0x00);
        assert_eq!(cart.read(0xA000), 0xFF);
    }

    #[test]
    fn mbc2_ram_is_nibble_wide() {
        let rom = RomBuilder::new().mbc_code(0x06).build();
        let mut cart = Cartridge::from_bytes(rom, None, false).unwrap();
        cart.write(0x0000, 0x0A);
        cart.write(0xA000, 0xFF);
        assert_eq!(cart.read(0xA000), 0xFF, "upper bits read back as ones");
        cart.write(0xA001, 0x05);
        assert_eq!(cart.read(0xA001), 0xF5);
        // 512 cells echo across the whole window.
        assert_eq!(cart.read(0xA201), 0xF5);
    }

    #[test]
    fn multicart_detected_by_logo_in_bank_16() {
        let mut builder = RomBuilder::new().mbc_code(0x01).rom_size_code(0x05); // 1 MiB
        builder.poke_bank(0x10, 0x0104, 0); // placeholder; logo written below
        let mut rom = builder.build();
        rom[0x10 * 0x4000 + 0x0104..0x10 * 0x4000 + 0x0104 + 48].copy_from_slice(&NINTENDO_LOGO);
        let cart = Cartridge::from_bytes(rom, None, false).unwrap();
        assert!(matches!(cart.mbc, Mbc::Mbc1 { multicart: true, .. }));
    }

    #[test]
    fn plain_one_megabyte_image_is_not_multicart() {
        let mut builder = RomBuilder::new().mbc_code(0x01).rom_size_code(0x05);
        // Give each 256 KiB block distinct content.
        for block in 0..4usize {
            builder.poke_bank(block * 0x10, 0x2000, block as u8 + 1);
        }
        let cart = Cartridge::from_bytes(builder.build(), None, false).unwrap();
        assert!(matches!(cart.mbc, Mbc::Mbc1 { multicart: false, .. }));
    }

    #[test]
    fn battery_ram_round_trips_through_the_save_file() {
        let dir = std::env::temp_dir().join("oxboy-cart-test");
        fs::create_dir_all(&dir).unwrap();
        let save = dir.join("battery.sav");
        let _ = fs::remove_file(&save);

        let rom = RomBuilder::new().mbc_code(0x03).ram_size_code(0x02).build();
        let mut cart =
            Cartridge::from_bytes(rom.clone(), Some(save.clone()), false).unwrap();
        cart.write(0x0000, 0x0A);
        cart.write(0xA010, 0x77);
        cart.write(0x0000, 0x00); // falling edge flushes

        let cart2 = Cartridge::from_bytes(rom, Some(save.clone()), false).unwrap();
        assert_eq!(cart2.ram[0x10], 0x77);
        let _ = fs::remove_file(&save);
    }

    #[test]
    fn mbc3_rtc_snapshot_prefixes_the_save_file() {
        let dir = std::env::temp_dir().join("oxboy-cart-test");
        fs::create_dir_all(&dir).unwrap();
        let save = dir.join("rtc.sav");
        let _ = fs::remove_file(&save);

        let rom = RomBuilder::new().mbc_code(0x10).ram_size_code(0x02).build();
        let mut cart = Cartridge::from_bytes(rom, Some(save.clone()), false).unwrap();
        cart.write(0x0000, 0x0A);
        cart.write(0xA000, 0x01);
        cart.save_battery_ram().unwrap();

        let data = fs::read(&save).unwrap();
        assert_eq!(data.len(), RTC_SNAPSHOT_LEN + 0x2000);
        let _ = fs::remove_file(&save);
    }
}
