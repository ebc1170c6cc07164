/*!
Gameboy: the assembled machine and its host-facing API.

Construction probes the cartridge header (or honors an explicit mode
hint), wires the bus, and either starts cold at 0x0000 with a boot ROM
overlay or applies the post-boot register/IO state and begins at 0x0100.

`step_t_cycle` is the single clock: it fans the T-cycle out to every
peripheral through the bus and gates the CPU to one micro-op per four
T-cycles, honoring stall debt from GDMA/HDMA and the speed-switch pause.
`step_frame` runs until the PPU signals the VBlank line.

Save states serialize the CPU followed by the bus (which owns everything
else) behind a version tag; a failed load rolls back to the pre-call
state.
*/

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::apu::fifo::{SampleFifo, StereoSample};
use crate::bus::Bus;
use crate::cartridge::{Cartridge, RumbleCallback};
use crate::cpu::Cpu;
use crate::error::{Error, Result};
use crate::joypad::Button;
use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::state::{StateReader, StateWriter};

/// T-cycles per frame at normal speed.
pub const FRAME_T_CYCLES: u32 = 70_224;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeHint {
    #[default]
    Auto,
    Dmg,
    Cgb,
}

pub struct Settings {
    pub boot_rom: Option<Vec<u8>>,
    pub mode: ModeHint,
    pub use_real_rtc: bool,
    pub sample_rate: u32,
    pub save_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            boot_rom: None,
            mode: ModeHint::Auto,
            use_real_rtc: false,
            sample_rate: 48_000,
            save_path: None,
        }
    }
}

pub struct Gameboy {
    pub(crate) cpu: Cpu,
    pub(crate) bus: Bus,
    cgb: bool,
    t_phase: u8,
    t_cycles: u64,
}

impl Gameboy {
    pub fn new(rom: Vec<u8>, settings: Settings) -> Result<Self> {
        if let Some(boot) = settings.boot_rom.as_ref() {
            if boot.len() < 0x100 {
                return Err(Error::BootRomTooSmall(boot.len()));
            }
        }
        let cartridge = Cartridge::from_bytes(rom, settings.save_path, settings.use_real_rtc)?;
        let cgb = match settings.mode {
            ModeHint::Auto => cartridge.is_cgb(),
            ModeHint::Dmg => false,
            ModeHint::Cgb => true,
        };
        let run_boot_rom = settings.boot_rom.is_some();
        let mut bus = Bus::new(cartridge, cgb, settings.sample_rate, settings.boot_rom);
        let mut cpu = Cpu::new();
        if run_boot_rom {
            cpu.reset_boot_rom(&bus);
        } else {
            Gameboy::init_post_boot_io(&mut bus, cgb);
            cpu.reset_post_boot(&bus, cgb);
        }
        Ok(Gameboy { cpu, bus, cgb, t_phase: 0, t_cycles: 0 })
    }

    pub fn from_file(path: &Path, mut settings: Settings) -> Result<Self> {
        let rom = std::fs::read(path)?;
        if settings.save_path.is_none() {
            settings.save_path = Some(path.with_extension("sav"));
        }
        Gameboy::new(rom, settings)
    }

    /// IO state the boot ROM would have left behind.
    fn init_post_boot_io(bus: &mut Bus, cgb: bool) {
        bus.timer.div_counter = if cgb { 0x1EA0 } else { 0xABCC };
        // The boot jingle leaves CH1 configured and the APU powered.
        bus.apu.write(0xFF26, 0x80);
        bus.apu.write(0xFF10, 0x80);
        bus.apu.write(0xFF11, 0xBF);
        bus.apu.write(0xFF12, 0xF3);
        bus.apu.write(0xFF13, 0xC1);
        bus.apu.write(0xFF14, 0x87);
        bus.apu.write(0xFF24, 0x77);
        bus.apu.write(0xFF25, 0xF3);
    }

    // -----------------------------
    // Clocking
    // -----------------------------

    /// Advance the machine by exactly one T-cycle.
    pub fn step_t_cycle(&mut self) {
        self.t_cycles += 1;
        self.bus.tick_t_cycle();
        if self.bus.cpu_stall > 0 {
            self.bus.cpu_stall -= 1;
            return;
        }
        self.t_phase += 1;
        if self.t_phase == 4 {
            self.t_phase = 0;
            self.cpu.step_m_cycle(&mut self.bus);
        }
    }

    /// Run until the PPU enters the VBlank line (or a frame's worth of
    /// cycles with the LCD off).
    pub fn step_frame(&mut self) {
        self.bus.ppu.frame_ready = false;
        let budget = FRAME_T_CYCLES << (self.bus.double_speed as u32 + 1);
        for _ in 0..budget {
            self.step_t_cycle();
            if self.bus.ppu.frame_ready {
                return;
            }
        }
    }

    // -----------------------------
    // Host surface
    // -----------------------------

    pub fn framebuffer(&self) -> &[u32; SCREEN_WIDTH * SCREEN_HEIGHT] {
        self.bus.ppu.framebuffer()
    }

    pub fn pop_sample(&self) -> Option<StereoSample> {
        self.bus.apu.pop_sample()
    }

    /// Shareable handle for a dedicated audio thread.
    pub fn sample_fifo(&self) -> std::sync::Arc<SampleFifo> {
        self.bus.apu.sample_fifo()
    }

    pub fn set_button(&self, button: Button, pressed: bool) {
        self.bus.joypad.set_button(button, pressed);
    }

    pub fn set_rumble_callback(&mut self, callback: RumbleCallback) {
        self.bus.cartridge.set_rumble_callback(callback);
    }

    /// Flush battery RAM (and the RTC snapshot) to the save path.
    pub fn request_save_ram(&self) -> Result<()> {
        self.bus.cartridge.save_battery_ram()
    }

    pub fn is_cgb(&self) -> bool {
        self.cgb
    }

    /// The CPU hit an undocumented opcode and wedged.
    pub fn is_locked_up(&self) -> bool {
        self.cpu.locked_up
    }

    /// Total T-cycles stepped since construction.
    pub fn cycles(&self) -> u64 {
        self.t_cycles
    }

    // -----------------------------
    // Save states
    // -----------------------------

    pub fn save_state(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&self.state_bytes())?;
        Ok(())
    }

    fn state_bytes(&self) -> Vec<u8> {
        let mut w = StateWriter::new();
        w.put_bool(self.cgb);
        w.put_u8(self.t_phase);
        w.put_u64(self.t_cycles);
        self.cpu.save_state(&mut w);
        self.bus.save_state(&mut w);
        w.into_bytes()
    }

    fn apply_state(&mut self, bytes: &[u8]) -> Result<()> {
        let mut r = StateReader::new(bytes)?;
        let _cgb = r.get_bool()?;
        self.t_phase = r.get_u8()?;
        self.t_cycles = r.get_u64()?;
        self.cpu.load_state(&mut r)?;
        self.bus.load_state(&mut r)
    }

    /// Restore a stream produced by `save_state`. On any error the
    /// machine is left exactly as it was before the call.
    pub fn load_state(&mut self, reader: &mut impl Read) -> Result<()> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let backup = self.state_bytes();
        match self.apply_state(&bytes) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.apply_state(&backup)
                    .expect("rolling back to a freshly captured state cannot fail");
                Err(err)
            }
        }
    }
}
