#![doc = r#"
oxboy library crate.

Game Boy (DMG) and Game Boy Color (CGB) emulator core, clocked one
T-cycle at a time. The crate exposes the machine to frontends and tests.

Modules:
- apu: four-channel audio unit, frame sequencer, mixer, sample ring
- bus: address decoder tying every component together; OAM DMA and HDMA
- cartridge: header probing, ROM/RAM ownership, battery persistence
- cpu: SM83 core at M-cycle granularity with fetch/execute overlap
- error: crate-wide error taxonomy
- interrupts: IF/IE/IME plus the delayed-request window
- joypad: atomic key matrix behind the P1 register
- machine: the assembled `Gameboy` and its host API
- mbc: cartridge bank-controller variants (MBC1/2/3/5)
- ppu: dot-clocked pixel pipeline with the fetcher FIFO
- rtc: MBC3 real-time clock
- serial: link port shifter (no peer attached)
- state: save-state stream helpers
- timer: DIV/TIMA block with its falling-edge rules

Shared ROM builders for tests live in `crate::test_utils`.
"#]

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod error;
pub mod interrupts;
pub mod joypad;
pub mod machine;
pub mod mbc;
pub mod ppu;
pub mod rtc;
pub mod serial;
pub(crate) mod state;
pub mod timer;

// Re-export the host-facing surface at the crate root.
pub use apu::fifo::{SampleFifo, StereoSample};
pub use error::{Error, Result};
pub use joypad::Button;
pub use machine::{Gameboy, ModeHint, Settings};
pub use ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
