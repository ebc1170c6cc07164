/*!
Error taxonomy for the emulator core.

Kinds:
- Cartridge/boot-ROM load failures: fatal for the instance, surfaced at
  construction.
- Save-state failures: surfaced by `Gameboy::load_state`; the machine is
  left in its pre-call state.
- I/O failures while flushing battery RAM: surfaced by
  `Gameboy::request_save_ram`; the automatic flush path logs and keeps the
  in-memory copy instead.

No error ever propagates out of `step_t_cycle`; every reachable hardware
state has a defined outcome. Internal invariant violations abort via
`unreachable!`.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("ROM image too small ({0} bytes); no cartridge header")]
    RomTooSmall(usize),

    #[error("unsupported cartridge type byte {0:#04x}")]
    UnsupportedMbc(u8),

    #[error("unsupported ROM size byte {0:#04x}")]
    UnsupportedRomSize(u8),

    #[error("unsupported RAM size byte {0:#04x}")]
    UnsupportedRamSize(u8),

    #[error("boot ROM image too small ({0} bytes)")]
    BootRomTooSmall(usize),

    #[error("save state has bad magic")]
    StateBadMagic,

    #[error("save state version {found} not supported (expected {expected})")]
    StateVersion { found: u32, expected: u32 },

    #[error("save state truncated")]
    StateTruncated,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
