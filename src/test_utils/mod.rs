/*!
Shared test helpers: in-memory cartridge image builders.

Tests assemble tiny ROMs instead of shipping binary fixtures. The builder
lays down a minimal header (logo, CGB flag, MBC/ROM/RAM size codes,
header checksum) and an entry stub at 0x0100 that jumps to the program
bytes placed at 0x0150.
*/

const BANK: usize = 0x4000;

const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00,
    0x0D, 0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD,
    0xD9, 0x99, 0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB,
    0xB9, 0x33, 0x3E,
];

pub struct RomBuilder {
    mbc_code: u8,
    rom_size_code: u8,
    ram_size_code: u8,
    cgb_flag: u8,
    program: Vec<u8>,
    pokes: Vec<(usize, u8)>,
}

impl RomBuilder {
    pub fn new() -> Self {
        RomBuilder {
            mbc_code: 0x00,
            rom_size_code: 0x00,
            ram_size_code: 0x00,
            cgb_flag: 0x00,
            program: Vec::new(),
            pokes: Vec::new(),
        }
    }

    pub fn mbc_code(mut self, code: u8) -> Self {
        self.mbc_code = code;
        self
    }

    pub fn rom_size_code(mut self, code: u8) -> Self {
        self.rom_size_code = code;
        self
    }

    pub fn ram_size_code(mut self, code: u8) -> Self {
        self.ram_size_code = code;
        self
    }

    pub fn cgb(mut self) -> Self {
        self.cgb_flag = 0x80;
        self
    }

    /// Program bytes placed at 0x0150; execution reaches them through the
    /// entry stub at 0x0100.
    pub fn program(mut self, code: &[u8]) -> Self {
        self.program = code.to_vec();
        self
    }

    /// Raw byte override anywhere in the image.
    pub fn poke(&mut self, offset: usize, value: u8) {
        self.pokes.push((offset, value));
    }

    /// Override relative to the start of a 16 KiB bank.
    pub fn poke_bank(&mut self, bank: usize, offset: usize, value: u8) {
        self.pokes.push((bank * BANK + offset, value));
    }

    pub fn build(&self) -> Vec<u8> {
        let banks: usize = match self.rom_size_code {
            0x00..=0x08 => 2 << self.rom_size_code,
            0x52 => 72,
            0x53 => 80,
            0x54 => 96,
            _ => 2,
        };
        let mut rom = vec![0u8; banks * BANK];

        // Entry: NOP; JP 0x0150
        rom[0x0100] = 0x00;
        rom[0x0101] = 0xC3;
        rom[0x0102] = 0x50;
        rom[0x0103] = 0x01;
        rom[0x0104..0x0104 + 48].copy_from_slice(&NINTENDO_LOGO);
        rom[0x0143] = self.cgb_flag;
        rom[0x0147] = self.mbc_code;
        rom[0x0148] = self.rom_size_code;
        rom[0x0149] = self.ram_size_code;

        let end = (0x0150 + self.program.len()).min(rom.len());
        rom[0x0150..end].copy_from_slice(&self.program[..end - 0x0150]);

        for &(offset, value) in &self.pokes {
            if offset < rom.len() {
                rom[offset] = value;
            }
        }

        let checksum = rom[0x0134..=0x014C]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));
        rom[0x014D] = checksum;
        rom
    }
}

impl Default for RomBuilder {
    fn default() -> Self {
        RomBuilder::new()
    }
}

/// Shortest useful program ROM: the given code, then JR -2 to spin.
pub fn program_rom(code: &[u8]) -> Vec<u8> {
    let mut program = code.to_vec();
    program.extend_from_slice(&[0x18, 0xFE]);
    RomBuilder::new().program(&program).build()
}
