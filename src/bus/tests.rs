use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::test_utils::RomBuilder;

fn dmg_bus() -> Bus {
    let cart = Cartridge::from_bytes(RomBuilder::new().build(), None, false).unwrap();
    Bus::new(cart, false, 48_000, None)
}

fn cgb_bus() -> Bus {
    let cart = Cartridge::from_bytes(RomBuilder::new().cgb().build(), None, false).unwrap();
    Bus::new(cart, true, 48_000, None)
}

/// Park the PPU in VBlank so VRAM/OAM are freely accessible.
fn bus_in_vblank() -> Bus {
    let mut bus = dmg_bus();
    while bus.ppu.ly < 144 {
        bus.tick_t_cycle();
    }
    bus
}

#[test]
fn wram_and_echo_mirror_each_other() {
    let mut bus = dmg_bus();
    bus.write_byte(0xC123, 0x55);
    assert_eq!(bus.read_byte(0xC123), 0x55);
    assert_eq!(bus.read_byte(0xE123), 0x55);
    bus.write_byte(0xF000, 0xAA);
    assert_eq!(bus.read_byte(0xD000), 0xAA);
}

#[test]
fn cgb_wram_banking_switches_the_upper_window() {
    let mut bus = cgb_bus();
    bus.write_byte(0xFF70, 2);
    bus.write_byte(0xD000, 0x22);
    bus.write_byte(0xFF70, 3);
    bus.write_byte(0xD000, 0x33);
    assert_eq!(bus.read_byte(0xD000), 0x33);
    bus.write_byte(0xFF70, 2);
    assert_eq!(bus.read_byte(0xD000), 0x22);
    // Bank 0 aliases to 1.
    bus.write_byte(0xFF70, 0);
    assert_eq!(bus.read_byte(0xFF70), 0xF8 | 1);
}

#[test]
fn wram_bank_register_hidden_on_dmg() {
    let mut bus = dmg_bus();
    bus.write_byte(0xFF70, 3);
    assert_eq!(bus.read_byte(0xFF70), 0xFF);
    bus.write_byte(0xD000, 0x44);
    assert_eq!(bus.read_byte(0xD000), 0x44);
}

#[test]
fn oam_locked_during_scan_and_draw() {
    let mut bus = dmg_bus();
    // Fresh machine starts in mode 2.
    bus.tick_t_cycle();
    assert_eq!(bus.ppu.mode, 2);
    bus.write_byte(0xFE00, 0x12);
    assert_eq!(bus.read_byte(0xFE00), 0xFF);

    let mut bus = bus_in_vblank();
    bus.write_byte(0xFE00, 0x12);
    assert_eq!(bus.read_byte(0xFE00), 0x12);
}

#[test]
fn vram_locked_only_during_mode_three() {
    let mut bus = dmg_bus();
    bus.tick_t_cycle();
    assert_eq!(bus.ppu.mode, 2);
    bus.write_byte(0x8000, 0x34);
    assert_eq!(bus.read_byte(0x8000), 0x34, "mode 2 leaves VRAM open");
    while bus.ppu.mode != 3 {
        bus.tick_t_cycle();
    }
    bus.write_byte(0x8000, 0x56);
    assert_eq!(bus.read_byte(0x8000), 0xFF);
    let mut bus = bus_in_vblank();
    bus.write_byte(0x8000, 0x56);
    assert_eq!(bus.read_byte(0x8000), 0x56);
}

#[test]
fn unusable_region_reads_ff() {
    let mut bus = dmg_bus();
    bus.write_byte(0xFEA5, 0x77);
    assert_eq!(bus.read_byte(0xFEA5), 0xFF);
}

#[test]
fn interrupt_flag_reads_upper_bits_set() {
    let mut bus = dmg_bus();
    bus.write_byte(0xFF0F, 0x00);
    assert_eq!(bus.read_byte(0xFF0F), 0xE0);
    bus.write_byte(0xFF0F, 0x05);
    assert_eq!(bus.read_byte(0xFF0F), 0xE5);
}

#[test]
fn key1_only_exists_on_cgb() {
    let mut bus = dmg_bus();
    assert_eq!(bus.read_byte(0xFF4D), 0xFF);
    let mut bus = cgb_bus();
    assert_eq!(bus.read_byte(0xFF4D), 0x7E);
    bus.write_byte(0xFF4D, 0x01);
    assert_eq!(bus.read_byte(0xFF4D), 0x7F);
    bus.change_speed();
    assert_eq!(bus.read_byte(0xFF4D), 0xFE, "double speed, no longer armed");
}

#[test]
fn oam_dma_copies_160_bytes_after_startup() {
    let mut bus = bus_in_vblank();
    for i in 0..0xA0u16 {
        bus.write_byte(0xC000 + i, i as u8 ^ 0x5A);
    }
    bus.write_byte(0xFF46, 0xC0);
    assert_eq!(bus.read_byte(0xFF46), 0xC0, "register reads back last write");
    // Startup (1 M-cycle) + 160 byte copies at 4 T-cycles each.
    for _ in 0..(161 * 4) {
        bus.tick_t_cycle();
    }
    for i in 0..0xA0usize {
        assert_eq!(bus.ppu.oam[i], (i as u8) ^ 0x5A);
    }
}

#[test]
fn oam_reads_ff_while_dma_running() {
    let mut bus = bus_in_vblank();
    bus.write_byte(0xC000, 0x99);
    bus.write_byte(0xFF46, 0xC0);
    for _ in 0..12 {
        bus.tick_t_cycle();
    }
    assert_eq!(bus.read_byte(0xFE00), 0xFF, "locked mid-transfer");
    for _ in 0..161 * 4 {
        bus.tick_t_cycle();
    }
    assert_eq!(bus.read_byte(0xFE00), 0x99, "unlocked after completion");
}

#[test]
fn oam_dma_restart_takes_the_new_source() {
    let mut bus = bus_in_vblank();
    for i in 0..0xA0u16 {
        bus.write_byte(0xC000 + i, 0x11);
        bus.write_byte(0xC100 + i, 0x22);
    }
    bus.write_byte(0xFF46, 0xC0);
    for _ in 0..16 {
        bus.tick_t_cycle();
    }
    // Past the setup window: this schedules a restart from 0xC100.
    bus.write_byte(0xFF46, 0xC1);
    for _ in 0..(163 * 4) {
        bus.tick_t_cycle();
    }
    assert!(bus.ppu.oam.iter().all(|&b| b == 0x22));
}

#[test]
fn gdma_copies_immediately_and_charges_stall() {
    let mut bus = cgb_bus();
    // Park in VBlank so VRAM writes land.
    while bus.ppu.ly < 144 {
        bus.tick_t_cycle();
    }
    for i in 0..32u16 {
        bus.write_byte(0xC000 + i, i as u8);
    }
    bus.write_byte(0xFF51, 0xC0);
    bus.write_byte(0xFF52, 0x00);
    bus.write_byte(0xFF53, 0x00);
    bus.write_byte(0xFF54, 0x40);
    bus.write_byte(0xFF55, 0x01); // 2 blocks, general purpose
    assert_eq!(bus.read_byte(0xFF55), 0xFF, "transfer finished");
    for i in 0..32u16 {
        assert_eq!(bus.read_byte(0x8040 + i), i as u8);
    }
}

#[test]
fn hblank_hdma_moves_one_block_per_hblank() {
    let mut bus = cgb_bus();
    for i in 0..64u16 {
        bus.write_byte(0xC000 + i, 0xA0 | (i as u8 & 0x0F));
    }
    // Restart the frame so we can count hblanks from line 0.
    while bus.ppu.ly != 0 || bus.ppu.dot != 0 {
        bus.tick_t_cycle();
    }
    bus.write_byte(0xFF51, 0xC0);
    bus.write_byte(0xFF52, 0x00);
    bus.write_byte(0xFF53, 0x00);
    bus.write_byte(0xFF54, 0x00);
    bus.write_byte(0xFF55, 0x83); // 4 blocks, hblank mode
    assert_eq!(bus.read_byte(0xFF55), 0x03, "active, 4 blocks pending");
    // One full scanline -> exactly one block moved.
    for _ in 0..456 {
        bus.tick_t_cycle();
    }
    assert_eq!(bus.read_byte(0xFF55), 0x02);
    for _ in 0..456 * 3 {
        bus.tick_t_cycle();
    }
    assert_eq!(bus.read_byte(0xFF55), 0xFF, "all blocks done");
    while bus.ppu.ly < 144 {
        bus.tick_t_cycle();
    }
    for i in 0..64u16 {
        assert_eq!(bus.read_byte(0x8000 + i), 0xA0 | (i as u8 & 0x0F));
    }
}

#[test]
fn hdma_registers_hidden_on_dmg() {
    let mut bus = dmg_bus();
    bus.write_byte(0xFF55, 0x05);
    assert_eq!(bus.read_byte(0xFF55), 0xFF);
}

#[test]
fn boot_rom_overlays_until_disabled() {
    let cart = Cartridge::from_bytes(RomBuilder::new().build(), None, false).unwrap();
    let mut boot = vec![0xED; 0x100];
    boot[0x42] = 0x24;
    let mut bus = Bus::new(cart, false, 48_000, Some(boot));
    assert_eq!(bus.read_byte(0x0042), 0x24);
    assert_eq!(bus.read_byte(0x0150), 0x00, "past the overlay: cartridge");
    bus.write_byte(0xFF50, 0x01);
    assert_ne!(bus.read_byte(0x0042), 0x24, "overlay gone");
    assert_eq!(bus.read_byte(0xFF50), 0xFF);
}

#[test]
fn cgb_boot_overlay_exposes_the_header_window() {
    let cart = Cartridge::from_bytes(RomBuilder::new().cgb().build(), None, false).unwrap();
    let boot = vec![0xED; 0x900];
    let bus = Bus::new(cart, true, 48_000, Some(boot));
    assert_eq!(bus.read_byte(0x0000), 0xED);
    assert_eq!(bus.read_byte(0x0104), 0xCE, "header window reads the cartridge logo");
    assert_eq!(bus.read_byte(0x0200), 0xED);
}

#[test]
fn joypad_interrupt_requested_on_selected_press() {
    let mut bus = dmg_bus();
    bus.write_byte(0xFF0F, 0);
    bus.write_byte(0xFF00, 0x20); // select direction row
    bus.joypad.set_button(crate::joypad::Button::Down, true);
    bus.tick_t_cycle();
    assert!(bus.read_byte(0xFF0F) & 0x10 != 0);
}
