use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::cpu::Cpu;
use crate::test_utils::program_rom;

/// Fresh DMG machine with `code` at 0x0150 and the CPU pointing at it.
fn harness(code: &[u8]) -> (Cpu, Bus) {
    let cart = Cartridge::from_bytes(program_rom(code), None, false).unwrap();
    let bus = Bus::new(cart, false, 48_000, None);
    let mut cpu = Cpu::new();
    cpu.reset_post_boot(&bus, false);
    (cpu, bus)
}

/// Execute until the spin loop after the program is reached.
fn run(code: &[u8]) -> (Cpu, Bus) {
    let (mut cpu, mut bus) = harness(code);
    let spin = 0x0150 + code.len() as u16;
    for _ in 0..10_000 {
        if cpu.m_cycle == 1 && cpu.pc == spin.wrapping_add(1) {
            return (cpu, bus);
        }
        cpu.step_m_cycle(&mut bus);
    }
    panic!("program never reached its spin loop");
}

/// Execute a fixed number of M-cycles (for programs that jump away).
fn run_m_cycles(code: &[u8], cycles: u32) -> (Cpu, Bus) {
    let (mut cpu, mut bus) = harness(code);
    for _ in 0..cycles {
        cpu.step_m_cycle(&mut bus);
    }
    (cpu, bus)
}

#[test]
fn add_sets_carry_half_and_zero() {
    let (cpu, _) = run(&[0x3E, 0x3A, 0xC6, 0xC6]); // LD A,0x3A; ADD 0xC6
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.flag_z());
    assert!(cpu.regs.flag_c());
    assert!(cpu.regs.flag_h());
    assert!(!cpu.regs.flag_n());
}

#[test]
fn adc_consumes_the_carry() {
    // ADD leaves C=1; LD A does not touch flags; ADC 0 adds it back.
    let (cpu, _) = run(&[0x3E, 0x3A, 0xC6, 0xC6, 0x3E, 0x00, 0xCE, 0x00]);
    assert_eq!(cpu.regs.a, 0x01);
    assert!(!cpu.regs.flag_c());
}

#[test]
fn sub_borrow_semantics() {
    let (cpu, _) = run(&[0x3E, 0x10, 0xD6, 0x20]); // LD A,0x10; SUB 0x20
    assert_eq!(cpu.regs.a, 0xF0);
    assert!(cpu.regs.flag_c());
    assert!(!cpu.regs.flag_h());
    assert!(cpu.regs.flag_n());
    assert!(!cpu.regs.flag_z());
}

#[test]
fn sbc_chains_the_borrow() {
    // SUB 1 from 0 -> A=0xFF, C=1; SBC 0 then subtracts the borrow.
    let (cpu, _) = run(&[0x3E, 0x00, 0xD6, 0x01, 0xDE, 0x00]);
    assert_eq!(cpu.regs.a, 0xFE);
    assert!(!cpu.regs.flag_c());
}

#[test]
fn cp_discards_the_result() {
    let (cpu, _) = run(&[0x3E, 0x42, 0xFE, 0x42]); // CP 0x42
    assert_eq!(cpu.regs.a, 0x42, "accumulator untouched");
    assert!(cpu.regs.flag_z());
    assert!(cpu.regs.flag_n());
}

#[test]
fn logic_ops_fix_their_flag_patterns() {
    let (cpu, _) = run(&[0x3E, 0xF0, 0xE6, 0x0F]); // AND 0x0F -> 0
    assert!(cpu.regs.flag_z());
    assert!(cpu.regs.flag_h());
    assert!(!cpu.regs.flag_c());
    let (cpu, _) = run(&[0x3E, 0xF0, 0xF6, 0x0F]); // OR
    assert_eq!(cpu.regs.a, 0xFF);
    assert_eq!(cpu.regs.f, 0x00);
    let (cpu, _) = run(&[0x3E, 0xFF, 0xEE, 0xFF]); // XOR -> 0
    assert_eq!(cpu.regs.f, 0x80);
}

#[test]
fn inc_and_dec_leave_carry_alone() {
    // SCF sets C; INC A through the nibble boundary keeps it.
    let (cpu, _) = run(&[0x37, 0x3E, 0x0F, 0x3C]);
    assert_eq!(cpu.regs.a, 0x10);
    assert!(cpu.regs.flag_h());
    assert!(cpu.regs.flag_c(), "C survives INC");
    // DEC B from 0 wraps and sets H/N, C still set from SCF.
    let (cpu, _) = run(&[0x37, 0x06, 0x00, 0x05]);
    assert_eq!(cpu.regs.b, 0xFF);
    assert!(cpu.regs.flag_h());
    assert!(cpu.regs.flag_n());
    assert!(cpu.regs.flag_c());
}

#[test]
fn sixteen_bit_inc_touches_no_flags() {
    let (cpu, _) = run(&[0x37, 0x01, 0xFF, 0xFF, 0x03]); // SCF; LD BC,0xFFFF; INC BC
    assert_eq!(cpu.regs.bc(), 0x0000);
    assert!(cpu.regs.flag_c(), "flags untouched by INC rr");
}

#[test]
fn add_hl_uses_bit_eleven_and_fifteen() {
    let (cpu, _) = run(&[0x21, 0xFF, 0x0F, 0x01, 0x01, 0x00, 0x09]);
    assert_eq!(cpu.regs.hl(), 0x1000);
    assert!(cpu.regs.flag_h());
    assert!(!cpu.regs.flag_c());
    assert!(!cpu.regs.flag_n());

    let (cpu, _) = run(&[0x21, 0x00, 0x80, 0x29]); // ADD HL,HL at 0x8000
    assert!(cpu.regs.flag_c());
}

#[test]
fn add_sp_flags_come_from_the_low_byte() {
    let (cpu, _) = run(&[0x31, 0x01, 0xD0, 0xE8, 0xFF]); // SP=0xD001; ADD SP,-1
    assert_eq!(cpu.sp, 0xD000);
    assert!(cpu.regs.flag_c());
    assert!(cpu.regs.flag_h());
    assert!(!cpu.regs.flag_z());
    assert!(!cpu.regs.flag_n());
}

#[test]
fn ld_hl_sp_offset_shares_the_flag_rule() {
    let (cpu, _) = run(&[0x31, 0x01, 0xD0, 0xF8, 0xFF]); // LD HL,SP-1
    assert_eq!(cpu.regs.hl(), 0xD000);
    assert_eq!(cpu.sp, 0xD001, "SP itself unchanged");
    assert!(cpu.regs.flag_c());
}

#[test]
fn daa_corrects_bcd_addition_and_subtraction() {
    let (cpu, _) = run(&[0x3E, 0x45, 0xC6, 0x38, 0x27]);
    assert_eq!(cpu.regs.a, 0x83);
    assert!(!cpu.regs.flag_c());

    let (cpu, _) = run(&[0x3E, 0x99, 0xC6, 0x01, 0x27]);
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.flag_z());
    assert!(cpu.regs.flag_c());

    let (cpu, _) = run(&[0x3E, 0x42, 0xD6, 0x13, 0x27]);
    assert_eq!(cpu.regs.a, 0x29, "BCD 42 - 13");
}

#[test]
fn accumulator_rotates_clear_z() {
    let (cpu, _) = run(&[0x3E, 0x80, 0x07]); // RLCA
    assert_eq!(cpu.regs.a, 0x01);
    assert!(cpu.regs.flag_c());
    assert!(!cpu.regs.flag_z(), "RLCA never sets Z");

    let (cpu, _) = run(&[0x3E, 0x01, 0x1F]); // RRA with C clear... C is set post-boot
    // Post-boot C=1: RRA shifts it into bit 7.
    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.flag_c());
}

#[test]
fn cb_rotates_and_shifts() {
    let (cpu, _) = run(&[0x3E, 0x81, 0xCB, 0x07]); // RLC A
    assert_eq!(cpu.regs.a, 0x03);
    assert!(cpu.regs.flag_c());

    let (cpu, _) = run(&[0x3E, 0x90, 0xCB, 0x2F]); // SRA A: sign preserved
    assert_eq!(cpu.regs.a, 0xC8);

    let (cpu, _) = run(&[0x3E, 0x90, 0xCB, 0x3F]); // SRL A
    assert_eq!(cpu.regs.a, 0x48);

    let (cpu, _) = run(&[0x3E, 0xAB, 0xCB, 0x37]); // SWAP A
    assert_eq!(cpu.regs.a, 0xBA);
    assert!(!cpu.regs.flag_c());
}

#[test]
fn cb_bit_preserves_carry() {
    let (cpu, _) = run(&[0x37, 0x3E, 0x00, 0xCB, 0x47]); // SCF; BIT 0,A
    assert!(cpu.regs.flag_z());
    assert!(cpu.regs.flag_h());
    assert!(!cpu.regs.flag_n());
    assert!(cpu.regs.flag_c());
}

#[test]
fn cb_res_and_set_on_memory() {
    let (_, bus) = run(&[
        0x21, 0x80, 0xFF, // LD HL,0xFF80
        0x36, 0xFF, // LD (HL),0xFF
        0xCB, 0x86, // RES 0,(HL)
        0xCB, 0xCE, // SET 1,(HL) (already set)
    ]);
    assert_eq!(bus.read_byte(0xFF80), 0xFE);
}

#[test]
fn ldh_addresses_the_high_page() {
    let (cpu, bus) = run(&[0x3E, 0x77, 0xE0, 0x80, 0x3E, 0x00, 0xF0, 0x80]);
    assert_eq!(bus.read_byte(0xFF80), 0x77);
    assert_eq!(cpu.regs.a, 0x77);
}

#[test]
fn stack_round_trips_every_pair() {
    let (cpu, _) = run(&[
        0x31, 0xFE, 0xFF, // LD SP,0xFFFE
        0x01, 0x22, 0x11, // LD BC
        0x11, 0x44, 0x33, // LD DE
        0x21, 0x66, 0x55, // LD HL
        0xC5, 0xD5, 0xE5, // PUSH BC,DE,HL
        0x01, 0x00, 0x00, 0x11, 0x00, 0x00, 0x21, 0x00, 0x00, // clear
        0xE1, 0xD1, 0xC1, // POP HL,DE,BC
    ]);
    assert_eq!(cpu.regs.bc(), 0x1122);
    assert_eq!(cpu.regs.de(), 0x3344);
    assert_eq!(cpu.regs.hl(), 0x5566);
    assert_eq!(cpu.sp, 0xFFFE);
}

#[test]
fn hl_autoincrement_forms_move_the_pointer() {
    let (cpu, bus) = run(&[
        0x21, 0x00, 0xC0, // LD HL,0xC000
        0x3E, 0xAA, // LD A,0xAA
        0x22, // LD (HL+),A
        0x3E, 0xBB, // LD A,0xBB
        0x32, // LD (HL-),A ... HL back to 0xC000? no: 0xC001 -> 0xC000
    ]);
    assert_eq!(bus.read_byte(0xC000), 0xAA);
    assert_eq!(bus.read_byte(0xC001), 0xBB);
    assert_eq!(cpu.regs.hl(), 0xC000);
}

#[test]
fn jp_hl_is_a_plain_jump() {
    let (cpu, _) = run_m_cycles(&[0x21, 0x00, 0x02, 0xE9], 16);
    assert!(cpu.pc >= 0x0200, "execution moved to HL");
}

#[test]
fn jr_with_negative_offset_goes_backwards() {
    // JR -4 jumps back onto the LD A,d8, looping it; A keeps 0x55.
    let (cpu, _) = run_m_cycles(&[0x3E, 0x55, 0x18, 0xFC], 64);
    assert_eq!(cpu.regs.a, 0x55);
    assert!((0x0150..0x0155).contains(&cpu.pc));
}

#[test]
fn ld_a16_sp_stores_both_bytes() {
    let (_, bus) = run(&[0x31, 0xCD, 0xAB, 0x08, 0x00, 0xC0]); // LD (0xC000),SP
    assert_eq!(bus.read_byte(0xC000), 0xCD);
    assert_eq!(bus.read_byte(0xC001), 0xAB);
}

#[test]
fn reti_sets_ime_without_delay() {
    // PUSH a return target, then RETI through it.
    let rom = program_rom(&[0x31, 0xFE, 0xFF, 0x21, 0x5A, 0x01, 0xE5, 0xD9]);
    let cart = Cartridge::from_bytes(rom, None, false).unwrap();
    let mut bus = Bus::new(cart, false, 48_000, None);
    let mut cpu = Cpu::new();
    cpu.reset_post_boot(&bus, false);
    for _ in 0..60 {
        cpu.step_m_cycle(&mut bus);
    }
    assert!(bus.interrupts.ime);
    assert!(!bus.interrupts.ei_delay);
}
