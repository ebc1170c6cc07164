/*!
oxboy runner.

Headless by default: loads a cartridge, runs a number of frames, and can
dump the final framebuffer as a PNG (`screenshot` feature) - which is
how the conformance-ROM harness captures screens to compare. With the
`display` feature an interactive minifb window maps the keyboard onto
the joypad.

Usage:
  oxboy [options] rom.gb
    --gb | --gbc        force DMG/CGB mode (default: cartridge header)
    --bios <path>       boot ROM image
    --frames <n>        headless frame budget (default 60)
    --real-rtc          drive the MBC3 clock from the host clock
    --screenshot <png>  write the last frame (needs the screenshot feature)
    --window            open a display window (needs the display feature)
*/

use std::path::PathBuf;
use std::process::ExitCode;

use oxboy::{Gameboy, ModeHint, Settings};

struct Args {
    rom: PathBuf,
    bios: Option<PathBuf>,
    mode: ModeHint,
    frames: u32,
    real_rtc: bool,
    screenshot: Option<PathBuf>,
    window: bool,
}

fn usage() -> ExitCode {
    eprintln!(
        "USAGE: oxboy [options] romFile\n\
         Options:\n\
         \x20 --gb | --gbc        force DMG/CGB mode\n\
         \x20 --bios <path>       boot ROM image\n\
         \x20 --frames <n>        frames to run headless (default 60)\n\
         \x20 --real-rtc          wall-clock RTC for MBC3 carts\n\
         \x20 --screenshot <png>  dump the final framebuffer\n\
         \x20 --window            interactive window (display feature)"
    );
    ExitCode::FAILURE
}

fn parse_args() -> Option<Args> {
    let mut args = Args {
        rom: PathBuf::new(),
        bios: None,
        mode: ModeHint::Auto,
        frames: 60,
        real_rtc: false,
        screenshot: None,
        window: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--gb" => args.mode = ModeHint::Dmg,
            "--gbc" => args.mode = ModeHint::Cgb,
            "--bios" => args.bios = Some(PathBuf::from(iter.next()?)),
            "--frames" => args.frames = iter.next()?.parse().ok()?,
            "--real-rtc" => args.real_rtc = true,
            "--screenshot" => args.screenshot = Some(PathBuf::from(iter.next()?)),
            "--window" => args.window = true,
            other if !other.starts_with("--") => args.rom = PathBuf::from(other),
            _ => return None,
        }
    }
    if args.rom.as_os_str().is_empty() {
        return None;
    }
    Some(args)
}

fn main() -> ExitCode {
    env_logger::init();
    let Some(args) = parse_args() else {
        return usage();
    };

    let boot_rom = match args.bios.as_ref().map(std::fs::read) {
        None => None,
        Some(Ok(data)) => Some(data),
        Some(Err(err)) => {
            eprintln!("error: cannot read boot ROM: {err}");
            return ExitCode::FAILURE;
        }
    };

    let settings = Settings {
        boot_rom,
        mode: args.mode,
        use_real_rtc: args.real_rtc,
        ..Settings::default()
    };
    let mut gameboy = match Gameboy::from_file(&args.rom, settings) {
        Ok(gb) => gb,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if args.window {
        return run_window(&mut gameboy);
    }

    for _ in 0..args.frames {
        gameboy.step_frame();
        if gameboy.is_locked_up() {
            eprintln!("CPU locked up after {} cycles", gameboy.cycles());
            break;
        }
    }

    if let Some(path) = args.screenshot.as_ref() {
        if let Err(err) = write_screenshot(&gameboy, path) {
            eprintln!("error: screenshot failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(err) = gameboy.request_save_ram() {
        eprintln!("warning: battery save failed: {err}");
    }
    ExitCode::SUCCESS
}

#[cfg(feature = "screenshot")]
fn write_screenshot(gameboy: &Gameboy, path: &std::path::Path) -> oxboy::Result<()> {
    use oxboy::{SCREEN_HEIGHT, SCREEN_WIDTH};
    let mut pixels = Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT * 4);
    for &px in gameboy.framebuffer().iter() {
        pixels.extend_from_slice(&px.to_le_bytes());
    }
    let image =
        image::RgbaImage::from_raw(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, pixels)
            .expect("framebuffer dimensions are fixed");
    image.save(path).map_err(|err| std::io::Error::other(err.to_string()))?;
    Ok(())
}

#[cfg(not(feature = "screenshot"))]
fn write_screenshot(_gameboy: &Gameboy, _path: &std::path::Path) -> oxboy::Result<()> {
    eprintln!("built without the screenshot feature");
    Ok(())
}

#[cfg(feature = "display")]
fn run_window(gameboy: &mut Gameboy) -> ExitCode {
    use minifb::{Key, Window, WindowOptions};
    use oxboy::{Button, SCREEN_HEIGHT, SCREEN_WIDTH};

    const KEYMAP: [(Key, Button); 8] = [
        (Key::Right, Button::Right),
        (Key::Left, Button::Left),
        (Key::Up, Button::Up),
        (Key::Down, Button::Down),
        (Key::Z, Button::A),
        (Key::X, Button::B),
        (Key::Backspace, Button::Select),
        (Key::Enter, Button::Start),
    ];

    let mut window = match Window::new(
        "oxboy",
        SCREEN_WIDTH * 3,
        SCREEN_HEIGHT * 3,
        WindowOptions::default(),
    ) {
        Ok(window) => window,
        Err(err) => {
            eprintln!("error: cannot open window: {err}");
            return ExitCode::FAILURE;
        }
    };
    window.set_target_fps(60);

    let mut buffer = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
    while window.is_open() && !window.is_key_down(Key::Escape) {
        for (key, button) in KEYMAP {
            gameboy.set_button(button, window.is_key_down(key));
        }
        gameboy.step_frame();

        // RGBA little-endian to minifb's 0RGB words.
        for (dst, &src) in buffer.iter_mut().zip(gameboy.framebuffer().iter()) {
            let [r, g, b, _] = src.to_le_bytes();
            *dst = (r as u32) << 16 | (g as u32) << 8 | b as u32;
        }
        if let Err(err) = window.update_with_buffer(&buffer, SCREEN_WIDTH, SCREEN_HEIGHT) {
            eprintln!("error: window update failed: {err}");
            return ExitCode::FAILURE;
        }
    }
    let _ = gameboy.request_save_ram();
    ExitCode::SUCCESS
}

#[cfg(not(feature = "display"))]
fn run_window(_gameboy: &mut Gameboy) -> ExitCode {
    eprintln!("built without the display feature");
    ExitCode::FAILURE
}
