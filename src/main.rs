//! Driver binary (spec.md §6, SPEC_FULL.md §10/§13): CLI argument parsing,
//! iNES loading, `env_logger` setup, and the 1:3 CPU/PPU tick loop. Owns the
//! one external collaborator spec.md §1 carves out of `nes-core` — the
//! window, texture blitter and event loop — by delegating to `nes-platform`'s
//! tile preview and debug view. No emulation state lives here.

mod error;
mod ines;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;

use nes_core::Console;
use nes_platform::debug_view::{hex_dump, CpuSnapshot, DebugView};
use nes_platform::tile_view::{draw_tables, render_pattern_table};
use nes_platform::{load_palette, NES_DEBUGGER_WIDTH, NES_SCREEN_HEIGHT, NES_SCREEN_SCALE, NES_SCREEN_WIDTH};

use error::NesError;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
/// nes: a faithful NES CPU/PPU timing core with a minimal debug front-end.
struct Args {
    /// Path to an iNES ROM image.
    #[clap(required = true, parse(from_os_str))]
    rom: PathBuf,

    /// Path to a .pal (palette) file for the CHR tile preview window. If
    /// omitted, a synthetic grayscale palette is used.
    #[clap(short, long, parse(from_os_str))]
    palette: Option<PathBuf>,

    /// Run the core without opening a window. The tile preview and debug
    /// overlay are unavailable; the loop runs until the CPU errors.
    #[clap(long)]
    headless: bool,

    /// Raise the log level to `debug`.
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::from_default_env().filter_level(level).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), NesError> {
    let bytes = fs::read(&args.rom)?;
    let (cartridge, info) = ines::load(&bytes)?;
    info!(
        "loaded {}: mapper {}, mirroring {:?}, PRG {} bytes, CHR {} bytes, trainer={}, battery={}, NES2.0={}",
        args.rom.display(),
        info.mapper,
        info.mirroring,
        info.prg_size,
        info.chr_size,
        info.has_trainer,
        info.has_persistent_memory,
        info.is_nes2,
    );

    let mut console = Console::new(cartridge)?;

    if args.headless {
        run_headless(&mut console)
    } else {
        run_windowed(&mut console, args)
    }
}

/// Tick the console until it errors. There is no other stopping condition —
/// a real ROM eventually hits an opcode this core doesn't implement (BRK,
/// BIT) and the loop halts there, matching spec.md §7's "surfaced; driver
/// reports the byte at PC-1 and halts".
fn run_headless(console: &mut Console) -> Result<(), NesError> {
    loop {
        console.tick()?;
    }
}

/// Synthetic fallback palette for the tile preview when no `.pal` file is
/// given: 32 entries (8 groups of 4, matching the NES background/sprite
/// palette layout) of increasingly bright gray.
fn default_palette() -> Vec<Color> {
    (0..32u32).map(|i| {
        let v = (i * 8) as u8;
        Color::RGB(v, v, v)
    }).collect()
}

/// Open a window showing the CHR ROM pattern-table tile preview (spec.md
/// §1's "tile preview stub", not full pixel composition) and an optional
/// hex-dump/register debug overlay, ticking the console once per drawn
/// frame.
fn run_windowed(console: &mut Console, args: &Args) -> Result<(), NesError> {
    let sdl_context = sdl2::init().expect("sdl2 init failed");
    let video_subsystem = sdl_context.video().expect("sdl2 video subsystem failed");
    let ttf_context = sdl2::ttf::init().map_err(|e| e.to_string()).expect("sdl2_ttf init failed");

    let mut show_debugger = args.verbose;
    let window_width = NES_SCREEN_WIDTH + NES_DEBUGGER_WIDTH;

    let window = video_subsystem
        .window("nes", window_width, NES_SCREEN_HEIGHT)
        .position_centered()
        .build()
        .expect("failed to create window");

    let mut canvas = window.into_canvas().build().expect("failed to create canvas");
    let texture_creator = canvas.texture_creator();
    let mut debug_view = DebugView::new(canvas.texture_creator(), &ttf_context);

    let palette = match &args.palette {
        Some(path) => load_palette(path.clone()),
        None => default_palette(),
    };

    let mut event_pump = sdl_context.event_pump().expect("failed to create event pump");

    'running: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } | Event::KeyDown { keycode: Some(Keycode::Escape), .. } => {
                    break 'running;
                }
                Event::KeyDown { keycode: Some(Keycode::Backquote), .. } => {
                    show_debugger = !show_debugger;
                }
                _ => {}
            }
        }

        console.tick()?;

        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();

        let left = render_pattern_table(console.chr(), 0, &palette, 0, &texture_creator);
        let right = render_pattern_table(console.chr(), 1, &palette, 0, &texture_creator);
        draw_tables(&mut canvas, &left, &right, 8, 8, NES_SCREEN_SCALE);

        if show_debugger {
            let base = console.cpu.pc;
            let mut window_bytes = [0u8; 128];
            if let Err(e) = console.mmu.read_bytes(base, &mut window_bytes, None) {
                log::warn!("debug overlay: could not read memory window at {:#06X}: {e}", base);
            }
            let dump = hex_dump(base, &window_bytes);
            let snap = CpuSnapshot {
                pc: console.cpu.pc,
                a: console.cpu.a,
                x: console.cpu.x,
                y: console.cpu.y,
                sp: console.cpu.sp,
                p: console.cpu.p(),
                ticks: console.cpu.ticks,
            };
            debug_view.render(&mut canvas, &snap, &dump);
        }

        canvas.present();
    }

    Ok(())
}
