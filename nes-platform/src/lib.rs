//! SDL2 window plumbing external to `nes-core`: a tile preview stub for CHR
//! ROM pattern tables and a hex-dump/register debug view. No emulation
//! state lives here — everything is read from `nes-core` snapshots handed
//! in by the driver.

extern crate sdl2;

pub const NES_SCREEN_SCALE: u32 = 2;
pub const NES_SCREEN_HEIGHT: u32 = 240 * NES_SCREEN_SCALE;
pub const NES_SCREEN_WIDTH: u32 = 256 * NES_SCREEN_SCALE;
pub const NES_DEBUGGER_WIDTH: u32 = 260;
pub const NES_PPU_INFO_HEIGHT: u32 = 200;

pub mod debug_view;
pub mod tile_view;

use log::debug;
use sdl2::pixels::Color;
use std::path::PathBuf;

/// Load a `.pal` file: a flat list of RGB triples, one per NES palette
/// index. Format is whatever the teacher's palette files use — no header,
/// just 3 bytes per entry.
pub fn load_palette(path: PathBuf) -> Vec<Color> {
    let data: Vec<u8> = std::fs::read(&path).unwrap();
    let entries: Vec<Color> = data.chunks(3).map(|c| Color::RGB(c[0], c[1], c[2])).collect();
    debug!("loaded {} palette entries from {}", entries.len(), path.display());
    entries
}
