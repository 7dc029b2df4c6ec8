//! Stubbed debugger view: a hex dump of a memory window plus a register
//! snapshot line, rendered as blitted text. Grounded in the teacher's
//! `debug_view.rs` layout (status-flag line, register line, text blit via
//! an `sdl2::ttf` font), reduced to a hex dump since the live-scrolling
//! disassembly list it drove (`nes::cpu::debug::disasm_6502` walking a
//! 21-address window) depended on internals this core does not expose the
//! same way; `nes_core::cpu::disasm` still renders the single instruction
//! at `PC` for the header line.

use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, TextureCreator, TextureQuery};
use sdl2::ttf::Sdl2TtfContext;
use sdl2::video::{Window, WindowContext};

use crate::{NES_DEBUGGER_WIDTH, NES_SCREEN_HEIGHT, NES_SCREEN_WIDTH};

/// Format `bytes` (already read by the caller from the live `Mmu`) as a
/// classic 16-columns-per-row hex dump starting at `base_addr`.
pub fn hex_dump(base_addr: u16, bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(16).enumerate() {
        out.push_str(&format!("{:04X}: ", base_addr.wrapping_add((row * 16) as u16)));
        for b in chunk {
            out.push_str(&format!("{:02X} ", b));
        }
        out.push('\n');
    }
    out
}

/// One line of CPU register state, matching the teacher's status-flag
/// rendering (`NvBbDIZC` style letters) but built from plain fields instead
/// of a live `bitflags` borrow, since the driver hands this view a snapshot.
pub struct CpuSnapshot {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub p: u8,
    pub ticks: u64,
}

fn status_line(snap: &CpuSnapshot) -> String {
    let bit = |mask: u8, set: char| if snap.p & mask != 0 { set } else { set.to_ascii_lowercase() };
    format!(
        "{}{}{}{}{}{}\nPC:{:04X} A:{:02X} X:{:02X} Y:{:02X} SP:{:02X} CYC:{}",
        bit(0b1000_0000, 'N'),
        bit(0b0100_0000, 'V'),
        bit(0b0000_1000, 'D'),
        bit(0b0000_0100, 'I'),
        bit(0b0000_0010, 'Z'),
        bit(0b0000_0001, 'C'),
        snap.pc,
        snap.a,
        snap.x,
        snap.y,
        snap.sp,
        snap.ticks,
    )
}

pub struct DebugView<'a> {
    font: sdl2::ttf::Font<'a, 'static>,
    texture_creator: TextureCreator<WindowContext>,
}

impl<'a> DebugView<'a> {
    pub fn new(texture_creator: TextureCreator<WindowContext>, ttf_context: &'a Sdl2TtfContext) -> Self {
        Self {
            font: ttf_context.load_font("debug.ttf", 16).unwrap(),
            texture_creator,
        }
    }

    /// Render the hex dump plus register snapshot into the debugger panel
    /// to the right of the main screen.
    pub fn render(&mut self, canvas: &mut Canvas<Window>, snap: &CpuSnapshot, dump: &str) {
        canvas.set_draw_color(Color::RGBA(0, 0, 255, 180));
        canvas
            .fill_rect(Rect::new(NES_SCREEN_WIDTH as i32, 0, NES_DEBUGGER_WIDTH, NES_SCREEN_HEIGHT))
            .unwrap();

        let body = format!("{}\n\n{}", status_line(snap), dump);
        let surface = self
            .font
            .render(body.as_str())
            .blended_wrapped(Color::RGBA(255, 255, 255, 255), NES_DEBUGGER_WIDTH)
            .map_err(|e| e.to_string())
            .unwrap();

        let texture = self
            .texture_creator
            .create_texture_from_surface(&surface)
            .map_err(|e| e.to_string())
            .unwrap();

        let TextureQuery { width, height, .. } = texture.query();
        let text_rect = Rect::new(NES_SCREEN_WIDTH as i32 + 10, 10, width, height);
        canvas.copy(&texture, None, Some(text_rect)).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_formats_rows_of_sixteen() {
        let bytes: Vec<u8> = (0..32).collect();
        let dump = hex_dump(0x0200, &bytes);
        let mut lines = dump.lines();
        assert_eq!(lines.next().unwrap().starts_with("0200: "), true);
        assert_eq!(lines.next().unwrap().starts_with("0210: "), true);
    }

    #[test]
    fn status_line_renders_set_and_clear_flags() {
        let snap = CpuSnapshot {
            pc: 0xC000,
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            p: 0b1000_0100, // N and I set
            ticks: 0,
        };
        let line = status_line(&snap);
        assert!(line.starts_with("Nvdizc\n") || line.starts_with("NvdIzc\n"));
    }
}
