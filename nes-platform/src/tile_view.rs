//! Tile preview stub (spec.md §1's "tile preview stub" callout, detailed in
//! `SPEC_FULL.md` §15): renders CHR ROM's two 4 KiB pattern tables as a
//! static 16x16 grid of 8x8 tiles, reading straight from
//! [`nes_core::cartridge::Cartridge::chr`]. No PPU timing state is
//! consulted — this is a standalone viewer, not part of the emulation loop.

use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{Canvas, Texture, TextureAccess, TextureCreator};
use sdl2::video::{Window, WindowContext};

const TILE_SIZE: u32 = 8;
const TILES_PER_ROW: u32 = 16;
const TILES_PER_TABLE: u32 = 256;
const TABLE_PIXELS: u32 = TILE_SIZE * TILES_PER_ROW; // 128x128

/// Decode tile `index` (0-255) within `table` (0 or 1) of `chr` into 8x8
/// 2-bit palette indices, per the standard NES planar tile format: 8 bytes
/// of bitplane 0 followed by 8 bytes of bitplane 1, 16 bytes per tile.
fn decode_tile(chr: &[u8], table: usize, index: usize) -> [[u8; 8]; 8] {
    let base = table * 0x1000 + index * 16;
    let mut pixels = [[0u8; 8]; 8];
    if base + 16 > chr.len() {
        return pixels;
    }
    for row in 0..8 {
        let lo = chr[base + row];
        let hi = chr[base + 8 + row];
        for col in 0..8 {
            let bit = 7 - col;
            let lo_bit = (lo >> bit) & 1;
            let hi_bit = (hi >> bit) & 1;
            pixels[row][col] = lo_bit | (hi_bit << 1);
        }
    }
    pixels
}

/// Render one pattern table (`table` 0 or 1) as a 128x128 texture, coloring
/// each 2-bit pixel value via `palette[palette_row * 4 + value]`.
pub fn render_pattern_table<'a>(
    chr: &[u8],
    table: usize,
    palette: &[Color],
    palette_row: usize,
    texture_creator: &'a TextureCreator<WindowContext>,
) -> Texture<'a> {
    let mut buf = vec![0u8; (TABLE_PIXELS * TABLE_PIXELS * 4) as usize];

    for tile_idx in 0..TILES_PER_TABLE as usize {
        let tile = decode_tile(chr, table, tile_idx);
        let tile_x = (tile_idx as u32 % TILES_PER_ROW) * TILE_SIZE;
        let tile_y = (tile_idx as u32 / TILES_PER_ROW) * TILE_SIZE;

        for row in 0..8u32 {
            for col in 0..8u32 {
                let value = tile[row as usize][col as usize] as usize;
                let color = palette
                    .get(palette_row * 4 + value)
                    .copied()
                    .unwrap_or(Color::RGB(0, 0, 0));

                let px = tile_x + col;
                let py = tile_y + row;
                let offset = ((py * TABLE_PIXELS + px) * 4) as usize;
                buf[offset] = 0xFF; // alpha
                buf[offset + 1] = color.r;
                buf[offset + 2] = color.g;
                buf[offset + 3] = color.b;
            }
        }
    }

    let mut texture = texture_creator
        .create_texture(
            Some(PixelFormatEnum::ABGR8888),
            TextureAccess::Static,
            TABLE_PIXELS,
            TABLE_PIXELS,
        )
        .unwrap();
    texture.update(None, &buf, (TABLE_PIXELS * 4) as usize).unwrap();
    texture
}

/// Blit both pattern tables side by side, scaled up by `scale`.
pub fn draw_tables(
    canvas: &mut Canvas<Window>,
    left: &Texture,
    right: &Texture,
    origin_x: i32,
    origin_y: i32,
    scale: u32,
) {
    let size = (TABLE_PIXELS * scale) as u32;
    canvas
        .copy(left, None, Some(Rect::new(origin_x, origin_y, size, size)))
        .unwrap();
    canvas
        .copy(
            right,
            None,
            Some(Rect::new(origin_x + size as i32 + 8, origin_y, size, size)),
        )
        .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_solid_tile() {
        let mut chr = vec![0u8; 16];
        chr[0..8].fill(0xFF); // low bitplane all set, high bitplane clear -> value 1
        let tile = decode_tile(&chr, 0, 0);
        assert_eq!(tile, [[1u8; 8]; 8]);
    }

    #[test]
    fn out_of_range_tile_is_blank() {
        let chr = vec![0u8; 16];
        let tile = decode_tile(&chr, 1, 0); // table 1 starts at 0x1000, past a 16-byte buffer
        assert_eq!(tile, [[0u8; 8]; 8]);
    }
}
