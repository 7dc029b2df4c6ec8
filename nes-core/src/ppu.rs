//! The PPU timing core: scanline/cycle counter, VBLANK, NMI generation and
//! the 8 memory-mapped ports (spec §4.2).
//!
//! This models timing and port semantics only. Pixel composition of
//! backgrounds and sprites is a non-goal (spec.md §1) — a tile preview stub
//! in `nes-platform` renders CHR ROM pattern tables directly from the
//! cartridge view instead, entirely independent of this timing state.

use bitflags::bitflags;
use log::{debug, error};

use crate::error::PpuError;

bitflags! {
    pub struct PpuCtrl: u8 {
        const BASE_NAMETABLE_LO = 0b0000_0001;
        const BASE_NAMETABLE_HI = 0b0000_0010;
        const VRAM_INCREMENT    = 0b0000_0100;
        const SPRITE_TABLE_ADDR = 0b0000_1000;
        const BG_TABLE_ADDR     = 0b0001_0000;
        const SPRITE_SIZE       = 0b0010_0000;
        const PPU_ORIENTATION   = 0b0100_0000;
        const NMI_ENABLED       = 0b1000_0000;
    }
}

bitflags! {
    pub struct PpuMask: u8 {
        const GREYSCALE       = 0b0000_0001;
        const LEFT_BACKGROUND = 0b0000_0010;
        const LEFT_SPRITES    = 0b0000_0100;
        const BACKGROUND      = 0b0000_1000;
        const SPRITES         = 0b0001_0000;
        const EMPH_RED        = 0b0010_0000;
        const EMPH_GREEN      = 0b0100_0000;
        const EMPH_BLUE       = 0b1000_0000;

        const RENDERING = Self::BACKGROUND.bits | Self::SPRITES.bits;
    }
}

bitflags! {
    pub struct PpuStatus: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_0_HIT    = 0b0100_0000;
        const VBLANK          = 0b1000_0000;
    }
}

mod port {
    pub const PPUCTRL: u16 = 0x2000;
    pub const PPUMASK: u16 = 0x2001;
    pub const PPUSTATUS: u16 = 0x2002;
    pub const OAMADDR: u16 = 0x2003;
    pub const OAMDATA: u16 = 0x2004;
    pub const PPUSCROLL: u16 = 0x2005;
    pub const PPUADDR: u16 = 0x2006;
    pub const PPUDATA: u16 = 0x2007;
    pub const OAMDMA: u16 = 0x4014;
}

/// The two boot-time tick milestones that force an early VBLANK before the
/// PPU engages its full scanline/cycle machine, modeling the NES power-on
/// delay (spec §4.2, §9). Kept as named constants rather than bare
/// literals per the design notes.
const BOOT_VBLANK_TICK: u32 = 27384;
const BOOT_READY_TICK: u32 = 57165;

pub struct Ppu {
    pub ctrl: PpuCtrl,
    pub mask: PpuMask,
    pub status: PpuStatus,
    oam_addr: u8,

    vram: Box<[u8; 0x4000]>,
    vram_addr: u16,
    addr_latch: u16,
    addr_latch_toggle: bool,

    pub ticks: u32,
    pub frame_row: u16,
    pub frame_col: u16,
    pub frame_odd: bool,
    ppu_ready: bool,
    vblank_clear: bool,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            oam_addr: 0,
            vram: Box::new([0xFF; 0x4000]),
            vram_addr: 0,
            addr_latch: 0,
            addr_latch_toggle: false,
            ticks: 0,
            frame_row: 0,
            frame_col: 0,
            frame_odd: false,
            ppu_ready: false,
            vblank_clear: false,
        }
    }

    fn vram_increment(&self) -> u16 {
        if self.ctrl.contains(PpuCtrl::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    fn rendering_enabled(&self) -> bool {
        self.mask.intersects(PpuMask::RENDERING)
    }

    /// CPU-initiated read of a port, canonicalised to its 0x2000-0x2007 (or
    /// 0x4014) address by the MMU before this is called.
    pub fn on_cpu_read(&mut self, addr: u16) -> Result<u8, PpuError> {
        match addr {
            port::PPUSTATUS => {
                let data = self.status.bits();
                if self.status.contains(PpuStatus::VBLANK) {
                    self.vblank_clear = true;
                }
                Ok(data)
            }
            port::OAMDATA => {
                error!("OAMDATA read at {:#06X} is not modeled", addr);
                Err(PpuError::OamAccessUnimplemented(addr))
            }
            port::PPUDATA => {
                if !self.status.contains(PpuStatus::VBLANK) && self.rendering_enabled() {
                    error!("PPUDATA read at vram {:#06X} while rendering", self.vram_addr);
                    return Err(PpuError::RenderingOnVramAccess(self.vram_addr));
                }
                error!("PPUDATA read is not modeled");
                Err(PpuError::PpuDataReadUnimplemented)
            }
            port::OAMDMA => {
                error!("OAMDMA read is not modeled");
                Err(PpuError::OamDmaUnimplemented)
            }
            _ => Ok(0),
        }
    }

    /// CPU-initiated write of a port, canonicalised the same way.
    pub fn on_cpu_write(&mut self, addr: u16, data: u8) -> Result<(), PpuError> {
        match addr {
            port::PPUCTRL => {
                self.ctrl = PpuCtrl::from_bits_truncate(data);
                Ok(())
            }
            port::PPUMASK => {
                self.mask = PpuMask::from_bits_truncate(data);
                Ok(())
            }
            port::PPUSTATUS => Ok(()), // writes to a read port are ignored
            port::OAMADDR => {
                self.oam_addr = data;
                Ok(())
            }
            port::OAMDATA => {
                error!("OAMDATA write at {:#06X} is not modeled", addr);
                Err(PpuError::OamAccessUnimplemented(addr))
            }
            port::PPUSCROLL => self.write_latch("PPUSCROLL", data, false),
            port::PPUADDR => self.write_latch("PPUADDR", data, true),
            port::PPUDATA => {
                if !self.status.contains(PpuStatus::VBLANK) && self.rendering_enabled() {
                    error!("PPUDATA write at vram {:#06X} while rendering", self.vram_addr);
                    return Err(PpuError::RenderingOnVramAccess(self.vram_addr));
                }
                self.vram[self.vram_addr as usize] = data;
                self.vram_addr = self.vram_addr.wrapping_add(self.vram_increment());
                Ok(())
            }
            port::OAMDMA => {
                error!("OAMDMA write is not modeled");
                Err(PpuError::OamDmaUnimplemented)
            }
            _ => Ok(()),
        }
    }

    /// Shared two-write latch logic for PPUSCROLL/PPUADDR (spec §4.2). The
    /// precondition is that the half being written is currently zero;
    /// violating it is a fatal latch error. On PPUADDR's second write,
    /// `vram_addr` is loaded from the completed latch.
    fn write_latch(&mut self, port_name: &'static str, data: u8, commits_vram_addr: bool) -> Result<(), PpuError> {
        if !self.addr_latch_toggle {
            if self.addr_latch & 0xFF00 != 0 {
                error!("{} latch violation: expected high half clear", port_name);
                return Err(PpuError::LatchViolation {
                    port: port_name,
                    expected: "high",
                });
            }
            self.addr_latch = (self.addr_latch & 0x00FF) | ((data as u16) << 8);
        } else {
            if self.addr_latch & 0x00FF != 0 {
                error!("{} latch violation: expected low half clear", port_name);
                return Err(PpuError::LatchViolation {
                    port: port_name,
                    expected: "low",
                });
            }
            self.addr_latch = (self.addr_latch & 0xFF00) | data as u16;
            if commits_vram_addr {
                self.vram_addr = self.addr_latch;
            }
        }
        self.addr_latch_toggle = !self.addr_latch_toggle;
        Ok(())
    }

    /// Advance the timing state machine by one PPU dot (spec §4.2). Three
    /// of these run per CPU tick. `nmi` is the shared flag the CPU samples
    /// before fetching its next opcode.
    pub fn tick(&mut self, nmi: &mut bool) {
        if !self.ppu_ready {
            if self.ticks == BOOT_VBLANK_TICK {
                self.status.insert(PpuStatus::VBLANK);
            }
            if self.ticks == BOOT_READY_TICK {
                self.status.insert(PpuStatus::VBLANK);
                self.ppu_ready = true;
            }
        } else {
            if self.frame_col == 0 && self.frame_odd && self.rendering_enabled() {
                self.frame_col = 1;
            }

            if self.frame_col == 1 {
                if self.frame_row == 241 {
                    self.status.insert(PpuStatus::VBLANK);
                    debug!("VBLANK set at scanline 241");
                    if self.ctrl.contains(PpuCtrl::NMI_ENABLED) {
                        *nmi = true;
                        debug!("NMI asserted");
                    }
                } else if self.frame_row == 261 {
                    self.vblank_clear = true;
                    self.status.remove(PpuStatus::SPRITE_0_HIT);
                    self.status.remove(PpuStatus::SPRITE_OVERFLOW);
                }
            }

            if self.frame_col >= 340 {
                self.frame_col = 0;
                self.frame_row += 1;
            } else {
                self.frame_col += 1;
            }

            if self.frame_row > 261 {
                self.frame_row = 0;
                self.frame_odd = !self.frame_odd;
            }
        }

        if self.vblank_clear {
            self.status.remove(PpuStatus::VBLANK);
            self.addr_latch = 0;
            self.addr_latch_toggle = false;
            self.vblank_clear = false;
        }

        self.ticks += 1;
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_ppu() -> Ppu {
        let mut ppu = Ppu::new();
        let mut nmi = false;
        for _ in 0..=BOOT_READY_TICK {
            ppu.tick(&mut nmi);
        }
        ppu
    }

    #[test]
    fn boot_milestones_force_vblank_then_ready() {
        let mut ppu = Ppu::new();
        let mut nmi = false;
        for _ in 0..BOOT_VBLANK_TICK {
            ppu.tick(&mut nmi);
        }
        assert!(ppu.status.contains(PpuStatus::VBLANK));

        for _ in BOOT_VBLANK_TICK..BOOT_READY_TICK {
            ppu.tick(&mut nmi);
        }
        assert!(ppu.ppu_ready);
    }

    #[test]
    fn vblank_and_nmi_fire_once_per_frame() {
        let mut ppu = ready_ppu();
        ppu.ctrl.insert(PpuCtrl::NMI_ENABLED);
        let mut nmi = false;

        while !(ppu.frame_row == 241 && ppu.frame_col == 1) {
            ppu.tick(&mut nmi);
        }
        assert!(ppu.status.contains(PpuStatus::VBLANK));
        assert!(nmi);
    }

    #[test]
    fn prerender_scanline_arms_vblank_clear_and_clears_sprite_flags() {
        let mut ppu = ready_ppu();
        ppu.status.insert(PpuStatus::SPRITE_0_HIT);
        ppu.status.insert(PpuStatus::SPRITE_OVERFLOW);
        let mut nmi = false;

        while !(ppu.frame_row == 261 && ppu.frame_col == 1) {
            ppu.tick(&mut nmi);
        }
        assert!(!ppu.status.contains(PpuStatus::SPRITE_0_HIT));
        assert!(!ppu.status.contains(PpuStatus::SPRITE_OVERFLOW));
    }

    #[test]
    fn ppuscroll_then_ppuaddr_latch_sequencing() {
        let mut ppu = ready_ppu();
        ppu.on_cpu_write(0x2005, 0x12).unwrap();
        ppu.on_cpu_write(0x2005, 0x34).unwrap();
        assert_eq!(ppu.addr_latch, 0x1234);

        ppu.status.insert(PpuStatus::VBLANK);
        ppu.on_cpu_read(0x2002).unwrap();
        let mut nmi = false;
        ppu.tick(&mut nmi); // applies the armed vblank_clear
        assert_eq!(ppu.addr_latch, 0);

        ppu.on_cpu_write(0x2006, 0x30).unwrap();
        ppu.on_cpu_write(0x2006, 0x00).unwrap();
        assert_eq!(ppu.vram_addr, 0x3000);
    }

    #[test]
    fn latch_violation_is_fatal() {
        let mut ppu = ready_ppu();
        ppu.on_cpu_write(0x2006, 0x12).unwrap();
        ppu.on_cpu_write(0x2006, 0x34).unwrap();
        let err = ppu.on_cpu_write(0x2006, 0x56).unwrap_err();
        assert!(matches!(err, PpuError::LatchViolation { .. }));
    }

    #[test]
    fn oamdata_access_is_fatal() {
        let mut ppu = ready_ppu();
        assert!(matches!(
            ppu.on_cpu_write(0x2004, 1),
            Err(PpuError::OamAccessUnimplemented(_))
        ));
    }
}
