//! Core NES emulation: MMU, PPU timing, CPU interpreter, and the NROM
//! cartridge view (spec §2). No file I/O and no windowing lives here — the
//! driver binary owns the iNES loader and the platform crate owns the
//! window; this crate is a pure state machine driven one tick at a time.

pub mod cartridge;
pub mod cpu;
pub mod error;
pub mod mem;
pub mod ppu;

use cartridge::Cartridge;
use cpu::Cpu;
use error::CpuError;
use mem::Mmu;
use ppu::Ppu;

/// Number of PPU dots advanced per CPU cycle on NTSC hardware.
const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;

/// Owns the CPU, PPU, MMU and the shared NMI flag, and wires a [`Cartridge`]
/// onto the CPU address space per spec §6. This is the "driver owns
/// everything, threads mutable borrows through tick calls" shape from
/// spec §9's design notes, rather than storing context/function pointers
/// inside the MMU's region list.
pub struct Console {
    pub cpu: Cpu,
    pub ppu: Ppu,
    pub mmu: Mmu,
    nmi: bool,
    cartridge: Cartridge,
}

impl Console {
    /// Build a fully-wired console from a cartridge and run the reset
    /// sequence. Address-space layout (spec §6):
    /// - `0x0000-0x1FFF`: 2 KiB internal RAM, mirrored.
    /// - `0x2000-0x3FFF`: the 8 PPU ports, mirrored every 8 bytes, routed
    ///   through the PPU callback.
    /// - `0x4000-0x4017`: APU/IO register window, backing memory only,
    ///   except `0x4014` (OAMDMA), which is routed through the PPU callback
    ///   like the 0x2000-0x3FFF ports (spec §4.2, §6).
    /// - `0x6000-0x7FFF`: PRG-RAM. The canonical NROM layout, not the CHR
    ///   window some references use for this range (spec §9 open question,
    ///   resolved in `DESIGN.md`); CHR is exposed only via
    ///   [`Cartridge::chr`] to external consumers such as the tile preview.
    /// - `0x8000-0xFFFF`: PRG ROM, mirrored if the cartridge supplies only
    ///   16 KiB.
    pub fn new(cartridge: Cartridge) -> Result<Self, CpuError> {
        let mut mmu = Mmu::new();
        mmu.map(0x0000, 0x2000, vec![0u8; 0x800], true, false)?;
        mmu.map(0x2000, 0x4000, vec![0u8; 8], true, true)?;
        mmu.map(0x4000, 0x4014, vec![0u8; 0x14], true, false)?;
        mmu.map(0x4014, 0x4015, vec![0u8; 1], true, true)?;
        mmu.map(0x4015, 0x4018, vec![0u8; 3], true, false)?;
        mmu.map(0x6000, 0x8000, vec![0u8; 0x2000], true, false)?;
        mmu.map(0x8000, 0x10000, cartridge.prg().to_vec(), false, false)?;
        mmu.sort();

        let mut cpu = Cpu::new();
        cpu.reset(&mut mmu)?;

        Ok(Self {
            cpu,
            ppu: Ppu::new(),
            mmu,
            nmi: false,
            cartridge,
        })
    }

    /// The cartridge's CHR ROM, for the tile preview stub — entirely
    /// independent of the PPU's timing state (spec §9).
    pub fn chr(&self) -> &[u8] {
        self.cartridge.chr()
    }

    /// Advance by one CPU instruction and its matching span of PPU dots, at
    /// the fixed 1:3 NTSC ratio.
    pub fn tick(&mut self) -> Result<(), CpuError> {
        self.cpu.tick(&mut self.mmu, Some(&mut self.ppu), &mut self.nmi)?;
        for _ in 0..PPU_DOTS_PER_CPU_CYCLE {
            self.ppu.tick(&mut self.nmi);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartridge::Mirroring;

    fn test_cartridge(prg: Vec<u8>) -> Cartridge {
        Cartridge::new(prg, vec![0; 0x2000], 0, Mirroring::Horizontal).unwrap()
    }

    #[test]
    fn wires_reset_vector_from_cartridge_prg() {
        let mut prg = vec![0xEAu8; 0x4000];
        prg[0x3FFC] = 0x00; // 0xFFFC mirrors to 0x3FFC within the 16 KiB bank
        prg[0x3FFD] = 0xC0;
        let console = Console::new(test_cartridge(prg)).unwrap();
        assert_eq!(console.cpu.pc, 0xC000);
    }

    #[test]
    fn prg_ram_window_is_writable_and_distinct_from_chr() {
        let mut prg = vec![0xEAu8; 0x4000];
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0xC0;
        let mut console = Console::new(test_cartridge(prg)).unwrap();
        console.mmu.write_byte(0x6000, 0x99, None).unwrap();
        assert_eq!(console.mmu.read_byte(0x6000, None).unwrap(), 0x99);
        assert_eq!(console.chr().len(), 0x2000);
    }

    #[test]
    fn oamdma_write_through_the_mmu_is_routed_to_the_ppu_and_is_fatal() {
        let mut prg = vec![0xEAu8; 0x4000];
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0xC0;
        let mut console = Console::new(test_cartridge(prg)).unwrap();
        let err = console
            .mmu
            .write_byte(0x4014, 0x02, Some(&mut console.ppu))
            .unwrap_err();
        assert!(matches!(
            err,
            CpuError::Ppu(crate::error::PpuError::OamDmaUnimplemented)
        ));
    }

    #[test]
    fn ticking_drives_ppu_three_dots_per_cpu_cycle() {
        let mut prg = vec![0xEAu8; 0x4000]; // all NOP
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0xC0;
        let mut console = Console::new(test_cartridge(prg)).unwrap();
        console.tick().unwrap();
        assert_eq!(console.ppu.ticks, 3);
    }
}
