//! The memory management unit: address decoding, mirroring, write
//! protection and memory-mapped I/O callbacks (spec §4.1).
//!
//! A [`Mmu`] owns a flat list of [`MemRegion`]s. Regions are appended with
//! [`Mmu::map`], then [`Mmu::sort`] orders them by start address so lookups
//! can binary search. The list is read-only from then on.

use log::debug;

use crate::error::{CpuError, MmuError};
use crate::ppu::Ppu;

/// One mapped region of the 16-bit CPU address space.
///
/// `end` is exclusive and may equal `0x10000` (the full address space), so
/// it is widened to `u32` to stay representable.
struct MemRegion {
    start: u16,
    end: u32,
    backing: Vec<u8>,
    writable: bool,
    /// Whether CPU accesses to this region should be routed through the
    /// PPU's port callback (spec §4.2). The PPU is the only permitted
    /// listener type (spec §9) — rather than storing a context pointer and
    /// function pointer in the region (the source's self-referential
    /// approach), the driver threads a `&mut Ppu` through every read/write
    /// call and the region just records whether it wants one.
    has_ppu_callback: bool,
}

impl MemRegion {
    fn contains(&self, addr: u16) -> bool {
        let addr = addr as u32;
        addr >= self.start as u32 && addr < self.end
    }

    fn overlaps(&self, start: u16, end: u32) -> bool {
        (start as u32) < self.end && end > self.start as u32
    }

    fn offset(&self, addr: u16) -> usize {
        ((addr as u32 - self.start as u32) as usize) % self.backing.len()
    }
}

#[derive(Default)]
pub struct Mmu {
    regions: Vec<MemRegion>,
}

impl Mmu {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Map `backing` over the half-open range `[start, end)`. If the range
    /// is wider than `backing`, accesses mirror modulo `backing.len()`.
    /// Fails if the range intersects any region already mapped.
    pub fn map(
        &mut self,
        start: u16,
        end: u32,
        backing: Vec<u8>,
        writable: bool,
        has_ppu_callback: bool,
    ) -> Result<(), MmuError> {
        assert!(!backing.is_empty(), "a mapped region needs backing storage");
        assert!(end as usize <= 0x1_0000, "end exceeds the 16-bit address space");

        if self.regions.iter().any(|r| r.overlaps(start, end)) {
            return Err(MmuError::MemoryAlreadyMapped { start, end });
        }

        debug!(
            "mapping [{:#06X}, {:#06X}) ({} bytes backing, writable={}, ppu_callback={})",
            start,
            end,
            backing.len(),
            writable,
            has_ppu_callback
        );

        self.regions.push(MemRegion {
            start,
            end,
            backing,
            writable,
            has_ppu_callback,
        });
        Ok(())
    }

    /// Order mapped regions by start address so [`Mmu::lookup`] can binary
    /// search. Idempotent.
    pub fn sort(&mut self) {
        self.regions.sort_by_key(|r| r.start);
    }

    fn lookup(&self, addr: u16) -> Option<usize> {
        self.regions
            .binary_search_by(|r| {
                use std::cmp::Ordering;
                if (addr as u32) < r.start as u32 {
                    Ordering::Greater
                } else if (addr as u32) >= r.end {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .ok()
    }

    /// A side-effect-free lookup used by tests to cross-check
    /// [`Mmu::lookup`]'s binary search against a linear scan.
    #[cfg(test)]
    fn lookup_linear(&self, addr: u16) -> Option<usize> {
        self.regions.iter().position(|r| r.contains(addr))
    }

    /// Canonical port address for the 0x2000-0x3FFF mirror (the 8-byte
    /// register block) and the single 0x4014 OAMDMA byte (spec §4.2).
    fn canonical_port_addr(addr: u16) -> u16 {
        if (0x2000..0x4000).contains(&addr) {
            0x2000 + (addr & 0x7)
        } else {
            addr
        }
    }

    /// Read one byte. `ppu` is consulted only when the matched region
    /// requests a callback; pass `None` for pure-memory tests that never
    /// touch a port range.
    pub fn read_byte(&mut self, addr: u16, ppu: Option<&mut Ppu>) -> Result<u8, CpuError> {
        let idx = self
            .lookup(addr)
            .ok_or(MmuError::UnmappedMemory(addr))?;

        if self.regions[idx].has_ppu_callback {
            if let Some(ppu) = ppu {
                let canonical = Self::canonical_port_addr(addr);
                return Ok(ppu.on_cpu_read(canonical)?);
            }
        }

        let region = &self.regions[idx];
        let offset = region.offset(addr);
        Ok(region.backing[offset])
    }

    pub fn write_byte(
        &mut self,
        addr: u16,
        data: u8,
        ppu: Option<&mut Ppu>,
    ) -> Result<(), CpuError> {
        let idx = self
            .lookup(addr)
            .ok_or(MmuError::UnmappedMemory(addr))?;

        if !self.regions[idx].writable {
            return Err(CpuError::Mmu(MmuError::WritingROMemory(addr)));
        }

        {
            let region = &mut self.regions[idx];
            let offset = region.offset(addr);
            region.backing[offset] = data;
        }

        if self.regions[idx].has_ppu_callback {
            if let Some(ppu) = ppu {
                let canonical = Self::canonical_port_addr(addr);
                ppu.on_cpu_write(canonical, data)?;
            }
        }

        Ok(())
    }

    /// Read `buf.len()` consecutive bytes starting at `addr`, wrapping the
    /// address at the 16-bit boundary. Mirroring at region boundaries is
    /// preserved because each byte goes through [`Mmu::read_byte`].
    pub fn read_bytes(
        &mut self,
        addr: u16,
        buf: &mut [u8],
        mut ppu: Option<&mut Ppu>,
    ) -> Result<(), CpuError> {
        for (i, slot) in buf.iter_mut().enumerate() {
            let a = addr.wrapping_add(i as u16);
            *slot = self.read_byte(a, ppu.as_deref_mut())?;
        }
        Ok(())
    }

    /// Convenience little-endian word read used throughout the CPU core.
    pub fn read_word(&mut self, addr: u16, mut ppu: Option<&mut Ppu>) -> Result<u16, CpuError> {
        let lo = self.read_byte(addr, ppu.as_deref_mut())?;
        let hi = self.read_byte(addr.wrapping_add(1), ppu)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_a_small_backing_buffer_over_a_larger_range() {
        let mut mmu = Mmu::new();
        mmu.map(0x120, 0x140, (0..16u8).collect(), true, false)
            .unwrap();
        mmu.sort();

        assert_eq!(mmu.read_byte(0x13F, None).unwrap(), 0x0F);
        assert_eq!(mmu.read_byte(0x137, None).unwrap(), 0x07);
        assert_eq!(mmu.read_byte(0x13C, None).unwrap(), 0x0C);
    }

    #[test]
    fn rejects_overlapping_maps() {
        let mut mmu = Mmu::new();
        mmu.map(0x120, 0x140, vec![0; 16], true, false).unwrap();
        let err = mmu.map(0x110, 0x130, vec![0; 16], true, false).unwrap_err();
        assert_eq!(
            err,
            MmuError::MemoryAlreadyMapped {
                start: 0x110,
                end: 0x130
            }
        );
    }

    #[test]
    fn unmapped_reads_fail() {
        let mut mmu = Mmu::new();
        mmu.map(0, 0x10, vec![0; 0x10], true, false).unwrap();
        mmu.sort();
        assert!(matches!(
            mmu.read_byte(0x20, None).unwrap_err(),
            CpuError::Mmu(MmuError::UnmappedMemory(0x20))
        ));
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut mmu = Mmu::new();
        mmu.map(0, 0x10, vec![0; 0x10], true, false).unwrap();
        mmu.sort();
        mmu.write_byte(5, 0x42, None).unwrap();
        assert_eq!(mmu.read_byte(5, None).unwrap(), 0x42);
    }

    #[test]
    fn read_only_region_rejects_writes() {
        let mut mmu = Mmu::new();
        mmu.map(0, 0x10, vec![0; 0x10], false, false).unwrap();
        mmu.sort();
        let err = mmu.write_byte(0, 1, None).unwrap_err();
        assert!(matches!(err, CpuError::Mmu(MmuError::WritingROMemory(0))));
    }

    #[test]
    fn binary_search_agrees_with_linear_scan() {
        let mut mmu = Mmu::new();
        mmu.map(0x8000, 0x10000, vec![0; 0x8000], false, false)
            .unwrap();
        mmu.map(0, 0x2000, vec![0; 0x800], true, false).unwrap();
        mmu.map(0x2000, 0x4000, vec![0; 8], true, true).unwrap();
        mmu.sort();

        for addr in [0u16, 0x7FF, 0x1FFF, 0x2000, 0x3FFF, 0x8000, 0xFFFF] {
            assert_eq!(
                mmu.lookup(addr),
                mmu.lookup_linear(addr),
                "addr {:#06X}",
                addr
            );
        }
    }
}
