use thiserror::Error;

/// Errors raised by the [`crate::mem::Mmu`] address-decoding contract.
///
/// The MMU never retries or logs on these paths (spec §4.1); it hands them
/// straight back to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MmuError {
    #[error("no mapped region contains address {0:#06X}")]
    UnmappedMemory(u16),

    #[error("region [{start:#06X}, {end:#06X}) overlaps an already-mapped region")]
    MemoryAlreadyMapped { start: u16, end: u32 },

    #[error("attempted write to read-only region at {0:#06X}")]
    WritingROMemory(u16),
}

/// Fatal PPU conditions (spec §4.2, §7). These model developer-visible
/// programming errors in the ROM/emulator interaction and are never
/// recovered — the driver logs and aborts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PpuError {
    #[error("OAMDATA access is not modeled (addr {0:#06X})")]
    OamAccessUnimplemented(u16),

    #[error("OAMDMA access is not modeled")]
    OamDmaUnimplemented,

    #[error("PPUDATA read is not modeled")]
    PpuDataReadUnimplemented,

    #[error("PPUDATA accessed at vram {0:#06X} while rendering is enabled and VBLANK is inactive")]
    RenderingOnVramAccess(u16),

    #[error("{port} latch violation: expected the {expected} half to be clear")]
    LatchViolation {
        port: &'static str,
        expected: &'static str,
    },
}

/// Errors raised by [`crate::cpu::Cpu::tick`].
#[derive(Debug, Error)]
pub enum CpuError {
    #[error(transparent)]
    Mmu(#[from] MmuError),

    #[error(transparent)]
    Ppu(#[from] PpuError),

    #[error("instruction not recognised: opcode {0:#04X} at PC={1:#06X}")]
    UnknownOpcode(u8, u16),

    #[error("opcode {0:#04X} ({1}) has no handler implemented")]
    UnimplementedOperation(u8, &'static str),

    #[error("handler produced a store value but no address was resolved")]
    NullAddress,
}

/// Errors raised while constructing a [`crate::cartridge::Cartridge`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("unsupported mapper: {0}")]
    UnsupportedMapper(u8),
}
