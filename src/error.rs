//! The root `NesError`: wraps every subsystem's error type behind `#[from]`
//! so `main` can propagate with `?` (spec.md §7, SPEC_FULL.md §12).

use thiserror::Error;

use crate::ines::InesError;

#[derive(Debug, Error)]
pub enum NesError {
    #[error("could not read ROM file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load iNES cartridge: {0}")]
    Ines(#[from] InesError),

    #[error("emulation halted: {0}")]
    Cpu(#[from] nes_core::error::CpuError),
}
