//! The cartridge view: a read-only handle onto PRG/CHR data, mapper id and
//! mirroring. Built by an external loader (the iNES reader lives in the
//! driver binary, not here) and consumed by the MMU and PPU wiring.

use crate::error::CartridgeError;

/// Nametable mirroring, as declared by the cartridge header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// Only mapper 0 (NROM) is supported; see spec.md §1 Non-goals.
pub const SUPPORTED_MAPPER: u8 = 0;

#[derive(Debug, Clone)]
pub struct Cartridge {
    prg: Vec<u8>,
    chr: Vec<u8>,
    mapper: u8,
    mirroring: Mirroring,
}

impl Cartridge {
    /// Construct a cartridge view from already-extracted PRG/CHR bytes.
    /// Fails with [`CartridgeError::UnsupportedMapper`] for anything but
    /// mapper 0.
    pub fn new(
        prg: Vec<u8>,
        chr: Vec<u8>,
        mapper: u8,
        mirroring: Mirroring,
    ) -> Result<Self, CartridgeError> {
        if mapper != SUPPORTED_MAPPER {
            return Err(CartridgeError::UnsupportedMapper(mapper));
        }
        Ok(Self {
            prg,
            chr,
            mapper,
            mirroring,
        })
    }

    pub fn prg(&self) -> &[u8] {
        &self.prg
    }

    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    pub fn mapper(&self) -> u8 {
        self.mapper
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_mappers() {
        let err = Cartridge::new(vec![0; 16384], vec![], 4, Mirroring::Horizontal).unwrap_err();
        assert_eq!(err, CartridgeError::UnsupportedMapper(4));
    }

    #[test]
    fn exposes_prg_and_chr() {
        let cart = Cartridge::new(vec![1, 2, 3], vec![4, 5], 0, Mirroring::Vertical).unwrap();
        assert_eq!(cart.prg(), &[1, 2, 3]);
        assert_eq!(cart.chr(), &[4, 5]);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
    }
}
