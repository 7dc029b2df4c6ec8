//! iNES cartridge file parsing (spec §6): an external collaborator to
//! `nes-core` per spec.md §1 — the core only ever sees an already-built
//! [`Cartridge`]. Grounded in the teacher's `nes/src/lib.rs`
//! `NESHeaderMetadata::parse_header`, generalised to also slice out the PRG
//! and CHR bytes (the teacher's binary did that slicing inline in `main`).

use thiserror::Error;

use nes_core::cartridge::{Cartridge, Mirroring};
use nes_core::error::CartridgeError;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum InesError {
    #[error("file is only {0} bytes, too short for an iNES header")]
    TooShort(usize),

    #[error("missing 'NES' + EOF magic bytes")]
    BadMagic,

    #[error("file is truncated: header declares {expected} bytes of PRG/CHR data, file has {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

/// Header fields not carried by [`Cartridge`] itself, surfaced so the driver
/// can log them (spec.md §11 "`info!` on ROM load").
pub struct InesInfo {
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub four_screen: bool,
    pub has_persistent_memory: bool,
    pub has_trainer: bool,
    pub is_nes2: bool,
    pub prg_size: usize,
    pub chr_size: usize,
}

/// Parse a complete iNES file into a [`Cartridge`] plus the header details
/// the cartridge view doesn't carry. Fails with [`InesError::Cartridge`] for
/// any mapper but 0 (spec.md §1 Non-goals, §6).
pub fn load(bytes: &[u8]) -> Result<(Cartridge, InesInfo), InesError> {
    if bytes.len() < HEADER_LEN {
        return Err(InesError::TooShort(bytes.len()));
    }
    if &bytes[0..4] != b"NES\x1A" {
        return Err(InesError::BadMagic);
    }

    let prg_banks = bytes[4] as usize;
    let chr_banks = bytes[5] as usize;
    let flags6 = bytes[6];
    let flags7 = bytes[7];

    let four_screen = flags6 & 0b0000_1000 != 0;
    let mirroring = if four_screen {
        Mirroring::FourScreen
    } else if flags6 & 0b0000_0001 != 0 {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    };
    let has_persistent_memory = flags6 & 0b0000_0010 != 0;
    let has_trainer = flags6 & 0b0000_0100 != 0;
    // NES 2.0 is identified, but (per spec.md §1 Non-goals) no NES 2.0
    // extension fields are read; mapper/mirroring decode the iNES 1.0 way
    // regardless.
    let is_nes2 = flags7 & 0b0000_1100 == 0b0000_1000;
    let mapper = (flags7 & 0xF0) | (flags6 >> 4);

    let prg_size = prg_banks * PRG_BANK_LEN;
    let chr_size = chr_banks * CHR_BANK_LEN;

    let mut offset = HEADER_LEN;
    if has_trainer {
        offset += TRAINER_LEN;
    }
    let prg_end = offset + prg_size;
    let chr_end = prg_end + chr_size;

    if bytes.len() < chr_end {
        return Err(InesError::Truncated {
            expected: chr_end,
            actual: bytes.len(),
        });
    }

    let prg = bytes[offset..prg_end].to_vec();
    let chr = bytes[prg_end..chr_end].to_vec();

    let cartridge = Cartridge::new(prg, chr, mapper, mirroring)?;

    Ok((
        cartridge,
        InesInfo {
            mapper,
            mirroring,
            four_screen,
            has_persistent_memory,
            has_trainer,
            is_nes2,
            prg_size,
            chr_size,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        h[0..4].copy_from_slice(b"NES\x1A");
        h[4] = prg_banks;
        h[5] = chr_banks;
        h[6] = flags6;
        h[7] = flags7;
        h
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = header(1, 1, 0, 0);
        bytes[0] = b'X';
        assert!(matches!(load(&bytes), Err(InesError::BadMagic)));
    }

    #[test]
    fn rejects_truncated_file() {
        let bytes = header(1, 1, 0, 0); // declares 16 KiB PRG + 8 KiB CHR, supplies none
        assert!(matches!(load(&bytes), Err(InesError::Truncated { .. })));
    }

    #[test]
    fn parses_mapper_zero_horizontal_mirroring() {
        let mut bytes = header(1, 1, 0, 0);
        bytes.extend(vec![0xEA; PRG_BANK_LEN]);
        bytes.extend(vec![0x00; CHR_BANK_LEN]);
        let (cart, info) = load(&bytes).unwrap();
        assert_eq!(cart.mapper(), 0);
        assert_eq!(info.mirroring, Mirroring::Horizontal);
        assert!(!info.has_trainer);
        assert_eq!(cart.prg().len(), PRG_BANK_LEN);
    }

    #[test]
    fn skips_trainer_block_when_present() {
        let mut bytes = header(1, 1, 0b0000_0100, 0); // trainer present
        bytes.extend(vec![0xFFu8; TRAINER_LEN]);
        let mut prg = vec![0xEA; PRG_BANK_LEN];
        prg[0] = 0x42;
        bytes.extend(prg);
        bytes.extend(vec![0x00; CHR_BANK_LEN]);

        let (cart, info) = load(&bytes).unwrap();
        assert!(info.has_trainer);
        assert_eq!(cart.prg()[0], 0x42);
    }

    #[test]
    fn rejects_unsupported_mapper() {
        let mut bytes = header(1, 1, 0, 0b0001_0000); // mapper 1 (MMC1)
        bytes.extend(vec![0xEA; PRG_BANK_LEN]);
        bytes.extend(vec![0x00; CHR_BANK_LEN]);
        assert!(matches!(load(&bytes), Err(InesError::Cartridge(_))));
    }

    #[test]
    fn four_screen_override_takes_priority_over_mirroring_bit() {
        let mut bytes = header(1, 1, 0b0000_1001, 0); // four-screen + vertical bit both set
        bytes.extend(vec![0xEA; PRG_BANK_LEN]);
        bytes.extend(vec![0x00; CHR_BANK_LEN]);
        let (_, info) = load(&bytes).unwrap();
        assert_eq!(info.mirroring, Mirroring::FourScreen);
        assert!(info.four_screen);
    }
}
