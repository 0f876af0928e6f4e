// SPDX-License-Identifier: MIT

//! Fletcher-64 as used in every APFS object header.
//!
//! The sum runs over the 32-bit little-endian words of `block[8..]`; the
//! checksum field itself is excluded.

use crate::constant::MAX_CKSUM_SIZE;

const FLETCHER_MOD: u64 = 0xFFFF_FFFF;

/// Stored and computed checksums of a block that failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumMismatch {
    pub stored: u64,
    pub computed: u64,
}

impl ChecksumMismatch {
    /// Attaches the block address the mismatch was found at.
    #[inline]
    pub fn at(self, addr: u64) -> crate::errors::ApfsError {
        crate::errors::ApfsError::ChecksumMismatch {
            addr,
            stored: self.stored,
            computed: self.computed,
        }
    }
}

pub fn fletcher64(block: &[u8]) -> u64 {
    let mut sum1: u64 = 0;
    let mut sum2: u64 = 0;
    let payload = block.get(MAX_CKSUM_SIZE..).unwrap_or(&[]);
    for word in payload.chunks_exact(4) {
        let w = u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as u64;
        sum1 = (sum1 + w) % FLETCHER_MOD;
        sum2 = (sum2 + sum1) % FLETCHER_MOD;
    }
    let ck_low = FLETCHER_MOD - ((sum1 + sum2) % FLETCHER_MOD);
    let ck_high = FLETCHER_MOD - ((sum1 + ck_low) % FLETCHER_MOD);
    (ck_high << 32) | ck_low
}

#[inline]
pub fn stored_checksum(block: &[u8]) -> u64 {
    let mut raw = [0u8; MAX_CKSUM_SIZE];
    let n = block.len().min(MAX_CKSUM_SIZE);
    raw[..n].copy_from_slice(&block[..n]);
    u64::from_le_bytes(raw)
}

pub fn verify_checksum(block: &[u8]) -> Result<(), ChecksumMismatch> {
    let stored = stored_checksum(block);
    let computed = fletcher64(block);
    if stored != computed {
        return Err(ChecksumMismatch { stored, computed });
    }
    Ok(())
}

/// Recomputes the checksum and stores it at offset 0. Call right before writing.
pub fn update_checksum(block: &mut [u8]) {
    let ck = fletcher64(block);
    if let Some(field) = block.get_mut(..MAX_CKSUM_SIZE) {
        field.copy_from_slice(&ck.to_le_bytes());
    }
}
