// SPDX-License-Identifier: MIT

//! Sector-addressed helpers on top of `RimIO`, so GPT code can speak in LBAs.

use rimio::prelude::*;

/// Byte offset of `lba`, rejecting overflow instead of wrapping.
#[inline]
pub(crate) fn lba_offset(lba: u64, sector_size: u64) -> RimIOResult<u64> {
    lba.checked_mul(sector_size).ok_or(RimIOError::OutOfBounds)
}

pub trait RimIOLbaExt: RimIO {
    #[inline]
    fn read_struct_lba<T>(&mut self, lba: u64, sector_size: u64) -> RimIOResult<T>
    where
        T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable,
    {
        let off = lba_offset(lba, sector_size)?;
        self.read_struct::<T>(off)
    }

    #[inline]
    fn write_struct_lba<T>(&mut self, lba: u64, sector_size: u64, val: &T) -> RimIOResult
    where
        T: zerocopy::IntoBytes + zerocopy::Immutable,
    {
        let off = lba_offset(lba, sector_size)?;
        self.write_struct::<T>(off, val)
    }
}

impl<T: RimIO + ?Sized> RimIOLbaExt for T {}
