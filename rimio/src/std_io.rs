// SPDX-License-Identifier: MIT

use std::io::{Read, Seek, SeekFrom, Write};

use crate::{RimIO, RimIOError, RimIOResult};

/// `RimIO` over any `Read + Write + Seek` handle, typically a `std::fs::File`.
#[derive(Debug)]
pub struct StdRimIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    partition_offset: u64,
}

impl<'a, T: Read + Write + Seek> StdRimIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self {
            io,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(io: &'a mut T, partition_offset: u64) -> Self {
        Self {
            io,
            partition_offset,
        }
    }

    #[inline]
    fn absolute(&self, offset: u64) -> RimIOResult<u64> {
        self.partition_offset
            .checked_add(offset)
            .ok_or(RimIOError::OutOfBounds)
    }
}

impl<'a, T: Read + Write + Seek> RimIO for StdRimIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> RimIOResult {
        let abs_offset = self.absolute(offset)?;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> RimIOResult {
        let abs_offset = self.absolute(offset)?;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> RimIOResult {
        self.io.flush()?;
        Ok(())
    }

    #[inline]
    fn set_offset(&mut self, partition_offset: u64) -> u64 {
        self.partition_offset = partition_offset;
        partition_offset
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }
}
