// SPDX-License-Identifier: MIT

use crate::{RimIO, RimIOError, RimIOResult};

/// In-memory implementation of `RimIO`.
///
/// Useful for tests and for images that were loaded into RAM up front.
#[derive(Debug)]
pub struct MemRimIO<'a> {
    buffer: &'a mut [u8],
    partition_offset: u64,
}

impl<'a> MemRimIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(buffer: &'a mut [u8], partition_offset: u64) -> Self {
        Self {
            buffer,
            partition_offset,
        }
    }

    /// Resolves `offset..offset+len` to an absolute range inside the buffer.
    #[inline]
    fn span(&self, offset: u64, len: usize) -> RimIOResult<core::ops::Range<usize>> {
        let start = self
            .partition_offset
            .checked_add(offset)
            .ok_or(RimIOError::OutOfBounds)?;
        let end = start
            .checked_add(len as u64)
            .ok_or(RimIOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(RimIOError::OutOfBounds);
        }
        Ok(start as usize..end as usize)
    }
}

impl<'a> RimIO for MemRimIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> RimIOResult {
        let range = self.span(offset, data.len())?;
        self.buffer[range].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> RimIOResult {
        let range = self.span(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[range]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> RimIOResult {
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
