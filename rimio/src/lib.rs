// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

// Core modules
pub mod errors;
#[macro_use]
mod macros;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std_io;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::RimIO;
    pub use super::RimIOExt;
    pub use super::RimIOStructExt;
    pub use super::errors::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemRimIO;

    #[cfg(feature = "std")]
    pub use super::std_io::StdRimIO;
}

// Internal use
use errors::*;

// Constants

/// Size of the stack scratch buffer used by struct reads.
/// 4 KiB = smallest APFS block and the usual page size.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Block IO abstraction trait.
///
/// Every offset is relative to the current partition offset, so a caller that
/// located a container inside a partitioned image can keep addressing it from 0.
/// Implementations may target RAM, files, block devices, etc.
pub trait RimIO {
    /// Writes `data` at `offset` (relative to the partition offset).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> RimIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (relative to the partition offset).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> RimIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> RimIOResult;

    /// Sets the absolute byte offset that all subsequent offsets are relative to.
    fn set_offset(&mut self, partition_offset: u64) -> u64;

    fn partition_offset(&self) -> u64;
}

/// Byte offset of block `index` for a given block size, overflow-checked.
#[inline]
pub fn block_offset(index: u64, block_size: u32) -> RimIOResult<u64> {
    index
        .checked_mul(block_size as u64)
        .ok_or(RimIOError::OutOfBounds)
}

/// Extension helpers for RimIO.
///
/// - block-addressed reads/writes (`index * block_size`)
/// - little-endian primitive reads/writes (read_u32_at, write_u64_at, ...)
pub trait RimIOExt: RimIO {
    /// Reads one block of `buf.len()` bytes at block `index`.
    #[inline]
    fn read_block_at(&mut self, index: u64, block_size: u32, buf: &mut [u8]) -> RimIOResult {
        if buf.len() != block_size as usize {
            return Err(RimIOError::Invalid("read_block_at: buffer length mismatch"));
        }
        let offset = block_offset(index, block_size)?;
        self.read_at(offset, buf)
    }

    /// Writes one block of `data.len()` bytes at block `index`.
    #[inline]
    fn write_block_at(&mut self, index: u64, block_size: u32, data: &[u8]) -> RimIOResult {
        if data.len() != block_size as usize {
            return Err(RimIOError::Invalid("write_block_at: buffer length mismatch"));
        }
        let offset = block_offset(index, block_size)?;
        self.write_at(offset, data)
    }

    // Implements read/write helpers for primitive types (u16, u32, u64)
    rimio_impl_primitive_rw!(u16, u32, u64);
}

impl<T: RimIO + ?Sized> RimIOExt for T {}

/// Extension trait for reading and writing structs using zerocopy.
///
/// Provides helpers to read a struct from a given offset and write a struct at a given offset.
/// Requires the struct to implement zerocopy traits for safe conversion.
pub trait RimIOStructExt: RimIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> RimIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(RimIOError::Invalid("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| RimIOError::Other("read_struct failed"))
    }

    /// Writes a struct of type `T` at the given offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> RimIOResult {
        self.write_at(offset, val.as_bytes())
    }
}

impl<T: RimIO + ?Sized> RimIOStructExt for T {}
