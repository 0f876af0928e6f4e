// SPDX-License-Identifier: MIT

//! Locating the APFS container inside an image and block-addressed access to it.

use alloc::{vec, vec::Vec};

use log::debug;
use rimio::prelude::*;

use crate::checksum::verify_checksum;
use crate::constant::*;
use crate::errors::*;
use crate::types::{NxSuperblock, view};

/// Where the container starts in the image and how large its blocks are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerLocation {
    pub base_offset: u64,
    pub block_size: u32,
}

/// Reads `(magic, block_size)` from a block that may hold a container superblock.
fn peek_superblock(block: &[u8]) -> Option<(u32, u32)> {
    view::<NxSuperblock>(block).map(|sb| (sb.magic.get(), sb.block_size.get()))
}

/// Finds the container: either the image is a bare container (magic in its first
/// block) or it carries a GPT with an APFS partition.
///
/// Offsets are relative to the current partition offset of `io`.
pub fn locate_container<IO: RimIO + ?Sized>(io: &mut IO) -> ApfsResult<ContainerLocation> {
    let mut head = [0u8; NX_MINIMUM_BLOCK_SIZE as usize];
    io.read_at(0, &mut head)
        .map_err(|source| ApfsError::IOAt { offset: 0, source })?;

    if let Some((NX_MAGIC, block_size)) = peek_superblock(&head) {
        return Ok(ContainerLocation {
            base_offset: 0,
            block_size,
        });
    }

    let base_offset = rimpart::guids::detect_apfs_partition_offset(io)?;
    io.read_at(base_offset, &mut head)
        .map_err(|source| ApfsError::IOAt {
            offset: base_offset,
            source,
        })?;
    match peek_superblock(&head) {
        Some((NX_MAGIC, block_size)) => Ok(ContainerLocation {
            base_offset,
            block_size,
        }),
        found => Err(ApfsError::BadMagic {
            offset: base_offset,
            expected: NX_MAGIC,
            found: found.map_or(0, |(magic, _)| magic),
        }),
    }
}

pub fn validate_block_size(block_size: u32) -> ApfsResult<()> {
    ensure!(
        (NX_MINIMUM_BLOCK_SIZE..=NX_MAXIMUM_BLOCK_SIZE).contains(&block_size)
            && block_size.is_power_of_two(),
        ApfsError::InvalidBlockSize(block_size)
    );
    Ok(())
}

/// An open container: exclusive borrow of the backing IO, shifted so that block 0
/// is the first container block.
pub struct Container<'a, IO: RimIO + ?Sized> {
    io: &'a mut IO,
    location: ContainerLocation,
}

impl<'a, IO: RimIO + ?Sized> Container<'a, IO> {
    pub fn open(io: &'a mut IO) -> ApfsResult<Self> {
        let location = locate_container(io)?;
        validate_block_size(location.block_size)?;

        let absolute = io.partition_offset() + location.base_offset;
        io.set_offset(absolute);
        debug!(
            "APFS container at byte offset {} (block size {})",
            location.base_offset, location.block_size
        );
        Ok(Self { io, location })
    }

    #[inline]
    pub fn location(&self) -> ContainerLocation {
        self.location
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.location.block_size
    }

    /// Single positioned read of exactly one block.
    pub fn read_block(&mut self, addr: u64) -> ApfsResult<Vec<u8>> {
        let block_size = self.block_size();
        let mut buf = vec![0u8; block_size as usize];
        self.io
            .read_block_at(addr, block_size, &mut buf)
            .map_err(|source| ApfsError::IO { addr, source })?;
        Ok(buf)
    }

    /// Reads a block whose header fields are about to be trusted: checksum-verified.
    pub fn read_object(&mut self, addr: u64) -> ApfsResult<Vec<u8>> {
        let block = self.read_block(addr)?;
        verify_checksum(&block).map_err(|m| m.at(addr))?;
        Ok(block)
    }

    pub fn write_block(&mut self, addr: u64, data: &[u8]) -> ApfsResult<()> {
        self.io
            .write_block_at(addr, self.location.block_size, data)
            .map_err(|source| ApfsError::IO { addr, source })
    }

    pub fn flush(&mut self) -> ApfsResult<()> {
        self.io
            .flush()
            .map_err(|source| ApfsError::IO { addr: 0, source })
    }
}
