// SPDX-License-Identifier: MIT

//! GUID Partition Table: on-disk layout, header validation, entry scan and a
//! minimal writer (primary + backup) used to build partitioned images.

use crate::guids::GptPartitionKind;
use crate::{errors::*, io_ext::RimIOLbaExt, io_ext::lba_offset};
use rimio::prelude::*;
use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const GPT_ENTRY_SIZE: usize = 128;
pub const GPT_PRIMARY_HEADER_LBA: u64 = 1;
pub const GPT_PRIMARY_ENTRIES_LBA: u64 = 2;
pub const GPT_DEFAULT_NUM_ENTRIES: u32 = 128;
pub const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";
pub const GPT_REVISION: u32 = 0x0001_0000;
pub const GPT_HEADER_SIZE: u32 = 92;

const GPT_MAX_ENTRIES: u32 = 16_384;
const GPT_MAX_ENTRY_SIZE: u32 = 512;

pub fn encode_gpt_name(name: &str) -> [U16; 36] {
    let mut buf = [U16::ZERO; 36];
    for (i, c) in name.encode_utf16().take(36).enumerate() {
        buf[i] = U16::new(c);
    }
    buf
}

#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct GptEntry {
    pub type_guid: [u8; 16],
    pub unique_guid: [u8; 16],
    pub start_lba: U64,
    pub end_lba: U64,
    pub attributes: U64,
    pub name: [U16; 36],
}

impl GptEntry {
    pub fn new(
        type_guid: [u8; 16],
        unique_guid: [u8; 16],
        start_lba: u64,
        end_lba: u64,
        name: &str,
    ) -> Self {
        Self {
            type_guid,
            unique_guid,
            start_lba: U64::new(start_lba),
            end_lba: U64::new(end_lba),
            attributes: U64::ZERO,
            name: encode_gpt_name(name),
        }
    }

    /// An all-zero type GUID marks an unused slot; the table ends there.
    #[inline]
    pub fn is_unused(&self) -> bool {
        self.type_guid.iter().all(|&b| b == 0)
    }

    #[inline]
    pub fn kind(&self) -> GptPartitionKind {
        GptPartitionKind::from_guid(&self.type_guid)
    }

    /// Absolute byte offset of the first sector of this partition.
    pub fn byte_offset(&self, sector_size: u64) -> PartResult<u64> {
        self.start_lba
            .get()
            .checked_mul(sector_size)
            .ok_or(PartError::Invalid("GPT: partition start overflows"))
    }
}

#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct GptHeader {
    pub signature: [u8; 8],
    pub revision: U32,
    pub header_size: U32,
    pub header_crc: U32,
    pub reserved: U32,
    pub current_lba: U64,
    pub backup_lba: U64,
    pub first_usable_lba: U64,
    pub last_usable_lba: U64,
    pub disk_guid: [u8; 16],
    pub entries_lba: U64,
    pub num_entries: U32,
    pub entry_size: U32,
    pub entries_crc: U32,
    pub reserved2: [u8; 420],
}

impl GptHeader {
    pub fn new_primary(
        total_sectors: u64,
        disk_guid: [u8; 16],
        num_entries: u32,
        sector_size: u64,
    ) -> PartResult<Self> {
        let entries_sectors = (num_entries as u64 * GPT_ENTRY_SIZE as u64).div_ceil(sector_size);
        let first_usable_lba = GPT_PRIMARY_ENTRIES_LBA + entries_sectors;
        let last_usable_lba = total_sectors
            .checked_sub(2 + entries_sectors)
            .ok_or(PartError::Other("GPT: disk too small (headers/tables)"))?;
        if first_usable_lba > last_usable_lba {
            return Err(PartError::Other("GPT: disk too small (headers/tables)"));
        }

        Ok(Self {
            signature: *GPT_SIGNATURE,
            revision: U32::new(GPT_REVISION),
            header_size: U32::new(GPT_HEADER_SIZE),
            header_crc: U32::ZERO,
            reserved: U32::ZERO,
            current_lba: U64::new(GPT_PRIMARY_HEADER_LBA),
            backup_lba: U64::new(total_sectors - 1),
            first_usable_lba: U64::new(first_usable_lba),
            last_usable_lba: U64::new(last_usable_lba),
            disk_guid,
            entries_lba: U64::new(GPT_PRIMARY_ENTRIES_LBA),
            num_entries: U32::new(num_entries),
            entry_size: U32::new(GPT_ENTRY_SIZE as u32),
            entries_crc: U32::ZERO,
            reserved2: [0u8; 420],
        })
    }

    pub fn validate_header(&self) -> PartResult<()> {
        if &self.signature != GPT_SIGNATURE {
            return Err(PartError::NotFound);
        }
        let entry_size = self.entry_size.get();
        if (entry_size as usize) < GPT_ENTRY_SIZE || entry_size > GPT_MAX_ENTRY_SIZE {
            return Err(PartError::Invalid("GPT: invalid entry_size"));
        }
        if self.num_entries.get() > GPT_MAX_ENTRIES {
            return Err(PartError::Invalid("GPT: num_entries out of range"));
        }
        Ok(())
    }

    /// CRC32 over the first `header_size` bytes with the CRC field zeroed.
    pub fn compute_header_crc32(&self) -> u32 {
        let mut copy = *self;
        copy.header_crc = U32::ZERO;
        let len = (copy.header_size.get() as usize).clamp(GPT_HEADER_SIZE as usize, 512);
        crc32fast::hash(&copy.as_bytes()[..len])
    }

    /// Checks both CRCs against the table currently on disk.
    pub fn validate_crc<IO: RimIO + ?Sized>(&self, io: &mut IO, sector_size: u64) -> PartResult<()> {
        if self.compute_header_crc32() != self.header_crc.get() {
            return Err(PartError::Invalid("GPT: header CRC mismatch"));
        }
        if compute_entries_crc32(io, self, sector_size)? != self.entries_crc.get() {
            return Err(PartError::Invalid("GPT: entries CRC mismatch"));
        }
        Ok(())
    }

    fn entry_offset(&self, index: u32, sector_size: u64) -> PartResult<u64> {
        let base = lba_offset(self.entries_lba.get(), sector_size)?;
        (index as u64)
            .checked_mul(self.entry_size.get() as u64)
            .and_then(|o| o.checked_add(base))
            .ok_or(PartError::Invalid("GPT: entry offset overflows"))
    }
}

fn compute_entries_crc32<IO: RimIO + ?Sized>(
    io: &mut IO,
    hdr: &GptHeader,
    sector_size: u64,
) -> PartResult<u32> {
    let entry_size = hdr.entry_size.get() as usize;
    let mut slot = [0u8; GPT_MAX_ENTRY_SIZE as usize];
    let mut hasher = crc32fast::Hasher::new();
    for i in 0..hdr.num_entries.get() {
        let off = hdr.entry_offset(i, sector_size)?;
        io.read_at(off, &mut slot[..entry_size])?;
        hasher.update(&slot[..entry_size]);
    }
    Ok(hasher.finalize())
}

/// Reads and validates the primary header at LBA 1.
///
/// A missing `EFI PART` signature is reported as `PartError::NotFound`.
pub fn read_gpt_header<IO: RimIO + ?Sized>(io: &mut IO, sector_size: u64) -> PartResult<GptHeader> {
    let hdr: GptHeader = io.read_struct_lba(GPT_PRIMARY_HEADER_LBA, sector_size)?;
    hdr.validate_header()?;
    Ok(hdr)
}

/// Linear scan of the entry table for the first entry of `type_guid`.
///
/// Entries are read one by one (`entry_size` stride, only the leading 128 bytes are
/// interpreted) and the scan stops at the first unused slot.
pub fn find_partition<IO: RimIO + ?Sized>(
    io: &mut IO,
    type_guid: &[u8; 16],
    sector_size: u64,
) -> PartResult<GptEntry> {
    let hdr = read_gpt_header(io, sector_size)?;
    for i in 0..hdr.num_entries.get() {
        let entry: GptEntry = io.read_struct(hdr.entry_offset(i, sector_size)?)?;
        if entry.type_guid == *type_guid {
            return Ok(entry);
        }
        if entry.is_unused() {
            break;
        }
    }
    Err(PartError::NotFound)
}

/// Byte offset of the first partition of `type_guid`.
pub fn find_partition_offset<IO: RimIO + ?Sized>(
    io: &mut IO,
    type_guid: &[u8; 16],
    sector_size: u64,
) -> PartResult<u64> {
    find_partition(io, type_guid, sector_size)?.byte_offset(sector_size)
}

fn write_entries<IO: RimIO + ?Sized>(
    io: &mut IO,
    hdr: &GptHeader,
    entries: &[GptEntry],
    sector_size: u64,
) -> PartResult<()> {
    let blank = GptEntry::new_zeroed();
    for i in 0..hdr.num_entries.get() {
        let entry = entries.get(i as usize).unwrap_or(&blank);
        io.write_struct(hdr.entry_offset(i, sector_size)?, entry)?;
    }
    Ok(())
}

/// Writes a primary and backup GPT describing `entries` (protective MBR not included).
pub fn write_gpt<IO: RimIO + ?Sized>(
    io: &mut IO,
    entries: &[GptEntry],
    total_sectors: u64,
    disk_guid: [u8; 16],
    sector_size: u64,
) -> PartResult<()> {
    if entries.len() > GPT_DEFAULT_NUM_ENTRIES as usize {
        return Err(PartError::Invalid("GPT: too many entries"));
    }
    let mut primary =
        GptHeader::new_primary(total_sectors, disk_guid, GPT_DEFAULT_NUM_ENTRIES, sector_size)?;
    write_entries(io, &primary, entries, sector_size)?;
    primary.entries_crc = U32::new(compute_entries_crc32(io, &primary, sector_size)?);
    primary.header_crc = U32::new(primary.compute_header_crc32());
    io.write_struct_lba(GPT_PRIMARY_HEADER_LBA, sector_size, &primary)?;

    let mut backup = primary;
    backup.current_lba = U64::new(total_sectors - 1);
    backup.backup_lba = U64::new(GPT_PRIMARY_HEADER_LBA);
    backup.entries_lba = U64::new(primary.last_usable_lba.get() + 1);
    write_entries(io, &backup, entries, sector_size)?;
    backup.header_crc = U32::new(backup.compute_header_crc32());
    io.write_struct_lba(total_sectors - 1, sector_size, &backup)?;

    io.flush()?;
    Ok(())
}
