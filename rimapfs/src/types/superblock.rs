// SPDX-License-Identifier: MIT

use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::ObjPhys;
use crate::constant::*;

/// Container superblock (nx_superblock_t), up to and including the volume OID array.
#[derive(Debug, Clone, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct NxSuperblock {
    pub o: ObjPhys,
    pub magic: U32,
    pub block_size: U32,
    pub block_count: U64,
    pub features: U64,
    pub readonly_compatible_features: U64,
    pub incompatible_features: U64,
    pub uuid: [u8; 16],
    pub next_oid: U64,
    pub next_xid: U64,
    pub xp_desc_blocks: U32,
    pub xp_data_blocks: U32,
    pub xp_desc_base: U64,
    pub xp_data_base: U64,
    pub xp_desc_next: U32,
    pub xp_data_next: U32,
    pub xp_desc_index: U32,
    pub xp_desc_len: U32,
    pub xp_data_index: U32,
    pub xp_data_len: U32,
    pub spaceman_oid: U64,
    pub omap_oid: U64,
    pub reaper_oid: U64,
    pub test_type: U32,
    pub max_file_systems: U32,
    pub fs_oid: [U64; NX_MAX_FILE_SYSTEMS],
}

impl NxSuperblock {
    #[inline]
    pub fn checkpoint_desc_blocks(&self) -> u32 {
        self.xp_desc_blocks.get() & NX_XP_DESC_BLOCKS_MASK
    }

    /// Non-zero volume OIDs, with their slot index.
    pub fn volume_oids(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.fs_oid
            .iter()
            .map(|oid| oid.get())
            .enumerate()
            .filter(|&(_, oid)| oid != 0)
    }
}

/// Volume superblock (apfs_superblock_t), up to and including the role.
#[derive(Debug, Clone, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ApfsSuperblock {
    pub o: ObjPhys,
    pub magic: U32,
    pub fs_index: U32,
    pub features: U64,
    pub readonly_compatible_features: U64,
    pub incompatible_features: U64,
    pub unmount_time: U64,
    pub fs_reserve_block_count: U64,
    pub fs_quota_block_count: U64,
    pub fs_alloc_count: U64,
    pub meta_crypto: [u8; 20],
    pub root_tree_type: U32,
    pub extentref_tree_type: U32,
    pub snap_meta_tree_type: U32,
    pub omap_oid: U64,
    pub root_tree_oid: U64,
    pub extentref_tree_oid: U64,
    pub snap_meta_tree_oid: U64,
    pub revert_to_xid: U64,
    pub revert_to_sblock_oid: U64,
    pub next_obj_id: U64,
    pub num_files: U64,
    pub num_directories: U64,
    pub num_symlinks: U64,
    pub num_other_fsobjects: U64,
    pub num_snapshots: U64,
    pub total_blocks_alloced: U64,
    pub total_blocks_freed: U64,
    pub vol_uuid: [u8; 16],
    pub last_mod_time: U64,
    pub fs_flags: U64,
    pub formatted_by: [u8; 48],
    pub modified_by: [u8; 384],
    pub volname: [u8; APFS_VOLNAME_LEN],
    pub next_doc_id: U32,
    pub role: U16,
    pub reserved: U16,
}

impl ApfsSuperblock {
    /// Volume name up to the first NUL.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .volname
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(APFS_VOLNAME_LEN);
        &self.volname[..end]
    }

    #[inline]
    pub fn is_case_insensitive(&self) -> bool {
        self.incompatible_features.get() & APFS_INCOMPAT_CASE_INSENSITIVE != 0
    }

    /// Case- or normalization-insensitive volumes store hashed directory keys.
    pub fn uses_hashed_names(&self) -> bool {
        self.incompatible_features.get()
            & (APFS_INCOMPAT_CASE_INSENSITIVE | APFS_INCOMPAT_NORMALIZATION_INSENSITIVE)
            != 0
    }
}

const _: () = assert!(core::mem::size_of::<NxSuperblock>() == 984);
const _: () = assert!(core::mem::offset_of!(NxSuperblock, omap_oid) == 160);
const _: () = assert!(core::mem::offset_of!(ApfsSuperblock, omap_oid) == 128);
const _: () = assert!(core::mem::offset_of!(ApfsSuperblock, volname) == 704);
const _: () = assert!(core::mem::offset_of!(ApfsSuperblock, role) == 964);
