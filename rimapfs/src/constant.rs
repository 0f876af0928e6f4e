// SPDX-License-Identifier: MIT

// === Object header (obj_phys_t) ===

pub const OBJ_PHYS_SIZE: usize = 32;
pub const MAX_CKSUM_SIZE: usize = 8;

// o_type: low 16 bits = type, high 16 bits = storage class + flags
pub const OBJECT_TYPE_MASK: u32 = 0x0000_FFFF;
pub const OBJECT_TYPE_FLAGS_MASK: u32 = 0xFFFF_0000;

pub const OBJECT_TYPE_NX_SUPERBLOCK: u32 = 0x01;
pub const OBJECT_TYPE_BTREE: u32 = 0x02;
pub const OBJECT_TYPE_BTREE_NODE: u32 = 0x03;
pub const OBJECT_TYPE_OMAP: u32 = 0x0B;
pub const OBJECT_TYPE_CHECKPOINT_MAP: u32 = 0x0C;
pub const OBJECT_TYPE_FS: u32 = 0x0D;
pub const OBJECT_TYPE_FSTREE: u32 = 0x0E;

// === Container superblock (nx_superblock_t) ===

/// "NXSB" as stored on disk.
pub const NX_MAGIC: u32 = u32::from_le_bytes(*b"NXSB");
pub const NX_MAX_FILE_SYSTEMS: usize = 100;
pub const NX_MINIMUM_BLOCK_SIZE: u32 = 4096;
pub const NX_MAXIMUM_BLOCK_SIZE: u32 = 65536;

/// The high bit of nx_xp_desc_blocks flags a non-contiguous descriptor area.
pub const NX_XP_DESC_BLOCKS_MASK: u32 = 0x7FFF_FFFF;

// === Volume superblock (apfs_superblock_t) ===

/// "APSB" as stored on disk.
pub const APFS_MAGIC: u32 = u32::from_le_bytes(*b"APSB");
pub const APFS_VOLNAME_LEN: usize = 256;

pub const APFS_INCOMPAT_CASE_INSENSITIVE: u64 = 0x0000_0001;
pub const APFS_INCOMPAT_NORMALIZATION_INSENSITIVE: u64 = 0x0000_0008;

// === B-trees ===

pub const BTREE_NODE_HDR_SIZE: usize = 56;
/// btree_info_t footer, present only at the end of root nodes.
pub const BTREE_INFO_SIZE: usize = 40;

pub const KVOFF_SIZE: usize = 4;
pub const KVLOC_SIZE: usize = 8;

/// Child pointer stored in index nodes (oid_t).
pub const BTREE_CHILD_PTR_SIZE: usize = 8;

// === Object map ===

pub const OMAP_KEY_SIZE: u16 = 16;
pub const OMAP_VAL_SIZE: u16 = 16;

// === Filesystem records ===

pub const OBJ_ID_MASK: u64 = 0x0FFF_FFFF_FFFF_FFFF;
pub const OBJ_TYPE_SHIFT: u32 = 60;

pub const APFS_TYPE_INODE: u8 = 3;
pub const APFS_TYPE_DIR_REC: u8 = 9;

pub const J_DREC_LEN_MASK: u32 = 0x0000_03FF;
pub const J_DREC_HASH_MASK: u32 = 0xFFFF_FC00;
pub const J_DREC_HASH_SHIFT: u32 = 10;
/// 22-bit name hash kept in `name_len_and_hash`.
pub const DREC_NAME_HASH_MASK: u32 = 0x003F_FFFF;

pub const DREC_TYPE_MASK: u16 = 0x000F;

// === Well-known inodes ===

pub const ROOT_DIR_PARENT: u64 = 1;
pub const ROOT_DIR_INO_NUM: u64 = 2;

/// Owner and group APFS records for every file of a volume mounted with `noowners`.
pub const NOOWNERS_PLACEHOLDER_ID: u32 = 99;
