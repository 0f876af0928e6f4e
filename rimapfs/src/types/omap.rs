// SPDX-License-Identifier: MIT

use zerocopy::byteorder::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::ObjPhys;

/// Object map header (omap_phys_t).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct OmapPhys {
    pub o: ObjPhys,
    pub flags: U32,
    pub snap_count: U32,
    pub tree_type: U32,
    pub snapshot_tree_type: U32,
    pub tree_oid: U64,
    pub snapshot_tree_oid: U64,
    pub most_recent_snap: U64,
    pub pending_revert_min: U64,
    pub pending_revert_max: U64,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct OmapKey {
    pub oid: U64,
    pub xid: U64,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct OmapVal {
    pub flags: U32,
    pub size: U32,
    pub paddr: U64,
}

const _: () = assert!(core::mem::offset_of!(OmapPhys, tree_oid) == 48);
