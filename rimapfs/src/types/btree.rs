// SPDX-License-Identifier: MIT

use bitflags::bitflags;
use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::ObjPhys;
use crate::constant::*;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BtreeNodeFlags: u16 {
        const ROOT = 0x0001;
        const LEAF = 0x0002;
        const FIXED_KV_SIZE = 0x0004;
        const HASHED = 0x0008;
        const NOHEADER = 0x0010;
        const CHECK_KOFF_INVAL = 0x8000;
    }
}

/// Offset/length pair relative to a node area (nloc_t).
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Nloc {
    pub off: U16,
    pub len: U16,
}

/// Table-of-contents slot of fixed-size nodes (kvoff_t).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Kvoff {
    pub k: U16,
    pub v: U16,
}

/// Table-of-contents slot of variable-size nodes (kvloc_t).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Kvloc {
    pub k: Nloc,
    pub v: Nloc,
}

/// B-tree node header (btree_node_phys_t without the data area).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BtreeNodePhys {
    pub o: ObjPhys,
    pub flags: U16,
    pub level: U16,
    pub nkeys: U32,
    pub table_space: Nloc,
    pub free_space: Nloc,
    pub key_free_list: Nloc,
    pub val_free_list: Nloc,
}

impl BtreeNodePhys {
    #[inline]
    pub fn node_flags(&self) -> BtreeNodeFlags {
        BtreeNodeFlags::from_bits_retain(self.flags.get())
    }
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BtreeInfoFixed {
    pub flags: U32,
    pub node_size: U32,
    pub key_size: U32,
    pub val_size: U32,
}

/// Footer stored in the last 40 bytes of a root node (btree_info_t).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BtreeInfo {
    pub fixed: BtreeInfoFixed,
    pub longest_key: U32,
    pub longest_val: U32,
    pub key_count: U64,
    pub node_count: U64,
}

const _: () = assert!(core::mem::size_of::<BtreeNodePhys>() == BTREE_NODE_HDR_SIZE);
const _: () = assert!(core::mem::size_of::<BtreeInfo>() == BTREE_INFO_SIZE);
const _: () = assert!(core::mem::size_of::<Kvoff>() == KVOFF_SIZE);
const _: () = assert!(core::mem::size_of::<Kvloc>() == KVLOC_SIZE);
