// SPDX-License-Identifier: MIT

use bitflags::bitflags;
use zerocopy::byteorder::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constant::*;

/// Header shared by every APFS object (obj_phys_t).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ObjPhys {
    pub cksum: U64,
    pub oid: U64,
    pub xid: U64,
    pub o_type: U32,
    pub o_subtype: U32,
}

bitflags! {
    /// Storage class and flags in the upper half of `o_type`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjStorage: u32 {
        const EPHEMERAL = 0x8000_0000;
        const PHYSICAL = 0x4000_0000;
        const NOHEADER = 0x2000_0000;
        const ENCRYPTED = 0x1000_0000;
        const NONPERSISTENT = 0x0800_0000;
    }
}

impl ObjPhys {
    #[inline]
    pub fn object_type(&self) -> u32 {
        self.o_type.get() & OBJECT_TYPE_MASK
    }

    /// Empty flags mean a virtual object.
    #[inline]
    pub fn storage(&self) -> ObjStorage {
        ObjStorage::from_bits_retain(self.o_type.get() & OBJECT_TYPE_FLAGS_MASK)
    }

    #[inline]
    pub fn is_btree_node(&self) -> bool {
        matches!(
            self.object_type(),
            OBJECT_TYPE_BTREE | OBJECT_TYPE_BTREE_NODE
        )
    }
}

const _: () = assert!(core::mem::size_of::<ObjPhys>() == OBJ_PHYS_SIZE);
