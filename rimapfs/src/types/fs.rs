// SPDX-License-Identifier: MIT

use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constant::*;

/// Filesystem record key header (j_key_t): 60-bit object id, 4-bit record type.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct JKey {
    pub obj_id_and_type: U64,
}

impl JKey {
    #[inline]
    pub fn new(obj_id: u64, kind: u8) -> Self {
        Self {
            obj_id_and_type: U64::new(pack_key_header(obj_id, kind)),
        }
    }

    #[inline]
    pub fn obj_id(&self) -> u64 {
        self.obj_id_and_type.get() & OBJ_ID_MASK
    }

    #[inline]
    pub fn kind(&self) -> u8 {
        (self.obj_id_and_type.get() >> OBJ_TYPE_SHIFT) as u8
    }
}

#[inline]
pub fn pack_key_header(obj_id: u64, kind: u8) -> u64 {
    ((kind as u64) << OBJ_TYPE_SHIFT) | (obj_id & OBJ_ID_MASK)
}

/// Hashed directory record key (j_drec_hashed_key_t) without the trailing name.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct JDrecHashedKey {
    pub hdr: JKey,
    pub name_len_and_hash: U32,
}

/// Plain directory record key (j_drec_key_t) without the trailing name.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct JDrecKey {
    pub hdr: JKey,
    pub name_len: U16,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct JDrecVal {
    pub file_id: U64,
    pub date_added: U64,
    pub flags: U16,
}

/// Fixed part of an inode value (j_inode_val_t) up to `pad1`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct JInodeVal {
    pub parent_id: U64,
    pub private_id: U64,
    pub create_time: U64,
    pub mod_time: U64,
    pub change_time: U64,
    pub access_time: U64,
    pub internal_flags: U64,
    pub nchildren_or_nlink: U32,
    pub default_protection_class: U32,
    pub write_generation_counter: U32,
    pub bsd_flags: U32,
    pub owner: U32,
    pub group: U32,
    pub mode: U16,
    pub pad1: U16,
}

const _: () = assert!(core::mem::offset_of!(JInodeVal, owner) == 72);
const _: () = assert!(core::mem::offset_of!(JInodeVal, group) == 76);
const _: () = assert!(core::mem::size_of::<JInodeVal>() == 84);
