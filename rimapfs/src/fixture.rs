// SPDX-License-Identifier: MIT

//! In-memory APFS image builder for tests.
//!
//! [`apfs_image`] lays out a small but complete container:
//!
//! ```text
//! block  0      container superblock (xid 8)
//! blocks 1..5   checkpoint area: old sb (xid 4), checkpoint map, sb (xid 8), corrupt sb (xid 99)
//! block  10/11  container omap header / leaf-only omap tree
//! block  20-22  Data volume superblock at xids 2 (garbage), 5, 9 (too new)
//! block  25     System volume superblock
//! block  30-33  volume omap header, index root, two leaves
//! block  40-43  fs tree: index root over three leaves
//! block  44     "future" copy of leaf 42 pointing foo.plist at the wrong inode
//! ```
//!
//! Filesystem content: `/Library/LaunchDaemons/foo.plist` (99:99),
//! `/Library/owned.txt` (501:20), `/bad_id` (private_id mismatch).

use alloc::{vec, vec::Vec};
use core::ops::Range;

use rimio::prelude::MemRimIO;
use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromZeros, IntoBytes};

use crate::checksum::update_checksum;
use crate::constant::*;
use crate::drec::drec_name_hash;
use crate::types::*;
use crate::volume::VolumeRole;

pub const BLOCK_SIZE: u32 = 4096;
pub const TOTAL_BLOCKS: u64 = 48;
pub const GPT_APFS_START_LBA: u64 = 40;

pub const CONTAINER_XID: u64 = 8;
pub const DATA_VOLUME_XID: u64 = 5;
/// xid of every fs tree node and omap entry below the Data volume.
pub const FS_XID: u64 = 3;

pub const DT_DIR: u16 = 4;
pub const DT_REG: u16 = 8;

pub mod addr {
    use core::ops::Range;

    pub const CHECKPOINT_AREA: Range<u64> = 1..5;
    pub const CHECKPOINT_OLD: u64 = 1;
    pub const CHECKPOINT_MAP: u64 = 2;
    pub const CHECKPOINT_LATEST: u64 = 3;
    pub const CHECKPOINT_CORRUPT: u64 = 4;
    pub const CONTAINER_OMAP: u64 = 10;
    pub const CONTAINER_OMAP_TREE: u64 = 11;
    pub const DATA_VOLUME_STALE: u64 = 20;
    pub const DATA_VOLUME: u64 = 21;
    pub const DATA_VOLUME_FUTURE: u64 = 22;
    pub const SYSTEM_VOLUME: u64 = 25;
    pub const VOLUME_OMAP: u64 = 30;
    pub const VOLUME_OMAP_ROOT: u64 = 31;
    pub const VOLUME_OMAP_LEAF_A: u64 = 32;
    pub const VOLUME_OMAP_LEAF_B: u64 = 33;
    pub const FS_ROOT: u64 = 40;
    pub const FS_LEAF_A: u64 = 41;
    pub const FS_LEAF_B: u64 = 42;
    pub const FS_LEAF_C: u64 = 43;
    pub const FS_LEAF_B_FUTURE: u64 = 44;
}

pub mod oid {
    pub const DATA_VOLUME: u64 = 1026;
    pub const SYSTEM_VOLUME: u64 = 1027;
    pub const FS_ROOT: u64 = 1028;
    pub const FS_LEAF_A: u64 = 1029;
    pub const FS_LEAF_B: u64 = 1030;
    pub const FS_LEAF_C: u64 = 1031;
    /// Listed in the container superblock but absent from the container omap.
    pub const MISSING_VOLUME: u64 = 1099;
}

pub mod ino {
    pub const ROOT: u64 = 2;
    pub const LIBRARY: u64 = 16;
    pub const LAUNCH_DAEMONS: u64 = 17;
    pub const FOO_PLIST: u64 = 18;
    pub const OWNED_TXT: u64 = 19;
    pub const BAD_ID: u64 = 20;
}

// === Raw block helpers ===

fn block_range(addr: u64) -> Range<usize> {
    let start = addr as usize * BLOCK_SIZE as usize;
    start..start + BLOCK_SIZE as usize
}

/// Stores `block` at `addr` after recomputing its checksum.
pub fn put_block(image: &mut [u8], addr: u64, mut block: Vec<u8>) {
    update_checksum(&mut block);
    image[block_range(addr)].copy_from_slice(&block);
}

/// Edits a block in place and re-seals its checksum.
pub fn rewrite_block(image: &mut [u8], addr: u64, f: impl FnOnce(&mut [u8])) {
    let block = &mut image[block_range(addr)];
    f(block);
    update_checksum(block);
}

pub fn block(image: &[u8], addr: u64) -> &[u8] {
    &image[block_range(addr)]
}

fn header(oid: u64, xid: u64, o_type: u32, o_subtype: u32) -> ObjPhys {
    ObjPhys {
        cksum: U64::ZERO,
        oid: U64::new(oid),
        xid: U64::new(xid),
        o_type: U32::new(o_type),
        o_subtype: U32::new(o_subtype),
    }
}

const PHYSICAL: u32 = ObjStorage::PHYSICAL.bits();
const EPHEMERAL: u32 = ObjStorage::EPHEMERAL.bits();

// === Superblocks ===

pub fn nx_superblock(xid: u64, block_count: u64, desc_base: u64, desc_blocks: u32) -> NxSuperblock {
    let mut sb = NxSuperblock::new_zeroed();
    sb.o = header(1, xid, OBJECT_TYPE_NX_SUPERBLOCK | EPHEMERAL, 0);
    sb.magic = U32::new(NX_MAGIC);
    sb.block_size = U32::new(BLOCK_SIZE);
    sb.block_count = U64::new(block_count);
    sb.xp_desc_base = U64::new(desc_base);
    sb.xp_desc_blocks = U32::new(desc_blocks);
    sb.max_file_systems = U32::new(NX_MAX_FILE_SYSTEMS as u32);
    sb
}

pub fn write_struct_block<T: IntoBytes + zerocopy::Immutable>(image: &mut [u8], addr: u64, value: &T) {
    let mut block = vec![0u8; BLOCK_SIZE as usize];
    let bytes = value.as_bytes();
    block[..bytes.len()].copy_from_slice(bytes);
    put_block(image, addr, block);
}

/// Image of `n_blocks` blocks whose only content is a container superblock at
/// block 0 that is also its own single-block checkpoint area.
pub fn blank_container(n_blocks: u64) -> Vec<u8> {
    let mut image = vec![0u8; (n_blocks * BLOCK_SIZE as u64) as usize];
    let sb = nx_superblock(1, n_blocks, 0, 1);
    write_struct_block(&mut image, 0, &sb);
    image
}

pub struct VolumeSpec<'a> {
    pub oid: u64,
    pub xid: u64,
    pub role: VolumeRole,
    pub name: &'a str,
    pub fs_index: u32,
    pub omap_oid: u64,
    pub root_tree_oid: u64,
    pub case_insensitive: bool,
}

pub fn apfs_superblock(spec: &VolumeSpec<'_>) -> ApfsSuperblock {
    let mut sb = ApfsSuperblock::new_zeroed();
    sb.o = header(spec.oid, spec.xid, OBJECT_TYPE_FS, 0);
    sb.magic = U32::new(APFS_MAGIC);
    sb.fs_index = U32::new(spec.fs_index);
    if spec.case_insensitive {
        sb.incompatible_features = U64::new(APFS_INCOMPAT_CASE_INSENSITIVE);
    }
    sb.omap_oid = U64::new(spec.omap_oid);
    sb.root_tree_oid = U64::new(spec.root_tree_oid);
    sb.root_tree_type = U32::new(OBJECT_TYPE_BTREE);
    let name = spec.name.as_bytes();
    sb.volname[..name.len()].copy_from_slice(name);
    sb.role = U16::new(spec.role.0);
    sb
}

// === Object maps ===

pub fn write_omap_phys(image: &mut [u8], addr: u64, tree_addr: u64) {
    let mut omap = OmapPhys::new_zeroed();
    omap.o = header(addr, 1, OBJECT_TYPE_OMAP | PHYSICAL, 0);
    omap.tree_type = U32::new(OBJECT_TYPE_BTREE | PHYSICAL);
    omap.tree_oid = U64::new(tree_addr);
    write_struct_block(image, addr, &omap);
}

pub fn omap_key(oid: u64, xid: u64) -> Vec<u8> {
    OmapKey {
        oid: U64::new(oid),
        xid: U64::new(xid),
    }
    .as_bytes()
    .to_vec()
}

pub fn omap_val(paddr: u64) -> Vec<u8> {
    OmapVal {
        flags: U32::ZERO,
        size: U32::new(BLOCK_SIZE),
        paddr: U64::new(paddr),
    }
    .as_bytes()
    .to_vec()
}

pub fn child_ptr(oid: u64) -> Vec<u8> {
    oid.to_le_bytes().to_vec()
}

// === Filesystem records ===

pub fn inode_key(ino: u64) -> Vec<u8> {
    JKey::new(ino, APFS_TYPE_INODE).as_bytes().to_vec()
}

/// Hashed directory record key; the stored length counts the trailing NUL.
pub fn drec_key(parent: u64, name: &str) -> Vec<u8> {
    let len = name.len() as u32 + 1;
    let hdr = JDrecHashedKey {
        hdr: JKey::new(parent, APFS_TYPE_DIR_REC),
        name_len_and_hash: U32::new((drec_name_hash(name) << J_DREC_HASH_SHIFT) | len),
    };
    let mut key = hdr.as_bytes().to_vec();
    key.extend_from_slice(name.as_bytes());
    key.push(0);
    key
}

pub fn drec_plain_key(parent: u64, name: &str) -> Vec<u8> {
    let hdr = JDrecKey {
        hdr: JKey::new(parent, APFS_TYPE_DIR_REC),
        name_len: U16::new(name.len() as u16 + 1),
    };
    let mut key = hdr.as_bytes().to_vec();
    key.extend_from_slice(name.as_bytes());
    key.push(0);
    key
}

pub fn drec_val(file_id: u64, dtype: u16) -> Vec<u8> {
    JDrecVal {
        file_id: U64::new(file_id),
        date_added: U64::ZERO,
        flags: U16::new(dtype),
    }
    .as_bytes()
    .to_vec()
}

pub fn inode_val(parent: u64, private_id: u64, owner: u32, group: u32, mode: u16) -> Vec<u8> {
    let mut val = JInodeVal::new_zeroed();
    val.parent_id = U64::new(parent);
    val.private_id = U64::new(private_id);
    val.nchildren_or_nlink = U32::new(1);
    val.owner = U32::new(owner);
    val.group = U32::new(group);
    val.mode = U16::new(mode);
    val.as_bytes().to_vec()
}

fn dir_inode(ino: u64, parent: u64) -> (Vec<u8>, Vec<u8>) {
    (inode_key(ino), inode_val(parent, ino, 99, 99, 0o040755))
}

fn file_inode(ino: u64, parent: u64, private_id: u64, owner: u32, group: u32) -> (Vec<u8>, Vec<u8>) {
    (inode_key(ino), inode_val(parent, private_id, owner, group, 0o100644))
}

// === B-tree nodes ===

/// Builds one B-tree node block.
///
/// Keys are packed forward from the end of the table of contents; values are
/// packed backward from the end of the value area, so each value offset is the
/// running total of value lengths.
pub struct NodeBuilder {
    addr: u64,
    oid: u64,
    xid: u64,
    storage: u32,
    subtype: u32,
    flags: BtreeNodeFlags,
    level: u16,
    fixed: Option<(u32, u32)>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl NodeBuilder {
    fn new(addr: u64, flags: BtreeNodeFlags, level: u16, storage: u32, subtype: u32) -> Self {
        Self {
            addr,
            oid: addr,
            xid: 1,
            storage,
            subtype,
            flags,
            level,
            fixed: None,
            entries: Vec::new(),
        }
    }

    /// Variable-size filesystem-tree leaf.
    pub fn leaf(addr: u64) -> Self {
        Self::new(addr, BtreeNodeFlags::LEAF, 0, 0, OBJECT_TYPE_FSTREE)
    }

    /// Variable-size filesystem-tree index node.
    pub fn index(addr: u64, level: u16) -> Self {
        Self::new(addr, BtreeNodeFlags::empty(), level, 0, OBJECT_TYPE_FSTREE)
    }

    pub fn omap_leaf(addr: u64) -> Self {
        Self::new(addr, BtreeNodeFlags::LEAF, 0, PHYSICAL, OBJECT_TYPE_OMAP).fixed(16, 16)
    }

    pub fn omap_index(addr: u64, level: u16) -> Self {
        Self::new(addr, BtreeNodeFlags::empty(), level, PHYSICAL, OBJECT_TYPE_OMAP).fixed(16, 16)
    }

    pub fn root(mut self) -> Self {
        self.flags |= BtreeNodeFlags::ROOT;
        self
    }

    pub fn level(mut self, level: u16) -> Self {
        self.level = level;
        self
    }

    pub fn oid(mut self, oid: u64) -> Self {
        self.oid = oid;
        self
    }

    pub fn xid(mut self, xid: u64) -> Self {
        self.xid = xid;
        self
    }

    pub fn fixed(mut self, key_size: u32, val_size: u32) -> Self {
        self.flags |= BtreeNodeFlags::FIXED_KV_SIZE;
        self.fixed = Some((key_size, val_size));
        self
    }

    pub fn entry(mut self, key: Vec<u8>, value: Vec<u8>) -> Self {
        self.entries.push((key, value));
        self
    }

    pub fn entries(mut self, entries: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let bs = BLOCK_SIZE as usize;
        let mut block = vec![0u8; bs];
        let is_root = self.flags.contains(BtreeNodeFlags::ROOT);
        let is_fixed = self.flags.contains(BtreeNodeFlags::FIXED_KV_SIZE);
        let slot_size = if is_fixed { KVOFF_SIZE } else { KVLOC_SIZE };
        let toc_len = self.entries.len() * slot_size;
        let key_start = BTREE_NODE_HDR_SIZE + toc_len;
        let value_end = if is_root { bs - BTREE_INFO_SIZE } else { bs };

        let (mut k_off, mut v_off) = (0usize, 0usize);
        for (i, (key, value)) in self.entries.iter().enumerate() {
            let ks = key_start + k_off;
            block[ks..ks + key.len()].copy_from_slice(key);
            v_off += value.len();
            let vs = value_end - v_off;
            block[vs..vs + value.len()].copy_from_slice(value);

            let slot = BTREE_NODE_HDR_SIZE + i * slot_size;
            if is_fixed {
                let kv = Kvoff {
                    k: U16::new(k_off as u16),
                    v: U16::new(v_off as u16),
                };
                block[slot..slot + KVOFF_SIZE].copy_from_slice(kv.as_bytes());
            } else {
                let kv = Kvloc {
                    k: Nloc {
                        off: U16::new(k_off as u16),
                        len: U16::new(key.len() as u16),
                    },
                    v: Nloc {
                        off: U16::new(v_off as u16),
                        len: U16::new(value.len() as u16),
                    },
                };
                block[slot..slot + KVLOC_SIZE].copy_from_slice(kv.as_bytes());
            }
            k_off += key.len();
        }

        let kind = if is_root {
            OBJECT_TYPE_BTREE
        } else {
            OBJECT_TYPE_BTREE_NODE
        };
        let o_type = kind | self.storage;
        let node = BtreeNodePhys {
            o: header(self.oid, self.xid, o_type, self.subtype),
            flags: U16::new(self.flags.bits()),
            level: U16::new(self.level),
            nkeys: U32::new(self.entries.len() as u32),
            table_space: Nloc {
                off: U16::ZERO,
                len: U16::new(toc_len as u16),
            },
            free_space: Nloc {
                off: U16::new(k_off as u16),
                len: U16::new((value_end - v_off - key_start - k_off) as u16),
            },
            key_free_list: Nloc::default(),
            val_free_list: Nloc::default(),
        };
        block[..BTREE_NODE_HDR_SIZE].copy_from_slice(node.as_bytes());

        if is_root {
            let (key_size, val_size) = self.fixed.unwrap_or((0, 0));
            let info = BtreeInfo {
                fixed: BtreeInfoFixed {
                    flags: U32::ZERO,
                    node_size: U32::new(BLOCK_SIZE),
                    key_size: U32::new(key_size),
                    val_size: U32::new(val_size),
                },
                longest_key: U32::new(self.entries.iter().map(|e| e.0.len()).max().unwrap_or(0) as u32),
                longest_val: U32::new(self.entries.iter().map(|e| e.1.len()).max().unwrap_or(0) as u32),
                key_count: U64::new(self.entries.len() as u64),
                node_count: U64::new(1),
            };
            block[bs - BTREE_INFO_SIZE..].copy_from_slice(info.as_bytes());
        }
        block
    }

    pub fn write(self, image: &mut [u8]) {
        let block = self.build();
        put_block(image, self.addr, block);
    }
}

// === Complete images ===

fn leaf_a() -> Vec<(Vec<u8>, Vec<u8>)> {
    // (2, INODE) < (2, DREC "Library" 0x1b853a) < (2, DREC "bad_id" 0x21102d)
    // < (16, INODE) < (16, DREC "owned.txt" 0x174a69)
    vec![
        dir_inode(ino::ROOT, ROOT_DIR_PARENT),
        (drec_key(ino::ROOT, "Library"), drec_val(ino::LIBRARY, DT_DIR)),
        (drec_key(ino::ROOT, "bad_id"), drec_val(ino::BAD_ID, DT_REG)),
        dir_inode(ino::LIBRARY, ino::ROOT),
        (drec_key(ino::LIBRARY, "owned.txt"), drec_val(ino::OWNED_TXT, DT_REG)),
    ]
}

fn leaf_b(foo_plist: u64) -> Vec<(Vec<u8>, Vec<u8>)> {
    vec![
        (
            drec_key(ino::LIBRARY, "LaunchDaemons"),
            drec_val(ino::LAUNCH_DAEMONS, DT_DIR),
        ),
        dir_inode(ino::LAUNCH_DAEMONS, ino::LIBRARY),
        (drec_key(ino::LAUNCH_DAEMONS, "foo.plist"), drec_val(foo_plist, DT_REG)),
    ]
}

fn leaf_c() -> Vec<(Vec<u8>, Vec<u8>)> {
    vec![
        file_inode(ino::FOO_PLIST, ino::LAUNCH_DAEMONS, ino::FOO_PLIST, 99, 99),
        file_inode(ino::OWNED_TXT, ino::LIBRARY, ino::OWNED_TXT, 501, 20),
        file_inode(ino::BAD_ID, ino::ROOT, 999, 99, 99),
    ]
}

fn write_checkpoint_area(image: &mut [u8]) {
    let volumes = [oid::DATA_VOLUME, oid::SYSTEM_VOLUME, oid::MISSING_VOLUME];
    let superblock = |xid: u64| {
        let mut sb = nx_superblock(xid, TOTAL_BLOCKS, addr::CHECKPOINT_AREA.start, 4);
        sb.omap_oid = U64::new(addr::CONTAINER_OMAP);
        sb.next_xid = U64::new(xid + 1);
        for (slot, oid) in volumes.iter().enumerate() {
            sb.fs_oid[slot] = U64::new(*oid);
        }
        sb
    };

    write_struct_block(image, 0, &superblock(CONTAINER_XID));
    write_struct_block(image, addr::CHECKPOINT_OLD, &superblock(4));

    let map = header(addr::CHECKPOINT_MAP, CONTAINER_XID, OBJECT_TYPE_CHECKPOINT_MAP | PHYSICAL, 0);
    write_struct_block(image, addr::CHECKPOINT_MAP, &map);

    write_struct_block(image, addr::CHECKPOINT_LATEST, &superblock(CONTAINER_XID));

    write_struct_block(image, addr::CHECKPOINT_CORRUPT, &superblock(99));
    let range = block_range(addr::CHECKPOINT_CORRUPT);
    image[range.start + 200] ^= 0xFF;
}

fn write_volumes(image: &mut [u8]) {
    write_omap_phys(image, addr::CONTAINER_OMAP, addr::CONTAINER_OMAP_TREE);
    NodeBuilder::omap_leaf(addr::CONTAINER_OMAP_TREE)
        .root()
        .entry(omap_key(oid::DATA_VOLUME, 2), omap_val(addr::DATA_VOLUME_STALE))
        .entry(omap_key(oid::DATA_VOLUME, DATA_VOLUME_XID), omap_val(addr::DATA_VOLUME))
        .entry(omap_key(oid::DATA_VOLUME, 9), omap_val(addr::DATA_VOLUME_FUTURE))
        .entry(omap_key(oid::SYSTEM_VOLUME, 1), omap_val(addr::SYSTEM_VOLUME))
        .write(image);

    // 20 and 22 are left zeroed: any read of them fails its checksum.
    let data = apfs_superblock(&VolumeSpec {
        oid: oid::DATA_VOLUME,
        xid: DATA_VOLUME_XID,
        role: VolumeRole::DATA,
        name: "Data",
        fs_index: 0,
        omap_oid: addr::VOLUME_OMAP,
        root_tree_oid: oid::FS_ROOT,
        case_insensitive: true,
    });
    write_struct_block(image, addr::DATA_VOLUME, &data);

    let system = apfs_superblock(&VolumeSpec {
        oid: oid::SYSTEM_VOLUME,
        xid: 1,
        role: VolumeRole::SYSTEM,
        name: "Macintosh HD",
        fs_index: 1,
        omap_oid: 0,
        root_tree_oid: 0,
        case_insensitive: true,
    });
    write_struct_block(image, addr::SYSTEM_VOLUME, &system);
}

fn write_fs_tree(image: &mut [u8]) {
    write_omap_phys(image, addr::VOLUME_OMAP, addr::VOLUME_OMAP_ROOT);
    NodeBuilder::omap_index(addr::VOLUME_OMAP_ROOT, 1)
        .root()
        .entry(omap_key(oid::FS_ROOT, FS_XID), child_ptr(addr::VOLUME_OMAP_LEAF_A))
        .entry(omap_key(oid::FS_LEAF_B, FS_XID), child_ptr(addr::VOLUME_OMAP_LEAF_B))
        .write(image);
    NodeBuilder::omap_leaf(addr::VOLUME_OMAP_LEAF_A)
        .entry(omap_key(oid::FS_ROOT, FS_XID), omap_val(addr::FS_ROOT))
        .entry(omap_key(oid::FS_LEAF_A, FS_XID), omap_val(addr::FS_LEAF_A))
        .write(image);
    NodeBuilder::omap_leaf(addr::VOLUME_OMAP_LEAF_B)
        .entry(omap_key(oid::FS_LEAF_B, FS_XID), omap_val(addr::FS_LEAF_B))
        .entry(omap_key(oid::FS_LEAF_B, 9), omap_val(addr::FS_LEAF_B_FUTURE))
        .entry(omap_key(oid::FS_LEAF_C, FS_XID), omap_val(addr::FS_LEAF_C))
        .write(image);

    NodeBuilder::index(addr::FS_ROOT, 1)
        .root()
        .oid(oid::FS_ROOT)
        .xid(FS_XID)
        .entry(inode_key(ino::ROOT), child_ptr(oid::FS_LEAF_A))
        .entry(drec_key(ino::LIBRARY, "LaunchDaemons"), child_ptr(oid::FS_LEAF_B))
        .entry(inode_key(ino::FOO_PLIST), child_ptr(oid::FS_LEAF_C))
        .write(image);
    NodeBuilder::leaf(addr::FS_LEAF_A)
        .oid(oid::FS_LEAF_A)
        .xid(FS_XID)
        .entries(leaf_a())
        .write(image);
    NodeBuilder::leaf(addr::FS_LEAF_B)
        .oid(oid::FS_LEAF_B)
        .xid(FS_XID)
        .entries(leaf_b(ino::FOO_PLIST))
        .write(image);
    NodeBuilder::leaf(addr::FS_LEAF_C)
        .oid(oid::FS_LEAF_C)
        .xid(FS_XID)
        .entries(leaf_c())
        .write(image);
    NodeBuilder::leaf(addr::FS_LEAF_B_FUTURE)
        .oid(oid::FS_LEAF_B)
        .xid(9)
        .entries(leaf_b(ino::BAD_ID))
        .write(image);
}

/// Bare container image (no partition table).
pub fn apfs_image() -> Vec<u8> {
    let mut image = vec![0u8; (TOTAL_BLOCKS * BLOCK_SIZE as u64) as usize];
    write_checkpoint_area(&mut image);
    write_volumes(&mut image);
    write_fs_tree(&mut image);
    image
}

/// [`apfs_image`] inside a GPT disk, as the second partition after an ESP.
pub fn gpt_apfs_image() -> Vec<u8> {
    use rimpart::gpt::{GptEntry, write_gpt};
    use rimpart::guids::{GPT_PARTITION_TYPE_APFS, GPT_PARTITION_TYPE_ESP};

    let container = apfs_image();
    let sector = rimpart::DEFAULT_SECTOR_SIZE;
    let container_sectors = container.len() as u64 / sector;
    let total_sectors = GPT_APFS_START_LBA + container_sectors + 34;
    let mut disk = vec![0u8; (total_sectors * sector) as usize];

    let entries = [
        GptEntry::new(GPT_PARTITION_TYPE_ESP, [1; 16], 34, GPT_APFS_START_LBA - 1, "EFI"),
        GptEntry::new(
            GPT_PARTITION_TYPE_APFS,
            [2; 16],
            GPT_APFS_START_LBA,
            GPT_APFS_START_LBA + container_sectors - 1,
            "Container",
        ),
    ];
    let mut io = MemRimIO::new(&mut disk);
    write_gpt(&mut io, &entries, total_sectors, [7; 16], sector).expect("gpt fixture");

    let base = (GPT_APFS_START_LBA * sector) as usize;
    disk[base..base + container.len()].copy_from_slice(&container);
    disk
}
