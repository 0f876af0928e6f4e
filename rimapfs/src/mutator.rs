// SPDX-License-Identifier: MIT

//! Inode owner/group patching.
//!
//! The flow is split in three steps so each can be used on its own:
//! [`locate_inode`] reads the record, [`InodeRecord::check_noowners`] validates
//! it, and [`NoownersInode::apply`] patches and writes the leaf block.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::Range;

use log::info;
use rimio::RimIO;

use crate::btree::{KeyQuery, LeafHit};
use crate::checksum::update_checksum;
use crate::constant::*;
use crate::container::Container;
use crate::drec::{compare_fs_key_header, fs_key_header};
use crate::errors::*;
use crate::types::*;
use crate::volume::FsTree;

/// Exact match on an inode key header.
#[derive(Debug, Clone, Copy)]
pub struct InodeQuery {
    header: u64,
}

impl InodeQuery {
    pub fn new(inode: u64) -> Self {
        Self {
            header: pack_key_header(inode, APFS_TYPE_INODE),
        }
    }
}

impl KeyQuery for InodeQuery {
    fn order(&self, key: &[u8]) -> ApfsResult<Ordering> {
        Ok(compare_fs_key_header(fs_key_header(key)?, self.header))
    }

    fn rank(&self, key: &[u8]) -> ApfsResult<Option<u64>> {
        Ok((fs_key_header(key)? == self.header).then_some(0))
    }
}

/// An inode record as found in its leaf, together with the leaf block it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeRecord {
    pub inode: u64,
    /// Leaf block holding the record.
    pub addr: u64,
    pub parent_id: u64,
    pub private_id: u64,
    pub owner: u32,
    pub group: u32,
    pub mode: u16,
    block: Vec<u8>,
    value: Range<usize>,
}

impl InodeRecord {
    fn from_hit(inode: u64, hit: LeafHit) -> ApfsResult<Self> {
        let val = view::<JInodeVal>(hit.value()).ok_or(ApfsError::MalformedNode {
            addr: hit.addr,
            reason: "inode value shorter than j_inode_val_t",
        })?;
        Ok(Self {
            inode,
            addr: hit.addr,
            parent_id: val.parent_id.get(),
            private_id: val.private_id.get(),
            owner: val.owner.get(),
            group: val.group.get(),
            mode: val.mode.get(),
            block: hit.block,
            value: hit.value,
        })
    }

    /// Precondition for patching: the record really is `inode` and still carries
    /// the 99:99 placeholder.
    pub fn check_noowners(self) -> ApfsResult<NoownersInode> {
        ensure!(
            self.private_id == self.inode,
            ApfsError::InodeIdMismatch {
                inode: self.inode,
                private_id: self.private_id,
            }
        );
        ensure!(
            self.owner == NOOWNERS_PLACEHOLDER_ID && self.group == NOOWNERS_PLACEHOLDER_ID,
            ApfsError::UnexpectedOwnership {
                inode: self.inode,
                owner: self.owner,
                group: self.group,
            }
        );
        Ok(NoownersInode { record: self })
    }
}

/// An inode that passed [`InodeRecord::check_noowners`].
#[derive(Debug, Clone)]
pub struct NoownersInode {
    record: InodeRecord,
}

impl NoownersInode {
    #[inline]
    pub fn record(&self) -> &InodeRecord {
        &self.record
    }

    /// Overwrites owner and group, re-seals the leaf checksum, and writes the leaf back.
    pub fn apply<IO: RimIO + ?Sized>(
        self,
        container: &mut Container<'_, IO>,
        uid: u32,
        gid: u32,
    ) -> ApfsResult<InodeRecord> {
        let mut record = self.record;
        let val = record
            .block
            .get_mut(record.value.clone())
            .and_then(view_mut::<JInodeVal>)
            .ok_or(ApfsError::MalformedNode {
                addr: record.addr,
                reason: "inode value shorter than j_inode_val_t",
            })?;
        val.owner.set(uid);
        val.group.set(gid);
        update_checksum(&mut record.block);
        container.write_block(record.addr, &record.block)?;

        info!(
            "inode {}: owner {}:{} -> {uid}:{gid} (block {})",
            record.inode, record.owner, record.group, record.addr
        );
        record.owner = uid;
        record.group = gid;
        Ok(record)
    }
}

/// Finds the inode record of `inode`.
pub fn locate_inode<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
    tree: &FsTree,
    inode: u64,
) -> ApfsResult<InodeRecord> {
    let hit = tree
        .search(container, &InodeQuery::new(inode))?
        .ok_or(ApfsError::InodeNotFound { inode })?;
    InodeRecord::from_hit(inode, hit)
}

/// Sets `uid:gid` on `inode`, which must still be owned 99:99.
pub fn chown_inode<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
    tree: &FsTree,
    inode: u64,
    uid: u32,
    gid: u32,
) -> ApfsResult<InodeRecord> {
    locate_inode(container, tree, inode)?
        .check_noowners()?
        .apply(container, uid, gid)
}
