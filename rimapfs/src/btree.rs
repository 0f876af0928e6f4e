// SPDX-License-Identifier: MIT

//! Generic B-tree descent shared by object-map and filesystem trees.
//!
//! The walk itself knows nothing about key formats: a [`KeyQuery`] orders keys in
//! index nodes and picks the matching entry in the leaf, and [`ChildAddressing`]
//! says whether child pointers are physical block addresses (object maps) or
//! virtual OIDs to resolve through an object map (filesystem trees).

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::Range;

use log::trace;
use rimio::RimIO;
use zerocopy::byteorder::little_endian::U64;

use crate::constant::*;
use crate::container::Container;
use crate::errors::*;
use crate::omap;
use crate::types::*;

/// Search strategy for one kind of tree.
pub trait KeyQuery {
    /// Orders `key` against the search target. Index nodes descend into the last
    /// entry that is not `Greater`.
    fn order(&self, key: &[u8]) -> ApfsResult<Ordering>;

    /// Leaf selection: `Some(rank)` when `key` satisfies the query. The highest rank
    /// wins, and the first entry wins among equal ranks.
    fn rank(&self, key: &[u8]) -> ApfsResult<Option<u64>>;
}

/// How index-node values address their children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildAddressing {
    Physical,
    Virtual { omap_tree: u64, max_xid: u64 },
}

/// Key and value locations of one table-of-contents slot, as byte ranges of the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Range<usize>,
    pub value: Range<usize>,
}

/// Fixed key/value sizes of a tree, from the root's `btree_info_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizes {
    pub key: usize,
    pub value: usize,
}

impl Default for FixedSizes {
    /// Object-map sizes, the only fixed-size tree this crate walks.
    fn default() -> Self {
        Self {
            key: OMAP_KEY_SIZE as usize,
            value: OMAP_VAL_SIZE as usize,
        }
    }
}

/// Parsed header of one node, borrowing its block.
#[derive(Debug)]
pub struct NodeView<'a> {
    addr: u64,
    block: &'a [u8],
    flags: BtreeNodeFlags,
    level: u16,
    nkeys: u32,
    toc_start: usize,
    key_start: usize,
    value_end: usize,
}

impl<'a> NodeView<'a> {
    pub fn parse(addr: u64, block: &'a [u8]) -> ApfsResult<Self> {
        let hdr = view::<BtreeNodePhys>(block).ok_or(ApfsError::MalformedNode {
            addr,
            reason: "block shorter than node header",
        })?;
        ensure!(
            hdr.o.is_btree_node(),
            ApfsError::UnexpectedNodeType {
                addr,
                found: hdr.o.object_type(),
            }
        );

        let flags = hdr.node_flags();
        let toc_start = BTREE_NODE_HDR_SIZE + hdr.table_space.off.get() as usize;
        let key_start = toc_start + hdr.table_space.len.get() as usize;
        let value_end = if flags.contains(BtreeNodeFlags::ROOT) {
            block.len().saturating_sub(BTREE_INFO_SIZE)
        } else {
            block.len()
        };
        ensure!(
            key_start <= value_end,
            ApfsError::MalformedNode {
                addr,
                reason: "table of contents overruns the block",
            }
        );

        Ok(Self {
            addr,
            block,
            flags,
            level: hdr.level.get(),
            nkeys: hdr.nkeys.get(),
            toc_start,
            key_start,
            value_end,
        })
    }

    #[inline]
    pub fn addr(&self) -> u64 {
        self.addr
    }

    #[inline]
    pub fn flags(&self) -> BtreeNodeFlags {
        self.flags
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.flags.contains(BtreeNodeFlags::LEAF)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.flags.contains(BtreeNodeFlags::ROOT)
    }

    #[inline]
    pub fn level(&self) -> u16 {
        self.level
    }

    #[inline]
    pub fn nkeys(&self) -> u32 {
        self.nkeys
    }

    /// Root footer, if this is a root node.
    pub fn info(&self) -> Option<&'a BtreeInfo> {
        if !self.is_root() {
            return None;
        }
        self.block.get(self.value_end..).and_then(view::<BtreeInfo>)
    }

    /// Fixed sizes to use for fixed-size nodes of the tree rooted here.
    pub fn fixed_sizes(&self) -> FixedSizes {
        match self.info() {
            Some(info) if info.fixed.key_size.get() != 0 && info.fixed.val_size.get() != 0 => {
                FixedSizes {
                    key: info.fixed.key_size.get() as usize,
                    value: info.fixed.val_size.get() as usize,
                }
            }
            _ => FixedSizes::default(),
        }
    }

    fn malformed(&self, reason: &'static str) -> ApfsError {
        ApfsError::MalformedNode {
            addr: self.addr,
            reason,
        }
    }

    /// Resolves slot `index` of the table of contents.
    ///
    /// Keys are offsets from the start of the key area; values are offsets back
    /// from the end of the value area.
    pub fn entry(&self, index: u32, sizes: FixedSizes) -> ApfsResult<Entry> {
        ensure!(index < self.nkeys, self.malformed("entry index out of range"));
        let fixed = self.flags.contains(BtreeNodeFlags::FIXED_KV_SIZE);
        let slot_size = if fixed { KVOFF_SIZE } else { KVLOC_SIZE };
        let slot_start = self.toc_start + index as usize * slot_size;
        ensure!(
            slot_start + slot_size <= self.key_start,
            self.malformed("entry lies outside the table of contents")
        );
        let slot = &self.block[slot_start..slot_start + slot_size];

        let (k_off, k_len, v_off, v_len) = if fixed {
            let kv = view::<Kvoff>(slot).ok_or(self.malformed("short kvoff slot"))?;
            let v_len = if self.is_leaf() {
                sizes.value
            } else {
                BTREE_CHILD_PTR_SIZE
            };
            (kv.k.get() as usize, sizes.key, kv.v.get() as usize, v_len)
        } else {
            let kv = view::<Kvloc>(slot).ok_or(self.malformed("short kvloc slot"))?;
            (
                kv.k.off.get() as usize,
                kv.k.len.get() as usize,
                kv.v.off.get() as usize,
                kv.v.len.get() as usize,
            )
        };

        let key = self.key_start + k_off..self.key_start + k_off + k_len;
        let value_start = self
            .value_end
            .checked_sub(v_off)
            .ok_or(self.malformed("value offset before the value area"))?;
        let value = value_start..value_start + v_len;
        ensure!(
            key.end <= self.value_end && value.start >= self.key_start && value.end <= self.value_end,
            self.malformed("entry outside the node")
        );
        Ok(Entry { key, value })
    }

    #[inline]
    pub fn bytes(&self, range: &Range<usize>) -> &'a [u8] {
        &self.block[range.clone()]
    }
}

/// Leaf entry selected by a search; owns the leaf block so it can be patched and
/// written back.
#[derive(Debug, Clone)]
pub struct LeafHit {
    pub addr: u64,
    pub block: Vec<u8>,
    pub key: Range<usize>,
    pub value: Range<usize>,
}

impl LeafHit {
    #[inline]
    pub fn key(&self) -> &[u8] {
        &self.block[self.key.clone()]
    }

    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.block[self.value.clone()]
    }
}

/// Picks the leaf entry with the best rank, if any.
fn select_leaf_entry<Q: KeyQuery + ?Sized>(
    node: &NodeView<'_>,
    sizes: FixedSizes,
    query: &Q,
) -> ApfsResult<Option<Entry>> {
    let mut best: Option<(u64, Entry)> = None;
    for i in 0..node.nkeys() {
        let entry = node.entry(i, sizes)?;
        if let Some(rank) = query.rank(node.bytes(&entry.key))?
            && best.as_ref().is_none_or(|(r, _)| rank > *r)
        {
            best = Some((rank, entry));
        }
    }
    Ok(best.map(|(_, e)| e))
}

/// Index of the last entry whose key orders at or before the target (0 if none).
fn select_child<Q: KeyQuery + ?Sized>(
    node: &NodeView<'_>,
    sizes: FixedSizes,
    query: &Q,
) -> ApfsResult<u32> {
    let mut child = 0;
    for i in 0..node.nkeys() {
        let entry = node.entry(i, sizes)?;
        if query.order(node.bytes(&entry.key))? == Ordering::Greater {
            break;
        }
        child = i;
    }
    Ok(child)
}

/// Descends from `root_addr` to the leaf that may hold the target and returns the
/// selected entry, or `None` if the leaf has no match.
///
/// Every node is checksum-verified, must be a B-tree node object, and must sit
/// exactly one level below its parent.
pub fn search<IO, Q>(
    container: &mut Container<'_, IO>,
    root_addr: u64,
    children: ChildAddressing,
    query: &Q,
) -> ApfsResult<Option<LeafHit>>
where
    IO: RimIO + ?Sized,
    Q: KeyQuery + ?Sized,
{
    let mut addr = root_addr;
    let mut block = container.read_object(addr)?;
    let sizes = NodeView::parse(addr, &block)?.fixed_sizes();
    let mut expected_level: Option<u16> = None;

    loop {
        let node = NodeView::parse(addr, &block)?;
        if let Some(level) = expected_level {
            ensure!(
                node.level() == level,
                ApfsError::MalformedNode {
                    addr,
                    reason: "child level is not parent level - 1",
                }
            );
        }

        if node.is_leaf() {
            let selected = select_leaf_entry(&node, sizes, query)?;
            return Ok(selected.map(|e| LeafHit {
                addr,
                block,
                key: e.key,
                value: e.value,
            }));
        }

        ensure!(
            node.level() > 0,
            ApfsError::MalformedNode {
                addr,
                reason: "index node at level 0",
            }
        );
        ensure!(
            node.nkeys() > 0,
            ApfsError::MalformedNode {
                addr,
                reason: "empty index node",
            }
        );

        let child_index = select_child(&node, sizes, query)?;
        let entry = node.entry(child_index, sizes)?;
        let child_oid = view::<U64>(node.bytes(&entry.value))
            .ok_or(ApfsError::MalformedNode {
                addr,
                reason: "child pointer shorter than 8 bytes",
            })?
            .get();

        let next = match children {
            ChildAddressing::Physical => child_oid,
            ChildAddressing::Virtual { omap_tree, max_xid } => {
                omap::omap_lookup(container, omap_tree, child_oid, max_xid)?
            }
        };
        trace!(
            "btree node {addr} (level {}): entry {child_index} -> child {child_oid} at block {next}",
            node.level()
        );

        expected_level = Some(node.level() - 1);
        block = container.read_object(next)?;
        addr = next;
    }
}
