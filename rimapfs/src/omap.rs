// SPDX-License-Identifier: MIT

//! Object map resolver: (virtual OID, xid ceiling) -> physical block address.

use core::cmp::Ordering;

use log::trace;
use rimio::RimIO;

use crate::btree::{self, ChildAddressing, KeyQuery};
use crate::container::Container;
use crate::errors::*;
use crate::types::*;

/// An object map header (omap_phys_t) and the root of its B-tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMap {
    pub addr: u64,
    pub tree_addr: u64,
}

impl ObjectMap {
    pub fn load<IO: RimIO + ?Sized>(container: &mut Container<'_, IO>, addr: u64) -> ApfsResult<Self> {
        let block = container.read_object(addr)?;
        let omap = view::<OmapPhys>(&block).ok_or(ApfsError::Other("object map block too short"))?;
        Ok(Self {
            addr,
            tree_addr: omap.tree_oid.get(),
        })
    }

    #[inline]
    pub fn lookup<IO: RimIO + ?Sized>(
        &self,
        container: &mut Container<'_, IO>,
        oid: u64,
        max_xid: u64,
    ) -> ApfsResult<u64> {
        omap_lookup(container, self.tree_addr, oid, max_xid)
    }
}

/// Newest mapping of `oid` whose xid does not exceed `max_xid`.
#[derive(Debug, Clone, Copy)]
pub struct OmapQuery {
    pub oid: u64,
    pub max_xid: u64,
}

impl OmapQuery {
    fn parse(key: &[u8]) -> ApfsResult<&OmapKey> {
        view::<OmapKey>(key).ok_or(ApfsError::MalformedKey("object map key shorter than 16 bytes"))
    }
}

impl KeyQuery for OmapQuery {
    fn order(&self, key: &[u8]) -> ApfsResult<Ordering> {
        let k = Self::parse(key)?;
        Ok((k.oid.get(), k.xid.get()).cmp(&(self.oid, self.max_xid)))
    }

    fn rank(&self, key: &[u8]) -> ApfsResult<Option<u64>> {
        let k = Self::parse(key)?;
        Ok((k.oid.get() == self.oid && k.xid.get() <= self.max_xid).then(|| k.xid.get()))
    }
}

/// Resolves `oid` in the object map tree rooted at `tree_addr`.
///
/// Among entries for `oid`, the one with the largest xid `<= max_xid` wins; entries
/// newer than the ceiling are never returned.
pub fn omap_lookup<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
    tree_addr: u64,
    oid: u64,
    max_xid: u64,
) -> ApfsResult<u64> {
    let query = OmapQuery { oid, max_xid };
    let hit = btree::search(container, tree_addr, ChildAddressing::Physical, &query)?
        .ok_or(ApfsError::OmapEntryNotFound { oid, max_xid })?;
    let val = view::<OmapVal>(hit.value()).ok_or(ApfsError::MalformedNode {
        addr: hit.addr,
        reason: "object map value shorter than 16 bytes",
    })?;
    let paddr = val.paddr.get();
    trace!("omap {tree_addr}: oid {oid} (xid <= {max_xid}) -> block {paddr}");
    Ok(paddr)
}
