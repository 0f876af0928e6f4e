// SPDX-License-Identifier: MIT

//! Checkpoint scanner: picks the newest valid container superblock.

use alloc::vec::Vec;

use log::{debug, trace};
use rimio::RimIO;

use crate::constant::*;
use crate::container::Container;
use crate::errors::*;
use crate::types::*;

/// The container superblock of the newest checkpoint.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub addr: u64,
    pub xid: u64,
    block: Vec<u8>,
}

impl Checkpoint {
    pub fn superblock(&self) -> ApfsResult<&NxSuperblock> {
        view::<NxSuperblock>(&self.block)
            .ok_or(ApfsError::Other("checkpoint block shorter than nx_superblock_t"))
    }
}

/// Checks that a checkpoint-area block is a container superblock; returns its xid.
fn superblock_xid(block: &[u8]) -> Option<u64> {
    let sb = view::<NxSuperblock>(block)?;
    (sb.o.object_type() == OBJECT_TYPE_NX_SUPERBLOCK && sb.magic.get() == NX_MAGIC)
        .then(|| sb.o.xid.get())
}

/// Scans the checkpoint descriptor area named by block 0.
///
/// Blocks that cannot be read, fail their checksum, or are not container
/// superblocks are skipped; the one with the strictly highest xid wins.
pub fn latest_superblock<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
) -> ApfsResult<Checkpoint> {
    let block0 = container.read_object(0)?;
    let sb0 = view::<NxSuperblock>(&block0).ok_or(ApfsError::NoValidSuperblock)?;
    let desc_base = sb0.xp_desc_base.get();
    let desc_blocks = sb0.checkpoint_desc_blocks();

    let mut best: Option<Checkpoint> = None;
    for i in 0..desc_blocks as u64 {
        let Some(addr) = desc_base.checked_add(i) else {
            break;
        };
        let block = match container.read_object(addr) {
            Ok(block) => block,
            Err(e) => {
                trace!("checkpoint block {addr} skipped: {e}");
                continue;
            }
        };
        let Some(xid) = superblock_xid(&block) else {
            trace!("checkpoint block {addr} skipped: not a container superblock");
            continue;
        };
        if best.as_ref().is_none_or(|b| xid > b.xid) {
            best = Some(Checkpoint { addr, xid, block });
        }
    }

    let checkpoint = best.ok_or(ApfsError::NoValidSuperblock)?;
    debug!(
        "container superblock: block {} (xid {})",
        checkpoint.addr, checkpoint.xid
    );
    Ok(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{self, addr};
    use rimio::prelude::MemRimIO;

    #[test]
    fn picks_highest_valid_xid() {
        let mut image = fixture::apfs_image();
        let mut io = MemRimIO::new(&mut image);
        let mut container = Container::open(&mut io).unwrap();
        let cp = latest_superblock(&mut container).unwrap();
        // Block 4 claims a higher xid but carries a bad checksum.
        assert_eq!(cp.addr, addr::CHECKPOINT_LATEST);
        assert_eq!(cp.xid, fixture::CONTAINER_XID);
        assert_eq!(cp.superblock().unwrap().omap_oid.get(), addr::CONTAINER_OMAP);
    }

    #[test]
    fn short_block_is_an_error_not_a_panic() {
        let cp = Checkpoint {
            addr: 1,
            xid: 1,
            block: alloc::vec![0u8; 64],
        };
        assert_eq!(
            cp.superblock().err(),
            Some(ApfsError::Other("checkpoint block shorter than nx_superblock_t"))
        );
    }

    #[test]
    fn no_valid_superblock_when_area_is_garbage() {
        let mut image = fixture::apfs_image();
        for a in fixture::addr::CHECKPOINT_AREA {
            fixture::rewrite_block(&mut image, a, |block| {
                block[32..36].copy_from_slice(b"XXXX");
            });
        }
        let mut io = MemRimIO::new(&mut image);
        let mut container = Container::open(&mut io).unwrap();
        assert!(matches!(
            latest_superblock(&mut container),
            Err(ApfsError::NoValidSuperblock)
        ));
    }

    #[test]
    fn block_zero_must_verify() {
        let mut image = fixture::apfs_image();
        image[500] ^= 0xFF;
        let mut io = MemRimIO::new(&mut image);
        let mut container = Container::open(&mut io).unwrap();
        assert!(matches!(
            latest_superblock(&mut container),
            Err(ApfsError::ChecksumMismatch { addr: 0, .. })
        ));
    }
}
