// SPDX-License-Identifier: MIT

//! Volume discovery: container superblock -> container omap -> volume superblocks.

use alloc::{string::String, vec::Vec};
use core::fmt;
use core::str::FromStr;

use log::{debug, trace};
use rimio::RimIO;

use crate::btree::{self, ChildAddressing, KeyQuery, LeafHit};
use crate::checkpoint::latest_superblock;
use crate::constant::*;
use crate::container::Container;
use crate::drec::DrecKeyFormat;
use crate::errors::*;
use crate::omap::ObjectMap;
use crate::types::*;

/// APFS volume role (`apfs_role`). Roles above `0x00C0` are stored as multiples of 0x40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VolumeRole(pub u16);

impl VolumeRole {
    pub const NONE: Self = Self(0x0000);
    pub const SYSTEM: Self = Self(0x0001);
    pub const USER: Self = Self(0x0002);
    pub const RECOVERY: Self = Self(0x0004);
    pub const VM: Self = Self(0x0008);
    pub const PREBOOT: Self = Self(0x0010);
    pub const INSTALLER: Self = Self(0x0020);
    pub const DATA: Self = Self(0x0040);
    pub const BASEBAND: Self = Self(0x0080);
    pub const UPDATE: Self = Self(0x00C0);
    pub const XART: Self = Self(0x0100);
    pub const HARDWARE: Self = Self(0x0140);
    pub const BACKUP: Self = Self(0x0180);
    pub const SIDECAR: Self = Self(0x01C0);
    pub const ENTERPRISE: Self = Self(0x0240);
    pub const PRELOGIN: Self = Self(0x02C0);

    const NAMES: [(Self, &'static str); 16] = [
        (Self::NONE, "none"),
        (Self::SYSTEM, "system"),
        (Self::USER, "user"),
        (Self::RECOVERY, "recovery"),
        (Self::VM, "vm"),
        (Self::PREBOOT, "preboot"),
        (Self::INSTALLER, "installer"),
        (Self::DATA, "data"),
        (Self::BASEBAND, "baseband"),
        (Self::UPDATE, "update"),
        (Self::XART, "xart"),
        (Self::HARDWARE, "hardware"),
        (Self::BACKUP, "backup"),
        (Self::SIDECAR, "sidecar"),
        (Self::ENTERPRISE, "enterprise"),
        (Self::PRELOGIN, "prelogin"),
    ];

    pub fn name(&self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(role, _)| role == self)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for VolumeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#06x}", self.0),
        }
    }
}

impl FromStr for VolumeRole {
    type Err = ApfsError;

    /// Accepts a role name (any case), a `0x`-prefixed hex value or a decimal value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((role, _)) = Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
        {
            return Ok(*role);
        }
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => s.parse::<u16>(),
        };
        parsed
            .map(Self)
            .map_err(|_| ApfsError::Other("unknown volume role"))
    }
}

/// A volume superblock that resolved, verified and carried the `APSB` magic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub oid: u64,
    /// Physical block of the superblock.
    pub addr: u64,
    /// Transaction id of the superblock; ceiling for every lookup inside the volume.
    pub xid: u64,
    pub role: VolumeRole,
    pub name: String,
    pub fs_index: u32,
    pub omap_addr: u64,
    pub root_tree_oid: u64,
    pub case_insensitive: bool,
    pub hashed_names: bool,
}

impl Volume {
    fn from_superblock(oid: u64, addr: u64, sb: &ApfsSuperblock) -> Self {
        Self {
            oid,
            addr,
            xid: sb.o.xid.get(),
            role: VolumeRole(sb.role.get()),
            name: String::from_utf8_lossy(sb.name_bytes()).into_owned(),
            fs_index: sb.fs_index.get(),
            omap_addr: sb.omap_oid.get(),
            root_tree_oid: sb.root_tree_oid.get(),
            case_insensitive: sb.is_case_insensitive(),
            hashed_names: sb.uses_hashed_names(),
        }
    }

    /// Resolves the filesystem tree root through the volume's own object map.
    pub fn open_fs_tree<IO: RimIO + ?Sized>(
        &self,
        container: &mut Container<'_, IO>,
    ) -> ApfsResult<FsTree> {
        let omap = ObjectMap::load(container, self.omap_addr)?;
        let root_addr = omap.lookup(container, self.root_tree_oid, self.xid)?;
        debug!(
            "volume {:?}: fs tree oid {} at block {root_addr}",
            self.name, self.root_tree_oid
        );
        Ok(FsTree {
            root_addr,
            omap_tree: omap.tree_addr,
            max_xid: self.xid,
            key_format: DrecKeyFormat::for_volume(self.hashed_names),
        })
    }
}

/// Root of a volume's filesystem tree plus what is needed to follow its virtual children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsTree {
    pub root_addr: u64,
    pub omap_tree: u64,
    pub max_xid: u64,
    pub key_format: DrecKeyFormat,
}

impl FsTree {
    #[inline]
    pub fn children(&self) -> ChildAddressing {
        ChildAddressing::Virtual {
            omap_tree: self.omap_tree,
            max_xid: self.max_xid,
        }
    }

    pub fn search<IO, Q>(
        &self,
        container: &mut Container<'_, IO>,
        query: &Q,
    ) -> ApfsResult<Option<LeafHit>>
    where
        IO: RimIO + ?Sized,
        Q: KeyQuery + ?Sized,
    {
        btree::search(container, self.root_addr, self.children(), query)
    }
}

/// Every resolvable volume of the newest checkpoint, in `nx_fs_oid` order.
///
/// Slots whose OID does not resolve, or whose block fails its checksum or magic,
/// are skipped.
pub fn list_volumes<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
) -> ApfsResult<Vec<Volume>> {
    let checkpoint = latest_superblock(container)?;
    let nx = checkpoint.superblock()?;
    let omap = ObjectMap::load(container, nx.omap_oid.get())?;

    let mut volumes = Vec::new();
    for (slot, oid) in nx.volume_oids() {
        let addr = match omap.lookup(container, oid, checkpoint.xid) {
            Ok(addr) => addr,
            Err(e) => {
                trace!("volume slot {slot} (oid {oid}) skipped: {e}");
                continue;
            }
        };
        let block = match container.read_object(addr) {
            Ok(block) => block,
            Err(e) => {
                trace!("volume slot {slot} (oid {oid}) skipped: {e}");
                continue;
            }
        };
        match view::<ApfsSuperblock>(&block) {
            Some(sb) if sb.magic.get() == APFS_MAGIC => {
                volumes.push(Volume::from_superblock(oid, addr, sb));
            }
            _ => trace!("volume slot {slot} (oid {oid}) skipped: no APSB magic at block {addr}"),
        }
    }
    Ok(volumes)
}

/// First volume with the requested role.
pub fn find_volume<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
    role: VolumeRole,
) -> ApfsResult<Volume> {
    let volume = list_volumes(container)?
        .into_iter()
        .find(|v| v.role == role)
        .ok_or(ApfsError::VolumeNotFound { role })?;
    debug!(
        "volume {:?} (role {role}) at block {}, xid {}",
        volume.name, volume.addr, volume.xid
    );
    Ok(volume)
}
