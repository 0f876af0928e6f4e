// SPDX-License-Identifier: MIT

//! Path resolution: one directory-record lookup per component, from the root directory.

use alloc::string::ToString;

use log::{debug, trace};
use rimio::RimIO;

use crate::constant::*;
use crate::container::Container;
use crate::drec::DrecTarget;
use crate::errors::*;
use crate::path_utils::split_path;
use crate::types::*;
use crate::volume::FsTree;

/// Value of a directory record (j_drec_val_t).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub file_id: u64,
    pub flags: u16,
}

impl DirEntry {
    /// `DT_*` file type bits.
    #[inline]
    pub fn file_type(&self) -> u16 {
        self.flags & DREC_TYPE_MASK
    }
}

/// Looks up `name` in directory `parent`. The stored name must match byte for byte.
pub fn lookup_dir_entry<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
    tree: &FsTree,
    parent: u64,
    name: &str,
) -> ApfsResult<DirEntry> {
    let target = DrecTarget::new(parent, name).with_format(tree.key_format);
    let hit = tree
        .search(container, &target)?
        .ok_or_else(|| ApfsError::PathNotFound {
            component: name.to_string(),
            parent,
        })?;
    let val = view::<JDrecVal>(hit.value()).ok_or(ApfsError::MalformedNode {
        addr: hit.addr,
        reason: "directory record value too short",
    })?;
    let entry = DirEntry {
        file_id: val.file_id.get(),
        flags: val.flags.get(),
    };
    trace!("{parent}/{name:?} -> {} (leaf block {})", entry.file_id, hit.addr);
    Ok(entry)
}

/// Resolves a volume-relative path to its inode number. Empty components are
/// ignored, so `""` and `"/"` resolve to the root directory.
pub fn resolve_path<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
    tree: &FsTree,
    path: &str,
) -> ApfsResult<u64> {
    let mut cnid = ROOT_DIR_INO_NUM;
    for component in split_path(path) {
        cnid = lookup_dir_entry(container, tree, cnid, component)?.file_id;
    }
    debug!("path {path:?} -> inode {cnid}");
    Ok(cnid)
}
