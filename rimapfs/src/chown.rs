// SPDX-License-Identifier: MIT

//! Top-level operations: open the container, pick a volume, then resolve and
//! patch each path in order.
//!
//! The first failing path aborts the call. Inodes patched before it stay patched.

use alloc::{boxed::Box, string::String, string::ToString, vec::Vec};

use log::debug;
use rimio::RimIO;

use crate::container::Container;
use crate::errors::*;
use crate::mutator::{InodeRecord, chown_inode, locate_inode};
use crate::resolver::resolve_path;
use crate::volume::{FsTree, VolumeRole, find_volume};

fn open_volume<IO: RimIO + ?Sized>(
    io: &mut IO,
    role: VolumeRole,
) -> ApfsResult<(Container<'_, IO>, FsTree)> {
    let mut container = Container::open(io)?;
    let volume = find_volume(&mut container, role)?;
    let tree = volume.open_fs_tree(&mut container)?;
    Ok((container, tree))
}

fn resolve_wrapped<IO: RimIO + ?Sized>(
    container: &mut Container<'_, IO>,
    tree: &FsTree,
    path: &str,
) -> ApfsResult<u64> {
    resolve_path(container, tree, path).map_err(|e| ApfsError::Resolve {
        path: path.to_string(),
        source: Box::new(e),
    })
}

fn patch_paths<IO: RimIO + ?Sized, S: AsRef<str>>(
    container: &mut Container<'_, IO>,
    tree: &FsTree,
    uid: u32,
    gid: u32,
    paths: &[S],
) -> ApfsResult<Vec<InodeRecord>> {
    let mut patched = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let inode = resolve_wrapped(container, tree, path)?;
        let record = chown_inode(container, tree, inode, uid, gid).map_err(|e| ApfsError::Chown {
            path: path.to_string(),
            inode,
            source: Box::new(e),
        })?;
        patched.push(record);
    }
    Ok(patched)
}

/// Sets `uid:gid` on every path of the volume with `role`, on any [`RimIO`] backend.
///
/// Returns the patched records in the order of `paths`.
pub fn chown_io<IO: RimIO + ?Sized, S: AsRef<str>>(
    io: &mut IO,
    role: VolumeRole,
    uid: u32,
    gid: u32,
    paths: &[S],
) -> ApfsResult<Vec<InodeRecord>> {
    let (mut container, tree) = open_volume(io, role)?;
    let outcome = patch_paths(&mut container, &tree, uid, gid, paths);
    // Earlier writes must reach the backend even when a later path failed.
    let flushed = container.flush();
    let patched = outcome?;
    flushed?;
    debug!("{} inode(s) patched", patched.len());
    Ok(patched)
}

/// Dry run of [`chown_io`]: resolves every path and checks the placeholder
/// ownership, without writing.
pub fn check_io<IO: RimIO + ?Sized, S: AsRef<str>>(
    io: &mut IO,
    role: VolumeRole,
    paths: &[S],
) -> ApfsResult<Vec<(String, InodeRecord)>> {
    let (mut container, tree) = open_volume(io, role)?;
    let mut checked = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let inode = resolve_wrapped(&mut container, &tree, path)?;
        let ready = locate_inode(&mut container, &tree, inode)
            .and_then(InodeRecord::check_noowners)
            .map_err(|e| ApfsError::Chown {
                path: path.to_string(),
                inode,
                source: Box::new(e),
            })?;
        checked.push((path.to_string(), ready.record().clone()));
    }
    Ok(checked)
}

#[cfg(feature = "std")]
mod file {
    use super::*;
    use crate::volume::{Volume, list_volumes};
    use rimio::prelude::StdRimIO;
    use std::fs::{File, OpenOptions};
    use std::path::Path;

    fn open_image(path: &Path, write: bool) -> ApfsResult<File> {
        OpenOptions::new()
            .read(true)
            .write(write)
            .open(path)
            .map_err(|e| ApfsError::Open {
                path: path.display().to_string(),
                source: e.into(),
            })
    }

    /// Sets `uid:gid` on every path of the volume with `role` in the raw image at `image`.
    ///
    /// The image must not be mounted or otherwise in use. The file is closed on
    /// every return path.
    pub fn chown<P: AsRef<Path>, S: AsRef<str>>(
        image: P,
        role: VolumeRole,
        uid: u32,
        gid: u32,
        paths: &[S],
    ) -> ApfsResult<Vec<InodeRecord>> {
        let mut file = open_image(image.as_ref(), true)?;
        let mut io = StdRimIO::new(&mut file);
        chown_io(&mut io, role, uid, gid, paths)
    }

    /// Read-only [`chown`] dry run.
    pub fn check<P: AsRef<Path>, S: AsRef<str>>(
        image: P,
        role: VolumeRole,
        paths: &[S],
    ) -> ApfsResult<Vec<(String, InodeRecord)>> {
        let mut file = open_image(image.as_ref(), false)?;
        let mut io = StdRimIO::new(&mut file);
        check_io(&mut io, role, paths)
    }

    pub fn volumes<P: AsRef<Path>>(image: P) -> ApfsResult<Vec<Volume>> {
        let mut file = open_image(image.as_ref(), false)?;
        let mut io = StdRimIO::new(&mut file);
        let mut container = Container::open(&mut io)?;
        list_volumes(&mut container)
    }

    /// Reads the inode record `path` resolves to.
    pub fn stat<P: AsRef<Path>>(image: P, role: VolumeRole, path: &str) -> ApfsResult<InodeRecord> {
        let mut file = open_image(image.as_ref(), false)?;
        let mut io = StdRimIO::new(&mut file);
        let (mut container, tree) = open_volume(&mut io, role)?;
        let inode = resolve_wrapped(&mut container, &tree, path)?;
        locate_inode(&mut container, &tree, inode)
    }
}

#[cfg(feature = "std")]
pub use file::{check, chown, stat, volumes};
