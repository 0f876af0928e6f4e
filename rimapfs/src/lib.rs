// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

//! Minimal APFS reader/writer working directly on raw disk images.
//!
//! The crate locates an APFS container (bare or inside a GPT partition), walks the
//! checkpoint area, object maps and filesystem B-trees, resolves paths to inodes, and
//! patches inode owner/group fields in place. Nothing is mounted and nothing but the
//! touched inode blocks is ever written.

extern crate alloc;

#[macro_use]
mod macros;

pub mod constant;
pub mod errors;
pub mod types;

pub mod checksum;
pub mod container;

pub mod btree;
pub mod checkpoint;
pub mod omap;
pub mod volume;

pub mod drec;
pub mod mutator;
pub mod path_utils;
pub mod resolver;

pub mod chown;

#[cfg(test)]
pub(crate) mod fixture;

pub mod prelude {
    pub use crate::chown::{check_io, chown_io};
    #[cfg(feature = "std")]
    pub use crate::chown::{check, chown, stat, volumes};
    pub use crate::container::{Container, ContainerLocation, locate_container};
    pub use crate::errors::*;
    pub use crate::mutator::{InodeRecord, NoownersInode, chown_inode, locate_inode};
    pub use crate::resolver::resolve_path;
    pub use crate::volume::{FsTree, Volume, VolumeRole, find_volume, list_volumes};
}
