// SPDX-License-Identifier: MIT

use alloc::{boxed::Box, string::String};
use core::fmt;

pub use rimio::errors::*;
pub use rimpart::errors::PartError;

use crate::volume::VolumeRole;

pub type ApfsResult<T = ()> = core::result::Result<T, ApfsError>;

/// Every way reading or patching an APFS image can fail.
///
/// `Display` prints the failing operation followed by one `caused by:` line per
/// wrapped error, innermost last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApfsError {
    /// Positioned read or write failed at container block `addr`.
    IO { addr: u64, source: RimIOError },
    /// Read failed at byte `offset`, before the container block size is known.
    IOAt { offset: u64, source: RimIOError },
    Open { path: String, source: RimIOError },
    Partition(PartError),
    NoApfsPartition,
    BadMagic { offset: u64, expected: u32, found: u32 },
    InvalidBlockSize(u32),
    ChecksumMismatch { addr: u64, stored: u64, computed: u64 },
    NoValidSuperblock,
    VolumeNotFound { role: VolumeRole },
    OmapEntryNotFound { oid: u64, max_xid: u64 },
    /// A B-tree node was required but the object type is neither 0x02 nor 0x03.
    UnexpectedNodeType { addr: u64, found: u32 },
    MalformedNode { addr: u64, reason: &'static str },
    MalformedKey(&'static str),
    PathNotFound { component: String, parent: u64 },
    InodeNotFound { inode: u64 },
    InodeIdMismatch { inode: u64, private_id: u64 },
    /// Refusal to overwrite ownership that is not the 99:99 placeholder.
    UnexpectedOwnership { inode: u64, owner: u32, group: u32 },
    Resolve { path: String, source: Box<ApfsError> },
    Chown { path: String, inode: u64, source: Box<ApfsError> },
    Other(&'static str),
}

impl ApfsError {
    pub fn msg(&self) -> &'static str {
        match self {
            ApfsError::IO { .. } | ApfsError::IOAt { .. } => "I/O error",
            ApfsError::Open { .. } => "Cannot open image",
            ApfsError::Partition(_) => "Partition table error",
            ApfsError::NoApfsPartition => "No APFS partition found in GPT",
            ApfsError::BadMagic { .. } => "Bad magic",
            ApfsError::InvalidBlockSize(_) => "Invalid block size",
            ApfsError::ChecksumMismatch { .. } => "Checksum mismatch",
            ApfsError::NoValidSuperblock => {
                "No valid container superblock found in checkpoint area"
            }
            ApfsError::VolumeNotFound { .. } => "Volume not found",
            ApfsError::OmapEntryNotFound { .. } => "Object map entry not found",
            ApfsError::UnexpectedNodeType { .. } => "Expected B-tree node type (2 or 3)",
            ApfsError::MalformedNode { .. } => "Malformed B-tree node",
            ApfsError::MalformedKey(msg) => msg,
            ApfsError::PathNotFound { .. } => "Directory entry not found",
            ApfsError::InodeNotFound { .. } => "Inode not found in filesystem B-tree",
            ApfsError::InodeIdMismatch { .. } => "Inode has mismatched private_id",
            ApfsError::UnexpectedOwnership { .. } => "Inode ownership is not the noowners placeholder",
            ApfsError::Resolve { .. } => "Resolving path failed",
            ApfsError::Chown { .. } => "Chown failed",
            ApfsError::Other(msg) => msg,
        }
    }

    /// The wrapped APFS error, for the two context-adding variants.
    pub fn cause(&self) -> Option<&ApfsError> {
        match self {
            ApfsError::Resolve { source, .. } | ApfsError::Chown { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Innermost APFS error once all path/inode context is peeled off.
    pub fn root_cause(&self) -> &ApfsError {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }

    fn fmt_headline(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApfsError::IO { addr, .. } => write!(f, "I/O error at block {addr}"),
            ApfsError::IOAt { offset, .. } => write!(f, "I/O error at byte offset {offset:#x}"),
            ApfsError::Open { path, .. } => write!(f, "Cannot open image {path:?}"),
            ApfsError::BadMagic {
                offset,
                expected,
                found,
            } => write!(
                f,
                "Bad magic at offset {offset:#x}: expected {expected:#010x}, found {found:#010x}"
            ),
            ApfsError::InvalidBlockSize(size) => write!(f, "Invalid block size {size}"),
            ApfsError::ChecksumMismatch {
                addr,
                stored,
                computed,
            } => write!(
                f,
                "Checksum mismatch in block {addr}: stored {stored:#018x}, computed {computed:#018x}"
            ),
            ApfsError::VolumeNotFound { role } => write!(f, "No volume with role {role} found"),
            ApfsError::OmapEntryNotFound { oid, max_xid } => {
                write!(f, "Object map entry for OID {oid} (xid <= {max_xid}) not found")
            }
            ApfsError::UnexpectedNodeType { addr, found } => write!(
                f,
                "Block {addr}: expected B-tree node type (2 or 3), got {found:#x}"
            ),
            ApfsError::MalformedNode { addr, reason } => {
                write!(f, "Malformed B-tree node at block {addr}: {reason}")
            }
            ApfsError::PathNotFound { component, parent } => write!(
                f,
                "Directory entry {component:?} not found in directory (cnid {parent})"
            ),
            ApfsError::InodeNotFound { inode } => {
                write!(f, "Inode {inode} not found in filesystem B-tree")
            }
            ApfsError::InodeIdMismatch { inode, private_id } => {
                write!(f, "Inode {inode} has mismatched private_id {private_id}")
            }
            ApfsError::UnexpectedOwnership {
                inode,
                owner,
                group,
            } => write!(
                f,
                "Inode {inode} has ownership {owner}:{group}, expected 99:99 from noowners mount"
            ),
            ApfsError::Resolve { path, .. } => write!(f, "Resolving path {path:?}"),
            ApfsError::Chown { path, inode, .. } => write!(f, "Chown inode {inode} ({path:?})"),
            _ => f.write_str(self.msg()),
        }
    }

    fn fmt_leaf_cause(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApfsError::IO { source, .. }
            | ApfsError::IOAt { source, .. }
            | ApfsError::Open { source, .. } => {
                write!(f, "\n  caused by: {source}")
            }
            ApfsError::Partition(e) => write!(f, "\n  caused by: {e}"),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ApfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_headline(f)?;
        let mut current = self;
        while let Some(next) = current.cause() {
            f.write_str("\n  caused by: ")?;
            next.fmt_headline(f)?;
            current = next;
        }
        current.fmt_leaf_cause(f)
    }
}

// Display already renders the whole chain; `source()` stays empty.
impl core::error::Error for ApfsError {}

impl From<PartError> for ApfsError {
    fn from(e: PartError) -> Self {
        match e {
            PartError::NotFound => ApfsError::NoApfsPartition,
            other => ApfsError::Partition(other),
        }
    }
}

impl From<&'static str> for ApfsError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        ApfsError::Other(msg)
    }
}
